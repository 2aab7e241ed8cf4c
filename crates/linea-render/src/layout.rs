//! Tidy-tree layout over the visible part of a stratified hierarchy.
//!
//! Walker's algorithm with Buchheim-Junger-Leipert contour threading:
//! a bottom-up first walk assigns preliminary breadth coordinates by
//! merging subtree contours, a top-down second walk applies accumulated
//! modifiers. Final positions are normalized into the requested bounds the
//! way d3's fixed-size tree does it, with the depth axis scaled uniformly
//! per level and mirrored for the upstream half.

use crate::hierarchy::Hierarchy;
use linea_core::{FoldState, NodeId};

const SIBLING_SEPARATION: f64 = 1.0;
const SUBTREE_SEPARATION: f64 = 2.0;

/// Pixel extents the layout normalizes into. Breadth covers the full chart
/// height; depth covers one half of the width minus margins.
#[derive(Debug, Clone, Copy)]
pub struct LayoutBounds {
    pub breadth: f64,
    pub depth: f64,
}

/// One visible node with its computed position, in preorder (root first).
#[derive(Debug, Clone)]
pub struct PlacedNode {
    /// Arena slot in the source hierarchy.
    pub slot: usize,
    pub id: NodeId,
    pub depth: usize,
    /// Index of the parent within the placed list.
    pub parent: Option<usize>,
    /// Breadth coordinate (vertical on screen).
    pub x: f64,
    /// Depth coordinate (horizontal on screen; negative upstream).
    pub y: f64,
    /// Ids of visible children. Decompaction may adopt extra entries here
    /// so fold toggling has a children set to act on.
    pub children_ids: Vec<NodeId>,
    /// The node has children in the hierarchy that fold state hides.
    pub has_hidden_children: bool,
}

struct WalkNode {
    slot: usize,
    depth: usize,
    parent: Option<usize>,
    children: Vec<usize>,
    prelim: f64,
    modifier: f64,
    thread_left: Option<usize>,
    thread_right: Option<usize>,
    ancestor: usize,
    shift: f64,
    change: f64,
    number: usize,
}

/// Lays out every node of `hierarchy` not masked by `fold`.
///
/// A collapsed node stays visible (it carries the unfold indicator); only
/// its descendants are masked.
pub fn tidy_layout(hierarchy: &Hierarchy, fold: &FoldState, bounds: LayoutBounds) -> Vec<PlacedNode> {
    let mut walk: Vec<WalkNode> = Vec::with_capacity(hierarchy.len());
    build_visible(hierarchy, fold, hierarchy.root(), None, 0, &mut walk);

    first_walk(0, &mut walk);
    let mut breadth = vec![0.0f64; walk.len()];
    second_walk(0, 0.0, &walk, &mut breadth);

    // d3-style fixed-size normalization: pad half a separation on both
    // sides of the breadth extent, scale depth uniformly per level.
    let min_x = breadth.iter().copied().fold(f64::INFINITY, f64::min);
    let max_x = breadth.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = (max_x - min_x) + SIBLING_SEPARATION;
    let kx = bounds.breadth / span;

    let max_depth = walk.iter().map(|n| n.depth).max().unwrap_or(0);
    let ky = bounds.depth / max_depth.max(1) as f64;
    let sign = hierarchy.direction().axis_sign();

    let placed: Vec<PlacedNode> = walk
        .iter()
        .enumerate()
        .map(|(idx, node)| {
            let slot = hierarchy.slot(node.slot);
            PlacedNode {
                slot: node.slot,
                id: slot.data.id,
                depth: node.depth,
                parent: node.parent,
                x: (breadth[idx] - min_x + SIBLING_SEPARATION / 2.0) * kx,
                y: sign * node.depth as f64 * ky,
                children_ids: node
                    .children
                    .iter()
                    .map(|&c| hierarchy.id_of(walk[c].slot))
                    .collect(),
                has_hidden_children: fold.is_collapsed(slot.data.id) && slot.has_descendants(),
            }
        })
        .collect();

    tracing::trace!(
        direction = ?hierarchy.direction(),
        total = hierarchy.len(),
        visible = placed.len(),
        "tidy layout pass"
    );
    placed
}

fn build_visible(
    hierarchy: &Hierarchy,
    fold: &FoldState,
    slot_idx: usize,
    parent: Option<usize>,
    depth: usize,
    walk: &mut Vec<WalkNode>,
) {
    let idx = walk.len();
    walk.push(WalkNode {
        slot: slot_idx,
        depth,
        parent,
        children: Vec::new(),
        prelim: 0.0,
        modifier: 0.0,
        thread_left: None,
        thread_right: None,
        ancestor: idx,
        shift: 0.0,
        change: 0.0,
        number: 0,
    });

    let slot = hierarchy.slot(slot_idx);
    if fold.is_collapsed(slot.data.id) {
        return;
    }
    for (number, &child_slot) in slot.children.iter().enumerate() {
        let child_idx = walk.len();
        build_visible(hierarchy, fold, child_slot, Some(idx), depth + 1, walk);
        walk[child_idx].number = number;
        walk[idx].children.push(child_idx);
    }
}

fn first_walk(v: usize, nodes: &mut Vec<WalkNode>) {
    let children = nodes[v].children.clone();
    if children.is_empty() {
        nodes[v].prelim = 0.0;
        return;
    }

    for &child in &children {
        first_walk(child, nodes);
    }

    let mut default_ancestor = children[0];
    for (i, &child) in children.iter().enumerate() {
        if i > 0 {
            let left_sibling = children[i - 1];
            let shift = separate(left_sibling, child, nodes);
            nodes[child].prelim += shift;
            nodes[child].modifier += shift;
            default_ancestor = apportion(child, left_sibling, default_ancestor, nodes);
        }
    }

    execute_shifts(v, nodes);

    let midpoint =
        (nodes[children[0]].prelim + nodes[children[children.len() - 1]].prelim) / 2.0;
    nodes[v].prelim = midpoint;
}

/// Minimum shift keeping `right`'s subtree clear of `left`'s, found by
/// walking the facing contours level by level.
fn separate(left: usize, right: usize, nodes: &[WalkNode]) -> f64 {
    let mut left_contour = left;
    let mut right_contour = right;
    let mut left_mod = 0.0f64;
    let mut right_mod = 0.0f64;
    let mut max_shift = 0.0f64;

    loop {
        let left_x = nodes[left_contour].prelim + left_mod;
        let right_x = nodes[right_contour].prelim + right_mod;

        let desired = if are_siblings(left_contour, right_contour, nodes) {
            SIBLING_SEPARATION
        } else {
            SUBTREE_SEPARATION
        };

        let overlap = left_x + desired - right_x;
        if overlap > max_shift {
            max_shift = overlap;
        }

        match (next_right(left_contour, nodes), next_left(right_contour, nodes)) {
            (Some(nl), Some(nr)) => {
                left_mod += nodes[left_contour].modifier;
                right_mod += nodes[right_contour].modifier;
                left_contour = nl;
                right_contour = nr;
            }
            _ => break,
        }
    }

    max_shift
}

fn are_siblings(a: usize, b: usize, nodes: &[WalkNode]) -> bool {
    nodes[a].parent.is_some() && nodes[a].parent == nodes[b].parent
}

fn next_right(v: usize, nodes: &[WalkNode]) -> Option<usize> {
    nodes[v].children.last().copied().or(nodes[v].thread_right)
}

fn next_left(v: usize, nodes: &[WalkNode]) -> Option<usize> {
    nodes[v].children.first().copied().or(nodes[v].thread_left)
}

fn apportion(
    v: usize,
    left_sibling: usize,
    mut default_ancestor: usize,
    nodes: &mut Vec<WalkNode>,
) -> usize {
    let mut inner_right = left_sibling;
    let mut outer_right = v;
    let mut inner_left = v;
    let mut outer_left = nodes[v]
        .parent
        .and_then(|p| nodes[p].children.first().copied())
        .unwrap_or(v);

    let mut s_inner_right = nodes[inner_right].modifier;
    let mut s_outer_right = nodes[outer_right].modifier;
    let mut s_inner_left = nodes[inner_left].modifier;
    let mut s_outer_left = nodes[outer_left].modifier;

    loop {
        match (next_right(inner_right, nodes), next_left(inner_left, nodes)) {
            (Some(ir), Some(il)) => {
                inner_right = ir;
                inner_left = il;
            }
            _ => break,
        }
        if let Some(next) = next_left(outer_left, nodes) {
            outer_left = next;
        }
        if let Some(next) = next_right(outer_right, nodes) {
            outer_right = next;
        }

        nodes[outer_right].ancestor = v;

        let shift = (nodes[inner_right].prelim + s_inner_right)
            - (nodes[inner_left].prelim + s_inner_left)
            + SUBTREE_SEPARATION;
        if shift > 0.0 {
            let ancestor = nodes[v].ancestor;
            let wl = if nodes[ancestor].depth <= nodes[v].depth {
                ancestor
            } else {
                default_ancestor
            };
            move_subtree(wl, v, shift, nodes);
            s_inner_left += shift;
            s_outer_left += shift;
        }

        s_inner_right += nodes[inner_right].modifier;
        s_inner_left += nodes[inner_left].modifier;
        s_outer_left += nodes[outer_left].modifier;
        s_outer_right += nodes[outer_right].modifier;
    }

    if next_right(inner_right, nodes).is_some() && next_right(outer_right, nodes).is_none() {
        nodes[outer_right].thread_right = next_right(inner_right, nodes);
        nodes[outer_right].modifier += s_inner_right - s_outer_right;
    }
    if next_left(inner_left, nodes).is_some() && next_left(outer_left, nodes).is_none() {
        nodes[outer_left].thread_left = next_left(inner_left, nodes);
        nodes[outer_left].modifier += s_inner_left - s_outer_left;
        default_ancestor = v;
    }

    default_ancestor
}

fn move_subtree(wl: usize, wr: usize, shift: f64, nodes: &mut [WalkNode]) {
    let subtrees = (nodes[wr].number as f64 - nodes[wl].number as f64).max(1.0);
    let per_subtree = shift / subtrees;

    nodes[wr].change -= per_subtree;
    nodes[wr].shift += shift;
    nodes[wl].change += per_subtree;
    nodes[wr].prelim += shift;
    nodes[wr].modifier += shift;
}

fn execute_shifts(v: usize, nodes: &mut Vec<WalkNode>) {
    let children = nodes[v].children.clone();
    let mut shift = 0.0f64;
    let mut change = 0.0f64;

    for &child in children.iter().rev() {
        nodes[child].prelim += shift;
        nodes[child].modifier += shift;
        change += nodes[child].change;
        shift += nodes[child].shift + change;
    }
}

fn second_walk(v: usize, modifier: f64, nodes: &[WalkNode], breadth: &mut [f64]) {
    breadth[v] = nodes[v].prelim + modifier;
    for &child in &nodes[v].children {
        second_walk(child, modifier + nodes[v].modifier, nodes, breadth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linea_core::{Direction, compact};

    fn item(key: &str, parent: Option<&str>, level: u32) -> linea_core::LineageItem {
        linea_core::LineageItem {
            key: key.to_string(),
            parent: parent.map(str::to_string),
            level,
            name: key.to_string(),
            cluster: String::new(),
            database: String::new(),
            schema: String::new(),
            badges: Vec::new(),
            usage: None,
        }
    }

    fn bounds() -> LayoutBounds {
        LayoutBounds {
            breadth: 400.0,
            depth: 300.0,
        }
    }

    #[test]
    fn root_is_centered_over_its_children() {
        let items = vec![
            item("root", None, 0),
            item("a", Some("root"), 1),
            item("b", Some("root"), 1),
        ];
        let compacted = compact(Direction::Downstream, &items);
        let h = Hierarchy::stratify(Direction::Downstream, &compacted).unwrap();
        let placed = tidy_layout(&h, &FoldState::new(), bounds());

        assert_eq!(placed.len(), 3);
        let root = &placed[0];
        let a = placed.iter().find(|p| p.id == compacted[1].id).unwrap();
        let b = placed.iter().find(|p| p.id == compacted[2].id).unwrap();
        assert!((root.x - (a.x + b.x) / 2.0).abs() < 1e-9);
        assert!(a.x != b.x);
    }

    #[test]
    fn depth_axis_scales_into_bounds_and_mirrors_upstream() {
        let items = vec![
            item("root", None, 0),
            item("a", Some("root"), 1),
            item("b", Some("a"), 2),
        ];
        let down = compact(Direction::Downstream, &items);
        let h = Hierarchy::stratify(Direction::Downstream, &down).unwrap();
        let placed = tidy_layout(&h, &FoldState::new(), bounds());
        let ys: Vec<f64> = placed.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![0.0, 150.0, 300.0]);

        let up = compact(Direction::Upstream, &items);
        let h = Hierarchy::stratify(Direction::Upstream, &up).unwrap();
        let placed = tidy_layout(&h, &FoldState::new(), bounds());
        let ys: Vec<f64> = placed.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![0.0, -150.0, -300.0]);
    }

    #[test]
    fn single_chain_centers_on_the_breadth_axis() {
        let items = vec![item("root", None, 0), item("a", Some("root"), 1)];
        let compacted = compact(Direction::Downstream, &items);
        let h = Hierarchy::stratify(Direction::Downstream, &compacted).unwrap();
        let placed = tidy_layout(&h, &FoldState::new(), bounds());
        for p in &placed {
            assert!((p.x - 200.0).abs() < 1e-9);
        }
    }

    #[test]
    fn collapsed_subtree_is_masked_but_its_anchor_stays() {
        let items = vec![
            item("root", None, 0),
            item("a", Some("root"), 1),
            item("b", Some("a"), 2),
        ];
        let compacted = compact(Direction::Downstream, &items);
        let h = Hierarchy::stratify(Direction::Downstream, &compacted).unwrap();

        let mut fold = FoldState::new();
        fold.collapse(compacted[1].id);
        let placed = tidy_layout(&h, &fold, bounds());

        assert_eq!(placed.len(), 2);
        let a = placed.iter().find(|p| p.id == compacted[1].id).unwrap();
        assert!(a.has_hidden_children);
        assert!(a.children_ids.is_empty());
    }

    #[test]
    fn collapsed_co_parent_of_a_fan_in_child_reports_hidden_children() {
        let items = vec![
            item("root", None, 0),
            item("P1", Some("root"), 1),
            item("P2", Some("root"), 1),
            item("C", Some("P1"), 2),
            item("C", Some("P2"), 2),
        ];
        let compacted = compact(Direction::Downstream, &items);
        let h = Hierarchy::stratify(Direction::Downstream, &compacted).unwrap();

        let mut fold = FoldState::new();
        fold.collapse(compacted[1].id);
        fold.collapse(compacted[2].id);
        let placed = tidy_layout(&h, &fold, bounds());

        // P2 has no arena children of its own, only the adopted fan-in
        // edge to C, yet it must keep advertising the hidden subtree.
        let p2 = placed.iter().find(|p| p.id == compacted[2].id).unwrap();
        assert!(p2.has_hidden_children);
    }

    #[test]
    fn siblings_do_not_overlap() {
        let mut items = vec![item("root", None, 0)];
        for i in 0..6 {
            let key = format!("n{i}");
            items.push(item(&key, Some("root"), 1));
            items.push(item(&format!("{key}-child"), Some(&key), 2));
        }
        let compacted = compact(Direction::Downstream, &items);
        let h = Hierarchy::stratify(Direction::Downstream, &compacted).unwrap();
        let placed = tidy_layout(&h, &FoldState::new(), bounds());

        let mut level1: Vec<f64> = placed
            .iter()
            .filter(|p| p.depth == 1)
            .map(|p| p.x)
            .collect();
        level1.sort_by(|a, b| a.partial_cmp(b).unwrap());
        for pair in level1.windows(2) {
            assert!(pair[1] - pair[0] > 1e-6, "siblings overlap: {pair:?}");
        }
    }
}
