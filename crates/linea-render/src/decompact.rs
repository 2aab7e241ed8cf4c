//! Re-expansion of multi-parent nodes into one render copy per parent edge.
//!
//! The layout engine only understands trees, so a fan-in node is laid out
//! once under its canonical parent. Decompaction makes the remaining parent
//! edges visible again: one [`RenderNode`] per matched visible parent, all
//! copies sharing a breadth coordinate averaged across those parents.

use crate::hierarchy::Hierarchy;
use crate::layout::PlacedNode;
use crate::path::Point;
use crate::scene::{ElementId, RenderNode};

/// Expands `placed` into the render copies actually bound to SVG elements.
///
/// For a multi-parent node, every visible parent yields one copy whose
/// `parent` is that node and whose `x` is the arithmetic mean of all
/// matched parents' `x` (the averaged `x` is also written back to the
/// placed node so its own children hang from the averaged position). A
/// matched parent with no visible children adopts the node into its
/// children set, so later fold toggles have something to act on.
///
/// Output length is always >= input length, with equality exactly when no
/// visible node has more than one recorded parent.
pub fn decompact(hierarchy: &Hierarchy, placed: &mut [PlacedNode]) -> Vec<RenderNode> {
    let mut by_key = rustc_hash::FxHashMap::default();
    for (idx, p) in placed.iter().enumerate() {
        by_key.insert(hierarchy.slot(p.slot).data.key().to_string(), idx);
    }

    // (placed index, copy index, parent placed index)
    let mut copies: Vec<(usize, u32, Option<usize>)> = Vec::with_capacity(placed.len());

    for idx in 0..placed.len() {
        let data = &hierarchy.slot(placed[idx].slot).data;
        if !data.is_multi_parent() {
            copies.push((idx, 0, placed[idx].parent));
            continue;
        }

        let matched: Vec<usize> = data
            .parent_keys()
            .filter_map(|key| by_key.get(key).copied())
            .collect();
        if matched.is_empty() {
            copies.push((idx, 0, placed[idx].parent));
            continue;
        }

        let avg_x = matched.iter().map(|&m| placed[m].x).sum::<f64>() / matched.len() as f64;
        placed[idx].x = avg_x;

        let id = data.id;
        for (copy, &parent_idx) in matched.iter().enumerate() {
            copies.push((idx, copy as u32, Some(parent_idx)));
            if placed[parent_idx].children_ids.is_empty() {
                placed[parent_idx].children_ids.push(id);
            }
        }
    }

    copies
        .into_iter()
        .map(|(idx, copy, parent_idx)| {
            let node = &placed[idx];
            let slot = hierarchy.slot(node.slot);
            RenderNode {
                id: node.id,
                element: ElementId {
                    node: node.id,
                    copy,
                },
                key: slot.data.key().to_string(),
                name: slot.data.item.name.clone(),
                direction: hierarchy.direction(),
                depth: node.depth,
                is_root: node.parent.is_none(),
                parent: parent_idx.map(|p| placed[p].id),
                parent_pos: parent_idx.map(|p| Point::new(placed[p].x, placed[p].y)),
                x: node.x,
                y: node.y,
                has_visible_children: !node.children_ids.is_empty(),
                has_hidden_children: node.has_hidden_children,
                usage: slot.data.item.usage,
            }
        })
        .collect()
}
