//! Chart lifecycle and the fold/unfold click state machine.
//!
//! [`LineageChart`] is the explicit handle the host owns: it is created
//! once per lineage payload, re-renders on every click, and is torn down
//! by [`LineageChart::destroy`] (or simply dropped). All engine state —
//! hierarchies, fold state, the retained scene — lives behind the handle;
//! nothing is shared between charts.

use crate::decompact::decompact;
use crate::hierarchy::Hierarchy;
use crate::layout::{LayoutBounds, tidy_layout};
use crate::path::Point;
use crate::scene::{Anchor, ElementId, Frame, RenderNode, Scene};
use crate::svg::{SvgRenderOptions, render_frame_svg};
use crate::{Error, Result};
use linea_core::{Dimensions, Direction, FoldState, Labels, Lineage, NodeId, compact};
use rustc_hash::FxHashMap;
use std::fmt;

/// Invoked with the clicked copy and every copy currently in the scene,
/// whether or not the click produced a visible fold/unfold.
pub type NodeClickCallback = Box<dyn FnMut(&RenderNode, &[RenderNode])>;

pub struct ChartOptions {
    pub transition_ms: u64,
    /// Horizontal space reserved outside each half of the tree.
    pub margin: f64,
    pub node_radius: f64,
    pub font_size: f64,
    pub scale_radius_by_usage: bool,
    pub on_node_click: Option<NodeClickCallback>,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            transition_ms: 750,
            margin: 100.0,
            node_radius: 12.0,
            font_size: 11.0,
            scale_radius_by_usage: false,
            on_node_click: None,
        }
    }
}

impl fmt::Debug for ChartOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartOptions")
            .field("transition_ms", &self.transition_ms)
            .field("margin", &self.margin)
            .field("node_radius", &self.node_radius)
            .field("font_size", &self.font_size)
            .field("scale_radius_by_usage", &self.scale_radius_by_usage)
            .field("on_node_click", &self.on_node_click.is_some())
            .finish()
    }
}

/// What a single click changed.
#[derive(Debug)]
pub struct ClickOutcome {
    pub clicked: RenderNode,
    /// Logical nodes whose fold state flipped, in toggle order.
    pub toggled: Vec<NodeId>,
    /// One render pass per anchor, in pass order.
    pub frames: Vec<Frame>,
    /// The anchor node of each pass, parallel to `frames`.
    pub anchors: Vec<NodeId>,
}

/// A mounted lineage chart.
pub struct LineageChart {
    dimensions: Dimensions,
    labels: Labels,
    options: ChartOptions,
    has_lineage_data: bool,
    halves: Vec<Hierarchy>,
    fold: FoldState,
    scene: Scene,
    current: Vec<RenderNode>,
    /// Logical children per node, canonical and adopted fan-in edges
    /// alike. Built once from the hierarchies; fold state never changes
    /// it, so a folded co-parent keeps its place in the sync rule.
    children_index: FxHashMap<NodeId, Vec<NodeId>>,
    last_frame: Frame,
}

impl fmt::Debug for LineageChart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineageChart")
            .field("dimensions", &self.dimensions)
            .field("options", &self.options)
            .field("halves", &self.halves.len())
            .field("nodes", &self.current.len())
            .field("collapsed", &self.fold.collapsed_count())
            .finish_non_exhaustive()
    }
}

impl LineageChart {
    /// Compacts and stratifies both directions and performs the first
    /// render, anchored at the root's conventional start position
    /// (vertically centered on the fold axis).
    ///
    /// An empty direction contributes no hierarchy; with no lineage data
    /// at all the chart still renders its direction labels.
    pub fn create(
        lineage: &Lineage,
        dimensions: Dimensions,
        labels: Labels,
        options: ChartOptions,
    ) -> Result<Self> {
        let mut halves = Vec::new();
        for (direction, items) in [
            (Direction::Upstream, &lineage.upstream_entities),
            (Direction::Downstream, &lineage.downstream_entities),
        ] {
            if items.is_empty() {
                continue;
            }
            let compacted = compact(direction, items);
            halves.push(Hierarchy::stratify(direction, &compacted)?);
        }

        let mut children_index = FxHashMap::default();
        for hierarchy in &halves {
            for idx in 0..hierarchy.len() {
                let slot = hierarchy.slot(idx);
                let mut ids: Vec<NodeId> = slot
                    .children
                    .iter()
                    .map(|&child| hierarchy.id_of(child))
                    .collect();
                for &child in &slot.adopted {
                    let id = hierarchy.id_of(child);
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                children_index.insert(hierarchy.id_of(idx), ids);
            }
        }

        let start = Point::new(dimensions.height / 2.0, 0.0);
        let mut chart = Self {
            dimensions,
            labels,
            has_lineage_data: lineage.has_lineage_data(),
            halves,
            fold: FoldState::new(),
            scene: Scene::new(),
            current: Vec::new(),
            children_index,
            last_frame: Frame::empty(
                Anchor {
                    prev: start,
                    cur: start,
                },
                options.transition_ms,
            ),
            options,
        };

        let anchor = chart.root_ids().first().copied();
        chart.render_pass(anchor);
        tracing::debug!(
            halves = chart.halves.len(),
            nodes = chart.current.len(),
            "lineage chart created"
        );
        Ok(chart)
    }

    pub fn has_lineage_data(&self) -> bool {
        self.has_lineage_data
    }

    /// Every render copy currently in the scene.
    pub fn nodes(&self) -> &[RenderNode] {
        &self.current
    }

    /// The patches produced by the most recent render pass.
    pub fn frame(&self) -> &Frame {
        &self.last_frame
    }

    pub fn fold_state(&self) -> &FoldState {
        &self.fold
    }

    /// Root ids, one per direction that has data.
    pub fn root_ids(&self) -> Vec<NodeId> {
        self.halves.iter().map(|h| h.id_of(h.root())).collect()
    }

    /// The current frame as an animated SVG document.
    pub fn svg(&self) -> String {
        let options = SvgRenderOptions {
            node_radius: self.options.node_radius,
            font_size: self.options.font_size,
            animate: true,
            scale_radius_by_usage: self.options.scale_radius_by_usage,
        };
        render_frame_svg(&self.last_frame, self.dimensions, &self.labels, &options)
    }

    /// Fold/unfold state machine, driven by a click on any rendered copy
    /// of the node.
    ///
    /// - a root click toggles every current root and re-renders once per
    ///   root, the clicked one first
    /// - a click on a node with descendants toggles it together with every
    ///   node whose children intersect its children (so all parents of a
    ///   fanned-in child fold and unfold consistently), then re-renders
    ///   once, anchored at that half's root
    /// - a leaf click toggles nothing and triggers no render
    ///
    /// The host callback fires in every case.
    pub fn click(&mut self, id: NodeId) -> Result<ClickOutcome> {
        let clicked = self
            .current
            .iter()
            .find(|n| n.id == id)
            .cloned()
            .ok_or_else(|| Error::InvalidModel {
                message: format!("clicked node is not in the scene: {id}"),
            })?;

        if let Some(callback) = self.options.on_node_click.as_mut() {
            callback(&clicked, &self.current);
        }

        let mut toggled = Vec::new();
        let mut frames = Vec::new();
        let mut anchors = Vec::new();

        if clicked.is_root {
            let mut roots = self.root_ids();
            roots.sort_by_key(|root| *root != id);
            for &root in &roots {
                self.fold.toggle(root);
                toggled.push(root);
            }
            for &root in &roots {
                frames.push(self.render_pass(Some(root)));
                anchors.push(root);
            }
        } else if clicked.has_visible_children || clicked.has_hidden_children {
            let pre_children = self.children_index.get(&id).cloned().unwrap_or_default();
            self.fold.toggle(id);
            toggled.push(id);

            if !pre_children.is_empty() {
                let siblings: Vec<NodeId> = self
                    .children_index
                    .iter()
                    .filter(|(other, children)| {
                        **other != id && children.iter().any(|c| pre_children.contains(c))
                    })
                    .map(|(other, _)| *other)
                    .collect();
                for sibling in siblings {
                    self.fold.toggle(sibling);
                    toggled.push(sibling);
                }
            }

            let half_root = self
                .halves
                .iter()
                .find(|h| h.direction() == clicked.direction)
                .map(|h| h.id_of(h.root()))
                .unwrap_or(id);
            frames.push(self.render_pass(Some(half_root)));
            anchors.push(half_root);
        }

        tracing::debug!(
            clicked = %clicked.element,
            toggled = toggled.len(),
            passes = frames.len(),
            "lineage node clicked"
        );
        Ok(ClickOutcome {
            clicked,
            toggled,
            frames,
            anchors,
        })
    }

    /// Tears the chart down, collapsing every element toward the anchor.
    pub fn destroy(mut self) -> Frame {
        let anchor = self.last_frame.anchor;
        let teardown = Anchor {
            prev: anchor.cur,
            cur: anchor.cur,
        };
        self.scene.clear(teardown, self.options.transition_ms)
    }

    /// One full layout + decompact + diff pass, anchored at `anchor_id`
    /// (falling back to the conventional start position when the anchor
    /// has never been rendered).
    fn render_pass(&mut self, anchor_id: Option<NodeId>) -> Frame {
        let bounds = LayoutBounds {
            breadth: self.dimensions.height,
            depth: (self.dimensions.width / 2.0 - self.options.margin).max(0.0),
        };
        let start = Point::new(self.dimensions.height / 2.0, 0.0);
        let anchor_prev = anchor_id
            .and_then(|id| self.scene.position(ElementId { node: id, copy: 0 }))
            .unwrap_or(start);

        let mut nodes: Vec<RenderNode> = Vec::new();
        let mut anchor_cur = anchor_prev;

        for hierarchy in &self.halves {
            let mut placed = tidy_layout(hierarchy, &self.fold, bounds);
            // The focal table never moves: the root of each half is pinned
            // to the start position, its computed coordinates discarded.
            placed[0].x = start.x;
            placed[0].y = start.y;

            let rendered = decompact(hierarchy, &mut placed);
            if let Some(id) = anchor_id {
                if let Some(p) = placed.iter().find(|p| p.id == id) {
                    anchor_cur = Point::new(p.x, p.y);
                }
            }
            nodes.extend(rendered);
        }

        let anchor = Anchor {
            prev: anchor_prev,
            cur: anchor_cur,
        };
        let frame = self
            .scene
            .render(&nodes, anchor, self.options.transition_ms);
        self.current = nodes;
        self.last_frame = frame.clone();
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Phase;
    use std::cell::RefCell;
    use std::rc::Rc;

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

    fn dims() -> Dimensions {
        Dimensions {
            width: 800.0,
            height: 400.0,
        }
    }

    fn chart(lineage: &Lineage) -> LineageChart {
        LineageChart::create(lineage, dims(), Labels::default(), ChartOptions::default()).unwrap()
    }

    fn both_halves() -> Lineage {
        Lineage {
            upstream_entities: vec![item("root", None, 0), item("u1", Some("root"), 1)],
            downstream_entities: vec![item("root", None, 0), item("d1", Some("root"), 1)],
        }
    }

    #[test]
    fn create_renders_every_node_once_per_half() {
        let chart = chart(&both_halves());
        assert!(chart.has_lineage_data());
        assert_eq!(chart.root_ids().len(), 2);
        // Two roots (one per half) plus one child each.
        assert_eq!(chart.nodes().len(), 4);
        assert!(
            chart
                .frame()
                .nodes
                .iter()
                .all(|p| p.phase == Phase::Enter)
        );
    }

    #[test]
    fn clicking_a_root_renders_once_per_root_clicked_first() {
        let mut chart = chart(&both_halves());
        let roots = chart.root_ids();
        let clicked = roots[1];

        let outcome = chart.click(clicked).unwrap();
        assert_eq!(outcome.frames.len(), 2);
        assert_eq!(outcome.anchors[0], clicked);
        assert_eq!(outcome.toggled.len(), 2);
        // Both halves collapsed: only the two roots remain.
        assert_eq!(chart.nodes().len(), 2);

        let outcome = chart.click(clicked).unwrap();
        assert_eq!(outcome.frames.len(), 2);
        assert_eq!(chart.nodes().len(), 4);
    }

    #[test]
    fn clicking_a_leaf_neither_toggles_nor_renders_but_fires_the_callback() {
        let seen: Rc<RefCell<Vec<(String, usize)>>> = Rc::default();
        let sink = Rc::clone(&seen);
        let options = ChartOptions {
            on_node_click: Some(Box::new(move |clicked, all| {
                sink.borrow_mut().push((clicked.key.clone(), all.len()));
            })),
            ..Default::default()
        };
        let lineage = both_halves();
        let mut chart =
            LineageChart::create(&lineage, dims(), Labels::default(), options).unwrap();

        let leaf = chart
            .nodes()
            .iter()
            .find(|n| n.key == "d1")
            .map(|n| n.id)
            .unwrap();
        let outcome = chart.click(leaf).unwrap();

        assert!(outcome.toggled.is_empty());
        assert!(outcome.frames.is_empty());
        assert_eq!(seen.borrow().as_slice(), &[("d1".to_string(), 4)]);
    }

    #[test]
    fn folding_a_mid_node_masks_its_subtree_and_marks_it_foldable() {
        let lineage = Lineage {
            upstream_entities: Vec::new(),
            downstream_entities: vec![
                item("root", None, 0),
                item("a", Some("root"), 1),
                item("b", Some("a"), 2),
            ],
        };
        let mut chart = chart(&lineage);
        let a = chart
            .nodes()
            .iter()
            .find(|n| n.key == "a")
            .map(|n| n.id)
            .unwrap();

        let outcome = chart.click(a).unwrap();
        assert_eq!(outcome.toggled, vec![a]);
        assert_eq!(outcome.anchors, chart.root_ids());
        assert_eq!(chart.nodes().len(), 2);
        let a_node = chart.nodes().iter().find(|n| n.key == "a").unwrap();
        assert!(a_node.has_hidden_children);
        assert_eq!(a_node.indicator(), Some("+"));

        chart.click(a).unwrap();
        assert_eq!(chart.nodes().len(), 3);
    }

    #[test]
    fn fan_in_parents_fold_together() {
        let lineage = Lineage {
            upstream_entities: Vec::new(),
            downstream_entities: vec![
                item("root", None, 0),
                item("P1", Some("root"), 1),
                item("P2", Some("root"), 1),
                item("C", Some("P1"), 2),
                item("C", Some("P2"), 2),
            ],
        };
        let mut chart = chart(&lineage);
        // Both copies of C are rendered before folding.
        assert_eq!(chart.nodes().iter().filter(|n| n.key == "C").count(), 2);

        let p1 = chart
            .nodes()
            .iter()
            .find(|n| n.key == "P1")
            .map(|n| n.id)
            .unwrap();
        let outcome = chart.click(p1).unwrap();

        // P2's children intersect P1's (both contain C), so it folds too.
        assert_eq!(outcome.toggled.len(), 2);
        assert!(chart.nodes().iter().all(|n| n.key != "C"));

        chart.click(p1).unwrap();
        assert_eq!(chart.nodes().iter().filter(|n| n.key == "C").count(), 2);
    }

    #[test]
    fn folded_fan_in_parents_keep_their_fold_affordance() {
        let lineage = Lineage {
            upstream_entities: Vec::new(),
            downstream_entities: vec![
                item("root", None, 0),
                item("P1", Some("root"), 1),
                item("P2", Some("root"), 1),
                item("C", Some("P1"), 2),
                item("C", Some("P2"), 2),
            ],
        };
        let mut chart = chart(&lineage);
        let find = |chart: &LineageChart, key: &str| {
            chart
                .nodes()
                .iter()
                .find(|n| n.key == key)
                .map(|n| n.id)
                .unwrap()
        };
        let p1 = find(&chart, "P1");
        let p2 = find(&chart, "P2");

        chart.click(p1).unwrap();

        // P2 only ever adopted C through the fan-in edge, but after the
        // synced fold it must still advertise the hidden subtree.
        let p2_node = chart.nodes().iter().find(|n| n.key == "P2").unwrap();
        assert!(p2_node.has_hidden_children);
        assert_eq!(p2_node.indicator(), Some("+"));

        // Unfolding from the duplicate copy restores the whole pair.
        let outcome = chart.click(p2).unwrap();
        assert_eq!(outcome.toggled.len(), 2);
        assert_eq!(chart.nodes().iter().filter(|n| n.key == "C").count(), 2);
    }

    #[test]
    fn debug_output_summarizes_the_scene() {
        let chart = chart(&both_halves());
        let repr = format!("{chart:?}");
        assert!(repr.starts_with("LineageChart"));
        assert!(repr.contains("halves: 2"));
    }

    #[test]
    fn empty_lineage_renders_labels_only() {
        let chart = chart(&Lineage::default());
        assert!(!chart.has_lineage_data());
        assert!(chart.nodes().is_empty());
        let svg = chart.svg();
        assert!(svg.contains("Upstream"));
        assert!(svg.contains("Downstream"));
        assert!(!svg.contains(r#"class="lineage-node""#));
    }

    #[test]
    fn unknown_click_target_is_an_error() {
        let mut chart = chart(&both_halves());
        let bogus = NodeId::derive(Direction::Downstream, "nope");
        assert!(chart.click(bogus).is_err());
    }

    #[test]
    fn destroy_exits_every_element() {
        let chart = chart(&both_halves());
        let live = chart.nodes().len();
        let frame = chart.destroy();
        assert_eq!(frame.nodes.len(), live);
        assert!(frame.nodes.iter().all(|p| p.phase == Phase::Exit));
    }

    #[test]
    fn root_stays_pinned_to_the_anchor_across_folds() {
        let lineage = both_halves();
        let mut chart = chart(&lineage);
        let start = Point::new(dims().height / 2.0, 0.0);
        for root_patch in chart.frame().nodes.iter().filter(|p| p.node.is_root) {
            assert_eq!(root_patch.to, start);
        }

        let roots = chart.root_ids();
        let outcome = chart.click(roots[0]).unwrap();
        for frame in &outcome.frames {
            for root_patch in frame.nodes.iter().filter(|p| p.node.is_root) {
                assert_eq!(root_patch.to, start);
            }
        }
    }
}
