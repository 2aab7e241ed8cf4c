//! Retained scene with keyed enter/update/exit diffing.
//!
//! Each render pass binds the current render copies against the previous
//! frame by element identity and emits a [`Frame`] of patches. Entering
//! elements start at the anchor's previous position, updating elements
//! interpolate from their last position, exiting elements collapse toward
//! the anchor's current position. The previous positions are snapshotted
//! before the pass replaces them, which is what keeps fold/unfold and
//! re-centering animating instead of snapping.

use crate::path::Point;
use linea_core::{Direction, NodeId};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::fmt;

/// The unit actually bound to SVG elements. A multi-parent node yields one
/// of these per visible parent edge; copies share the logical [`NodeId`]
/// (so fold toggles stay in sync) but not the element identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderNode {
    pub id: NodeId,
    pub element: ElementId,
    pub key: String,
    pub name: String,
    pub direction: Direction,
    pub depth: usize,
    pub is_root: bool,
    pub parent: Option<NodeId>,
    /// Position of the parent copy this edge hangs from.
    pub parent_pos: Option<Point>,
    pub x: f64,
    pub y: f64,
    pub has_visible_children: bool,
    pub has_hidden_children: bool,
    pub usage: Option<u64>,
}

impl RenderNode {
    /// Indicator glyph next to the circle: `+` for a folded subtree, `-`
    /// for a visible one, nothing for leaves.
    pub fn indicator(&self) -> Option<&'static str> {
        if self.has_hidden_children {
            Some("+")
        } else if self.has_visible_children {
            Some("-")
        } else {
            None
        }
    }
}

/// Scene-level element identity: the logical node plus a copy ordinal for
/// decompacted duplicates. Copy 0 keeps the plain id so a node keeps its
/// element (and its in-flight animation) when it gains or loses duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ElementId {
    pub node: NodeId,
    pub copy: u32,
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.copy == 0 {
            write!(f, "n{}", self.node)
        } else {
            write!(f, "n{}e{}", self.node, self.copy)
        }
    }
}

/// The fixed reference point of a render pass: the clicked node (or the
/// scene root), at its position before and after the pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Anchor {
    /// Where the anchor was last frame; entering elements start here.
    pub prev: Point,
    /// Where the anchor is now; exiting elements collapse here.
    pub cur: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Enter,
    Update,
    Exit,
}

/// One circle+label element in the frame diff.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodePatch {
    pub element: ElementId,
    pub phase: Phase,
    pub from: Point,
    pub to: Point,
    pub node: RenderNode,
}

/// One parent-edge path element in the frame diff.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgePatch {
    pub element: ElementId,
    pub phase: Phase,
    pub from_source: Point,
    pub from_target: Point,
    pub to_source: Point,
    pub to_target: Point,
}

/// Everything one render pass changes, in a host-inspectable form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub anchor: Anchor,
    pub duration_ms: u64,
    pub nodes: Vec<NodePatch>,
    pub edges: Vec<EdgePatch>,
}

impl Frame {
    pub fn empty(anchor: Anchor, duration_ms: u64) -> Self {
        Self {
            anchor,
            duration_ms,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct Retained {
    pos: Point,
    node: RenderNode,
}

/// Retained element state across render passes.
#[derive(Debug, Default)]
pub struct Scene {
    retained: FxHashMap<ElementId, Retained>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last rendered position of an element, if it is currently in the
    /// scene.
    pub fn position(&self, element: ElementId) -> Option<Point> {
        self.retained.get(&element).map(|r| r.pos)
    }

    pub fn len(&self) -> usize {
        self.retained.len()
    }

    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }

    /// Diffs `nodes` against the previous frame and replaces the retained
    /// state with them.
    pub fn render(&mut self, nodes: &[RenderNode], anchor: Anchor, duration_ms: u64) -> Frame {
        let mut frame = Frame::empty(anchor, duration_ms);
        let mut seen: FxHashSet<ElementId> = FxHashSet::default();

        for node in nodes {
            seen.insert(node.element);
            let to = Point::new(node.x, node.y);

            match self.retained.get(&node.element) {
                Some(prev) => {
                    frame.nodes.push(NodePatch {
                        element: node.element,
                        phase: Phase::Update,
                        from: prev.pos,
                        to,
                        node: node.clone(),
                    });
                    if let Some(parent_pos) = node.parent_pos {
                        frame.edges.push(EdgePatch {
                            element: node.element,
                            phase: Phase::Update,
                            from_source: prev.node.parent_pos.unwrap_or(anchor.prev),
                            from_target: prev.pos,
                            to_source: parent_pos,
                            to_target: to,
                        });
                    }
                }
                None => {
                    frame.nodes.push(NodePatch {
                        element: node.element,
                        phase: Phase::Enter,
                        from: anchor.prev,
                        to,
                        node: node.clone(),
                    });
                    if let Some(parent_pos) = node.parent_pos {
                        frame.edges.push(EdgePatch {
                            element: node.element,
                            phase: Phase::Enter,
                            from_source: anchor.prev,
                            from_target: anchor.prev,
                            to_source: parent_pos,
                            to_target: to,
                        });
                    }
                }
            }
        }

        let mut exited: Vec<(ElementId, Retained)> = self
            .retained
            .iter()
            .filter(|(element, _)| !seen.contains(element))
            .map(|(element, r)| (*element, r.clone()))
            .collect();
        exited.sort_by_key(|(element, _)| *element);

        for (element, r) in exited {
            frame.nodes.push(NodePatch {
                element,
                phase: Phase::Exit,
                from: r.pos,
                to: anchor.cur,
                node: r.node.clone(),
            });
            if let Some(parent_pos) = r.node.parent_pos {
                frame.edges.push(EdgePatch {
                    element,
                    phase: Phase::Exit,
                    from_source: parent_pos,
                    from_target: r.pos,
                    to_source: anchor.cur,
                    to_target: anchor.cur,
                });
            }
        }

        self.retained = nodes
            .iter()
            .map(|node| {
                (
                    node.element,
                    Retained {
                        pos: Point::new(node.x, node.y),
                        node: node.clone(),
                    },
                )
            })
            .collect();

        frame
    }

    /// Removes everything, collapsing all elements toward `anchor`.
    pub fn clear(&mut self, anchor: Anchor, duration_ms: u64) -> Frame {
        self.render(&[], anchor, duration_ms)
    }
}
