use crate::model::Direction;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Stable identity for a lineage node.
///
/// Derived from the node's direction and key at compaction time, so the same
/// entity keeps the same id across re-renders regardless of traversal order.
/// The upstream and downstream copies of the focal table get distinct ids;
/// each half of the chart has its own root node.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    pub fn derive(direction: Direction, key: &str) -> Self {
        let mut h = FxHasher::default();
        direction.hash(&mut h);
        key.hash(&mut h);
        NodeId(h.finish())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
