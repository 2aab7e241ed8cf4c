use crate::id::NodeId;
use rustc_hash::FxHashSet;

/// Which subtrees are currently folded away.
///
/// The layout arena itself is immutable per pass; collapsing a node only
/// records its id here and the next layout pass masks its descendants.
/// Topology is never mutated by a toggle, so no subtree can be lost.
#[derive(Debug, Clone, Default)]
pub struct FoldState {
    collapsed: FxHashSet<NodeId>,
}

impl FoldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_collapsed(&self, id: NodeId) -> bool {
        self.collapsed.contains(&id)
    }

    pub fn is_expanded(&self, id: NodeId) -> bool {
        !self.is_collapsed(id)
    }

    /// Flips a node between expanded and collapsed. Returns true when the
    /// node ends up collapsed.
    pub fn toggle(&mut self, id: NodeId) -> bool {
        if self.collapsed.insert(id) {
            true
        } else {
            self.collapsed.remove(&id);
            false
        }
    }

    pub fn collapse(&mut self, id: NodeId) {
        self.collapsed.insert(id);
    }

    pub fn expand(&mut self, id: NodeId) {
        self.collapsed.remove(&id);
    }

    pub fn collapsed_count(&self) -> usize {
        self.collapsed.len()
    }
}
