use crate::{Error, Result};
use linea_core::{CompactedItem, Direction, NodeId};
use rustc_hash::FxHashMap;

/// A stratified single-parent hierarchy for one lineage direction.
///
/// Arena-indexed: `parent` and `children` are slot indices into the arena.
/// The arena is immutable once built; fold state masks subtrees at layout
/// time instead of mutating the tree.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    direction: Direction,
    slots: Vec<Slot>,
    root: usize,
}

#[derive(Debug, Clone)]
pub struct Slot {
    pub data: CompactedItem,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Fan-in children reachable through a non-canonical parent edge. The
    /// node is laid out under its canonical parent, but this co-parent
    /// still owns a fold handle on it.
    pub adopted: Vec<usize>,
    pub depth: usize,
}

impl Slot {
    /// The node has descendants of any kind, canonical or adopted.
    pub fn has_descendants(&self) -> bool {
        !self.children.is_empty() || !self.adopted.is_empty()
    }
}

impl Hierarchy {
    /// Builds the hierarchy from a compacted direction, hanging every node
    /// from its canonical (first-recorded) parent.
    ///
    /// Exactly one node may lack a parent; it becomes the root. A parent
    /// key absent from the list or a parent cycle is an error, surfaced to
    /// the caller rather than repaired (the input contract owns that data
    /// quality problem).
    pub fn stratify(direction: Direction, items: &[CompactedItem]) -> Result<Self> {
        let mut by_key: FxHashMap<&str, usize> = FxHashMap::default();
        for (idx, entry) in items.iter().enumerate() {
            if by_key.insert(entry.key(), idx).is_some() {
                return Err(Error::InvalidModel {
                    message: format!("duplicate key after compaction: {}", entry.key()),
                });
            }
        }

        let mut slots: Vec<Slot> = items
            .iter()
            .map(|entry| Slot {
                data: entry.clone(),
                parent: None,
                children: Vec::new(),
                adopted: Vec::new(),
                depth: 0,
            })
            .collect();

        let mut root: Option<usize> = None;
        for idx in 0..slots.len() {
            match slots[idx].data.canonical_parent().map(str::to_string) {
                None => {
                    if let Some(existing) = root {
                        return Err(Error::InvalidModel {
                            message: format!(
                                "multiple roots: {} and {}",
                                slots[existing].data.key(),
                                slots[idx].data.key()
                            ),
                        });
                    }
                    root = Some(idx);
                }
                Some(parent_key) => {
                    let Some(&parent_idx) = by_key.get(parent_key.as_str()) else {
                        return Err(Error::UnknownParent {
                            key: slots[idx].data.key().to_string(),
                            parent: parent_key,
                        });
                    };
                    slots[idx].parent = Some(parent_idx);
                    slots[parent_idx].children.push(idx);
                }
            }
        }

        // Non-canonical parent edges of fan-in nodes. Unknown co-parent
        // keys are skipped, matching decompaction's match-what-exists rule.
        for idx in 0..slots.len() {
            let co_parents: Vec<usize> = slots[idx]
                .data
                .parent_keys()
                .skip(1)
                .filter_map(|key| by_key.get(key).copied())
                .collect();
            for parent_idx in co_parents {
                if parent_idx != idx && !slots[parent_idx].adopted.contains(&idx) {
                    slots[parent_idx].adopted.push(idx);
                }
            }
        }

        let Some(root) = root else {
            return Err(Error::InvalidModel {
                message: "lineage direction has no root".to_string(),
            });
        };

        // Depth by walking up to the root; a walk longer than the arena
        // means the parent chain loops.
        for idx in 0..slots.len() {
            let mut depth = 0usize;
            let mut cursor = idx;
            while let Some(parent) = slots[cursor].parent {
                depth += 1;
                if depth > slots.len() {
                    return Err(Error::Cycle {
                        key: slots[idx].data.key().to_string(),
                    });
                }
                cursor = parent;
            }
            if cursor != root {
                return Err(Error::Cycle {
                    key: slots[idx].data.key().to_string(),
                });
            }
            slots[idx].depth = depth;
        }

        tracing::trace!(?direction, nodes = slots.len(), "stratified lineage direction");
        Ok(Self {
            direction,
            slots,
            root,
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn root(&self) -> usize {
        self.root
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, idx: usize) -> &Slot {
        &self.slots[idx]
    }

    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    pub fn id_of(&self, idx: usize) -> NodeId {
        self.slots[idx].data.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linea_core::compact;

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

    #[test]
    fn fan_in_co_parents_record_adopted_children() {
        let items = vec![
            item("root", None, 0),
            item("P1", Some("root"), 1),
            item("P2", Some("root"), 1),
            item("C", Some("P1"), 2),
            item("C", Some("P2"), 2),
        ];
        let compacted = compact(Direction::Downstream, &items);
        let h = Hierarchy::stratify(Direction::Downstream, &compacted).unwrap();

        let p1 = h.slots().position(|s| s.data.key() == "P1").unwrap();
        let p2 = h.slots().position(|s| s.data.key() == "P2").unwrap();
        let c = h.slots().position(|s| s.data.key() == "C").unwrap();

        // C is laid out under P1 but P2 keeps a fold handle on it.
        assert_eq!(h.slot(p1).children, vec![c]);
        assert!(h.slot(p1).adopted.is_empty());
        assert!(h.slot(p2).children.is_empty());
        assert_eq!(h.slot(p2).adopted, vec![c]);
        assert!(h.slot(p2).has_descendants());
    }

    #[test]
    fn parent_cycles_are_rejected() {
        let items = vec![
            item("root", None, 0),
            item("A", Some("B"), 1),
            item("B", Some("A"), 2),
        ];
        let compacted = compact(Direction::Downstream, &items);
        let err = Hierarchy::stratify(Direction::Downstream, &compacted).unwrap_err();
        assert!(matches!(err, Error::Cycle { .. }));
    }
}
