use crate::id::NodeId;
use crate::model::{Direction, LineageItem};
use indexmap::IndexMap;

/// One lineage node per unique key, with every parent reference from the
/// raw payload collected on the side.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CompactedItem {
    /// Stable content-derived identity (see [`NodeId::derive`]).
    pub id: NodeId,
    pub item: LineageItem,
    /// Ordered multiset of `parent` fields from all raw items sharing this
    /// key, after orphan repair. `parents[0]` is the canonical tree parent
    /// used for stratification.
    pub parents: Vec<Option<String>>,
}

impl CompactedItem {
    pub fn key(&self) -> &str {
        &self.item.key
    }

    /// The parent key stratification hangs this node from.
    pub fn canonical_parent(&self) -> Option<&str> {
        self.parents.first().and_then(|p| p.as_deref())
    }

    /// Every distinct parent edge recorded for this node, in payload order.
    pub fn parent_keys(&self) -> impl Iterator<Item = &str> {
        self.parents.iter().filter_map(|p| p.as_deref())
    }

    /// Whether decompaction must fan this node back out into one render
    /// copy per parent edge.
    pub fn is_multi_parent(&self) -> bool {
        self.parents.len() > 1
    }
}

/// Deduplicates a raw lineage list into one entry per key.
///
/// The first occurrence of a key seeds the entry; later occurrences only
/// append their `parent` to the side list. A level-1 item with no parent is
/// rewired to the level-0 item's key when one exists — some payloads omit
/// the explicit root-to-first-level edge. Without a level-0 item that
/// rewrite silently no-ops and the orphan keeps an empty parent.
///
/// Output order is first-occurrence insertion order.
pub fn compact(direction: Direction, items: &[LineageItem]) -> Vec<CompactedItem> {
    let root_key = items.iter().find(|i| i.level == 0).map(|i| i.key.clone());

    let mut by_key: IndexMap<&str, CompactedItem> = IndexMap::with_capacity(items.len());
    for item in items {
        let parent = match &item.parent {
            Some(p) if !p.is_empty() => Some(p.clone()),
            _ if item.level == 1 => root_key.clone(),
            _ => None,
        };
        match by_key.get_mut(item.key.as_str()) {
            Some(existing) => existing.parents.push(parent),
            None => {
                let mut entry = CompactedItem {
                    id: NodeId::derive(direction, &item.key),
                    item: item.clone(),
                    parents: vec![parent],
                };
                entry.item.parent = entry.parents[0].clone();
                by_key.insert(item.key.as_str(), entry);
            }
        }
    }

    tracing::debug!(
        ?direction,
        raw = items.len(),
        compacted = by_key.len(),
        "compacted lineage direction"
    );
    by_key.into_values().collect()
}
