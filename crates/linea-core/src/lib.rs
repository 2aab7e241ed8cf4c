#![forbid(unsafe_code)]

//! Lineage graph semantic model (headless).
//!
//! A table's lineage arrives as two flat lists of entities (upstream and
//! downstream), each a DAG flattened into `(key, parent, level)` rows where
//! the same key may appear once per parent edge. This crate owns the model
//! side of the pipeline:
//!
//! - [`compact`]: dedupe the flat list into one entry per key, collecting
//!   every parent reference on the side
//! - [`NodeId`]: stable content-derived identity, so re-renders agree on
//!   which node is "the same" without any shared counter
//! - [`FoldState`]: which subtrees are currently folded away
//!
//! Layout and SVG rendering live in `linea-render`.

pub mod compact;
pub mod fold;
pub mod id;
pub mod model;

pub use compact::{CompactedItem, compact};
pub use fold::FoldState;
pub use id::NodeId;
pub use model::{Dimensions, Direction, Labels, Lineage, LineageItem};

#[cfg(test)]
mod tests;
