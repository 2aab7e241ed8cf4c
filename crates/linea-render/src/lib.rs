#![forbid(unsafe_code)]

//! Headless layout + SVG renderer for lineage charts.
//!
//! The pipeline runs leaves-first over a compacted lineage direction:
//!
//! 1. [`hierarchy::Hierarchy::stratify`] builds a strict single-parent
//!    arena from the compacted list (`parents[0]` is the tree parent)
//! 2. [`layout::tidy_layout`] computes a tidy-tree position per visible
//!    node, masking folded subtrees
//! 3. [`decompact::decompact`] fans multi-parent nodes back out into one
//!    render copy per visible parent edge
//! 4. [`scene::Scene`] diffs the copies against the previous frame into
//!    enter/update/exit patches, and [`svg`] writes the patches as an SVG
//!    document with SMIL transitions
//!
//! [`chart::LineageChart`] owns the whole loop plus the fold/unfold click
//! state machine.

pub mod chart;
pub mod decompact;
pub mod hierarchy;
pub mod layout;
pub mod path;
pub mod scene;
pub mod svg;

pub use chart::{ChartOptions, ClickOutcome, LineageChart, NodeClickCallback};
pub use decompact::decompact;
pub use hierarchy::Hierarchy;
pub use layout::{LayoutBounds, PlacedNode, tidy_layout};
pub use path::{Point, generate_path};
pub use scene::{Anchor, EdgePatch, ElementId, Frame, NodePatch, Phase, RenderNode, Scene};
pub use svg::{SvgRenderOptions, render_frame_svg};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown parent for lineage node {key}: {parent}")]
    UnknownParent { key: String, parent: String },
    #[error("lineage contains a cycle through {key}")]
    Cycle { key: String },
    #[error("invalid lineage model: {message}")]
    InvalidModel { message: String },
    #[error("lineage JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
