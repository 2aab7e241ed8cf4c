#![forbid(unsafe_code)]

//! `linea` is a headless lineage-chart engine.
//!
//! A data catalog's lineage payload — upstream and downstream entity
//! lists, each a multi-parent DAG flattened into rows — goes in; an
//! interactive, animated, foldable tree diagram comes out as SVG plus an
//! inspectable frame diff.
//!
//! # Features
//!
//! - `render`: enable layout + SVG rendering (`linea::render`)

pub use linea_core::*;

#[cfg(feature = "render")]
pub mod render {
    pub use linea_render::{
        Anchor, ChartOptions, ClickOutcome, EdgePatch, ElementId, Error, Frame, LineageChart,
        NodeClickCallback, NodePatch, Phase, Point, RenderNode, Result, Scene, SvgRenderOptions,
        generate_path, render_frame_svg,
    };

    use linea_core::{Dimensions, Labels, Lineage};

    /// One-shot helper: compact, layout and render a lineage payload into
    /// an animated SVG document. Hosts that need clicks keep the
    /// [`LineageChart`] handle instead.
    pub fn render_lineage_svg(
        lineage: &Lineage,
        dimensions: Dimensions,
        labels: Labels,
        options: ChartOptions,
    ) -> Result<String> {
        Ok(LineageChart::create(lineage, dimensions, labels, options)?.svg())
    }

    /// Converts an arbitrary string into a conservative SVG `id` token
    /// suitable for embedding multiple lineage charts in the same UI tree.
    ///
    /// Element ids inside the emitted SVG are prefixed per chart, so two
    /// inlined charts with the same id would collide. This helper:
    /// - trims whitespace
    /// - replaces unsupported characters with `-`
    /// - ensures the id starts with an ASCII letter by prefixing `l-`
    ///   when needed
    pub fn sanitize_svg_id(raw: &str) -> String {
        let raw = raw.trim();
        if raw.is_empty() {
            return "l-untitled".to_string();
        }

        let mut out = String::with_capacity(raw.len() + 4);
        for ch in raw.chars() {
            let ok = ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == ':' || ch == '.';
            out.push(if ok { ch } else { '-' });
        }

        let starts_ok = out.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
        if !starts_ok {
            out.insert_str(0, "l-");
        }

        while out.contains("--") {
            out = out.replace("--", "-");
        }
        let out = out.trim_matches('-');
        if out.is_empty() || out == "l" {
            return "l-untitled".to_string();
        }
        out.to_string()
    }
}
