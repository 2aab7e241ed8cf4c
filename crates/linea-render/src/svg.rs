//! SVG document writer for rendered frames.
//!
//! The tidy layout computes breadth (`x`) vertically and depth (`y`)
//! horizontally-after-mirroring, so every element is placed at screen
//! coordinates `(y, x)` inside a group translated to the horizontal center
//! of the chart. Transitions are encoded as SMIL `animate` children, which
//! makes the emitted document a self-contained animated frame.

use crate::path::{Point, degenerate_path, fmt, generate_path};
use crate::scene::{EdgePatch, Frame, NodePatch, Phase};
use linea_core::{Dimensions, Direction, Labels};
use std::fmt::Write as _;

#[derive(Debug, Clone)]
pub struct SvgRenderOptions {
    pub node_radius: f64,
    pub font_size: f64,
    /// Emit SMIL transitions. When false the document shows only the final
    /// state of the frame and exited elements are omitted entirely.
    pub animate: bool,
    /// Grow circles mildly with the entity's usage count.
    pub scale_radius_by_usage: bool,
}

impl Default for SvgRenderOptions {
    fn default() -> Self {
        Self {
            node_radius: 12.0,
            font_size: 11.0,
            animate: true,
            scale_radius_by_usage: false,
        }
    }
}

impl SvgRenderOptions {
    fn radius_for(&self, usage: Option<u64>) -> f64 {
        match usage {
            Some(usage) if self.scale_radius_by_usage => {
                let boost = ((usage + 1) as f64).log10() / 10.0;
                self.node_radius * (1.0 + boost).min(2.0)
            }
            _ => self.node_radius,
        }
    }
}

/// Writes one frame as a complete SVG document.
pub fn render_frame_svg(
    frame: &Frame,
    dimensions: Dimensions,
    labels: &Labels,
    options: &SvgRenderOptions,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        &mut out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="lineage-chart" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = fmt(dimensions.width),
        h = fmt(dimensions.height),
    );
    out.push_str(
        r#"<style>
.direction-label { fill: #4b5563; font-family: ui-sans-serif, system-ui, sans-serif; font-size: 13px; text-anchor: middle; }
.lineage-edge { fill: none; stroke: #9ca3af; stroke-width: 1.5; }
.lineage-node circle { fill: #fff; stroke: #2563eb; stroke-width: 1.5; cursor: pointer; }
.lineage-node .node-label { fill: #1f2937; font-family: ui-sans-serif, system-ui, sans-serif; dominant-baseline: middle; }
.lineage-node .fold-indicator { fill: #2563eb; font-family: ui-sans-serif, system-ui, sans-serif; text-anchor: middle; }
</style>
"#,
    );

    render_direction_labels(&mut out, dimensions, labels);

    let _ = writeln!(
        &mut out,
        r#"<g class="lineage-graph" transform="translate({} 0)">"#,
        fmt(dimensions.width / 2.0)
    );

    out.push_str(r#"<g class="edges">"#);
    out.push('\n');
    for edge in &frame.edges {
        render_edge(&mut out, edge, frame.duration_ms, options);
    }
    out.push_str("</g>\n");

    out.push_str(r#"<g class="nodes">"#);
    out.push('\n');
    for node in &frame.nodes {
        render_node(&mut out, node, frame.duration_ms, options);
    }
    out.push_str("</g>\n");

    out.push_str("</g>\n</svg>\n");
    out
}

fn render_direction_labels(out: &mut String, dimensions: Dimensions, labels: &Labels) {
    let _ = writeln!(
        out,
        r#"<text class="direction-label" x="{}" y="24">{}</text>"#,
        fmt(dimensions.width * 0.25),
        escape_xml(&labels.upstream)
    );
    let _ = writeln!(
        out,
        r#"<text class="direction-label" x="{}" y="24">{}</text>"#,
        fmt(dimensions.width * 0.75),
        escape_xml(&labels.downstream)
    );
}

fn render_edge(out: &mut String, edge: &EdgePatch, duration_ms: u64, options: &SvgRenderOptions) {
    if edge.phase == Phase::Exit && !options.animate {
        return;
    }

    let to_path = match edge.phase {
        Phase::Exit => degenerate_path(edge.to_source),
        _ => generate_path(edge.to_source, edge.to_target),
    };
    let _ = write!(
        out,
        r#"<path class="lineage-edge" id="p-{}" d="{}""#,
        edge.element,
        escape_attr(&to_path)
    );
    if edge.phase == Phase::Exit {
        out.push_str(r#" opacity="0""#);
    }
    if !options.animate {
        out.push_str(" />\n");
        return;
    }
    out.push('>');

    let from_path = match edge.phase {
        Phase::Enter => degenerate_path(edge.from_source),
        _ => generate_path(edge.from_source, edge.from_target),
    };
    animate(out, "d", &from_path, &to_path, duration_ms);
    if edge.phase == Phase::Exit {
        animate(out, "opacity", "1", "0", duration_ms);
    }
    out.push_str("</path>\n");
}

fn render_node(out: &mut String, patch: &NodePatch, duration_ms: u64, options: &SvgRenderOptions) {
    if patch.phase == Phase::Exit && !options.animate {
        return;
    }

    let node = &patch.node;
    let (to_x, to_y) = screen(patch.to);
    let radius = options.radius_for(node.usage);
    let to_radius = if patch.phase == Phase::Exit { 1e-6 } else { radius };

    let _ = write!(
        out,
        r#"<g class="lineage-node" id="{}" transform="translate({} {})">"#,
        node.element,
        fmt(to_x),
        fmt(to_y)
    );
    out.push('\n');

    if options.animate {
        let (from_x, from_y) = screen(patch.from);
        let _ = write!(
            out,
            r#"<animateTransform attributeName="transform" type="translate" from="{} {}" to="{} {}" dur="{}ms" fill="freeze"/>"#,
            fmt(from_x),
            fmt(from_y),
            fmt(to_x),
            fmt(to_y),
            duration_ms
        );
        out.push('\n');
    }

    let _ = write!(out, r#"<circle r="{}">"#, fmt(to_radius));
    if options.animate {
        let from_radius = match patch.phase {
            Phase::Enter => 1e-6,
            _ => radius,
        };
        animate(out, "r", &fmt(from_radius), &fmt(to_radius), duration_ms);
        if patch.phase == Phase::Exit {
            animate(out, "opacity", "1", "0", duration_ms);
        }
    }
    out.push_str("</circle>\n");

    // The focal table is the anchor of the whole chart; it carries no name
    // label on the circle.
    if !node.is_root && !node.name.is_empty() {
        let inner = node.has_visible_children || node.has_hidden_children;
        let offset = radius + 1.0;
        let (label_x, label_anchor) = match (node.direction, inner) {
            (Direction::Downstream, true) | (Direction::Upstream, false) => (-offset, "end"),
            _ => (offset, "start"),
        };
        let _ = write!(
            out,
            r#"<text class="node-label" x="{}" dy="4" font-size="{}" text-anchor="{}">{}</text>"#,
            fmt(label_x),
            fmt(options.font_size),
            label_anchor,
            escape_xml(&node.name)
        );
        out.push('\n');
    }

    if let Some(indicator) = node.indicator() {
        let _ = write!(
            out,
            r#"<text class="fold-indicator" dy="4" font-size="{}">{}</text>"#,
            fmt(options.font_size),
            indicator
        );
        out.push('\n');
    }

    out.push_str("</g>\n");
}

fn animate(out: &mut String, attribute: &str, from: &str, to: &str, duration_ms: u64) {
    let _ = write!(
        out,
        r#"<animate attributeName="{}" from="{}" to="{}" dur="{}ms" fill="freeze"/>"#,
        attribute,
        escape_attr(from),
        escape_attr(to),
        duration_ms
    );
    out.push('\n');
}

/// Layout space to screen space: depth runs horizontally, breadth
/// vertically.
fn screen(p: Point) -> (f64, f64) {
    (p.y, p.x)
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attr(text: &str) -> String {
    escape_xml(text)
}
