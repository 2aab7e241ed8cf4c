use serde::Serialize;

/// 2D position in layout space.
///
/// `x` runs along the breadth axis (vertical on screen), `y` along the
/// depth axis (horizontal on screen; negative for the upstream half).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Cubic Bezier path between a node and its parent.
///
/// The tree grows horizontally while the tidy layout is computed on a
/// vertical axis, so `x` and `y` swap roles in the path data: the depth
/// coordinate drives horizontal placement and the control points sit at
/// the horizontal midpoint between source and destination.
pub fn generate_path(source: Point, dest: Point) -> String {
    let mid = (source.y + dest.y) / 2.0;
    format!(
        "M {} {} C {} {}, {} {}, {} {}",
        fmt(source.y),
        fmt(source.x),
        fmt(mid),
        fmt(source.x),
        fmt(mid),
        fmt(dest.x),
        fmt(dest.y),
        fmt(dest.x)
    )
}

/// A zero-length path: every endpoint and control point at `at`.
pub fn degenerate_path(at: Point) -> String {
    generate_path(at, at)
}

/// Stringifies a coordinate for SVG attributes: round-trippable decimal
/// form without `-0` or tiny float noise from our own calculations.
pub(crate) fn fmt(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }

    let mut v = if v.abs() < 1e-9 { 0.0 } else { v };
    let nearest = v.round();
    if (v - nearest).abs() < 1e-6 {
        v = nearest;
    }
    let s = v.to_string();
    if s == "-0" { "0".to_string() } else { s }
}
