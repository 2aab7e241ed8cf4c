use serde::{Deserialize, Serialize};

/// One entity in a lineage payload, as delivered by the catalog backend.
///
/// `key` is unique within a direction; the same key may still appear on
/// multiple rows, once per parent edge. `level` is the distance from the
/// focal table (0 = the table itself).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageItem {
    pub key: String,
    #[serde(default)]
    pub parent: Option<String>,
    pub level: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub badges: Vec<String>,
    #[serde(default)]
    pub usage: Option<u64>,
}

/// Upstream and downstream halves of a table's lineage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lineage {
    #[serde(default)]
    pub upstream_entities: Vec<LineageItem>,
    #[serde(default)]
    pub downstream_entities: Vec<LineageItem>,
}

impl Lineage {
    /// True when at least one half has entities. When false the chart
    /// renders only the direction labels and skips graph construction.
    pub fn has_lineage_data(&self) -> bool {
        !self.upstream_entities.is_empty() || !self.downstream_entities.is_empty()
    }
}

/// Which half of the lineage a node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Upstream,
    Downstream,
}

impl Direction {
    /// Sign applied to the depth axis. Upstream renders mirrored to the
    /// left of the root, downstream to the right.
    pub fn axis_sign(self) -> f64 {
        match self {
            Direction::Upstream => -1.0,
            Direction::Downstream => 1.0,
        }
    }
}

/// Pixel size of the drawing surface supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

/// Direction captions rendered above each half of the chart.
///
/// Rendered even when there is no lineage data at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Labels {
    pub upstream: String,
    pub downstream: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            upstream: "Upstream".to_string(),
            downstream: "Downstream".to_string(),
        }
    }
}
