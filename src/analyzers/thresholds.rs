use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Policy knobs for fleet reporting.
///
/// Any field left out of a config file keeps its default:
/// ```json
/// { "slaGraceMinutes": 10, "topOffenders": 5 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Thresholds {
    /// A completed stop with a running delay at or under this is on time.
    pub sla_grace_minutes: i64,
    /// Cap for the most-delayed route and driver lists.
    pub top_offenders: usize,
    /// Cap for the customer performance list.
    pub top_customers: usize,
    /// Cap for the critical stops list.
    pub top_critical_stops: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            sla_grace_minutes: 15,
            top_offenders: 10,
            top_customers: 20,
            top_critical_stops: 15,
        }
    }
}

impl Thresholds {
    /// Loads thresholds from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
