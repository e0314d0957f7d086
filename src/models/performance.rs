//! Search-performance rows, keyed by (URL, period).

use serde::{Deserialize, Serialize};

/// Per-query search metrics for one URL in one reporting period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRow {
    pub url: String,
    pub periodo: String,
    pub query: String,
    pub clicks: i64,
    pub impressions: i64,
    pub ctr: f64,
    pub position: f64,
}

/// Period-over-period traffic deltas for one URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeltaRow {
    pub url: String,
    pub periodo: String,
    pub clicks: i64,
    pub clicks_prev: i64,
    pub impressions: i64,
    pub impressions_prev: i64,
    pub clicks_delta_pct: f64,
    pub position: f64,
    pub position_prev: f64,
    pub position_delta: f64,
}
