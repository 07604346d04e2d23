//! Display scores derived from decoded proposal values.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Merger scoring shown in the detail view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct MergerAnalysis {
    /// Capped at 100.
    #[ts(type = "number")]
    pub synergy_score: i64,
    #[ts(type = "number")]
    pub valuation_diff: i64,
    #[ts(type = "number")]
    pub compatibility: i64,
}

/// Dashboard aggregates over the whole collection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    #[ts(type = "number")]
    pub total_proposals: usize,
    pub total_treasury: f64,
    pub average_activity: f64,
}
