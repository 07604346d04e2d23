//! # dmerge-analysis
//!
//! Display-only figures derived from decoded proposal values: the merger
//! scores in the detail view and the dashboard aggregates.
//!
//! All inputs follow the same fallback rule: a value revealed in the open
//! detail view wins, otherwise the record's token is decoded directly,
//! otherwise 0.

use dmerge_crypto::codec;
use dmerge_reveal::DecodedCache;
use dmerge_types::{DashboardSummary, MergerAnalysis, ProposalRecord, RevealField};
use serde::Serialize;

/// Score a merger from its treasury and member activity.
pub fn analyze(treasury: f64, activity: f64) -> MergerAnalysis {
    MergerAnalysis {
        synergy_score: round_half_up(((treasury * 0.4 + activity * 0.6) * 10.0).min(100.0)),
        valuation_diff: round_half_up(treasury * 0.7),
        compatibility: round_half_up(activity * 10.0),
    }
}

/// Score one record, preferring values revealed in `cache`.
pub fn analyze_record(record: &ProposalRecord, cache: Option<&DecodedCache>) -> MergerAnalysis {
    analyze(
        field_value(record, RevealField::Treasury, cache),
        field_value(record, RevealField::Activity, cache),
    )
}

/// Decoded-or-fallback value of one field.
pub fn field_value(record: &ProposalRecord, field: RevealField, cache: Option<&DecodedCache>) -> f64 {
    cache
        .and_then(|c| c.get(field))
        .unwrap_or_else(|| codec::decode_or(record.encoded(field), 0.0))
}

/// Dashboard aggregates. `open` carries the id and cache of the record in
/// the detail view, if any; its revealed values replace the decoded ones
/// for that record only.
pub fn summarize(records: &[ProposalRecord], open: Option<(u64, &DecodedCache)>) -> DashboardSummary {
    let cache_for = |record: &ProposalRecord| match open {
        Some((id, cache)) if id == record.id => Some(cache),
        _ => None,
    };

    let total_treasury: f64 = records
        .iter()
        .map(|r| field_value(r, RevealField::Treasury, cache_for(r)))
        .sum();
    let average_activity = if records.is_empty() {
        0.0
    } else {
        records
            .iter()
            .map(|r| field_value(r, RevealField::Activity, cache_for(r)))
            .sum::<f64>()
            / records.len() as f64
    };

    DashboardSummary {
        total_proposals: records.len(),
        total_treasury,
        average_activity,
    }
}

/// Percent widths for the analysis bars.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarWidths {
    pub synergy: u8,
    pub valuation: u8,
    pub compatibility: u8,
}

impl From<MergerAnalysis> for BarWidths {
    fn from(a: MergerAnalysis) -> Self {
        Self {
            synergy: bar_width(a.synergy_score),
            valuation: bar_width(a.valuation_diff),
            compatibility: bar_width(a.compatibility),
        }
    }
}

/// Clamp a score to a bar width in `[0, 100]`.
pub fn bar_width(score: i64) -> u8 {
    // Clamped above, so the cast cannot truncate.
    score.clamp(0, 100) as u8
}

// Halves round toward positive infinity, so -2.5 becomes -2.
fn round_half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}
