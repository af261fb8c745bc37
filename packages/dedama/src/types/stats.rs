//! Derived statistics produced by the aggregator.

use serde::{Deserialize, Serialize};

/// Summary of one unit row, as carried into a group's ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitSummary {
    pub unit_id: String,
    pub spins: u64,
    pub total_hits: u64,
    pub first_hits: u64,
    pub hit_rate: String,
    pub first_hit_rate: String,
    pub max_balls: u64,
}

/// Totals and averages for one group across every captured snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStats {
    /// Number of rows across all dates (not distinct units)
    pub unit_count: usize,
    pub total_hits: u64,
    pub total_first_hits: u64,
    pub total_spins: u64,
    pub max_balls: u64,

    /// Percent, two decimal places; 0 when no spins were recorded
    pub avg_hit_rate: f64,
    pub avg_first_hit_rate: f64,

    /// Rows ranked by total hits, highest first
    pub units: Vec<UnitSummary>,
}

/// Cross-group headline numbers for a dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub group_count: usize,
    pub unit_count: usize,
    pub total_hits: u64,

    /// Mean of the positive per-group hit rates
    pub avg_hit_rate: f64,
}

/// A unit summary tagged with the group it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedUnit {
    pub group: String,
    #[serde(flatten)]
    pub unit: UnitSummary,
}

/// Totals for a single date snapshot of a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    pub date: String,
    pub unit_count: usize,
    pub total_hits: u64,
    pub total_first_hits: u64,
    pub total_spins: u64,
    pub hit_rate: f64,
}
