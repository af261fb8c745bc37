//! Folding raw records into per-group statistics.
//!
//! Every date snapshot contributes independently: a unit seen on three dates
//! counts three times. Totals are cumulative across observed snapshots, not a
//! latest-only view.

use indexmap::IndexMap;

use crate::types::record::{GroupDataset, UnitRecord};
use crate::types::stats::{GroupStats, Overview, RankedUnit, TimeSeriesPoint, UnitSummary};

/// Statistics for every group, keyed by group name in dataset order.
///
/// A later group with a name already seen replaces the earlier entry.
pub fn analyze(datasets: &[GroupDataset]) -> IndexMap<String, GroupStats> {
    datasets
        .iter()
        .map(|dataset| (dataset.name.clone(), group_stats(dataset)))
        .collect()
}

/// Totals, averages and the hit ranking for one group.
pub fn group_stats(dataset: &GroupDataset) -> GroupStats {
    let mut stats = GroupStats {
        unit_count: 0,
        total_hits: 0,
        total_first_hits: 0,
        total_spins: 0,
        max_balls: 0,
        avg_hit_rate: 0.0,
        avg_first_hit_rate: 0.0,
        units: Vec::new(),
    };

    for record in dataset.records() {
        stats.unit_count += 1;
        stats.total_hits = stats.total_hits.saturating_add(record.total_hits);
        stats.total_first_hits = stats.total_first_hits.saturating_add(record.first_hits);
        stats.total_spins = stats.total_spins.saturating_add(record.spins);
        stats.max_balls = stats.max_balls.max(record.max_balls);
        stats.units.push(summarize(record));
    }

    stats.avg_hit_rate = percent(stats.total_hits, stats.total_spins);
    stats.avg_first_hit_rate = percent(stats.total_first_hits, stats.total_spins);

    // Stable: equal hit counts keep encounter order
    stats.units.sort_by(|a, b| b.total_hits.cmp(&a.total_hits));
    stats
}

fn summarize(record: &UnitRecord) -> UnitSummary {
    UnitSummary {
        unit_id: record.unit_id.clone(),
        spins: record.spins,
        total_hits: record.total_hits,
        first_hits: record.first_hits,
        hit_rate: record.hit_rate.clone(),
        first_hit_rate: record.first_hit_rate.clone(),
        max_balls: record.max_balls,
    }
}

/// `100 * part / whole` rounded to two decimals; 0 when `whole` is 0.
pub fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(100.0 * part as f64 / whole as f64)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Headline numbers across all groups.
pub fn overview(stats: &IndexMap<String, GroupStats>) -> Overview {
    let rates: Vec<f64> = stats
        .values()
        .map(|s| s.avg_hit_rate)
        .filter(|rate| *rate > 0.0)
        .collect();
    let avg_hit_rate = if rates.is_empty() {
        0.0
    } else {
        round2(rates.iter().sum::<f64>() / rates.len() as f64)
    };

    Overview {
        group_count: stats.len(),
        unit_count: stats.values().map(|s| s.unit_count).sum(),
        total_hits: stats.values().map(|s| s.total_hits).sum(),
        avg_hit_rate,
    }
}

/// The `limit` best units across every group, by total hits.
pub fn top_units(stats: &IndexMap<String, GroupStats>, limit: usize) -> Vec<RankedUnit> {
    let mut ranked: Vec<RankedUnit> = stats
        .iter()
        .flat_map(|(group, s)| {
            s.units.iter().map(move |unit| RankedUnit {
                group: group.clone(),
                unit: unit.clone(),
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.unit.total_hits.cmp(&a.unit.total_hits));
    ranked.truncate(limit);
    ranked
}

/// One point per date snapshot, in capture order.
///
/// Date labels are compared as captured; no calendar normalisation is done.
pub fn time_series(dataset: &GroupDataset) -> Vec<TimeSeriesPoint> {
    dataset
        .dates
        .iter()
        .map(|entry| {
            let total_hits = entry.data.iter().map(|r| r.total_hits).sum();
            let total_first_hits = entry.data.iter().map(|r| r.first_hits).sum();
            let total_spins = entry.data.iter().map(|r| r.spins).sum();
            TimeSeriesPoint {
                date: entry.date.clone(),
                unit_count: entry.data.len(),
                total_hits,
                total_first_hits,
                total_spins,
                hit_rate: percent(total_hits, total_spins),
            }
        })
        .collect()
}
