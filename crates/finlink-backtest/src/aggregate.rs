use std::collections::BTreeMap;

use crate::types::{AggregateWindow, AnchorKind, BenchmarkRelativeReturn};

fn round(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sample standard deviation; requires at least two observations, else 0.
fn sample_stdev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct GroupKey {
    anchor_kind: AnchorOrd,
    window_sessions: u32,
    benchmark_symbol: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum AnchorOrd {
    Transaction,
    Report,
}

impl From<AnchorKind> for AnchorOrd {
    fn from(kind: AnchorKind) -> Self {
        match kind {
            AnchorKind::Transaction => AnchorOrd::Transaction,
            AnchorKind::Report => AnchorOrd::Report,
        }
    }
}

/// Groups relative returns by `(anchor_kind, window_sessions, benchmark_symbol)`
/// and emits one `AggregateWindow` per group, sorted by anchor_kind, then
/// window ascending, then benchmark ascending.
pub fn aggregate(rows: &[BenchmarkRelativeReturn]) -> Vec<AggregateWindow> {
    let mut groups: BTreeMap<GroupKey, Vec<&BenchmarkRelativeReturn>> = BTreeMap::new();

    for row in rows {
        let key = GroupKey {
            anchor_kind: row.window.anchor_kind.into(),
            window_sessions: row.window.window_sessions,
            benchmark_symbol: row.benchmark_symbol.clone(),
        };
        groups.entry(key).or_default().push(row);
    }

    groups
        .into_iter()
        .map(|(key, members)| {
            let forward_returns: Vec<f64> = members.iter().map(|m| m.window.forward_return_percent).collect();
            let excess_returns: Vec<f64> = members.iter().map(|m| m.excess_return_percent).collect();
            let relative_returns: Vec<f64> = members.iter().map(|m| m.relative_return_percent).collect();
            let hits = excess_returns.iter().filter(|&&e| e > 0.0).count();

            AggregateWindow {
                anchor_kind: match key.anchor_kind {
                    AnchorOrd::Transaction => AnchorKind::Transaction,
                    AnchorOrd::Report => AnchorKind::Report,
                },
                window_sessions: key.window_sessions,
                benchmark_symbol: key.benchmark_symbol,
                sample_size: members.len(),
                hit_rate_percent: round(hits as f64 / members.len() as f64 * 100.0, 4),
                mean_return_percent: round(mean(&forward_returns), 6),
                median_return_percent: round(median(&forward_returns), 6),
                stdev_return_percent: round(sample_stdev(&forward_returns), 6),
                mean_excess_return_percent: round(mean(&excess_returns), 6),
                mean_relative_return_percent: round(mean(&relative_returns), 6),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventWindowReturn;
    use chrono::NaiveDate;

    fn row(window_sessions: u32, benchmark: &str, forward: f64, excess: f64) -> BenchmarkRelativeReturn {
        let d = NaiveDate::parse_from_str("2025-01-06", "%Y-%m-%d").unwrap();
        BenchmarkRelativeReturn {
            window: EventWindowReturn {
                event_id: "evt".to_string(),
                ticker: "AAPL".to_string(),
                anchor_kind: AnchorKind::Transaction,
                anchor_date: d,
                aligned_anchor_date: d,
                window_sessions,
                start_close: 100.0,
                end_close: 100.0 * (1.0 + forward / 100.0),
                forward_return_percent: forward,
            },
            benchmark_symbol: benchmark.to_string(),
            excess_return_percent: excess,
            relative_return_percent: forward - excess,
        }
    }

    #[test]
    fn groups_by_anchor_window_and_benchmark() {
        let rows = vec![row(1, "SPY", 2.0, 1.0), row(1, "SPY", 4.0, 3.0), row(5, "SPY", -1.0, -2.0)];
        let aggregates = aggregate(&rows);
        assert_eq!(aggregates.len(), 2);
        assert_eq!(aggregates[0].window_sessions, 1);
        assert_eq!(aggregates[0].sample_size, 2);
        assert!((aggregates[0].mean_return_percent - 3.0).abs() < 1e-9);
        assert!((aggregates[0].hit_rate_percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn single_sample_group_has_zero_stdev() {
        let rows = vec![row(1, "SPY", 2.0, 1.0)];
        let aggregates = aggregate(&rows);
        assert_eq!(aggregates[0].stdev_return_percent, 0.0);
    }

    #[test]
    fn sorted_by_window_then_benchmark() {
        let rows = vec![row(5, "XLK", 1.0, 1.0), row(1, "XLK", 1.0, 1.0), row(1, "SPY", 1.0, 1.0)];
        let aggregates = aggregate(&rows);
        let keys: Vec<(u32, &str)> = aggregates.iter().map(|a| (a.window_sessions, a.benchmark_symbol.as_str())).collect();
        assert_eq!(keys, vec![(1, "SPY"), (1, "XLK"), (5, "XLK")]);
    }
}
