use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use finlink_core::WorkflowError;

use crate::types::{AggregateWindow, AnchorKind};

/// Minimal view of a previously-persisted run, read back from
/// `aggregate-results.json` and `events.json` for longitudinal comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub path: PathBuf,
    pub generated_at: DateTime<Utc>,
    pub event_ids: Vec<String>,
    pub aggregates: Vec<AggregateWindow>,
}

#[derive(Debug, Deserialize)]
struct AggregateResultsFile {
    generated_at: DateTime<Utc>,
    aggregates: Vec<AggregateWindow>,
}

#[derive(Debug, Deserialize)]
struct EventsFile {
    event_ids: Vec<String>,
}

/// Scans `reports_root/political-backtest/<scope_key>/<YYYY-MM-DD>/` for
/// directories carrying all three run artifacts, excluding the current
/// output root, sorted by `generated_at` ascending.
pub fn discover_historical_runs(reports_root: &Path, scope_key: &str, exclude: Option<&Path>) -> Result<Vec<RunRecord>, WorkflowError> {
    let scope_root = reports_root.join("political-backtest").join(scope_key);
    if !scope_root.is_dir() {
        return Ok(Vec::new());
    }

    let mut runs = Vec::new();
    let entries = fs::read_dir(&scope_root)
        .map_err(|e| WorkflowError::new("HISTORY_SCAN_FAILED", format!("reading {}: {e}", scope_root.display())))?;

    for entry in entries {
        let entry = entry.map_err(|e| WorkflowError::new("HISTORY_SCAN_FAILED", e.to_string()))?;
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        if exclude.is_some_and(|excluded| excluded == dir) {
            continue;
        }

        let assumptions = dir.join("assumptions.json");
        let aggregate_results = dir.join("aggregate-results.json");
        let events = dir.join("events.json");
        if !assumptions.is_file() || !aggregate_results.is_file() || !events.is_file() {
            continue;
        }

        let aggregate_raw = fs::read_to_string(&aggregate_results)
            .map_err(|e| WorkflowError::new("HISTORY_SCAN_FAILED", format!("reading {}: {e}", aggregate_results.display())))?;
        let aggregate_file: AggregateResultsFile = serde_json::from_str(&aggregate_raw)
            .map_err(|e| WorkflowError::new("HISTORY_SCAN_FAILED", format!("parsing {}: {e}", aggregate_results.display())))?;

        let events_raw = fs::read_to_string(&events)
            .map_err(|e| WorkflowError::new("HISTORY_SCAN_FAILED", format!("reading {}: {e}", events.display())))?;
        let events_file: EventsFile = serde_json::from_str(&events_raw)
            .map_err(|e| WorkflowError::new("HISTORY_SCAN_FAILED", format!("parsing {}: {e}", events.display())))?;

        runs.push(RunRecord {
            path: dir,
            generated_at: aggregate_file.generated_at,
            event_ids: events_file.event_ids,
            aggregates: aggregate_file.aggregates,
        });
    }

    runs.sort_by_key(|r| r.generated_at);
    Ok(runs)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSample {
    pub current: usize,
    pub baseline: usize,
    pub new_events: Vec<String>,
    pub removed_events: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateDrift {
    pub anchor_kind: AnchorKind,
    pub window_sessions: u32,
    pub benchmark_symbol: String,
    pub sample_size_delta: i64,
    pub hit_rate_delta: f64,
    pub mean_delta: f64,
    pub median_delta: f64,
    pub mean_excess_delta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConclusionLabel {
    Outperform,
    Underperform,
    Flat,
}

fn label(mean_excess: f64) -> ConclusionLabel {
    if mean_excess.abs() < 1e-9 {
        ConclusionLabel::Flat
    } else if mean_excess > 0.0 {
        ConclusionLabel::Outperform
    } else {
        ConclusionLabel::Underperform
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConclusionChange {
    pub anchor_kind: AnchorKind,
    pub window_sessions: u32,
    pub benchmark_symbol: String,
    pub baseline_label: ConclusionLabel,
    pub current_label: ConclusionLabel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunComparison {
    pub first_run: bool,
    pub event_sample: EventSample,
    pub aggregate_drift: Vec<AggregateDrift>,
    pub conclusion_changes: Vec<ConclusionChange>,
}

fn group_id(window: &AggregateWindow) -> (u8, u32, String) {
    let anchor = match window.anchor_kind {
        AnchorKind::Transaction => 0,
        AnchorKind::Report => 1,
    };
    (anchor, window.window_sessions, window.benchmark_symbol.clone())
}

/// Compares a current run against an optional baseline. With no baseline, returns a `first_run`
/// report with empty drift/conclusion sections.
pub fn compare_runs(current: &RunRecord, baseline: Option<&RunRecord>) -> RunComparison {
    let Some(baseline) = baseline else {
        return RunComparison {
            first_run: true,
            event_sample: EventSample {
                current: current.event_ids.len(),
                baseline: 0,
                new_events: Vec::new(),
                removed_events: Vec::new(),
            },
            aggregate_drift: Vec::new(),
            conclusion_changes: Vec::new(),
        };
    };

    let current_set: BTreeSet<&String> = current.event_ids.iter().collect();
    let baseline_set: BTreeSet<&String> = baseline.event_ids.iter().collect();

    let new_events: Vec<String> = current_set.difference(&baseline_set).map(|s| s.to_string()).collect();
    let removed_events: Vec<String> = baseline_set.difference(&current_set).map(|s| s.to_string()).collect();

    let mut current_by_group = std::collections::BTreeMap::new();
    for window in &current.aggregates {
        current_by_group.insert(group_id(window), window);
    }
    let mut baseline_by_group = std::collections::BTreeMap::new();
    for window in &baseline.aggregates {
        baseline_by_group.insert(group_id(window), window);
    }

    let mut aggregate_drift = Vec::new();
    let mut conclusion_changes = Vec::new();

    for (key, cur) in &current_by_group {
        if let Some(base) = baseline_by_group.get(key) {
            aggregate_drift.push(AggregateDrift {
                anchor_kind: cur.anchor_kind,
                window_sessions: cur.window_sessions,
                benchmark_symbol: cur.benchmark_symbol.clone(),
                sample_size_delta: cur.sample_size as i64 - base.sample_size as i64,
                hit_rate_delta: cur.hit_rate_percent - base.hit_rate_percent,
                mean_delta: cur.mean_return_percent - base.mean_return_percent,
                median_delta: cur.median_return_percent - base.median_return_percent,
                mean_excess_delta: cur.mean_excess_return_percent - base.mean_excess_return_percent,
            });

            let base_label = label(base.mean_excess_return_percent);
            let cur_label = label(cur.mean_excess_return_percent);
            if base_label != cur_label {
                conclusion_changes.push(ConclusionChange {
                    anchor_kind: cur.anchor_kind,
                    window_sessions: cur.window_sessions,
                    benchmark_symbol: cur.benchmark_symbol.clone(),
                    baseline_label: base_label,
                    current_label: cur_label,
                });
            }
        }
        let _ = key;
    }

    RunComparison {
        first_run: false,
        event_sample: EventSample {
            current: current.event_ids.len(),
            baseline: baseline.event_ids.len(),
            new_events,
            removed_events,
        },
        aggregate_drift,
        conclusion_changes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(mean_excess: f64) -> AggregateWindow {
        AggregateWindow {
            anchor_kind: AnchorKind::Transaction,
            window_sessions: 1,
            benchmark_symbol: "SPY".to_string(),
            sample_size: 10,
            hit_rate_percent: 50.0,
            mean_return_percent: 1.0,
            median_return_percent: 1.0,
            stdev_return_percent: 0.5,
            mean_excess_return_percent: mean_excess,
            mean_relative_return_percent: mean_excess,
        }
    }

    fn run(event_ids: &[&str], mean_excess: f64) -> RunRecord {
        RunRecord {
            path: PathBuf::from("/tmp/run"),
            generated_at: Utc::now(),
            event_ids: event_ids.iter().map(|s| s.to_string()).collect(),
            aggregates: vec![window(mean_excess)],
        }
    }

    #[test]
    fn identical_runs_produce_empty_drift_and_no_conclusion_changes() {
        let current = run(&["a", "b"], 1.0);
        let baseline = run(&["a", "b"], 1.0);
        let comparison = compare_runs(&current, Some(&baseline));

        assert!(!comparison.first_run);
        assert!(comparison.event_sample.new_events.is_empty());
        assert!(comparison.event_sample.removed_events.is_empty());
        assert_eq!(comparison.aggregate_drift[0].mean_delta, 0.0);
        assert!(comparison.conclusion_changes.is_empty());
    }

    #[test]
    fn no_baseline_is_reported_as_first_run() {
        let current = run(&["a"], 1.0);
        let comparison = compare_runs(&current, None);
        assert!(comparison.first_run);
        assert_eq!(comparison.event_sample.baseline, 0);
    }

    #[test]
    fn sign_flip_in_mean_excess_is_a_conclusion_change() {
        let current = run(&["a"], -2.0);
        let baseline = run(&["a"], 2.0);
        let comparison = compare_runs(&current, Some(&baseline));
        assert_eq!(comparison.conclusion_changes.len(), 1);
        assert_eq!(comparison.conclusion_changes[0].baseline_label, ConclusionLabel::Outperform);
        assert_eq!(comparison.conclusion_changes[0].current_label, ConclusionLabel::Underperform);
    }

    #[test]
    fn new_and_removed_events_are_set_differences() {
        let current = run(&["a", "c"], 1.0);
        let baseline = run(&["a", "b"], 1.0);
        let comparison = compare_runs(&current, Some(&baseline));
        assert_eq!(comparison.event_sample.new_events, vec!["c".to_string()]);
        assert_eq!(comparison.event_sample.removed_events, vec!["b".to_string()]);
    }
}
