use std::path::PathBuf;

use chrono::NaiveDate;

/// Resolves the output root for one political-backtest run:
/// `reports/political-backtest/<scope>/<YYYY-MM-DD>/`.
pub fn run_output_root(reports_root: &std::path::Path, scope_key: &str, run_date: NaiveDate) -> PathBuf {
    reports_root.join("political-backtest").join(scope_key).join(run_date.format("%Y-%m-%d").to_string())
}

/// Filenames written into a political-backtest run directory.
/// Human-readable reports come first, then the machine-readable artifacts
/// `discoverHistoricalRuns`/`compareRuns` read back on the next run.
pub const REPORT_MD: &str = "report.md";
pub const DASHBOARD_MD: &str = "dashboard.md";
pub const ASSUMPTIONS_JSON: &str = "assumptions.json";
pub const EVENTS_JSON: &str = "events.json";
pub const EVENT_WINDOW_RETURNS_JSON: &str = "event-window-returns.json";
pub const BENCHMARK_RELATIVE_RETURNS_JSON: &str = "benchmark-relative-returns.json";
pub const AGGREGATE_RESULTS_JSON: &str = "aggregate-results.json";
pub const COMPARISON_JSON: &str = "comparison.json";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_output_root_matches_spec_layout() {
        let root = run_output_root(std::path::Path::new("reports"), "aapl", NaiveDate::from_ymd_opt(2025, 1, 4).unwrap());
        assert_eq!(root, PathBuf::from("reports/political-backtest/aapl/2025-01-04"));
    }
}
