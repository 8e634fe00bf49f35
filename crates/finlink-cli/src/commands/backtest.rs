//! `backtest` subcommand: runs the political-trading event study end to end
//! from a locally-supplied scenario file (raw government-trading rows plus
//! the price bars needed to evaluate them) and persists the run under
//! `reports/political-backtest/<scope>/<date>/`.
//!
//! The canonical finance intents (quote/fundamentals/filings/insider/news)
//! have no historical-bars endpoint, so this workflow takes its raw rows and
//! price series as input rather than wiring a live multi-symbol fetch.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use finlink_artifacts::political_backtest_layout as layout;
use finlink_backtest::{
    aggregate, compare_runs, compute_benchmark_relative, compute_event_window_return, discover_historical_runs,
    normalize_events, resolve_anchors, resolve_benchmarks, AnchorMode, BarSeries, BenchmarkMode, BenchmarkRelativeReturn,
    EventWindowReturn, PriceBar, SourceDatasetId, TradingCalendar,
};
use finlink_collab::{AlwaysAllow, SystemClock};
use finlink_core::CancelSignal;

#[derive(Debug, Deserialize)]
struct BacktestScenario {
    ticker: String,
    sector: Option<String>,
    source_dataset_id: SourceDatasetId,
    anchor_mode: AnchorMode,
    benchmark_mode: BenchmarkMode,
    window_sessions: Vec<u32>,
    rows: Vec<Value>,
    price_bars: BTreeMap<String, Vec<PriceBar>>,
}

fn flag_value(args: &[String], name: &str) -> Option<String> {
    args.iter().position(|a| a == name).and_then(|i| args.get(i + 1)).cloned()
}

pub async fn run(args: &[String]) -> anyhow::Result<()> {
    let scenario_path = flag_value(args, "--scenario").ok_or_else(|| anyhow::anyhow!("--scenario PATH is required"))?;
    let reports_root = PathBuf::from(flag_value(args, "--reports-root").unwrap_or_else(|| "reports".to_string()));
    let scope = flag_value(args, "--scope").ok_or_else(|| anyhow::anyhow!("--scope KEY is required"))?;
    let run_date = match flag_value(args, "--run-date") {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")?,
        None => chrono::Utc::now().date_naive(),
    };

    let raw = std::fs::read_to_string(&scenario_path)?;
    let scenario: BacktestScenario = serde_json::from_str(&raw)?;

    let events = normalize_events(scenario.source_dataset_id, &scenario.ticker, &scenario.rows)?;
    let anchors = resolve_anchors(&events, scenario.anchor_mode)?;

    let mut all_bars: Vec<&[PriceBar]> = Vec::new();
    for bars in scenario.price_bars.values() {
        all_bars.push(bars.as_slice());
    }
    let calendar = TradingCalendar::from_bars(all_bars);

    let ticker_bars = scenario
        .price_bars
        .get(&scenario.ticker.to_uppercase())
        .ok_or_else(|| anyhow::anyhow!("no price bars supplied for ticker {}", scenario.ticker))?;
    let ticker_series = BarSeries::from_bars(ticker_bars);

    let benchmark_symbols = resolve_benchmarks(scenario.benchmark_mode, scenario.sector.as_deref())?;
    let benchmark_series: BTreeMap<&str, BarSeries> = benchmark_symbols
        .iter()
        .map(|symbol| {
            let bars = scenario
                .price_bars
                .get(symbol)
                .ok_or_else(|| anyhow::anyhow!("no price bars supplied for benchmark {symbol}"))?;
            Ok::<_, anyhow::Error>((symbol.as_str(), BarSeries::from_bars(bars)))
        })
        .collect::<Result<_, _>>()?;

    let mut event_window_returns: Vec<EventWindowReturn> = Vec::new();
    let mut benchmark_relative_returns: Vec<BenchmarkRelativeReturn> = Vec::new();

    for anchor in &anchors {
        let (aligned, _shifted) = calendar.align_to_next_session(anchor.anchor_date)?;

        for &window in &scenario.window_sessions {
            let window_return = compute_event_window_return(
                &anchor.event_id,
                &anchor.ticker,
                anchor.anchor_kind,
                anchor.anchor_date,
                aligned,
                window,
                &ticker_series,
                &calendar,
            )?;

            for symbol in &benchmark_symbols {
                let series = &benchmark_series[symbol.as_str()];
                let relative = compute_benchmark_relative(&window_return, symbol, series, &calendar)?;
                benchmark_relative_returns.push(relative);
            }

            event_window_returns.push(window_return);
        }
    }

    let aggregates = aggregate(&benchmark_relative_returns);
    let event_ids: Vec<String> = events.iter().map(|e| e.event_id.clone()).collect();
    let output_root = layout::run_output_root(&reports_root, &scope, run_date);
    let generated_at = chrono::Utc::now();

    let historical = discover_historical_runs(&reports_root, &scope, Some(&output_root))?;
    let baseline = historical.last().cloned();
    let current_record = finlink_backtest::RunRecord {
        path: output_root.clone(),
        generated_at,
        event_ids: event_ids.clone(),
        aggregates: aggregates.clone(),
    };
    let comparison = compare_runs(&current_record, baseline.as_ref());

    let mut files = BTreeMap::new();
    files.insert(layout::ASSUMPTIONS_JSON.to_string(), serde_json::to_string_pretty(&scenario_assumptions(&scenario))?);
    files.insert(layout::EVENTS_JSON.to_string(), serde_json::to_string_pretty(&serde_json::json!({ "event_ids": event_ids }))?);
    files.insert(layout::EVENT_WINDOW_RETURNS_JSON.to_string(), serde_json::to_string_pretty(&event_window_returns)?);
    files.insert(layout::BENCHMARK_RELATIVE_RETURNS_JSON.to_string(), serde_json::to_string_pretty(&benchmark_relative_returns)?);
    files.insert(
        layout::AGGREGATE_RESULTS_JSON.to_string(),
        serde_json::to_string_pretty(&serde_json::json!({ "generated_at": generated_at, "aggregates": aggregates }))?,
    );
    files.insert(layout::COMPARISON_JSON.to_string(), serde_json::to_string_pretty(&comparison)?);
    files.insert(layout::REPORT_MD.to_string(), render_report_md(&scope, run_date, &aggregates));
    files.insert(layout::DASHBOARD_MD.to_string(), render_dashboard_md(&scope, &aggregates, &comparison));

    finlink_artifacts::write_artifacts(&output_root, &files, &AlwaysAllow, &SystemClock, &CancelSignal::never()).await?;

    println!("wrote {} to {}", files.len(), output_root.display());
    println!("{}", serde_json::to_string_pretty(&comparison)?);
    Ok(())
}

fn scenario_assumptions(scenario: &BacktestScenario) -> Value {
    serde_json::json!({
        "ticker": scenario.ticker,
        "sector": scenario.sector,
        "source_dataset_id": scenario.source_dataset_id,
        "anchor_mode": scenario.anchor_mode,
        "benchmark_mode": scenario.benchmark_mode,
        "window_sessions": scenario.window_sessions,
    })
}

fn render_report_md(scope: &str, run_date: NaiveDate, aggregates: &[finlink_backtest::AggregateWindow]) -> String {
    let mut out = format!("# Political backtest: {scope}\n\nRun date: {run_date}\n\n");
    out.push_str("| anchor | window | benchmark | n | hit rate % | mean % | mean excess % |\n");
    out.push_str("|---|---|---|---|---|---|---|\n");
    for window in aggregates {
        out.push_str(&format!(
            "| {:?} | {} | {} | {} | {:.2} | {:.2} | {:.2} |\n",
            window.anchor_kind,
            window.window_sessions,
            window.benchmark_symbol,
            window.sample_size,
            window.hit_rate_percent,
            window.mean_return_percent,
            window.mean_excess_return_percent
        ));
    }
    out
}

fn render_dashboard_md(scope: &str, aggregates: &[finlink_backtest::AggregateWindow], comparison: &finlink_backtest::RunComparison) -> String {
    let mut out = format!("# Dashboard: {scope}\n\n");
    if comparison.first_run {
        out.push_str("First recorded run for this scope.\n");
    } else {
        out.push_str(&format!(
            "{} new events, {} events no longer present versus the prior run.\n",
            comparison.event_sample.new_events.len(),
            comparison.event_sample.removed_events.len()
        ));
        for change in &comparison.conclusion_changes {
            out.push_str(&format!(
                "- conclusion flipped for window {} / {:?}: {:?} -> {:?}\n",
                change.window_sessions, change.anchor_kind, change.baseline_label, change.current_label
            ));
        }
    }
    out.push_str(&format!("\n{} aggregate windows computed.\n", aggregates.len()));
    out
}
