use std::collections::BTreeMap;

use chrono::NaiveDate;

use finlink_core::WorkflowError;

use crate::calendar::TradingCalendar;
use crate::types::{AnchorKind, BenchmarkMode, BenchmarkRelativeReturn, EventWindowReturn, PriceBar};

/// Canonical sector → ETF mapping used for `spy_plus_sector_*` benchmark
/// modes.
const SECTOR_ETF_MAP: &[(&str, &str)] = &[
    ("technology", "XLK"),
    ("financial", "XLF"),
    ("health", "XLV"),
    ("energy", "XLE"),
    ("consumer cyclical", "XLY"),
    ("consumer defensive", "XLP"),
    ("industrial", "XLI"),
    ("utilities", "XLU"),
    ("materials", "XLB"),
    ("real estate", "XLRE"),
    ("communication", "XLC"),
];

pub const SPY_SYMBOL: &str = "SPY";

/// Close-price lookup for a single symbol's loaded series.
#[derive(Debug, Clone)]
pub struct BarSeries {
    closes: BTreeMap<NaiveDate, f64>,
}

impl BarSeries {
    pub fn from_bars(bars: &[PriceBar]) -> Self {
        Self {
            closes: bars.iter().map(|b| (b.date, b.adjusted_close)).collect(),
        }
    }

    pub fn close_on(&self, date: NaiveDate) -> Option<f64> {
        self.closes.get(&date).copied()
    }

    pub fn bars(&self) -> impl Iterator<Item = PriceBar> + '_ {
        self.closes.iter().map(|(&date, &adjusted_close)| PriceBar { date, adjusted_close })
    }
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

fn forward_return_percent(start: f64, end: f64) -> f64 {
    round6((end / start - 1.0) * 100.0)
}

/// Resolves the benchmark symbol list for a sector and mode. SPY is always
/// present; the sector ETF is appended when the mode calls for it and a
/// mapping is resolvable.
pub fn resolve_benchmarks(mode: BenchmarkMode, sector: Option<&str>) -> Result<Vec<String>, WorkflowError> {
    let mut benchmarks = vec![SPY_SYMBOL.to_string()];

    let sector_etf = sector.and_then(|s| {
        let lowered = s.to_lowercase();
        SECTOR_ETF_MAP.iter().find(|(key, _)| lowered.contains(key)).map(|(_, etf)| *etf)
    });

    match mode {
        BenchmarkMode::SpyOnly => {}
        BenchmarkMode::SpyPlusSectorIfRelevant => {
            if let Some(etf) = sector_etf {
                benchmarks.push(etf.to_string());
            }
        }
        BenchmarkMode::SpyPlusSectorRequired => match sector_etf {
            Some(etf) => benchmarks.push(etf.to_string()),
            None => {
                return Err(WorkflowError::new(
                    "MISSING_SECTOR_BENCHMARK",
                    format!("no sector ETF mapping resolvable for sector {sector:?}"),
                ))
            }
        },
    }

    Ok(benchmarks)
}

/// Computes the forward return for one aligned anchor and window against a
/// single series. Fails loudly rather than silently skipping a missing bar.
pub fn compute_event_window_return(
    event_id: &str,
    ticker: &str,
    anchor_kind: AnchorKind,
    anchor_date: NaiveDate,
    aligned_anchor_date: NaiveDate,
    window_sessions: u32,
    series: &BarSeries,
    calendar: &TradingCalendar,
) -> Result<EventWindowReturn, WorkflowError> {
    let start_close = series.close_on(aligned_anchor_date).ok_or_else(|| {
        WorkflowError::new(
            "WINDOW_OUT_OF_RANGE",
            format!("no close price for {ticker} on aligned anchor {aligned_anchor_date}"),
        )
    })?;

    let end_date = calendar.offset_sessions(aligned_anchor_date, window_sessions).ok_or_else(|| {
        WorkflowError::new(
            "WINDOW_OUT_OF_RANGE",
            format!("window of {window_sessions} sessions from {aligned_anchor_date} exceeds the loaded calendar"),
        )
    })?;

    let end_close = series.close_on(end_date).ok_or_else(|| {
        WorkflowError::new(
            "WINDOW_OUT_OF_RANGE",
            format!("no close price for {ticker} on window end date {end_date}"),
        )
    })?;

    Ok(EventWindowReturn {
        event_id: event_id.to_string(),
        ticker: ticker.to_string(),
        anchor_kind,
        anchor_date,
        aligned_anchor_date,
        window_sessions,
        start_close,
        end_close,
        forward_return_percent: forward_return_percent(start_close, end_close),
    })
}

/// Computes the benchmark's own forward return over the identical aligned
/// anchor/window and derives excess/relative return against `window`.
pub fn compute_benchmark_relative(
    window: &EventWindowReturn,
    benchmark_symbol: &str,
    benchmark_series: &BarSeries,
    calendar: &TradingCalendar,
) -> Result<BenchmarkRelativeReturn, WorkflowError> {
    let benchmark_window = compute_event_window_return(
        &window.event_id,
        benchmark_symbol,
        window.anchor_kind,
        window.anchor_date,
        window.aligned_anchor_date,
        window.window_sessions,
        benchmark_series,
        calendar,
    )?;

    let forward = window.forward_return_percent;
    let benchmark_forward = benchmark_window.forward_return_percent;
    let excess = round6(forward - benchmark_forward);
    let relative = round6(((1.0 + forward / 100.0) / (1.0 + benchmark_forward / 100.0) - 1.0) * 100.0);

    Ok(BenchmarkRelativeReturn {
        window: window.clone(),
        benchmark_symbol: benchmark_symbol.to_string(),
        excess_return_percent: excess,
        relative_return_percent: relative,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn bars(pairs: &[(&str, f64)]) -> Vec<PriceBar> {
        pairs.iter().map(|(d, c)| PriceBar { date: date(d), adjusted_close: *c }).collect()
    }

    #[test]
    fn forward_return_matches_spec_scenario_s4() {
        let ticker_bars = bars(&[("2025-01-03", 100.0), ("2025-01-06", 102.0), ("2025-01-07", 105.0), ("2025-01-08", 107.0)]);
        let spy_bars = bars(&[("2025-01-03", 500.0), ("2025-01-06", 501.0), ("2025-01-07", 502.0), ("2025-01-08", 503.0)]);
        let calendar = TradingCalendar::from_bars([ticker_bars.as_slice(), spy_bars.as_slice()]);
        let ticker_series = BarSeries::from_bars(&ticker_bars);
        let spy_series = BarSeries::from_bars(&spy_bars);

        let (aligned, shifted) = calendar.align_to_next_session(date("2025-01-04")).unwrap();
        assert!(shifted);
        assert_eq!(aligned, date("2025-01-06"));

        let window = compute_event_window_return(
            "evt1",
            "AAPL",
            AnchorKind::Transaction,
            date("2025-01-04"),
            aligned,
            1,
            &ticker_series,
            &calendar,
        )
        .unwrap();
        assert!((window.forward_return_percent - 2.941176).abs() < 1e-6);

        let relative = compute_benchmark_relative(&window, "SPY", &spy_series, &calendar).unwrap();
        assert!((relative.window.forward_return_percent - 2.941176).abs() < 1e-6);
        assert!((relative.excess_return_percent - 2.741575).abs() < 1e-5);
    }

    #[test]
    fn window_beyond_loaded_range_fails_loudly() {
        let ticker_bars = bars(&[("2025-01-03", 100.0), ("2025-01-06", 102.0)]);
        let calendar = TradingCalendar::from_bars([ticker_bars.as_slice()]);
        let series = BarSeries::from_bars(&ticker_bars);

        let err = compute_event_window_return(
            "evt1",
            "AAPL",
            AnchorKind::Transaction,
            date("2025-01-04"),
            date("2025-01-06"),
            5,
            &series,
            &calendar,
        )
        .unwrap_err();
        assert_eq!(err.code, "WINDOW_OUT_OF_RANGE");
    }

    #[test]
    fn sector_required_mode_fails_without_mapping() {
        let err = resolve_benchmarks(BenchmarkMode::SpyPlusSectorRequired, Some("Widgets")).unwrap_err();
        assert_eq!(err.code, "MISSING_SECTOR_BENCHMARK");
    }

    #[test]
    fn sector_if_relevant_mode_proceeds_spy_only_without_mapping() {
        let benchmarks = resolve_benchmarks(BenchmarkMode::SpyPlusSectorIfRelevant, Some("Widgets")).unwrap();
        assert_eq!(benchmarks, vec!["SPY".to_string()]);
    }

    #[test]
    fn technology_sector_resolves_xlk() {
        let benchmarks = resolve_benchmarks(BenchmarkMode::SpyPlusSectorRequired, Some("Technology")).unwrap();
        assert_eq!(benchmarks, vec!["SPY".to_string(), "XLK".to_string()]);
    }
}
