//! Political-trading event study: normalizes raw government-trading rows
//! into events, aligns them to observed trading sessions, computes forward
//! and benchmark-relative returns, aggregates by window, and compares
//! successive runs. Every failure surfaces as a typed
//! [`finlink_core::WorkflowError`] — this engine never degrades to a
//! best-effort partial result.

pub mod aggregate;
pub mod anchor;
pub mod calendar;
pub mod compare;
pub mod normalize;
pub mod returns;
pub mod types;

pub use aggregate::aggregate;
pub use anchor::{resolve_anchors, Anchor};
pub use calendar::TradingCalendar;
pub use compare::{compare_runs, discover_historical_runs, RunComparison, RunRecord};
pub use normalize::normalize_events;
pub use returns::{compute_benchmark_relative, compute_event_window_return, resolve_benchmarks, BarSeries};
pub use types::{
    AggregateWindow, AnchorKind, AnchorMode, BacktestRunSnapshot, BenchmarkMode, BenchmarkRelativeReturn,
    EventWindowReturn, PoliticalEvent, PriceBar, Side, SourceDatasetId,
};
