use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One of the three Quiver government-trading datasets a raw row can come
/// from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceDatasetId {
    TickerCongressTrading,
    TickerSenateTrading,
    TickerHouseTrading,
}

impl SourceDatasetId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceDatasetId::TickerCongressTrading => "ticker_congress_trading",
            SourceDatasetId::TickerSenateTrading => "ticker_senate_trading",
            SourceDatasetId::TickerHouseTrading => "ticker_house_trading",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
    Other,
}

/// A normalized government-trading row. `event_id` is a stable
/// hash over the identity tuple, independent of input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoliticalEvent {
    pub event_id: String,
    pub ticker: String,
    pub source_dataset_id: SourceDatasetId,
    pub actor: String,
    pub side: Side,
    pub transaction_date: NaiveDate,
    pub report_date: Option<NaiveDate>,
    pub shares: Option<f64>,
}

/// One adjusted-close observation for a symbol. `adjusted_close`
/// is always strictly positive for a loaded bar.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub adjusted_close: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorKind {
    Transaction,
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorMode {
    Transaction,
    Report,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkMode {
    SpyOnly,
    SpyPlusSectorIfRelevant,
    SpyPlusSectorRequired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventWindowReturn {
    pub event_id: String,
    pub ticker: String,
    pub anchor_kind: AnchorKind,
    pub anchor_date: NaiveDate,
    pub aligned_anchor_date: NaiveDate,
    pub window_sessions: u32,
    pub start_close: f64,
    pub end_close: f64,
    pub forward_return_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkRelativeReturn {
    #[serde(flatten)]
    pub window: EventWindowReturn,
    pub benchmark_symbol: String,
    pub excess_return_percent: f64,
    pub relative_return_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateWindow {
    pub anchor_kind: AnchorKind,
    pub window_sessions: u32,
    pub benchmark_symbol: String,
    pub sample_size: usize,
    pub hit_rate_percent: f64,
    pub mean_return_percent: f64,
    pub median_return_percent: f64,
    pub stdev_return_percent: f64,
    pub mean_excess_return_percent: f64,
    pub mean_relative_return_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestRunSnapshot {
    pub workflow: String,
    pub output_root: String,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub aggregates: Vec<AggregateWindow>,
    pub event_ids: Vec<String>,
}
