use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use finlink_core::TransactionType;

/// A single government-trading disclosure, carrying both the fields that
/// make up its cross-run identity and the fields that can
/// change between disclosures of the logically same trade (amendments,
/// late-arriving share counts, corrected report dates).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovTradeEvent {
    pub actor: String,
    pub ticker: String,
    pub transaction_date: NaiveDate,
    pub transaction_type: TransactionType,
    pub amount: Option<f64>,
    pub shares: Option<f64>,
    pub report_date: Option<NaiveDate>,
    pub asset_description: Option<String>,
}

impl GovTradeEvent {
    /// The `(actor, ticker, transaction_date, transaction_type, amount)`
    /// identity tuple, independent of `event_id`'s content.
    pub fn identity_tuple(&self) -> (&str, &str, NaiveDate, TransactionType, Option<i64>) {
        (
            self.actor.as_str(),
            self.ticker.as_str(),
            self.transaction_date,
            self.transaction_type,
            self.amount.map(|a| (a * 100.0).round() as i64),
        )
    }

    /// Whether any field outside the identity tuple differs between two
    /// disclosures that share the same identity.
    pub fn non_identity_fields_differ(&self, other: &GovTradeEvent) -> bool {
        self.shares != other.shares || self.report_date != other.report_date || self.asset_description != other.asset_description
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaState {
    New,
    Updated,
    Unchanged,
    NoLongerPresent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeltaRecord {
    pub identity: String,
    pub state: DeltaState,
    pub current: Option<GovTradeEvent>,
    pub baseline: Option<GovTradeEvent>,
}

/// One prior run's set of event identities, keyed by `run_id` for ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalRun {
    pub run_id: String,
    pub identities: std::collections::HashSet<String>,
}

/// Persistence trend for one current-run identity: how many prior runs have carried this identity, and whether
/// that presence is an unbroken streak ending at the current run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersistenceTrend {
    pub consecutive_run_streak: u32,
    pub runs_seen_including_current: u32,
    pub total_runs_including_current: u32,
    pub persistence_ratio: f64,
}
