//! Government-trading event delta and cross-run persistence tracking. Sits
//! downstream of `finlink-backtest::normalize`'s event stream: where that
//! crate's `event_id` is an opaque stable hash used for
//! backtest sample identity, this crate computes the *business* identity
//! `(actor, ticker, transaction_date, transaction_type, amount)` used to
//! recognize "the same disclosure" across independently-run scrapes, and
//! tracks how durably each identity has persisted across historical runs.

pub mod delta;
pub mod identity;
pub mod persistence;
pub mod types;

pub use delta::delta;
pub use identity::identity_key;
pub use persistence::compute_persistence;
pub use types::{DeltaRecord, DeltaState, GovTradeEvent, HistoricalRun, PersistenceTrend};
