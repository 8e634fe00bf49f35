//! Deterministic artifact writer plus the persisted directory layouts for
//! the political-backtest and darkpool-anomaly workflows. Depends on the
//! caller having already assembled the report contents; this crate only
//! owns "where do these bytes land on disk, and how do we not clobber
//! yesterday's run".

pub mod darkpool_layout;
pub mod political_backtest_layout;
pub mod writer;

pub use darkpool_layout::EvidenceDocument;
pub use writer::write_artifacts;
