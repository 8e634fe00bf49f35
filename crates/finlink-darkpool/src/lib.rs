//! Off-exchange / dark-pool anomaly detector: auto-detects date and metric
//! columns in loose tabular data, builds a robust median/MAD baseline,
//! scores significance with configurable severity bands, and classifies
//! anomaly transitions across runs.

pub mod baseline;
pub mod dataset;
pub mod significance;
pub mod transition;
pub mod types;

pub use baseline::{compute_baseline, BaselineWindow};
pub use dataset::parse_dataset;
pub use significance::score;
pub use transition::classify_transitions;
pub use types::{
    AnomalyRecord, Direction, ParsedDataset, RawObservation, RobustStats, Severity, SeverityThresholds,
    TransitionRecord, TransitionState,
};
