use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use finlink_core::WorkflowError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RawObservation {
    pub date: NaiveDate,
    pub value: f64,
    pub row_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedDataset {
    pub metric_key: String,
    pub metric_label: String,
    pub date_key: String,
    pub observations: Vec<RawObservation>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RobustStats {
    pub center: f64,
    pub dispersion: f64,
    pub median: f64,
    pub mad: f64,
    pub iqr: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub key: String,
    pub ticker: String,
    pub metric_key: String,
    pub metric_label: String,
    pub date: NaiveDate,
    pub current_value: f64,
    pub baseline_center: f64,
    pub baseline_dispersion: f64,
    pub z_score: f64,
    pub abs_z_score: f64,
    pub direction: Direction,
    pub severity: Severity,
    pub significant: bool,
}

/// Significance/severity-band thresholds.
/// Must be constructed through [`SeverityThresholds::new`], which enforces
/// `significance ≤ medium ≤ high`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SeverityThresholds {
    pub significance: f64,
    pub medium: f64,
    pub high: f64,
}

impl SeverityThresholds {
    pub fn new(significance: f64, medium: f64, high: f64) -> Result<Self, WorkflowError> {
        if !(significance <= medium && medium <= high) {
            return Err(WorkflowError::new(
                "NON_MONOTONIC_SEVERITY_THRESHOLDS",
                format!("expected significance <= medium <= high, got {significance}, {medium}, {high}"),
            ));
        }
        Ok(Self { significance, medium, high })
    }

    /// Default bands: `medium = significance * 1.5`, `high = significance * 2`.
    pub fn from_significance(significance: f64) -> Result<Self, WorkflowError> {
        Self::new(significance, significance * 1.5, significance * 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionState {
    New,
    Persisted,
    SeverityChange,
    Resolved,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub state: TransitionState,
    pub key: String,
    pub current: Option<AnomalyRecord>,
    pub previous: Option<AnomalyRecord>,
}
