use crate::baseline::BaselineWindow;
use crate::types::{AnomalyRecord, Direction, Severity, SeverityThresholds};

/// Scores a baseline window against `thresholds`, producing the
/// `AnomalyRecord` whether or not it turns out significant.
pub fn score(ticker: &str, metric_key: &str, metric_label: &str, window: &BaselineWindow, thresholds: &SeverityThresholds) -> AnomalyRecord {
    let z_score = (window.current.value - window.stats.center) / window.stats.dispersion;
    let abs_z = z_score.abs();

    let direction = if z_score >= 0.0 { Direction::Positive } else { Direction::Negative };
    let significant = abs_z >= thresholds.significance;
    let severity = if abs_z < thresholds.medium {
        Severity::Low
    } else if abs_z < thresholds.high {
        Severity::Medium
    } else {
        Severity::High
    };

    AnomalyRecord {
        key: format!("{ticker}:{metric_key}"),
        ticker: ticker.to_string(),
        metric_key: metric_key.to_string(),
        metric_label: metric_label.to_string(),
        date: window.current.date,
        current_value: window.current.value,
        baseline_center: window.stats.center,
        baseline_dispersion: window.stats.dispersion,
        z_score,
        abs_z_score: abs_z,
        direction,
        severity,
        significant,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RawObservation, RobustStats};
    use chrono::NaiveDate;

    fn window(current_value: f64, center: f64, dispersion: f64) -> BaselineWindow {
        BaselineWindow {
            current: RawObservation {
                date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
                value: current_value,
                row_count: 1,
            },
            stats: RobustStats {
                center,
                dispersion,
                median: center,
                mad: dispersion / 1.4826,
                iqr: dispersion,
            },
        }
    }

    #[test]
    fn monotonic_thresholds_are_required() {
        let err = SeverityThresholds::new(2.5, 2.0, 5.0).unwrap_err();
        assert_eq!(err.code, "NON_MONOTONIC_SEVERITY_THRESHOLDS");
    }

    #[test]
    fn high_severity_spike_is_classified_positive_and_significant() {
        let thresholds = SeverityThresholds::from_significance(2.5).unwrap();
        let w = window(190.0, 99.8, 2.5);
        let record = score("AAPL", "off_exchange_ratio", "Off-exchange ratio", &w, &thresholds);
        assert!(record.significant);
        assert_eq!(record.direction, Direction::Positive);
        assert_eq!(record.severity, Severity::High);
    }

    #[test]
    fn value_within_band_is_not_significant() {
        let thresholds = SeverityThresholds::from_significance(2.5).unwrap();
        let w = window(100.0, 99.8, 2.5);
        let record = score("AAPL", "off_exchange_ratio", "Off-exchange ratio", &w, &thresholds);
        assert!(!record.significant);
        assert_eq!(record.severity, Severity::Low);
    }
}
