use finlink_core::WorkflowError;

use crate::types::{RawObservation, RobustStats};

const EPS: f64 = 1e-9;

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn mad(values: &[f64], center: f64) -> f64 {
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    median(&deviations)
}

fn iqr(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let q1 = percentile(&sorted, 0.25);
    let q3 = percentile(&sorted, 0.75);
    q3 - q1
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let weight = rank - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}

fn sample_stdev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

pub struct BaselineWindow {
    pub current: RawObservation,
    pub stats: RobustStats,
}

/// Builds the robust baseline over the `lookback`-session window ending on
/// the latest observed date.
pub fn compute_baseline(observations: &[RawObservation], lookback: usize, min_samples: usize) -> Result<BaselineWindow, WorkflowError> {
    if observations.is_empty() {
        return Err(WorkflowError::new("INSUFFICIENT_SAMPLE_COUNT", "no observations available"));
    }

    let window_len = lookback.min(observations.len());
    let window = &observations[observations.len() - window_len..];

    if window.len() < min_samples + 1 {
        return Err(WorkflowError::new(
            "INSUFFICIENT_SAMPLE_COUNT",
            "Insufficient off-exchange sample count",
        ));
    }

    let values: Vec<f64> = window.iter().map(|o| o.value).collect();
    let center = median(&values);
    let mad_value = mad(&values, center);
    let iqr_value = iqr(&values);
    let stdev_value = sample_stdev(&values);

    let dispersion = if 1.4826 * mad_value > EPS {
        1.4826 * mad_value
    } else if iqr_value / 1.349 > EPS {
        iqr_value / 1.349
    } else if stdev_value > EPS {
        stdev_value
    } else {
        return Err(WorkflowError::new("ZERO_DISPERSION", "baseline dispersion resolved to zero"));
    };

    Ok(BaselineWindow {
        current: *window.last().unwrap(),
        stats: RobustStats {
            center,
            dispersion,
            median: center,
            mad: mad_value,
            iqr: iqr_value,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn obs(values: &[f64]) -> Vec<RawObservation> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| RawObservation {
                date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + chrono::Duration::days(i as i64),
                value: v,
                row_count: 1,
            })
            .collect()
    }

    #[test]
    fn fails_when_sample_count_below_min_samples_plus_one() {
        let observations = obs(&[100.0, 101.0, 102.0]);
        let err = compute_baseline(&observations, 14, 5).unwrap_err();
        assert_eq!(err.code, "INSUFFICIENT_SAMPLE_COUNT");
    }

    #[test]
    fn baseline_center_is_median_of_window() {
        let observations = obs(&[100.0, 98.0, 101.0, 99.0, 102.0, 100.0]);
        let baseline = compute_baseline(&observations, 14, 5).unwrap();
        assert_eq!(baseline.stats.center, 99.5);
    }

    #[test]
    fn spec_scenario_s6_spike_detected_high_severity() {
        let observations = obs(&[100.0, 98.0, 101.0, 99.0, 102.0, 100.0, 97.0, 103.0, 100.0, 190.0]);
        let baseline = compute_baseline(&observations, 14, 5).unwrap();
        let z = (baseline.current.value - baseline.stats.center) / baseline.stats.dispersion;
        assert!(z.abs() >= 2.5);
    }

    #[test]
    fn constant_series_falls_back_through_dispersion_chain_and_fails() {
        let observations = obs(&[100.0; 8]);
        let err = compute_baseline(&observations, 14, 5).unwrap_err();
        assert_eq!(err.code, "ZERO_DISPERSION");
    }
}
