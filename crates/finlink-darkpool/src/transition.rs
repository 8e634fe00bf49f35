use std::collections::BTreeMap;

use crate::types::{AnomalyRecord, TransitionRecord, TransitionState};

/// Classifies `current` against `previous`, keyed by `${ticker}:${metric_key}`.
/// The output preserves current-first order (in `current`'s own order), then
/// resolved entries in `previous`'s order, for deterministic diffing.
pub fn classify_transitions(current: &[AnomalyRecord], previous: &[AnomalyRecord]) -> Vec<TransitionRecord> {
    let previous_by_key: BTreeMap<&str, &AnomalyRecord> = previous.iter().map(|r| (r.key.as_str(), r)).collect();
    let current_keys: std::collections::HashSet<&str> = current.iter().map(|r| r.key.as_str()).collect();

    let mut records = Vec::with_capacity(current.len() + previous.len());

    for record in current {
        match previous_by_key.get(record.key.as_str()) {
            None => records.push(TransitionRecord {
                state: TransitionState::New,
                key: record.key.clone(),
                current: Some(record.clone()),
                previous: None,
            }),
            Some(prev) => {
                let state = if prev.severity == record.severity {
                    TransitionState::Persisted
                } else {
                    TransitionState::SeverityChange
                };
                records.push(TransitionRecord {
                    state,
                    key: record.key.clone(),
                    current: Some(record.clone()),
                    previous: Some((*prev).clone()),
                });
            }
        }
    }

    for record in previous {
        if !current_keys.contains(record.key.as_str()) {
            records.push(TransitionRecord {
                state: TransitionState::Resolved,
                key: record.key.clone(),
                current: None,
                previous: Some(record.clone()),
            });
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, Severity};
    use chrono::NaiveDate;

    fn record(ticker: &str, metric: &str, severity: Severity) -> AnomalyRecord {
        AnomalyRecord {
            key: format!("{ticker}:{metric}"),
            ticker: ticker.to_string(),
            metric_key: metric.to_string(),
            metric_label: metric.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            current_value: 1.0,
            baseline_center: 1.0,
            baseline_dispersion: 1.0,
            z_score: 1.0,
            abs_z_score: 1.0,
            direction: Direction::Positive,
            severity,
            significant: true,
        }
    }

    #[test]
    fn spec_scenario_s7_classifies_all_four_transitions() {
        let current = vec![
            record("AAPL", "off_exchange_ratio", Severity::High),
            record("MSFT", "off_exchange_ratio", Severity::Low),
            record("NVDA", "off_exchange_ratio", Severity::Medium),
        ];
        let previous = vec![
            record("MSFT", "off_exchange_ratio", Severity::Low),
            record("NVDA", "off_exchange_ratio", Severity::Low),
            record("AMZN", "off_exchange_ratio", Severity::Medium),
        ];

        let transitions = classify_transitions(&current, &previous);
        let by_key: BTreeMap<_, _> = transitions.iter().map(|t| (t.key.as_str(), t.state)).collect();

        assert_eq!(by_key["AAPL:off_exchange_ratio"], TransitionState::New);
        assert_eq!(by_key["MSFT:off_exchange_ratio"], TransitionState::Persisted);
        assert_eq!(by_key["NVDA:off_exchange_ratio"], TransitionState::SeverityChange);
        assert_eq!(by_key["AMZN:off_exchange_ratio"], TransitionState::Resolved);
    }

    #[test]
    fn current_entries_precede_resolved_entries() {
        let current = vec![record("AAPL", "m", Severity::Low)];
        let previous = vec![record("MSFT", "m", Severity::Low)];
        let transitions = classify_transitions(&current, &previous);
        assert_eq!(transitions[0].state, TransitionState::New);
        assert_eq!(transitions[1].state, TransitionState::Resolved);
    }
}
