use std::collections::HashMap;

use crate::identity::identity_key;
use crate::types::{DeltaRecord, DeltaState, GovTradeEvent};

/// Diffs a current run's events against a baseline run's events by identity:
/// `new`, `updated` (identity unchanged but a non-identity field changed),
/// `unchanged`, and `no_longer_present` (identity was in baseline, absent
/// from current).
pub fn delta(current: &[GovTradeEvent], baseline: &[GovTradeEvent]) -> Vec<DeltaRecord> {
    let current_by_identity: HashMap<String, &GovTradeEvent> =
        current.iter().map(|e| (identity_key(e), e)).collect();
    let baseline_by_identity: HashMap<String, &GovTradeEvent> =
        baseline.iter().map(|e| (identity_key(e), e)).collect();

    let mut records = Vec::new();

    for (identity, cur) in &current_by_identity {
        match baseline_by_identity.get(identity) {
            None => records.push(DeltaRecord {
                identity: identity.clone(),
                state: DeltaState::New,
                current: Some((*cur).clone()),
                baseline: None,
            }),
            Some(base) => {
                let state = if cur.non_identity_fields_differ(base) {
                    DeltaState::Updated
                } else {
                    DeltaState::Unchanged
                };
                records.push(DeltaRecord {
                    identity: identity.clone(),
                    state,
                    current: Some((*cur).clone()),
                    baseline: Some((*base).clone()),
                });
            }
        }
    }

    for (identity, base) in &baseline_by_identity {
        if !current_by_identity.contains_key(identity) {
            records.push(DeltaRecord {
                identity: identity.clone(),
                state: DeltaState::NoLongerPresent,
                current: None,
                baseline: Some((*base).clone()),
            });
        }
    }

    records.sort_by(|a, b| a.identity.cmp(&b.identity));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use finlink_core::TransactionType;

    fn event(actor: &str, shares: Option<f64>) -> GovTradeEvent {
        GovTradeEvent {
            actor: actor.to_string(),
            ticker: "AAPL".to_string(),
            transaction_date: NaiveDate::parse_from_str("2025-01-03", "%Y-%m-%d").unwrap(),
            transaction_type: TransactionType::Buy,
            amount: Some(15_000.0),
            shares,
            report_date: None,
            asset_description: None,
        }
    }

    #[test]
    fn classifies_new_updated_unchanged_and_no_longer_present() {
        let baseline = vec![event("Jane Doe", Some(100.0)), event("Gone Guy", Some(50.0))];
        let current = vec![event("Jane Doe", Some(200.0)), event("New Guy", Some(10.0))];

        let records = delta(&current, &baseline);
        let states: Vec<DeltaState> = records.iter().map(|r| r.state).collect();

        assert!(states.contains(&DeltaState::Updated));
        assert!(states.contains(&DeltaState::New));
        assert!(states.contains(&DeltaState::NoLongerPresent));
        assert_eq!(states.len(), 3);
    }

    #[test]
    fn identical_events_are_unchanged() {
        let baseline = vec![event("Jane Doe", Some(100.0))];
        let current = vec![event("Jane Doe", Some(100.0))];
        let records = delta(&current, &baseline);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].state, DeltaState::Unchanged);
    }

    #[test]
    fn empty_baseline_marks_everything_new() {
        let current = vec![event("Jane Doe", Some(100.0))];
        let records = delta(&current, &[]);
        assert_eq!(records[0].state, DeltaState::New);
    }
}
