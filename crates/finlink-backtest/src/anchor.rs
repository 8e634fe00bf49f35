use chrono::NaiveDate;

use finlink_core::WorkflowError;

use crate::types::{AnchorKind, AnchorMode, PoliticalEvent};

/// One anchor date an event contributes to the study, before calendar
/// alignment.
#[derive(Debug, Clone)]
pub struct Anchor {
    pub event_id: String,
    pub ticker: String,
    pub anchor_kind: AnchorKind,
    pub anchor_date: NaiveDate,
}

/// Expands events into anchors per `anchor_mode`. `both` emits two anchors per event and requires both dates
/// to be present.
pub fn resolve_anchors(events: &[PoliticalEvent], mode: AnchorMode) -> Result<Vec<Anchor>, WorkflowError> {
    let mut anchors = Vec::new();

    for event in events {
        match mode {
            AnchorMode::Transaction => anchors.push(Anchor {
                event_id: event.event_id.clone(),
                ticker: event.ticker.clone(),
                anchor_kind: AnchorKind::Transaction,
                anchor_date: event.transaction_date,
            }),
            AnchorMode::Report => {
                let report_date = event.report_date.ok_or_else(|| {
                    WorkflowError::new(
                        "MISSING_REQUIRED_ANCHOR_DATE",
                        format!("event {} has no report_date but anchor_mode=report", event.event_id),
                    )
                })?;
                anchors.push(Anchor {
                    event_id: event.event_id.clone(),
                    ticker: event.ticker.clone(),
                    anchor_kind: AnchorKind::Report,
                    anchor_date: report_date,
                });
            }
            AnchorMode::Both => {
                let report_date = event.report_date.ok_or_else(|| {
                    WorkflowError::new(
                        "MISSING_REQUIRED_ANCHOR_DATE",
                        format!("event {} has no report_date but anchor_mode=both", event.event_id),
                    )
                })?;
                anchors.push(Anchor {
                    event_id: event.event_id.clone(),
                    ticker: event.ticker.clone(),
                    anchor_kind: AnchorKind::Transaction,
                    anchor_date: event.transaction_date,
                });
                anchors.push(Anchor {
                    event_id: event.event_id.clone(),
                    ticker: event.ticker.clone(),
                    anchor_kind: AnchorKind::Report,
                    anchor_date: report_date,
                });
            }
        }
    }

    Ok(anchors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Side, SourceDatasetId};

    fn event(report_date: Option<&str>) -> PoliticalEvent {
        PoliticalEvent {
            event_id: "evt1".to_string(),
            ticker: "AAPL".to_string(),
            source_dataset_id: SourceDatasetId::TickerCongressTrading,
            actor: "Jane Doe".to_string(),
            side: Side::Buy,
            transaction_date: NaiveDate::parse_from_str("2025-01-03", "%Y-%m-%d").unwrap(),
            report_date: report_date.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
            shares: Some(100.0),
        }
    }

    #[test]
    fn both_mode_requires_both_dates() {
        let events = vec![event(None)];
        let err = resolve_anchors(&events, AnchorMode::Both).unwrap_err();
        assert_eq!(err.code, "MISSING_REQUIRED_ANCHOR_DATE");
    }

    #[test]
    fn both_mode_emits_two_anchors_when_both_dates_present() {
        let events = vec![event(Some("2025-01-10"))];
        let anchors = resolve_anchors(&events, AnchorMode::Both).unwrap();
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[0].anchor_kind, AnchorKind::Transaction);
        assert_eq!(anchors[1].anchor_kind, AnchorKind::Report);
    }

    #[test]
    fn transaction_mode_never_requires_report_date() {
        let events = vec![event(None)];
        let anchors = resolve_anchors(&events, AnchorMode::Transaction).unwrap();
        assert_eq!(anchors.len(), 1);
    }
}
