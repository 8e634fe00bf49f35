use chrono::NaiveDate;
use serde_json::Value;
use sha2::{Digest, Sha256};

use finlink_core::WorkflowError;

use crate::types::{PoliticalEvent, Side, SourceDatasetId};

const ACTOR_KEYS: &[&str] = &["Representative", "Senator", "Name", "actor"];
const SIDE_KEYS: &[&str] = &["Transaction", "Type", "side"];
const TRANSACTION_DATE_KEYS: &[&str] = &["TransactionDate", "transaction_date"];
const REPORT_DATE_KEYS: &[&str] = &["ReportDate", "report_date"];
const SHARES_KEYS: &[&str] = &["Shares", "shares"];

fn text(row: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| {
        row.get(k)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn number(row: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| row.get(k).and_then(Value::as_f64))
}

/// Parses a free-form date string. UTC is assumed when no offset is present;
/// an explicit offset is honored by taking the UTC calendar day.
fn parse_date(raw: &str) -> Result<NaiveDate, WorkflowError> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%m/%d/%Y") {
        return Ok(date);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&chrono::Utc).date_naive());
    }
    if let Ok(dt) = NaiveDate::parse_from_str(&raw[..raw.len().min(10)], "%Y-%m-%d") {
        return Ok(dt);
    }
    Err(WorkflowError::new("INVALID_EVENT_DATE", format!("could not parse date: {raw}")))
}

fn parse_side(raw: &str) -> Side {
    let lowered = raw.to_lowercase();
    if lowered.contains("purchase") || lowered.contains("buy") {
        Side::Buy
    } else if lowered.contains("sale") || lowered.contains("sell") {
        Side::Sell
    } else {
        Side::Other
    }
}

/// Stable hash over the identity tuple; identical for logically-identical
/// rows regardless of their position in the input slice.
fn event_id(
    ticker: &str,
    dataset_id: SourceDatasetId,
    actor: &str,
    side: Side,
    transaction_date: NaiveDate,
    report_date: Option<NaiveDate>,
    shares: Option<f64>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ticker.to_uppercase().as_bytes());
    hasher.update(b"|");
    hasher.update(dataset_id.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(actor.as_bytes());
    hasher.update(b"|");
    hasher.update(format!("{side:?}").as_bytes());
    hasher.update(b"|");
    hasher.update(transaction_date.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(report_date.map(|d| d.to_string()).unwrap_or_default().as_bytes());
    hasher.update(b"|");
    hasher.update(shares.map(|s| format!("{s:.6}")).unwrap_or_default().as_bytes());
    let digest = hasher.finalize();
    hex_prefix(&digest, 16)
}

fn hex_prefix(bytes: &[u8], len: usize) -> String {
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    hex[..len].to_string()
}

/// Normalizes raw Quiver-shaped rows for a single ticker/dataset pair into
/// `PoliticalEvent`s. Row order has no bearing on the resulting `event_id`s.
pub fn normalize_events(dataset_id: SourceDatasetId, ticker: &str, rows: &[Value]) -> Result<Vec<PoliticalEvent>, WorkflowError> {
    let mut events = Vec::with_capacity(rows.len());

    for row in rows {
        let actor = text(row, ACTOR_KEYS)
            .ok_or_else(|| WorkflowError::new("INVALID_QUIVER_ROW", "row is missing an actor field"))?;
        let side_raw = text(row, SIDE_KEYS)
            .ok_or_else(|| WorkflowError::new("INVALID_QUIVER_ROW", "row is missing a transaction-type field"))?;
        let side = parse_side(&side_raw);

        let transaction_date_raw = text(row, TRANSACTION_DATE_KEYS)
            .ok_or_else(|| WorkflowError::new("MISSING_REQUIRED_ANCHOR_DATE", "row is missing transaction_date"))?;
        let transaction_date = parse_date(&transaction_date_raw)?;

        let report_date = match text(row, REPORT_DATE_KEYS) {
            Some(raw) => Some(parse_date(&raw)?),
            None => None,
        };

        let shares = number(row, SHARES_KEYS);

        let id = event_id(ticker, dataset_id, &actor, side, transaction_date, report_date, shares);

        events.push(PoliticalEvent {
            event_id: id,
            ticker: ticker.to_uppercase(),
            source_dataset_id: dataset_id,
            actor,
            side,
            transaction_date,
            report_date,
            shares,
        });
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows() -> Vec<Value> {
        vec![
            json!({"Representative": "Jane Doe", "Transaction": "Purchase", "TransactionDate": "2025-01-03", "Shares": 100.0}),
            json!({"Representative": "John Roe", "Transaction": "Sale", "TransactionDate": "2025-01-04", "ReportDate": "2025-01-10"}),
        ]
    }

    #[test]
    fn event_id_is_stable_under_row_reordering() {
        let forward = normalize_events(SourceDatasetId::TickerCongressTrading, "AAPL", &rows()).unwrap();
        let mut shuffled_rows = rows();
        shuffled_rows.reverse();
        let reversed = normalize_events(SourceDatasetId::TickerCongressTrading, "AAPL", &shuffled_rows).unwrap();

        let mut forward_ids: Vec<_> = forward.iter().map(|e| e.event_id.clone()).collect();
        let mut reversed_ids: Vec<_> = reversed.iter().map(|e| e.event_id.clone()).collect();
        forward_ids.sort();
        reversed_ids.sort();
        assert_eq!(forward_ids, reversed_ids);
    }

    #[test]
    fn missing_transaction_date_is_rejected() {
        let bad = vec![json!({"Representative": "Jane Doe", "Transaction": "Purchase"})];
        let err = normalize_events(SourceDatasetId::TickerCongressTrading, "AAPL", &bad).unwrap_err();
        assert_eq!(err.code, "MISSING_REQUIRED_ANCHOR_DATE");
    }

    #[test]
    fn malformed_transaction_date_is_rejected() {
        let bad = vec![json!({"Representative": "Jane Doe", "Transaction": "Purchase", "TransactionDate": "not-a-date"})];
        let err = normalize_events(SourceDatasetId::TickerCongressTrading, "AAPL", &bad).unwrap_err();
        assert_eq!(err.code, "INVALID_EVENT_DATE");
    }

    #[test]
    fn purchase_and_sale_keywords_map_to_buy_and_sell() {
        let parsed = normalize_events(SourceDatasetId::TickerCongressTrading, "AAPL", &rows()).unwrap();
        assert_eq!(parsed[0].side, Side::Buy);
        assert_eq!(parsed[1].side, Side::Sell);
    }
}
