use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::Value;

use finlink_core::WorkflowError;

use crate::types::{ParsedDataset, RawObservation};

const PREFERRED_DATE_NAMES: &[&str] = &[
    "date",
    "datetime",
    "timestamp",
    "reportdate",
    "report_date",
    "trade_date",
    "tradedate",
    "asof",
    "as_of",
];

fn parse_any_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&chrono::Utc).date_naive());
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%m/%d/%Y") {
        return Some(d);
    }
    None
}

fn value_as_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_any_date(s),
        _ => None,
    }
}

fn value_as_number(value: &Value) -> Option<f64> {
    value.as_f64()
}

fn column_keys(rows: &[Value]) -> Vec<String> {
    let mut keys = Vec::new();
    for row in rows {
        if let Value::Object(map) = row {
            for key in map.keys() {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
        }
    }
    keys
}

fn detect_date_column(rows: &[Value], keys: &[String]) -> Option<String> {
    let mut best: Option<(String, usize)> = None;
    for key in keys {
        let count = rows
            .iter()
            .filter_map(|r| r.get(key))
            .filter(|v| value_as_date(v).is_some())
            .count();
        if count == 0 {
            continue;
        }
        let preferred = PREFERRED_DATE_NAMES.iter().any(|name| key.to_lowercase().contains(name));
        match &best {
            None => best = Some((key.clone(), count)),
            Some((best_key, best_count)) => {
                let best_preferred = PREFERRED_DATE_NAMES.iter().any(|name| best_key.to_lowercase().contains(name));
                if count > *best_count || (count == *best_count && preferred && !best_preferred) {
                    best = Some((key.clone(), count));
                }
            }
        }
    }
    best.map(|(key, _)| key)
}

fn score_metric_name(key: &str) -> u32 {
    let lowered = key.to_lowercase();
    let has_off_exchange = lowered.contains("off") && lowered.contains("exchange");
    let has_dark = lowered.contains("dark");
    let has_ratio = lowered.contains("ratio");
    let has_volume = lowered.contains("volume");

    if has_off_exchange && has_ratio {
        600
    } else if has_dark && has_ratio {
        600
    } else if has_off_exchange && has_volume {
        500
    } else if has_dark && has_volume {
        500
    } else if has_off_exchange || has_dark {
        400
    } else if has_volume || lowered.contains("amount") || has_ratio || lowered.contains("percent") {
        150
    } else {
        0
    }
}

fn detect_metric_column(rows: &[Value], keys: &[String], exclude: &str) -> Result<String, WorkflowError> {
    let mut best: Option<(String, u32, usize)> = None;

    for key in keys {
        if key == exclude {
            continue;
        }
        let score = score_metric_name(key);
        if score == 0 {
            continue;
        }
        let numeric_count = rows.iter().filter_map(|r| r.get(key)).filter(|v| value_as_number(v).is_some()).count();

        match &best {
            None => best = Some((key.clone(), score, numeric_count)),
            Some((_, best_score, best_numeric)) => {
                if score > *best_score || (score == *best_score && numeric_count > *best_numeric) {
                    best = Some((key.clone(), score, numeric_count));
                }
            }
        }
    }

    best.map(|(key, _, _)| key)
        .ok_or_else(|| WorkflowError::new("NO_METRIC_COLUMN_CANDIDATE", "no column scored above zero for a dark-pool/off-exchange metric"))
}

/// Detects the date and metric columns among loose row maps, collapses
/// multiple rows per date into one observation (mean value, row_count =
/// count), and sorts chronologically.
pub fn parse_dataset(rows: &[Value], metric_label: &str) -> Result<ParsedDataset, WorkflowError> {
    let keys = column_keys(rows);
    let date_key = detect_date_column(rows, &keys)
        .ok_or_else(|| WorkflowError::new("NO_DATE_COLUMN_CANDIDATE", "no column contained parseable dates"))?;
    let metric_key = detect_metric_column(rows, &keys, &date_key)?;

    let mut by_date: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for row in rows {
        let Some(date) = row.get(&date_key).and_then(value_as_date) else {
            continue;
        };
        let Some(value) = row.get(&metric_key).and_then(value_as_number) else {
            continue;
        };
        let entry = by_date.entry(date).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    let observations = by_date
        .into_iter()
        .map(|(date, (sum, count))| RawObservation {
            date,
            value: sum / count as f64,
            row_count: count,
        })
        .collect();

    Ok(ParsedDataset {
        metric_key: metric_key.clone(),
        metric_label: metric_label.to_string(),
        date_key,
        observations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_off_exchange_ratio_column_over_generic_volume() {
        let rows = vec![
            json!({"date": "2025-01-02", "off_exchange_ratio": 0.41, "total_volume": 1000}),
            json!({"date": "2025-01-03", "off_exchange_ratio": 0.44, "total_volume": 1200}),
        ];
        let dataset = parse_dataset(&rows, "Off-exchange ratio").unwrap();
        assert_eq!(dataset.metric_key, "off_exchange_ratio");
        assert_eq!(dataset.observations.len(), 2);
    }

    #[test]
    fn collapses_duplicate_dates_into_mean_with_row_count() {
        let rows = vec![
            json!({"date": "2025-01-02", "dark_pool_volume": 100}),
            json!({"date": "2025-01-02", "dark_pool_volume": 200}),
        ];
        let dataset = parse_dataset(&rows, "Dark pool volume").unwrap();
        assert_eq!(dataset.observations.len(), 1);
        assert_eq!(dataset.observations[0].value, 150.0);
        assert_eq!(dataset.observations[0].row_count, 2);
    }

    #[test]
    fn fails_loudly_when_no_metric_column_scores_above_zero() {
        let rows = vec![json!({"date": "2025-01-02", "name": "foo"})];
        let err = parse_dataset(&rows, "metric").unwrap_err();
        assert_eq!(err.code, "NO_METRIC_COLUMN_CANDIDATE");
    }

    #[test]
    fn observations_are_sorted_chronologically() {
        let rows = vec![
            json!({"date": "2025-01-05", "dark_pool_ratio": 0.5}),
            json!({"date": "2025-01-02", "dark_pool_ratio": 0.4}),
        ];
        let dataset = parse_dataset(&rows, "Dark pool ratio").unwrap();
        assert!(dataset.observations[0].date < dataset.observations[1].date);
    }
}
