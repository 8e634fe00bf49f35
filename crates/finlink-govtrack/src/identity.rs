use sha2::{Digest, Sha256};

use crate::types::GovTradeEvent;

/// Stable hash over the identity tuple `(actor, ticker, transaction_date,
/// transaction_type, amount)`. Amount is quantized to cents
/// before hashing so float jitter in upstream feeds can't split one
/// logical disclosure into two identities.
pub fn identity_key(event: &GovTradeEvent) -> String {
    let (actor, ticker, transaction_date, transaction_type, amount_cents) = event.identity_tuple();

    let mut hasher = Sha256::new();
    hasher.update(actor.as_bytes());
    hasher.update(b"|");
    hasher.update(ticker.to_uppercase().as_bytes());
    hasher.update(b"|");
    hasher.update(transaction_date.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(format!("{transaction_type:?}").as_bytes());
    hasher.update(b"|");
    hasher.update(amount_cents.map(|a| a.to_string()).unwrap_or_default().as_bytes());
    let digest = hasher.finalize();

    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use finlink_core::TransactionType;

    fn event(shares: Option<f64>, report_date: Option<&str>) -> GovTradeEvent {
        GovTradeEvent {
            actor: "Jane Doe".to_string(),
            ticker: "AAPL".to_string(),
            transaction_date: NaiveDate::parse_from_str("2025-01-03", "%Y-%m-%d").unwrap(),
            transaction_type: TransactionType::Buy,
            amount: Some(15_000.0),
            shares,
            report_date: report_date.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
            asset_description: None,
        }
    }

    #[test]
    fn identity_ignores_non_identity_fields() {
        let a = event(Some(100.0), Some("2025-01-10"));
        let b = event(Some(150.0), Some("2025-01-15"));
        assert_eq!(identity_key(&a), identity_key(&b));
    }

    #[test]
    fn identity_differs_on_amount() {
        let mut a = event(None, None);
        let mut b = a.clone();
        b.amount = Some(20_000.0);
        a.ticker = a.ticker.clone();
        assert_ne!(identity_key(&a), identity_key(&b));
    }

    #[test]
    fn identity_is_case_insensitive_on_ticker() {
        let mut a = event(None, None);
        let mut b = a.clone();
        a.ticker = "aapl".to_string();
        b.ticker = "AAPL".to_string();
        assert_eq!(identity_key(&a), identity_key(&b));
    }
}
