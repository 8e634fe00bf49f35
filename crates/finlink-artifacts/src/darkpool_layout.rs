use std::path::PathBuf;

use chrono::NaiveDate;

/// Resolves the output root for one darkpool-anomaly run:
/// `reports/<ticker-or-portfolio>/<date>/darkpool-anomaly/`.
pub fn run_output_root(reports_root: &std::path::Path, scope: &str, run_date: NaiveDate) -> PathBuf {
    reports_root.join(scope).join(run_date.format("%Y-%m-%d").to_string()).join("darkpool-anomaly")
}

pub const REPORT_MD: &str = "report.md";
pub const DASHBOARD_MD: &str = "dashboard.md";
pub const ASSUMPTIONS_JSON: &str = "assumptions.json";
pub const EVIDENCE_MD: &str = "evidence.md";
pub const EVIDENCE_JSON: &str = "evidence.json";

/// The `evidence.json` schema: the cross-run transition
/// contract. Any implementation reading back `anomalies` from a prior
/// version must be able to parse this shape, so field names and casing are
/// load-bearing, not cosmetic.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EvidenceDocument {
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub mode: String,
    pub tier: String,
    pub lookback_days: u32,
    pub min_samples: u32,
    pub threshold: f64,
    pub tickers: Vec<String>,
    pub anomalies: Vec<finlink_darkpool::AnomalyRecord>,
    pub transitions: Vec<finlink_darkpool::TransitionRecord>,
    pub historical: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_output_root_matches_spec_layout() {
        let root = run_output_root(std::path::Path::new("reports"), "AAPL", NaiveDate::from_ymd_opt(2025, 1, 4).unwrap());
        assert_eq!(root, PathBuf::from("reports/AAPL/2025-01-04/darkpool-anomaly"));
    }

    #[test]
    fn evidence_document_round_trips_through_json() {
        let doc = EvidenceDocument {
            generated_at: chrono::Utc::now(),
            mode: "default".to_string(),
            tier: "hobbyist".to_string(),
            lookback_days: 14,
            min_samples: 5,
            threshold: 2.5,
            tickers: vec!["AAPL".to_string()],
            anomalies: Vec::new(),
            transitions: Vec::new(),
            historical: Vec::new(),
        };
        let raw = serde_json::to_string(&doc).unwrap();
        let parsed: EvidenceDocument = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.tickers, doc.tickers);
    }
}
