use async_trait::async_trait;
use finlink_core::{
    Attribution, CancelSignal, FilingEntry, FilingsData, FinanceData, FinanceResult, Intent,
    NormalizedQuery, Provider, ProviderError, ProviderErrorCode,
};
use reqwest::Client;
use serde_json::Value;

use crate::support::{fetch_json, text};

const SOURCE: &str = "sec_edgar";

/// `SEC EDGAR` adapter, filings only. EDGAR requires a descriptive
/// `User-Agent` identity rather than an API key — read from
/// `SEC_EDGAR_IDENTITY`/`SEC_API_USER_AGENT` — so `enabled()` checks for
/// that identity string instead of a secret.
pub struct SecEdgarProvider {
    client: Client,
    identity: Option<String>,
}

impl SecEdgarProvider {
    pub fn new(client: Client, identity: Option<String>) -> Self {
        Self { client, identity }
    }

    /// CIK lookup then filing index; EDGAR's full-text and submissions APIs
    /// are both keyed by a zero-padded 10-digit CIK, which the ticker lookup
    /// resolves first.
    async fn resolve_cik(&self, ticker: &str, signal: &CancelSignal) -> Result<String, ProviderError> {
        let body = fetch_json(&self.client, SOURCE, "https://www.sec.gov/files/company_tickers.json", signal).await?;
        let entries = body.as_object().ok_or_else(|| ProviderError::new(SOURCE, "unexpected company_tickers shape", ProviderErrorCode::ProviderError))?;

        entries
            .values()
            .find(|row| text(row, "ticker").as_deref() == Some(&ticker.to_uppercase()))
            .and_then(|row| row.get("cik_str"))
            .and_then(Value::as_u64)
            .map(|cik| format!("{cik:010}"))
            .ok_or_else(|| ProviderError::new(SOURCE, format!("no CIK found for {ticker}"), ProviderErrorCode::ProviderError))
    }

    fn parse_filings(&self, body: Value, ticker: &str, form_filter: Option<&str>, limit: usize) -> FilingsData {
        let recent = body
            .get("filings")
            .and_then(|f| f.get("recent"))
            .cloned()
            .unwrap_or_default();

        let forms = recent.get("form").and_then(Value::as_array).cloned().unwrap_or_default();
        let dates = recent.get("filingDate").and_then(Value::as_array).cloned().unwrap_or_default();
        let report_dates = recent.get("reportDate").and_then(Value::as_array).cloned().unwrap_or_default();
        let accessions = recent.get("accessionNumber").and_then(Value::as_array).cloned().unwrap_or_default();
        let docs = recent.get("primaryDocument").and_then(Value::as_array).cloned().unwrap_or_default();

        let mut data = FilingsData::empty(ticker);
        data.filings = forms
            .iter()
            .enumerate()
            .filter_map(|(i, form)| {
                let form = form.as_str()?.to_string();
                if let Some(filter) = form_filter {
                    if !filter.is_empty() && form != filter {
                        return None;
                    }
                }
                let accession = accessions.get(i).and_then(Value::as_str)?.to_string();
                let accession_no_dashes = accession.replace('-', "");
                let doc = docs.get(i).and_then(Value::as_str).unwrap_or_default();
                Some(FilingEntry {
                    accession_number: Some(accession.clone()),
                    filing_date: dates.get(i).and_then(Value::as_str)?.to_string(),
                    report_date: report_dates.get(i).and_then(Value::as_str).map(str::to_string),
                    url: format!("https://www.sec.gov/Archives/edgar/data/{accession_no_dashes}/{doc}"),
                    summary: None,
                    form,
                })
            })
            .take(limit.max(1))
            .collect();
        data
    }
}

#[async_trait]
impl Provider for SecEdgarProvider {
    fn id(&self) -> &str {
        SOURCE
    }

    fn display_name(&self) -> &str {
        "SEC EDGAR"
    }

    fn supports(&self, intent: Intent) -> bool {
        matches!(intent, Intent::Filings)
    }

    fn enabled(&self) -> bool {
        self.identity.as_deref().is_some_and(|id| !id.is_empty())
    }

    async fn fetch(&self, query: &NormalizedQuery, cancel: &CancelSignal) -> Result<FinanceResult, ProviderError> {
        if !matches!(query.intent, Intent::Filings) {
            return Err(ProviderError::new(SOURCE, format!("unsupported intent: {}", query.intent), ProviderErrorCode::Unsupported));
        }
        if self.identity.is_none() {
            return Err(ProviderError::new(SOURCE, "missing SEC identity header", ProviderErrorCode::MissingAuth));
        }

        let cik = self.resolve_cik(&query.ticker, cancel).await?;
        let url = format!("https://data.sec.gov/submissions/CIK{cik}.json");
        let body = fetch_json(&self.client, SOURCE, &url, cancel).await?;
        let data = FinanceData::Filings(self.parse_filings(body, &query.ticker, query.form.as_deref(), query.limit as usize));

        Ok(FinanceResult {
            source: SOURCE.to_string(),
            timestamp: chrono::Utc::now(),
            attribution: vec![Attribution {
                publisher: "U.S. Securities and Exchange Commission".to_string(),
                domain: "sec.gov".to_string(),
                url: "https://www.sec.gov/edgar".to_string(),
            }],
            data,
            errors: Vec::new(),
        })
    }
}
