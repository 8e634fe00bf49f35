use async_trait::async_trait;
use finlink_core::{
    Attribution, CancelSignal, FilingEntry, FilingsData, FinanceData, FinanceResult,
    FundamentalsData, Intent, MetricDerivation, MetricPeriod, MetricValue, NormalizedQuery,
    Provider, ProviderError, ProviderErrorCode,
};
use reqwest::Client;
use serde_json::Value;

use crate::support::{fetch_json, num, text};

const SOURCE: &str = "quartr";
const BASE: &str = "https://api.quartr.com/public/v1";

/// `Quartr` adapter: earnings-call and investor-material coverage. Modeled
/// as fundamentals (company overview) and filings (earnings documents, since
/// Quartr's catalogue of transcripts/decks maps naturally onto the filings
/// envelope shape).
pub struct QuartrProvider {
    client: Client,
    api_key: Option<String>,
}

impl QuartrProvider {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }

    fn key(&self) -> &str {
        self.api_key.as_deref().unwrap_or("")
    }

    async fn request(&self, url: &str, signal: &CancelSignal) -> Result<Value, ProviderError> {
        fetch_json(&self.client, SOURCE, url, signal).await
    }

    fn parse_fundamentals(&self, body: Value, ticker: &str) -> FundamentalsData {
        let metric = |value: Option<f64>| MetricValue {
            value,
            period: if value.is_some() { MetricPeriod::Fy } else { MetricPeriod::Unknown },
            derivation: MetricDerivation::Reported,
        };

        let mut data = FundamentalsData::empty(ticker);
        data.metrics.revenue = metric(num(&body, "revenue"));
        data.metrics.net_income = metric(num(&body, "netIncome"));
        data.sector = text(&body, "sector");
        data.headquarters = text(&body, "country");
        data.website = text(&body, "website");
        data.icon_url = text(&body, "logoUrl");
        data.period = MetricPeriod::Fy;
        data
    }

    fn parse_documents(&self, body: Value, ticker: &str, limit: usize) -> FilingsData {
        let rows = body.get("documents").and_then(Value::as_array).cloned().unwrap_or_default();
        let mut data = FilingsData::empty(ticker);
        data.filings = rows
            .into_iter()
            .filter_map(|row| {
                Some(FilingEntry {
                    form: text(&row, "type").unwrap_or_else(|| "earnings-material".to_string()),
                    accession_number: text(&row, "id"),
                    filing_date: text(&row, "publishedAt")?,
                    report_date: text(&row, "periodEndDate"),
                    url: text(&row, "url")?,
                    summary: text(&row, "title"),
                })
            })
            .take(limit.max(1))
            .collect();
        data
    }
}

#[async_trait]
impl Provider for QuartrProvider {
    fn id(&self) -> &str {
        SOURCE
    }

    fn display_name(&self) -> &str {
        "Quartr"
    }

    fn supports(&self, intent: Intent) -> bool {
        matches!(intent, Intent::Fundamentals | Intent::Filings)
    }

    fn enabled(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    async fn fetch(&self, query: &NormalizedQuery, cancel: &CancelSignal) -> Result<FinanceResult, ProviderError> {
        if self.api_key.is_none() {
            return Err(ProviderError::new(SOURCE, "missing API key", ProviderErrorCode::MissingAuth));
        }

        let data = match query.intent {
            Intent::Fundamentals => {
                let url = format!("{BASE}/companies/{}?apikey={}", query.ticker, self.key());
                FinanceData::Fundamentals(self.parse_fundamentals(self.request(&url, cancel).await?, &query.ticker))
            }
            Intent::Filings => {
                let url = format!("{BASE}/companies/{}/documents?apikey={}", query.ticker, self.key());
                FinanceData::Filings(self.parse_documents(self.request(&url, cancel).await?, &query.ticker, query.limit as usize))
            }
            other => return Err(ProviderError::new(SOURCE, format!("unsupported intent: {other}"), ProviderErrorCode::Unsupported)),
        };

        Ok(FinanceResult {
            source: SOURCE.to_string(),
            timestamp: chrono::Utc::now(),
            attribution: vec![Attribution {
                publisher: "Quartr".to_string(),
                domain: "quartr.com".to_string(),
                url: "https://quartr.com".to_string(),
            }],
            data,
            errors: Vec::new(),
        })
    }
}
