use async_trait::async_trait;
use finlink_core::{
    Attribution, CancelSignal, FilingEntry, FilingsData, FinanceData, FinanceResult,
    FundamentalsData, Intent, MetricDerivation, MetricPeriod, MetricValue, NormalizedQuery,
    Provider, ProviderError, ProviderErrorCode, QuoteData,
};
use reqwest::Client;
use serde_json::Value;

use crate::ratelimit::RateLimiter;
use crate::support::{fetch_json, num, text};

const SOURCE: &str = "fmp";
const BASE: &str = "https://financialmodelingprep.com/api/v3";

/// `Financial Modeling Prep` adapter: quote (`/quote`), fundamentals
/// (`/profile` + `/ratios-ttm`), filings (`/sec_filings`).
pub struct FmpProvider {
    client: Client,
    api_key: Option<String>,
    limiter: RateLimiter,
}

impl FmpProvider {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self { client, api_key, limiter: RateLimiter::new(20) }
    }

    fn key(&self) -> &str {
        self.api_key.as_deref().unwrap_or("")
    }

    async fn request(&self, url: &str, signal: &CancelSignal) -> Result<Value, ProviderError> {
        self.limiter.acquire().await;
        fetch_json(&self.client, SOURCE, url, signal).await
    }

    fn parse_quote(&self, body: Value, ticker: &str) -> Result<QuoteData, ProviderError> {
        let row = body
            .as_array()
            .and_then(|rows| rows.first())
            .ok_or_else(|| ProviderError::new(SOURCE, "no quote row for ticker", ProviderErrorCode::ProviderError))?;

        Ok(QuoteData {
            symbol: ticker.to_uppercase(),
            price: num(row, "price"),
            currency: "USD".to_string(),
            previous_close: num(row, "previousClose"),
            change: num(row, "change"),
            change_percent: num(row, "changesPercentage"),
            market_cap: num(row, "marketCap"),
            high_52w: num(row, "yearHigh"),
            low_52w: num(row, "yearLow"),
            ytd_return_percent: None,
        })
    }

    fn parse_fundamentals(&self, profile: Value, ratios: Value, ticker: &str) -> FundamentalsData {
        let profile_row = profile.as_array().and_then(|rows| rows.first()).cloned().unwrap_or_default();
        let ratios_row = ratios.as_array().and_then(|rows| rows.first()).cloned().unwrap_or_default();

        let metric = |value: Option<f64>| MetricValue {
            value,
            period: if value.is_some() { MetricPeriod::Ttm } else { MetricPeriod::Unknown },
            derivation: MetricDerivation::Reported,
        };

        let mut data = FundamentalsData::empty(ticker);
        data.metrics.revenue = metric(None);
        data.metrics.net_income = metric(None);
        data.metrics.gross_margin_pct = metric(num(&ratios_row, "grossProfitMarginTTM").map(|v| v * 100.0));
        data.metrics.debt_to_equity = metric(num(&ratios_row, "debtEquityRatioTTM"));
        data.metrics.roe_pct = metric(num(&ratios_row, "returnOnEquityTTM").map(|v| v * 100.0));
        data.metrics.operating_margin_pct = metric(num(&ratios_row, "operatingProfitMarginTTM").map(|v| v * 100.0));
        data.metrics.free_cash_flow = metric(None);
        data.market_cap = num(&profile_row, "mktCap");
        data.sector = text(&profile_row, "sector");
        data.headquarters = text(&profile_row, "address").or_else(|| text(&profile_row, "city"));
        data.website = text(&profile_row, "website");
        data.icon_url = text(&profile_row, "image");
        data.period = MetricPeriod::Ttm;
        data
    }

    fn parse_filings(&self, body: Value, ticker: &str, limit: usize) -> FilingsData {
        let rows = body.as_array().cloned().unwrap_or_default();
        let mut data = FilingsData::empty(ticker);
        data.filings = rows
            .into_iter()
            .filter_map(|row| {
                Some(FilingEntry {
                    form: text(&row, "type")?,
                    accession_number: text(&row, "cik"),
                    filing_date: text(&row, "fillingDate").or_else(|| text(&row, "acceptedDate"))?,
                    report_date: text(&row, "acceptedDate"),
                    url: text(&row, "finalLink").or_else(|| text(&row, "link"))?,
                    summary: None,
                })
            })
            .take(limit.max(1))
            .collect();
        data
    }
}

#[async_trait]
impl Provider for FmpProvider {
    fn id(&self) -> &str {
        SOURCE
    }

    fn display_name(&self) -> &str {
        "Financial Modeling Prep"
    }

    fn supports(&self, intent: Intent) -> bool {
        matches!(intent, Intent::Quote | Intent::Fundamentals | Intent::Filings)
    }

    fn enabled(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    async fn fetch(&self, query: &NormalizedQuery, cancel: &CancelSignal) -> Result<FinanceResult, ProviderError> {
        if self.api_key.is_none() {
            return Err(ProviderError::new(SOURCE, "missing API key", ProviderErrorCode::MissingAuth));
        }

        let data = match query.intent {
            Intent::Quote => {
                let url = format!("{BASE}/quote/{}?apikey={}", query.ticker, self.key());
                FinanceData::Quote(self.parse_quote(self.request(&url, cancel).await?, &query.ticker)?)
            }
            Intent::Fundamentals => {
                let profile_url = format!("{BASE}/profile/{}?apikey={}", query.ticker, self.key());
                let ratios_url = format!("{BASE}/ratios-ttm/{}?apikey={}", query.ticker, self.key());
                let profile = self.request(&profile_url, cancel).await?;
                let ratios = self.request(&ratios_url, cancel).await?;
                FinanceData::Fundamentals(self.parse_fundamentals(profile, ratios, &query.ticker))
            }
            Intent::Filings => {
                let url = format!(
                    "{BASE}/sec_filings/{}?page=0&type={}&apikey={}",
                    query.ticker,
                    query.form.as_deref().unwrap_or(""),
                    self.key()
                );
                FinanceData::Filings(self.parse_filings(self.request(&url, cancel).await?, &query.ticker, query.limit as usize))
            }
            other => return Err(ProviderError::new(SOURCE, format!("unsupported intent: {other}"), ProviderErrorCode::Unsupported)),
        };

        Ok(FinanceResult {
            source: SOURCE.to_string(),
            timestamp: chrono::Utc::now(),
            attribution: vec![Attribution {
                publisher: "Financial Modeling Prep".to_string(),
                domain: "financialmodelingprep.com".to_string(),
                url: "https://financialmodelingprep.com".to_string(),
            }],
            data,
            errors: Vec::new(),
        })
    }
}
