use async_trait::async_trait;
use finlink_core::{
    Attribution, CancelSignal, FinanceData, FinanceResult, FundamentalsData, Intent,
    MetricDerivation, MetricPeriod, MetricValue, NewsData, NewsItem, NormalizedQuery, Provider,
    ProviderError, ProviderErrorCode, QuoteData,
};
use reqwest::Client;
use serde_json::Value;

use crate::ratelimit::RateLimiter;
use crate::support::{fetch_json, text};

const SOURCE: &str = "alphavantage";
const BASE: &str = "https://www.alphavantage.co/query";

/// `AlphaVantage` adapter: quote (`GLOBAL_QUOTE`), fundamentals (`OVERVIEW`)
/// and news (`NEWS_SENTIMENT`). Rate-limited to the lighter single-slot
/// policy Alpha Vantage's free tier enforces.
pub struct AlphaVantageProvider {
    client: Client,
    api_key: Option<String>,
    limiter: RateLimiter,
}

impl AlphaVantageProvider {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self { client, api_key, limiter: RateLimiter::new(5) }
    }

    fn url(&self, function: &str, ticker: &str) -> String {
        format!(
            "{BASE}?function={function}&symbol={ticker}&apikey={}",
            self.api_key.as_deref().unwrap_or("")
        )
    }

    fn tickers_url(&self, function: &str, ticker: &str) -> String {
        format!(
            "{BASE}?function={function}&tickers={ticker}&apikey={}",
            self.api_key.as_deref().unwrap_or("")
        )
    }

    async fn request(&self, url: &str, signal: &CancelSignal) -> Result<Value, ProviderError> {
        self.limiter.acquire().await;
        fetch_json(&self.client, SOURCE, url, signal).await
    }

    fn parse_quote(&self, body: Value, ticker: &str) -> Result<QuoteData, ProviderError> {
        let row = body
            .get("Global Quote")
            .ok_or_else(|| ProviderError::new(SOURCE, "missing Global Quote payload", ProviderErrorCode::ProviderError))?;

        let parse_num = |key: &str| row.get(key).and_then(Value::as_str).and_then(|s| s.parse::<f64>().ok());
        let parse_pct = |key: &str| {
            row.get(key)
                .and_then(Value::as_str)
                .and_then(|s| s.trim_end_matches('%').parse::<f64>().ok())
        };

        Ok(QuoteData {
            symbol: ticker.to_uppercase(),
            price: parse_num("05. price"),
            currency: "USD".to_string(),
            previous_close: parse_num("08. previous close"),
            change: parse_num("09. change"),
            change_percent: parse_pct("10. change percent"),
            market_cap: None,
            high_52w: None,
            low_52w: None,
            ytd_return_percent: None,
        })
    }

    fn parse_overview(&self, body: Value, ticker: &str) -> FundamentalsData {
        let parse_num = |key: &str| body.get(key).and_then(Value::as_str).and_then(|s| s.parse::<f64>().ok());
        let metric = |value: Option<f64>| MetricValue {
            value,
            period: if value.is_some() { MetricPeriod::Ttm } else { MetricPeriod::Unknown },
            derivation: MetricDerivation::Reported,
        };

        let mut data = FundamentalsData::empty(ticker);
        data.metrics.revenue = metric(parse_num("RevenueTTM"));
        data.metrics.net_income = metric(parse_num("NetIncomeTTM"));
        data.metrics.gross_margin_pct = metric(parse_num("GrossProfitTTM").zip(parse_num("RevenueTTM")).map(|(gp, rev)| {
            if rev != 0.0 {
                gp / rev * 100.0
            } else {
                f64::NAN
            }
        }));
        data.metrics.debt_to_equity = metric(None);
        data.metrics.roe_pct = metric(parse_num("ReturnOnEquityTTM").map(|v| v * 100.0));
        data.metrics.operating_margin_pct = metric(parse_num("OperatingMarginTTM").map(|v| v * 100.0));
        data.metrics.free_cash_flow = metric(None);
        data.market_cap = parse_num("MarketCapitalization");
        data.sector = text(&body, "Sector");
        data.headquarters = text(&body, "Address");
        data.website = text(&body, "OfficialSite");
        data.period = MetricPeriod::Ttm;
        data
    }

    fn parse_news(&self, body: Value, ticker: &str, limit: usize) -> NewsData {
        let items = body.get("feed").and_then(Value::as_array).cloned().unwrap_or_default();
        let mut news = NewsData::empty(ticker);
        news.items = items
            .into_iter()
            .filter_map(|row| {
                let published_at = text(&row, "time_published")
                    .and_then(|raw| chrono::NaiveDateTime::parse_from_str(&raw, "%Y%m%dT%H%M%S").ok())
                    .map(|naive| naive.and_utc())?;
                Some(NewsItem {
                    title: text(&row, "title")?,
                    source: text(&row, "source").unwrap_or_else(|| SOURCE.to_string()),
                    published_at,
                    url: text(&row, "url")?,
                    summary: text(&row, "summary"),
                    sentiment: row.get("overall_sentiment_score").and_then(Value::as_f64),
                })
            })
            .take(limit.max(1))
            .collect();
        news
    }
}

#[async_trait]
impl Provider for AlphaVantageProvider {
    fn id(&self) -> &str {
        SOURCE
    }

    fn display_name(&self) -> &str {
        "Alpha Vantage"
    }

    fn supports(&self, intent: Intent) -> bool {
        matches!(intent, Intent::Quote | Intent::Fundamentals | Intent::News)
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
                let body = self.request(&self.url("GLOBAL_QUOTE", &query.ticker), cancel).await?;
                FinanceData::Quote(self.parse_quote(body, &query.ticker)?)
            }
            Intent::Fundamentals => {
                let body = self.request(&self.url("OVERVIEW", &query.ticker), cancel).await?;
                FinanceData::Fundamentals(self.parse_overview(body, &query.ticker))
            }
            Intent::News => {
                let body = self.request(&self.tickers_url("NEWS_SENTIMENT", &query.ticker), cancel).await?;
                FinanceData::News(self.parse_news(body, &query.ticker, query.limit as usize))
            }
            other => return Err(ProviderError::new(SOURCE, format!("unsupported intent: {other}"), ProviderErrorCode::Unsupported)),
        };

        Ok(FinanceResult {
            source: SOURCE.to_string(),
            timestamp: chrono::Utc::now(),
            attribution: vec![Attribution {
                publisher: "Alpha Vantage".to_string(),
                domain: "alphavantage.co".to_string(),
                url: "https://www.alphavantage.co".to_string(),
            }],
            data,
            errors: Vec::new(),
        })
    }
}
