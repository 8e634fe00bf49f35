use async_trait::async_trait;
use finlink_core::{
    Attribution, CancelSignal, FinanceData, FinanceResult, FundamentalsData, Intent,
    MetricDerivation, MetricPeriod, MetricValue, NewsData, NewsItem, NormalizedQuery, Provider,
    ProviderError, ProviderErrorCode, QuoteData,
};
use reqwest::Client;
use serde_json::Value;

use crate::ratelimit::RateLimiter;
use crate::support::{fetch_json, num, text};

const SOURCE: &str = "finnhub";
const BASE: &str = "https://finnhub.io/api/v1";

/// `Finnhub` adapter: quote (`/quote`), fundamentals (`/stock/profile2` +
/// `/stock/metric`) and news (`/company-news`).
pub struct FinnhubProvider {
    client: Client,
    api_key: Option<String>,
    limiter: RateLimiter,
}

impl FinnhubProvider {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self { client, api_key, limiter: RateLimiter::new(30) }
    }

    fn key(&self) -> &str {
        self.api_key.as_deref().unwrap_or("")
    }

    async fn request(&self, url: &str, signal: &CancelSignal) -> Result<Value, ProviderError> {
        self.limiter.acquire().await;
        fetch_json(&self.client, SOURCE, url, signal).await
    }

    fn parse_quote(&self, body: Value, ticker: &str) -> QuoteData {
        let price = num(&body, "c");
        let previous_close = num(&body, "pc");
        let change_percent = num(&body, "dp");

        QuoteData {
            symbol: ticker.to_uppercase(),
            price,
            currency: "USD".to_string(),
            previous_close,
            change: num(&body, "d"),
            change_percent,
            market_cap: None,
            high_52w: None,
            low_52w: None,
            ytd_return_percent: None,
        }
    }

    fn parse_fundamentals(&self, profile: Value, metrics: Value, ticker: &str) -> FundamentalsData {
        let series = metrics.get("metric").cloned().unwrap_or_default();
        let metric = |value: Option<f64>| MetricValue {
            value,
            period: if value.is_some() { MetricPeriod::Ttm } else { MetricPeriod::Unknown },
            derivation: MetricDerivation::Reported,
        };

        let mut data = FundamentalsData::empty(ticker);
        data.metrics.revenue = metric(num(&series, "revenuePerShareTTM"));
        data.metrics.net_income = metric(None);
        data.metrics.gross_margin_pct = metric(num(&series, "grossMarginTTM"));
        data.metrics.debt_to_equity = metric(num(&series, "totalDebt/totalEquityQuarterly"));
        data.metrics.roe_pct = metric(num(&series, "roeTTM"));
        data.metrics.operating_margin_pct = metric(num(&series, "operatingMarginTTM"));
        data.metrics.free_cash_flow = metric(None);
        data.market_cap = num(&profile, "marketCapitalization");
        data.sector = text(&profile, "finnhubIndustry");
        data.headquarters = text(&profile, "country");
        data.website = text(&profile, "weburl");
        data.icon_url = text(&profile, "logo");
        data.period = MetricPeriod::Ttm;
        data
    }

    fn parse_news(&self, body: Value, ticker: &str, limit: usize) -> NewsData {
        let items = body.as_array().cloned().unwrap_or_default();
        let mut news = NewsData::empty(ticker);
        news.items = items
            .into_iter()
            .filter_map(|row| {
                let published_at = row.get("datetime").and_then(Value::as_i64).and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))?;
                Some(NewsItem {
                    title: text(&row, "headline")?,
                    source: text(&row, "source").unwrap_or_else(|| SOURCE.to_string()),
                    published_at,
                    url: text(&row, "url")?,
                    summary: text(&row, "summary"),
                    sentiment: None,
                })
            })
            .take(limit.max(1))
            .collect();
        news
    }
}

#[async_trait]
impl Provider for FinnhubProvider {
    fn id(&self) -> &str {
        SOURCE
    }

    fn display_name(&self) -> &str {
        "Finnhub"
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
                let url = format!("{BASE}/quote?symbol={}&token={}", query.ticker, self.key());
                FinanceData::Quote(self.parse_quote(self.request(&url, cancel).await?, &query.ticker))
            }
            Intent::Fundamentals => {
                let profile_url = format!("{BASE}/stock/profile2?symbol={}&token={}", query.ticker, self.key());
                let metric_url = format!("{BASE}/stock/metric?symbol={}&metric=all&token={}", query.ticker, self.key());
                let profile = self.request(&profile_url, cancel).await?;
                let metrics = self.request(&metric_url, cancel).await?;
                FinanceData::Fundamentals(self.parse_fundamentals(profile, metrics, &query.ticker))
            }
            Intent::News => {
                let now = chrono::Utc::now().date_naive();
                let from = now - chrono::Duration::days(30);
                let url = format!(
                    "{BASE}/company-news?symbol={}&from={from}&to={now}&token={}",
                    query.ticker,
                    self.key()
                );
                FinanceData::News(self.parse_news(self.request(&url, cancel).await?, &query.ticker, query.limit as usize))
            }
            other => return Err(ProviderError::new(SOURCE, format!("unsupported intent: {other}"), ProviderErrorCode::Unsupported)),
        };

        Ok(FinanceResult {
            source: SOURCE.to_string(),
            timestamp: chrono::Utc::now(),
            attribution: vec![Attribution {
                publisher: "Finnhub".to_string(),
                domain: "finnhub.io".to_string(),
                url: "https://finnhub.io".to_string(),
            }],
            data,
            errors: Vec::new(),
        })
    }
}
