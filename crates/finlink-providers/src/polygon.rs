use std::sync::Arc;

use async_trait::async_trait;
use finlink_core::{
    Attribution, CancelSignal, FinanceData, FinanceResult, FundamentalsData, Intent,
    MetricDerivation, MetricPeriod, MetricValue, NewsData, NewsItem, NormalizedQuery, Provider,
    ProviderError, ProviderErrorCode, QuoteData,
};
use reqwest::Client;
use serde_json::Value;
use tokio::sync::Semaphore;

use crate::ratelimit::RateLimiter;
use crate::support::{fetch_json, num, text};

const SOURCE: &str = "polygon";
const BASE: &str = "https://api.polygon.io";

/// `Polygon.io` adapter: quote (previous-close aggregate), fundamentals
/// (ticker details) and news (`/v2/reference/news`). Concurrency- and
/// rate-limited with a semaphore plus a sliding-window limiter, since
/// Polygon's higher request ceiling still needs retry-on-429 discipline
/// under sustained federated fan-out.
pub struct PolygonProvider {
    client: Client,
    api_key: Option<String>,
    semaphore: Arc<Semaphore>,
    limiter: RateLimiter,
}

impl PolygonProvider {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            semaphore: Arc::new(Semaphore::new(8)),
            limiter: RateLimiter::new(90),
        }
    }

    fn with_key(&self, url: &str) -> String {
        let sep = if url.contains('?') { "&" } else { "?" };
        format!("{url}{sep}apiKey={}", self.api_key.as_deref().unwrap_or(""))
    }

    async fn request(&self, url: &str, signal: &CancelSignal) -> Result<Value, ProviderError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| ProviderError::new(SOURCE, "semaphore closed", ProviderErrorCode::Network))?;
        self.limiter.acquire().await;
        fetch_json(&self.client, SOURCE, &self.with_key(url), signal).await
    }

    fn parse_quote(&self, body: Value, ticker: &str) -> Result<QuoteData, ProviderError> {
        let row = body
            .get("results")
            .and_then(Value::as_array)
            .and_then(|rows| rows.first())
            .ok_or_else(|| ProviderError::new(SOURCE, "no aggregate bar for ticker", ProviderErrorCode::ProviderError))?;

        let close = num(row, "c");
        let open = num(row, "o");
        let change = close.zip(open).map(|(c, o)| c - o);
        let change_percent = change.zip(open).map(|(chg, o)| if o != 0.0 { chg / o * 100.0 } else { f64::NAN });

        Ok(QuoteData {
            symbol: ticker.to_uppercase(),
            price: close,
            currency: "USD".to_string(),
            previous_close: open,
            change,
            change_percent,
            market_cap: None,
            high_52w: num(row, "h"),
            low_52w: num(row, "l"),
            ytd_return_percent: None,
        })
    }

    fn parse_fundamentals(&self, body: Value, ticker: &str) -> FundamentalsData {
        let result = body.get("results").cloned().unwrap_or_default();
        let metric = |value: Option<f64>| MetricValue {
            value,
            period: if value.is_some() { MetricPeriod::Ttm } else { MetricPeriod::Unknown },
            derivation: MetricDerivation::Reported,
        };

        let mut data = FundamentalsData::empty(ticker);
        data.metrics.revenue = metric(None);
        data.metrics.net_income = metric(None);
        data.metrics.gross_margin_pct = metric(None);
        data.metrics.debt_to_equity = metric(None);
        data.metrics.roe_pct = metric(None);
        data.metrics.operating_margin_pct = metric(None);
        data.metrics.free_cash_flow = metric(None);
        data.market_cap = num(&result, "market_cap");
        data.sector = result
            .get("sic_description")
            .and_then(Value::as_str)
            .map(str::to_string);
        data.headquarters = result.get("address").and_then(|a| text(a, "city"));
        data.website = text(&result, "homepage_url");
        data.icon_url = result.get("branding").and_then(|b| text(b, "icon_url"));
        data.period = MetricPeriod::Ttm;
        data
    }

    fn parse_news(&self, body: Value, ticker: &str, limit: usize) -> NewsData {
        let items = body.get("results").and_then(Value::as_array).cloned().unwrap_or_default();
        let mut news = NewsData::empty(ticker);
        news.items = items
            .into_iter()
            .filter_map(|row| {
                let published_at = text(&row, "published_utc").and_then(|raw| raw.parse::<chrono::DateTime<chrono::Utc>>().ok())?;
                Some(NewsItem {
                    title: text(&row, "title")?,
                    source: row.get("publisher").and_then(|p| text(p, "name")).unwrap_or_else(|| SOURCE.to_string()),
                    published_at,
                    url: text(&row, "article_url")?,
                    summary: text(&row, "description"),
                    sentiment: None,
                })
            })
            .take(limit.max(1))
            .collect();
        news
    }
}

#[async_trait]
impl Provider for PolygonProvider {
    fn id(&self) -> &str {
        SOURCE
    }

    fn display_name(&self) -> &str {
        "Polygon.io"
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
                let url = format!("{BASE}/v2/aggs/ticker/{}/prev", query.ticker);
                FinanceData::Quote(self.parse_quote(self.request(&url, cancel).await?, &query.ticker)?)
            }
            Intent::Fundamentals => {
                let url = format!("{BASE}/v3/reference/tickers/{}", query.ticker);
                FinanceData::Fundamentals(self.parse_fundamentals(self.request(&url, cancel).await?, &query.ticker))
            }
            Intent::News => {
                let url = format!("{BASE}/v2/reference/news?ticker={}&limit={}", query.ticker, query.limit);
                FinanceData::News(self.parse_news(self.request(&url, cancel).await?, &query.ticker, query.limit as usize))
            }
            other => return Err(ProviderError::new(SOURCE, format!("unsupported intent: {other}"), ProviderErrorCode::Unsupported)),
        };

        Ok(FinanceResult {
            source: SOURCE.to_string(),
            timestamp: chrono::Utc::now(),
            attribution: vec![Attribution {
                publisher: "Polygon.io".to_string(),
                domain: "polygon.io".to_string(),
                url: "https://polygon.io".to_string(),
            }],
            data,
            errors: Vec::new(),
        })
    }
}
