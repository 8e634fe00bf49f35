use async_trait::async_trait;
use finlink_core::{
    AnalystRatings, CancelSignal, FinanceData, FinanceResult, FundamentalsData, Intent,
    MetricDerivation, MetricPeriod, MetricValue, NewsData, NewsItem, NormalizedQuery, Provider,
    ProviderError, ProviderErrorCode, QuoteData,
};
use reqwest::Client;
use serde_json::Value;

use crate::support::{fetch_json, num, text};

const SOURCE: &str = "yahoo";

/// `query1.finance.yahoo.com` adapter. No API key required; `enabled()` is
/// always true. Supports quote, fundamentals and news.
pub struct YahooProvider {
    client: Client,
}

impl YahooProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn quote_url(ticker: &str) -> String {
        format!("https://query1.finance.yahoo.com/v7/finance/quote?symbols={ticker}")
    }

    fn summary_url(ticker: &str) -> String {
        format!(
            "https://query1.finance.yahoo.com/v10/finance/quoteSummary/{ticker}?modules=assetProfile,summaryDetail,financialData,recommendationTrend"
        )
    }

    fn news_url(ticker: &str) -> String {
        format!("https://query1.finance.yahoo.com/v1/finance/search?q={ticker}&newsCount=20")
    }

    async fn fetch_quote(&self, ticker: &str, signal: &CancelSignal) -> Result<QuoteData, ProviderError> {
        let body = fetch_json(&self.client, SOURCE, &Self::quote_url(ticker), signal).await?;
        let row = body
            .get("quoteResponse")
            .and_then(|v| v.get("result"))
            .and_then(Value::as_array)
            .and_then(|rows| rows.first())
            .ok_or_else(|| ProviderError::new(SOURCE, "no quote result for ticker", ProviderErrorCode::ProviderError))?;

        let price = num(row, "regularMarketPrice");
        let previous_close = num(row, "regularMarketPreviousClose");
        let change_percent = num(row, "regularMarketChangePercent");

        Ok(QuoteData {
            symbol: ticker.to_uppercase(),
            price,
            currency: text(row, "currency").unwrap_or_else(|| "USD".to_string()),
            previous_close,
            change: num(row, "regularMarketChange"),
            change_percent,
            market_cap: num(row, "marketCap"),
            high_52w: num(row, "fiftyTwoWeekHigh"),
            low_52w: num(row, "fiftyTwoWeekLow"),
            ytd_return_percent: num(row, "ytdReturn"),
        })
    }

    async fn fetch_fundamentals(&self, ticker: &str, signal: &CancelSignal) -> Result<FundamentalsData, ProviderError> {
        let body = fetch_json(&self.client, SOURCE, &Self::summary_url(ticker), signal).await?;
        let result = body
            .get("quoteSummary")
            .and_then(|v| v.get("result"))
            .and_then(Value::as_array)
            .and_then(|rows| rows.first())
            .ok_or_else(|| ProviderError::new(SOURCE, "no quoteSummary result for ticker", ProviderErrorCode::ProviderError))?;

        let profile = result.get("assetProfile");
        let summary = result.get("summaryDetail");
        let financials = result.get("financialData");
        let recommendation_trend = result
            .get("recommendationTrend")
            .and_then(|v| v.get("trend"))
            .and_then(Value::as_array)
            .and_then(|rows| rows.first());

        let raw_field = |container: Option<&Value>, key: &str| {
            container.and_then(|c| c.get(key)).and_then(|v| v.get("raw")).and_then(Value::as_f64)
        };

        let metric = |value: Option<f64>| MetricValue {
            value,
            period: if value.is_some() { MetricPeriod::Ttm } else { MetricPeriod::Unknown },
            derivation: MetricDerivation::Reported,
        };

        let mut data = FundamentalsData::empty(ticker);
        data.metrics.revenue = metric(raw_field(financials, "totalRevenue"));
        data.metrics.net_income = metric(raw_field(financials, "netIncomeToCommon"));
        data.metrics.gross_margin_pct = metric(raw_field(financials, "grossMargins").map(|v| v * 100.0));
        data.metrics.debt_to_equity = metric(raw_field(financials, "debtToEquity"));
        data.metrics.roe_pct = metric(raw_field(financials, "returnOnEquity").map(|v| v * 100.0));
        data.metrics.operating_margin_pct = metric(raw_field(financials, "operatingMargins").map(|v| v * 100.0));
        data.metrics.free_cash_flow = metric(raw_field(financials, "freeCashflow"));
        data.market_cap = raw_field(summary, "marketCap");
        data.sector = profile.and_then(|p| text(p, "sector"));
        data.headquarters = profile.and_then(|p| {
            let city = text(p, "city")?;
            let country = text(p, "country")?;
            Some(format!("{city}, {country}"))
        });
        data.website = profile.and_then(|p| text(p, "website"));
        data.period = MetricPeriod::Ttm;
        data.analyst_ratings = recommendation_trend
            .map(|row| AnalystRatings {
                strong_buy: num(row, "strongBuy"),
                buy: num(row, "buy"),
                hold: num(row, "hold"),
                sell: num(row, "sell"),
                strong_sell: num(row, "strongSell"),
            })
            .unwrap_or_default();

        Ok(data)
    }

    async fn fetch_news(&self, ticker: &str, limit: usize, signal: &CancelSignal) -> Result<NewsData, ProviderError> {
        let body = fetch_json(&self.client, SOURCE, &Self::news_url(ticker), signal).await?;
        let items = body.get("news").and_then(Value::as_array).cloned().unwrap_or_default();

        let mut news = NewsData::empty(ticker);
        news.items = items
            .into_iter()
            .filter_map(|row| {
                let published_at = row
                    .get("providerPublishTime")
                    .and_then(Value::as_i64)
                    .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))?;
                Some(NewsItem {
                    title: text(&row, "title")?,
                    source: text(&row, "publisher").unwrap_or_else(|| SOURCE.to_string()),
                    published_at,
                    url: text(&row, "link")?,
                    summary: None,
                    sentiment: None,
                })
            })
            .take(limit.max(1))
            .collect();

        Ok(news)
    }
}

#[async_trait]
impl Provider for YahooProvider {
    fn id(&self) -> &str {
        SOURCE
    }

    fn display_name(&self) -> &str {
        "Yahoo Finance"
    }

    fn supports(&self, intent: Intent) -> bool {
        matches!(intent, Intent::Quote | Intent::Fundamentals | Intent::News)
    }

    fn enabled(&self) -> bool {
        true
    }

    async fn fetch(&self, query: &NormalizedQuery, cancel: &CancelSignal) -> Result<FinanceResult, ProviderError> {
        let data = match query.intent {
            Intent::Quote => FinanceData::Quote(self.fetch_quote(&query.ticker, cancel).await?),
            Intent::Fundamentals => FinanceData::Fundamentals(self.fetch_fundamentals(&query.ticker, cancel).await?),
            Intent::News => FinanceData::News(self.fetch_news(&query.ticker, query.limit as usize, cancel).await?),
            other => return Err(ProviderError::new(SOURCE, format!("unsupported intent: {other}"), ProviderErrorCode::Unsupported)),
        };

        Ok(FinanceResult {
            source: SOURCE.to_string(),
            timestamp: chrono::Utc::now(),
            attribution: vec![finlink_core::Attribution {
                publisher: "Yahoo Finance".to_string(),
                domain: "finance.yahoo.com".to_string(),
                url: format!("https://finance.yahoo.com/quote/{}", query.ticker),
            }],
            data,
            errors: Vec::new(),
        })
    }
}
