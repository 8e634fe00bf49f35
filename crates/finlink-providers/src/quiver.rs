use async_trait::async_trait;
use finlink_auth::{tier_allows, EndpointTier, QuiverTier};
use finlink_core::{
    Attribution, CancelSignal, FinanceData, FinanceResult, InsiderData, InsiderEntry,
    InsiderSummary, Intent, NormalizedQuery, Provider, ProviderError, ProviderErrorCode,
    TransactionType,
};
use reqwest::Client;
use serde_json::Value;

use crate::ratelimit::RateLimiter;
use crate::support::{fetch_json, num, text};

const SOURCE: &str = "quiver";
const BASE: &str = "https://api.quiverquant.com/beta";

/// Tier-1 endpoints consulted for the fallback summary when the user's plan
/// doesn't clear tier 2: government-trading plus a slice of
/// alternative-data feeds.
const TIER1_ENDPOINTS: &[(&str, &str)] = &[
    ("congresstrading", "/live/congresstrading"),
    ("senatetrading", "/live/senatetrading"),
    ("housetrading", "/live/housetrading"),
    ("govcontracts", "/live/govcontractsall"),
];

/// `QuiverQuant` adapter, insider intent only. Endpoint access
/// is partitioned by `EndpointTier`: users at Hobbyist or above (tier 2) get
/// the live Form-4 endpoint, everyone else gets a synthesized tier-1
/// fallback summary with `entries=[]`.
pub struct QuiverProvider {
    client: Client,
    api_key: Option<String>,
    tier: QuiverTier,
    limiter: RateLimiter,
}

impl QuiverProvider {
    pub fn new(client: Client, api_key: Option<String>, tier: QuiverTier) -> Self {
        Self { client, api_key, tier, limiter: RateLimiter::new(60) }
    }

    fn key(&self) -> &str {
        self.api_key.as_deref().unwrap_or("")
    }

    async fn request(&self, path: &str, signal: &CancelSignal) -> Result<Value, ProviderError> {
        self.limiter.acquire().await;
        let url = format!("{BASE}{path}?token={}", self.key());
        fetch_json(&self.client, SOURCE, &url, signal).await
    }

    async fn fetch_live_form4(&self, ticker: &str, signal: &CancelSignal) -> Result<InsiderData, ProviderError> {
        let body = self.request(&format!("/live/insiders/{ticker}"), signal).await?;
        let rows = body.as_array().cloned().unwrap_or_default();

        let mut data = InsiderData::empty(ticker);
        data.entries = rows
            .into_iter()
            .filter_map(|row| {
                let shares_change = num(&row, "Shares")?;
                let transaction_type = match text(&row, "TransactionCode").as_deref() {
                    Some("P") => TransactionType::Buy,
                    Some("S") => TransactionType::Sell,
                    _ => TransactionType::Other,
                };
                Some(InsiderEntry {
                    owner: text(&row, "Name")?,
                    date: text(&row, "Date")?,
                    shares: shares_change.abs(),
                    shares_change,
                    transaction_type,
                    security: text(&row, "SecurityTitle").unwrap_or_else(|| "Common Stock".to_string()),
                })
            })
            .collect();
        data.ownership_change = data.entries.iter().map(|e| e.shares_change).sum();
        Ok(data)
    }

    /// Fetches every tier-1 endpoint for `ticker`, counting rows; failures
    /// are surfaced in the caller's `errors[]`, not raised.
    async fn fetch_tier1_fallback(&self, ticker: &str, signal: &CancelSignal, errors: &mut Vec<String>) -> InsiderData {
        let mut total_rows = 0usize;
        let mut consulted = Vec::new();

        for (label, path) in TIER1_ENDPOINTS {
            match self.request(&format!("{path}/{ticker}"), signal).await {
                Ok(body) => {
                    let count = body.as_array().map(Vec::len).unwrap_or(0);
                    total_rows += count;
                    consulted.push(*label);
                }
                Err(err) => errors.push(err.to_envelope_line()),
            }
        }

        let mut data = InsiderData::empty(ticker);
        data.summary = Some(InsiderSummary {
            source: SOURCE.to_string(),
            text: format!(
                "Tier-1 summary for {ticker}: {total_rows} rows observed across {} government-trading/alternative-data feeds ({}). Upgrade to Hobbyist tier and re-authenticate for live Form-4 detail.",
                consulted.len(),
                consulted.join(", ")
            ),
        });
        data
    }
}

#[async_trait]
impl Provider for QuiverProvider {
    fn id(&self) -> &str {
        SOURCE
    }

    fn display_name(&self) -> &str {
        "Quiver Quant"
    }

    fn supports(&self, intent: Intent) -> bool {
        matches!(intent, Intent::Insider)
    }

    fn enabled(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    async fn fetch(&self, query: &NormalizedQuery, cancel: &CancelSignal) -> Result<FinanceResult, ProviderError> {
        if !matches!(query.intent, Intent::Insider) {
            return Err(ProviderError::new(SOURCE, format!("unsupported intent: {}", query.intent), ProviderErrorCode::Unsupported));
        }
        if self.api_key.is_none() {
            return Err(ProviderError::new(SOURCE, "missing API key", ProviderErrorCode::MissingAuth));
        }

        let mut errors = Vec::new();
        let data = if tier_allows(EndpointTier::Tier2, self.tier) {
            self.fetch_live_form4(&query.ticker, cancel).await?
        } else {
            self.fetch_tier1_fallback(&query.ticker, cancel, &mut errors).await
        };

        Ok(FinanceResult {
            source: SOURCE.to_string(),
            timestamp: chrono::Utc::now(),
            attribution: vec![Attribution {
                publisher: "Quiver Quant".to_string(),
                domain: "quiverquant.com".to_string(),
                url: "https://www.quiverquant.com".to_string(),
            }],
            data: FinanceData::Insider(data),
            errors,
        })
    }
}
