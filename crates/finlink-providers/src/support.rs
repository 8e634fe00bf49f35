use std::time::Duration;

use finlink_core::signal::run_with_cancel;
use finlink_core::{CancelSignal, ProviderError, ProviderErrorCode};
use reqwest::{Client, Response};
use serde_json::Value;

/// Per-request timeout every adapter composes with the caller's cancellation
/// signal.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(12);

const TIER_MARKERS: &[&str] = &["upgrade", "tier", "plan", "subscription"];

/// Issues a GET request under `signal ⊕ FETCH_TIMEOUT`, decodes the 2xx body
/// as JSON, and maps failures onto the provider error taxonomy: timeouts → `TIMEOUT`; 402/403 with a tier/upgrade marker in the
/// body → `TIER_DENIED`; 429 → `RATE_LIMIT`; other non-2xx → `Http(status)`.
pub async fn fetch_json(
    client: &Client,
    source: &str,
    url: &str,
    signal: &CancelSignal,
) -> Result<Value, ProviderError> {
    let response = match run_with_cancel(signal, FETCH_TIMEOUT, client.get(url).send()).await {
        Some(Ok(response)) => response,
        Some(Err(err)) => {
            return Err(ProviderError::new(source, err.to_string(), ProviderErrorCode::Network));
        }
        None => return Err(ProviderError::new(source, "request timed out or was cancelled", ProviderErrorCode::Timeout)),
    };

    classify_response(source, response).await
}

async fn classify_response(source: &str, response: Response) -> Result<Value, ProviderError> {
    let status = response.status();

    if status.is_success() {
        return response
            .json::<Value>()
            .await
            .map_err(|err| ProviderError::new(source, format!("invalid JSON body: {err}"), ProviderErrorCode::ProviderError));
    }

    let body = response.text().await.unwrap_or_default();
    let lowered = body.to_lowercase();

    if status.as_u16() == 429 {
        return Err(ProviderError::new(source, "rate limited (429)", ProviderErrorCode::RateLimit));
    }

    if matches!(status.as_u16(), 402 | 403) && TIER_MARKERS.iter().any(|m| lowered.contains(m)) {
        return Err(ProviderError::new(
            source,
            "plan tier does not permit this endpoint; upgrade and re-authenticate",
            ProviderErrorCode::TierDenied,
        ));
    }

    Err(ProviderError::new(source, format!("HTTP {status}"), ProviderErrorCode::Http(status.as_u16())))
}

/// Reads a field from a lenient JSON map as `f64`, treating non-numeric or
/// absent values as `None` rather than a parse failure.
pub fn num(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(Value::as_f64)
}

pub fn text(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}
