use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};

/// Default per-HTTP timeout: providers may override.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(12);

pub const USER_AGENT_VALUE: &str = "finlink/0.1 (+https://finlink.invalid)";

/// Builds the shared reqwest client every provider adapter starts from:
/// `Accept: application/json` and an identifying `User-Agent` on every
/// request, rustls-backed per the workspace TLS stack.
pub fn build_http_client(timeout: Duration) -> reqwest::Client {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

    reqwest::Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .expect("failed to build shared HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_client_without_panicking() {
        let _client = build_http_client(DEFAULT_HTTP_TIMEOUT);
    }
}
