use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Sliding-window rate limiter: tracks recent request timestamps and blocks
/// new ones once the per-minute budget is exhausted. Ported from the
/// Polygon fetcher's window-based limiter; Polygon and Quiver adapters need
/// it, the lighter single-key providers (AlphaVantage/Finnhub/FMP) use a
/// permissive instance.
pub struct RateLimiter {
    window: Duration,
    max_requests: usize,
    timestamps: Mutex<Vec<Instant>>,
}

impl RateLimiter {
    pub fn new(max_per_minute: usize) -> Self {
        Self {
            window: Duration::from_secs(60),
            max_requests: max_per_minute,
            timestamps: Mutex::new(Vec::new()),
        }
    }

    /// Blocks until a request slot is available, then reserves it.
    pub async fn acquire(&self) {
        loop {
            let mut timestamps = self.timestamps.lock().await;
            let now = Instant::now();
            timestamps.retain(|t| now.duration_since(*t) < self.window);

            if timestamps.len() < self.max_requests {
                timestamps.push(now);
                return;
            }

            let oldest = timestamps[0];
            let sleep_for = self.window.saturating_sub(now.duration_since(oldest));
            drop(timestamps);
            tokio::time::sleep(sleep_for + Duration::from_millis(10)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn grants_requests_up_to_the_budget_without_blocking() {
        let limiter = RateLimiter::new(5);
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
