//! Single-process in-memory cache of `FinanceResult` envelopes keyed by
//! `NormalizedQuery::cache_key()`, with per-intent TTL expiry.
//! No persistence; a process restart empties it.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use finlink_core::{FinanceResult, Intent, NormalizedQuery};

struct CacheEntry {
    value: FinanceResult,
    cached_at: DateTime<Utc>,
    ttl_secs: i64,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        (now - self.cached_at).num_seconds() >= self.ttl_secs
    }
}

/// Snapshot counters for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub live_entries: usize,
}

#[derive(Default)]
pub struct QueryCache {
    entries: DashMap<String, CacheEntry>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self { entries: DashMap::new() }
    }

    /// Looks up the cached envelope for `query`, dropping it first if its
    /// TTL has elapsed. Lazy expiry: `get` is the only place entries die.
    pub fn get(&self, query: &NormalizedQuery) -> Option<FinanceResult> {
        let key = query.cache_key();
        let now = Utc::now();

        let expired = match self.entries.get(&key) {
            Some(entry) => entry.is_expired(now),
            None => return None,
        };

        if expired {
            self.entries.remove(&key);
            return None;
        }

        self.entries.get(&key).map(|entry| entry.value.clone())
    }

    /// Unconditionally stores `result`, overwriting whatever was there.
    pub fn set(&self, query: &NormalizedQuery, result: FinanceResult) {
        self.entries.insert(
            query.cache_key(),
            CacheEntry { value: result, cached_at: Utc::now(), ttl_secs: query.intent.cache_ttl_secs() },
        );
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Live entry count, not pruned for expiry (a snapshot, not a query).
    pub fn stats(&self) -> CacheStats {
        CacheStats { live_entries: self.entries.len() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finlink_core::{Coverage, FinanceData, QuoteData};

    fn sample_query(intent: Intent) -> NormalizedQuery {
        NormalizedQuery {
            intent,
            ticker: "AAPL".to_string(),
            form: None,
            coverage: Coverage::Default,
            limit: 10,
            refresh: false,
            source_override: None,
        }
    }

    fn sample_result(intent: Intent) -> FinanceResult {
        FinanceResult {
            source: "yahoo".to_string(),
            timestamp: Utc::now(),
            attribution: vec![],
            data: FinanceData::empty(intent, "AAPL"),
            errors: vec![],
        }
    }

    #[test]
    fn set_then_get_round_trips() {
        let cache = QueryCache::new();
        let query = sample_query(Intent::Quote);
        cache.set(&query, sample_result(Intent::Quote));
        assert!(cache.get(&query).is_some());
    }

    #[test]
    fn get_is_none_for_absent_key() {
        let cache = QueryCache::new();
        assert!(cache.get(&sample_query(Intent::News)).is_none());
    }

    #[test]
    fn expired_entry_is_evicted_on_get() {
        let cache = QueryCache::new();
        let query = sample_query(Intent::Quote);
        let stale = FinanceResult {
            source: "yahoo".to_string(),
            timestamp: Utc::now(),
            attribution: vec![],
            data: FinanceData::Quote(QuoteData::empty("AAPL")),
            errors: vec![],
        };
        cache.entries.insert(
            query.cache_key(),
            CacheEntry { value: stale, cached_at: Utc::now() - chrono::Duration::seconds(301), ttl_secs: 300 },
        );

        assert!(cache.get(&query).is_none());
        assert_eq!(cache.stats().live_entries, 0);
    }

    #[test]
    fn set_overwrites_unconditionally() {
        let cache = QueryCache::new();
        let query = sample_query(Intent::Quote);
        cache.set(&query, sample_result(Intent::Quote));
        cache.set(&query, sample_result(Intent::Quote));
        assert_eq!(cache.stats().live_entries, 1);
    }

    #[test]
    fn clear_empties_everything() {
        let cache = QueryCache::new();
        cache.set(&sample_query(Intent::Quote), sample_result(Intent::Quote));
        cache.set(&sample_query(Intent::News), sample_result(Intent::News));
        cache.clear();
        assert_eq!(cache.stats().live_entries, 0);
    }
}
