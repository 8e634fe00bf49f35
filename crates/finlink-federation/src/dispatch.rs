use std::sync::Arc;

use finlink_cache::QueryCache;
use finlink_core::{
    Attribution, CancelSignal, Coverage, FinanceData, FinanceResult, NormalizedQuery, Provider,
};

use crate::merge::{is_complete, merge_finance_data};

/// Runs the full dispatch policy: filter by capability, consult
/// the cache, then first-success or comprehensive-merge depending on
/// `query.coverage`. Always populates the cache with the final envelope.
pub async fn federate(
    query: &NormalizedQuery,
    providers: &[Arc<dyn Provider>],
    cache: &QueryCache,
    cancel: &CancelSignal,
) -> FinanceResult {
    let eligible: Vec<&Arc<dyn Provider>> = providers
        .iter()
        .filter(|p| p.supports(query.intent) && p.enabled())
        .collect();

    if eligible.is_empty() {
        return FinanceResult::empty(query.intent, &query.ticker);
    }

    if !query.refresh {
        if let Some(cached) = cache.get(query) {
            return cached;
        }
    }

    let mut result = match query.coverage {
        Coverage::Default => default_coverage(query, &eligible, cancel).await,
        Coverage::Comprehensive => comprehensive_coverage(query, &eligible, cancel).await,
    };

    result.dedupe_attribution();
    cache.set(query, result.clone());
    result
}

async fn default_coverage(query: &NormalizedQuery, providers: &[&Arc<dyn Provider>], cancel: &CancelSignal) -> FinanceResult {
    let mut failures = Vec::new();

    for provider in providers {
        match provider.fetch(query, cancel).await {
            Ok(mut result) => {
                result.errors = Vec::new();
                return result;
            }
            Err(err) => {
                tracing::warn!(provider = provider.id(), error = %err, "provider fetch failed");
                failures.push(err.to_envelope_line());
            }
        }
    }

    FinanceResult {
        source: "none".to_string(),
        timestamp: chrono::Utc::now(),
        attribution: Vec::new(),
        data: FinanceData::empty(query.intent, &query.ticker),
        errors: failures,
    }
}

async fn comprehensive_coverage(query: &NormalizedQuery, providers: &[&Arc<dyn Provider>], cancel: &CancelSignal) -> FinanceResult {
    let limit = query.limit as usize;
    let mut acc_data = FinanceData::empty(query.intent, &query.ticker);
    let mut contributing_ids = Vec::new();
    let mut attribution: Vec<Attribution> = Vec::new();
    let mut failures = Vec::new();
    let mut latest_timestamp = None;

    for provider in providers {
        match provider.fetch(query, cancel).await {
            Ok(result) => {
                merge_finance_data(&mut acc_data, &result.data, limit);
                contributing_ids.push(provider.id().to_string());
                attribution.extend(result.attribution);
                latest_timestamp = Some(match latest_timestamp {
                    Some(existing) if existing >= result.timestamp => existing,
                    _ => result.timestamp,
                });

                if is_complete(&acc_data, limit) {
                    break;
                }
            }
            Err(err) => {
                tracing::warn!(provider = provider.id(), error = %err, "provider fetch failed");
                failures.push(err.to_envelope_line());
            }
        }
    }

    let source = if contributing_ids.is_empty() {
        "none".to_string()
    } else {
        contributing_ids.join(",")
    };

    FinanceResult {
        source,
        timestamp: latest_timestamp.unwrap_or_else(chrono::Utc::now),
        attribution,
        data: acc_data,
        errors: failures,
    }
}
