//! Shared data model, error taxonomy and traits for the FinLink engine.
//!
//! Every other crate in the workspace depends on this one; it carries no
//! provider-specific, workflow-specific, or I/O logic of its own.

pub mod error;
pub mod signal;
pub mod traits;
pub mod types;

pub use error::{ArtifactError, InputError, ProviderError, ProviderErrorCode, WorkflowError};
pub use signal::{run_with_cancel, CancelHandle, CancelSignal};
pub use traits::Provider;
pub use types::{
    is_well_formed_string, AnalystRatings, Attribution, Coverage, FilingEntry, FilingsData,
    FinanceData, FinanceResult, FundamentalsData, FundamentalsMetrics, InsiderData, InsiderEntry,
    InsiderSummary, Intent, MetricDerivation, MetricPeriod, MetricValue, NewsData, NewsItem,
    NormalizedQuery, QuoteData, TransactionType,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_matches_spec_shape() {
        let q = NormalizedQuery {
            intent: Intent::Quote,
            ticker: "AAPL".to_string(),
            form: None,
            coverage: Coverage::Default,
            limit: 10,
            refresh: false,
            source_override: None,
        };
        assert_eq!(q.cache_key(), "AAPL:quote:default:auto::10");
    }

    #[test]
    fn well_formed_string_rejects_placeholder_values() {
        assert!(!is_well_formed_string(Some("unknown")));
        assert!(!is_well_formed_string(Some("N/A")));
        assert!(!is_well_formed_string(Some("-")));
        assert!(!is_well_formed_string(Some("  ")));
        assert!(!is_well_formed_string(None));
        assert!(is_well_formed_string(Some("Technology")));
    }
}
