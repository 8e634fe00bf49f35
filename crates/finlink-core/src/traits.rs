use async_trait::async_trait;

use crate::error::ProviderError;
use crate::signal::CancelSignal;
use crate::types::{FinanceResult, NormalizedQuery};

/// Polymorphic provider capability contract.
///
/// A provider MUST NOT be consulted by the federation engine when
/// `supports(intent)` is false or `enabled()` is false — callers are
/// expected to check both before calling `fetch`.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable provider id, used as the `source` tag and in error prefixes.
    fn id(&self) -> &str;

    /// Human-readable name for logs/diagnostics.
    fn display_name(&self) -> &str {
        self.id()
    }

    /// Whether this provider can answer the given intent at all.
    fn supports(&self, intent: crate::types::Intent) -> bool;

    /// Whether this provider is currently usable (credentials resolved,
    /// tier sufficient, etc). Checked independently of `supports`.
    fn enabled(&self) -> bool;

    /// Fetch and translate into the canonical envelope. `cancel` composes
    /// the caller's cancellation with the provider's own request timeout.
    async fn fetch(
        &self,
        query: &NormalizedQuery,
        cancel: &CancelSignal,
    ) -> Result<FinanceResult, ProviderError>;
}
