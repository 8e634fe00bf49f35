use std::sync::Arc;

use finlink_auth::{CredentialResolver, ResolveOptions};
use finlink_collab::build_http_client;
use finlink_core::{Intent, Provider};

use crate::alphavantage::AlphaVantageProvider;
use crate::finnhub::FinnhubProvider;
use crate::fmp::FmpProvider;
use crate::polygon::PolygonProvider;
use crate::quartr::QuartrProvider;
use crate::quiver::QuiverProvider;
use crate::sec_edgar::SecEdgarProvider;
use crate::yahoo::YahooProvider;
use crate::support::FETCH_TIMEOUT;

/// Builds the default ordered provider list from resolved credential
/// enablement, mirroring how `AnalysisOrchestrator` wires several upstream
/// clients behind one facade. Order is fixed and matters: comprehensive-mode
/// merges are order-sensitive.
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// Resolves credentials for every known provider and constructs the
    /// fixed-order registry: Yahoo, AlphaVantage, Finnhub, FMP, Polygon,
    /// Quartr, SEC EDGAR, Quiver.
    pub fn from_credentials(resolver: &CredentialResolver) -> Self {
        let client = build_http_client(FETCH_TIMEOUT);
        let opts = ResolveOptions { trim: true };

        let key_for = |provider_id: &str| resolver.resolve_provider_api_key(provider_id, opts);

        let quiver_credential = resolver.resolve_quiver_provider_credential(opts);
        let (quiver_key, quiver_tier) = match &quiver_credential {
            Some(cred) => (Some(cred.key.clone()), cred.tier),
            None => (None, finlink_auth::QuiverTier::Public),
        };

        let providers: Vec<Arc<dyn Provider>> = vec![
            Arc::new(YahooProvider::new(client.clone())),
            Arc::new(AlphaVantageProvider::new(client.clone(), key_for("alphavantage"))),
            Arc::new(FinnhubProvider::new(client.clone(), key_for("finnhub"))),
            Arc::new(FmpProvider::new(client.clone(), key_for("fmp"))),
            Arc::new(PolygonProvider::new(client.clone(), key_for("polygon"))),
            Arc::new(QuartrProvider::new(client.clone(), key_for("quartr"))),
            Arc::new(SecEdgarProvider::new(client.clone(), key_for("sec_edgar"))),
            Arc::new(QuiverProvider::new(client, quiver_key, quiver_tier)),
        ];

        Self { providers }
    }

    /// All providers declaring support for `intent`, enabled or not — the
    /// federation engine itself filters on `enabled()` at dispatch time.
    pub fn providers_for(&self, intent: Intent) -> Vec<Arc<dyn Provider>> {
        self.providers.iter().filter(|p| p.supports(intent)).cloned().collect()
    }

    pub fn all(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }
}
