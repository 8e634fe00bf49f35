use crate::store::{AuthInfo, AuthStore};
use crate::tier::QuiverTier;

/// Per-provider environment variable names, in lookup precedence order.
/// Mirrors how `alpaca-broker::AlpacaClient::from_env` chains
/// `APCA_API_KEY_ID` then `ALPACA_API_KEY`.
pub fn env_keys_for(provider_id: &str) -> &'static [&'static str] {
    match provider_id {
        "alphavantage" => &["ALPHAVANTAGE_API_KEY", "ALPHAVANTAGE_KEY"],
        "finnhub" => &["FINNHUB_API_KEY", "FINNHUB_KEY"],
        "fmp" => &["FMP_API_KEY", "FINANCIAL_MODELING_PREP_API_KEY"],
        "polygon" => &["POLYGON_API_KEY", "POLYGON_KEY"],
        "quartr" => &["QUARTR_API_KEY"],
        "quiver" => &["QUIVER_QUANT_API_KEY", "QUIVERQUANT_API_KEY"],
        "sec_edgar" => &["SEC_EDGAR_IDENTITY", "SEC_API_USER_AGENT"],
        _ => &[],
    }
}

/// Result of reading a provider's raw credential material.
#[derive(Debug, Clone, Default)]
pub struct ProviderCredential {
    pub env_key: Option<String>,
    pub auth_info: Option<AuthInfo>,
}

pub struct CredentialResolver {
    store: AuthStore,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    pub trim: bool,
}

/// A resolved Quiver credential plus the tier it operates under.
#[derive(Debug, Clone)]
pub struct QuiverCredential {
    pub key: String,
    pub tier: QuiverTier,
    /// True when no tier metadata was found and `Public` was assumed.
    pub inferred: bool,
}

impl CredentialResolver {
    pub fn new(store: AuthStore) -> Self {
        Self { store }
    }

    /// Raw read: first non-empty configured environment variable, plus the
    /// stored auth entry if present. Never fails on absence.
    pub fn read_provider_credential(&self, provider_id: &str) -> ProviderCredential {
        let env_key = env_keys_for(provider_id)
            .iter()
            .find_map(|name| std::env::var(name).ok().filter(|v| !v.is_empty()));

        let auth_info = self
            .store
            .load()
            .ok()
            .and_then(|snapshot| snapshot.get(provider_id).cloned());

        ProviderCredential { env_key, auth_info }
    }

    /// Resolve a usable API key for a provider. When `trim` is set,
    /// whitespace-only values are rejected and surviving values are
    /// trimmed; otherwise the raw env value wins over a stored api-typed
    /// key verbatim. `oauth`/`wellknown` store entries never satisfy this.
    pub fn resolve_provider_api_key(
        &self,
        provider_id: &str,
        opts: ResolveOptions,
    ) -> Option<String> {
        let credential = self.read_provider_credential(provider_id);

        if let Some(env_value) = credential.env_key {
            if opts.trim {
                let trimmed = env_value.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            } else {
                return Some(env_value);
            }
        }

        let stored = credential.auth_info.as_ref().and_then(AuthInfo::api_key)?;
        if opts.trim {
            let trimmed = stored.trim();
            if trimmed.is_empty() {
                return None;
            }
            Some(trimmed.to_string())
        } else {
            Some(stored.to_string())
        }
    }

    /// Combines the api key with the parsed Quiver tier. When
    /// tier metadata is missing, falls back to `Public` with `inferred = true`.
    pub fn resolve_quiver_provider_credential(&self, opts: ResolveOptions) -> Option<QuiverCredential> {
        let key = self.resolve_provider_api_key("quiver", opts)?;
        let credential = self.read_provider_credential("quiver");

        let tier_str = credential
            .auth_info
            .as_ref()
            .and_then(AuthInfo::provider_tier)
            .map(str::to_string)
            .or_else(|| std::env::var("QUIVER_QUANT_TIER").ok());

        match tier_str.as_deref().and_then(QuiverTier::parse) {
            Some(tier) => Some(QuiverCredential { key, tier, inferred: false }),
            None => {
                tracing::warn!("no Quiver tier metadata found; assuming Public tier");
                Some(QuiverCredential { key, tier: QuiverTier::Public, inferred: true })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AuthInfo;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize tests that touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn env_wins_over_stored_key_when_untrimmed() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let store = AuthStore::new(dir.path());
        store
            .set("polygon", AuthInfo::Api { key: "stored-key".into(), provider_tier: None, provider_tag: None })
            .unwrap();

        std::env::set_var("POLYGON_API_KEY", "env-key");
        let resolver = CredentialResolver::new(AuthStore::new(dir.path()));
        let resolved = resolver.resolve_provider_api_key("polygon", ResolveOptions::default());
        std::env::remove_var("POLYGON_API_KEY");

        assert_eq!(resolved.as_deref(), Some("env-key"));
    }

    #[test]
    fn whitespace_only_env_is_rejected_when_trimming() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let store = AuthStore::new(dir.path());
        store
            .set("polygon", AuthInfo::Api { key: "stored-key".into(), provider_tier: None, provider_tag: None })
            .unwrap();

        std::env::set_var("POLYGON_API_KEY", "   ");
        let resolver = CredentialResolver::new(AuthStore::new(dir.path()));
        let resolved = resolver.resolve_provider_api_key("polygon", ResolveOptions { trim: true });
        std::env::remove_var("POLYGON_API_KEY");

        assert_eq!(resolved.as_deref(), Some("stored-key"));
    }

    #[test]
    fn oauth_entries_never_satisfy_api_key_resolution() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("POLYGON_API_KEY");
        std::env::remove_var("POLYGON_KEY");
        let dir = tempfile::tempdir().unwrap();
        let store = AuthStore::new(dir.path());
        store
            .set("polygon", AuthInfo::Oauth { refresh: "r".into(), access: "a".into(), expires: 0 })
            .unwrap();

        let resolver = CredentialResolver::new(AuthStore::new(dir.path()));
        let resolved = resolver.resolve_provider_api_key("polygon", ResolveOptions::default());
        assert!(resolved.is_none());
    }

    #[test]
    fn missing_tier_metadata_infers_public() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("QUIVER_QUANT_TIER");
        let dir = tempfile::tempdir().unwrap();
        let store = AuthStore::new(dir.path());
        store
            .set("quiver", AuthInfo::Api { key: "k".into(), provider_tier: None, provider_tag: None })
            .unwrap();

        let resolver = CredentialResolver::new(AuthStore::new(dir.path()));
        let cred = resolver
            .resolve_quiver_provider_credential(ResolveOptions::default())
            .unwrap();
        assert_eq!(cred.tier, QuiverTier::Public);
        assert!(cred.inferred);
    }
}
