use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Discriminated union of the credential shapes the auth store can hold.
/// Entries that fail schema validation are silently dropped from the loaded
/// view rather than failing the whole load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthInfo {
    Api {
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provider_tier: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provider_tag: Option<String>,
    },
    Oauth {
        refresh: String,
        access: String,
        expires: i64,
    },
    Wellknown {
        key: String,
        token: String,
    },
}

impl AuthInfo {
    /// The raw api key, for auth types that carry one. `oauth`/`wellknown`
    /// entries never satisfy api-key resolution.
    pub fn api_key(&self) -> Option<&str> {
        match self {
            AuthInfo::Api { key, .. } => Some(key.as_str()),
            _ => None,
        }
    }

    pub fn provider_tier(&self) -> Option<&str> {
        match self {
            AuthInfo::Api { provider_tier, .. } => provider_tier.as_deref(),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum AuthStoreError {
    #[error("failed to read auth store at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write auth store at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize auth store: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Loads/saves `<data-root>/auth.json`: a JSON object mapping provider id to
/// `AuthInfo`. Loaded on demand, written atomically with mode 0600.
/// `set`/`remove` re-load, transform, and write back rather than mutating
/// shared in-memory state.
pub struct AuthStore {
    path: PathBuf,
}

impl AuthStore {
    pub fn new(data_root: impl AsRef<Path>) -> Self {
        Self {
            path: data_root.as_ref().join("auth.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the current snapshot, dropping any entries whose JSON shape
    /// doesn't match `AuthInfo` instead of failing the whole read.
    pub fn load(&self) -> Result<HashMap<String, AuthInfo>, AuthStoreError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let raw = std::fs::read_to_string(&self.path).map_err(|source| AuthStoreError::Read {
            path: self.path.clone(),
            source,
        })?;

        let value: serde_json::Value = serde_json::from_str(&raw).unwrap_or(serde_json::Value::Null);
        let obj = match value.as_object() {
            Some(obj) => obj,
            None => return Ok(HashMap::new()),
        };

        let mut result = HashMap::new();
        for (provider_id, entry) in obj {
            match serde_json::from_value::<AuthInfo>(entry.clone()) {
                Ok(info) => {
                    result.insert(provider_id.clone(), info);
                }
                Err(e) => {
                    tracing::warn!(provider = %provider_id, error = %e, "dropping malformed auth entry");
                }
            }
        }
        Ok(result)
    }

    /// Insert/overwrite one provider's entry and atomically persist the
    /// whole store with mode 0600.
    pub fn set(&self, provider_id: &str, info: AuthInfo) -> Result<(), AuthStoreError> {
        let mut snapshot = self.load()?;
        snapshot.insert(provider_id.to_string(), info);
        self.write_atomic(&snapshot)
    }

    pub fn remove(&self, provider_id: &str) -> Result<(), AuthStoreError> {
        let mut snapshot = self.load()?;
        snapshot.remove(provider_id);
        self.write_atomic(&snapshot)
    }

    fn write_atomic(&self, snapshot: &HashMap<String, AuthInfo>) -> Result<(), AuthStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| AuthStoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        }

        let body = serde_json::to_string_pretty(snapshot)?;
        let tmp_path = self.path.with_extension("json.tmp");

        std::fs::write(&tmp_path, body).map_err(|source| AuthStoreError::Write {
            path: tmp_path.clone(),
            source,
        })?;

        set_owner_only_permissions(&tmp_path).map_err(|source| AuthStoreError::Write {
            path: tmp_path.clone(),
            source,
        })?;

        std::fs::rename(&tmp_path, &self.path).map_err(|source| AuthStoreError::Write {
            path: self.path.clone(),
            source,
        })?;

        Ok(())
    }
}

#[cfg(unix)]
fn set_owner_only_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn set_owner_only_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_an_api_entry_and_sets_owner_only_mode() {
        let dir = tempfile::tempdir().unwrap();
        let store = AuthStore::new(dir.path());

        store
            .set(
                "polygon",
                AuthInfo::Api {
                    key: "sk-test".to_string(),
                    provider_tier: None,
                    provider_tag: None,
                },
            )
            .unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded["polygon"].api_key(), Some("sk-test"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(store.path()).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o600);
        }
    }

    #[test]
    fn drops_malformed_entries_instead_of_failing_the_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        std::fs::write(&path, r#"{"good":{"type":"api","key":"abc"},"bad":{"type":"api"}}"#).unwrap();

        let store = AuthStore::new(dir.path());
        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains_key("good"));
        assert!(!loaded.contains_key("bad"));
    }

    #[test]
    fn remove_drops_only_the_named_provider() {
        let dir = tempfile::tempdir().unwrap();
        let store = AuthStore::new(dir.path());
        store
            .set("a", AuthInfo::Api { key: "1".into(), provider_tier: None, provider_tag: None })
            .unwrap();
        store
            .set("b", AuthInfo::Api { key: "2".into(), provider_tier: None, provider_tag: None })
            .unwrap();
        store.remove("a").unwrap();
        let loaded = store.load().unwrap();
        assert!(!loaded.contains_key("a"));
        assert!(loaded.contains_key("b"));
    }
}
