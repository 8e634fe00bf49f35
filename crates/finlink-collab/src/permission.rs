use async_trait::async_trait;

/// A request to edit one or more paths, as surfaced by the host's permission
/// prompt.
#[derive(Debug, Clone)]
pub struct EditPermissionRequest {
    pub permission: String,
    pub patterns: Vec<String>,
    pub metadata: Vec<(String, String)>,
}

impl EditPermissionRequest {
    pub fn for_paths(patterns: Vec<String>) -> Self {
        Self { permission: "edit".to_string(), patterns, metadata: Vec::new() }
    }
}

/// The host-supplied gate the artifact writer must consult before any write.
/// Implementations decide policy; this crate only models the interface plus
/// a couple of faithful standalone defaults.
#[async_trait]
pub trait PermissionGate: Send + Sync {
    async fn ask(&self, request: &EditPermissionRequest) -> bool;
}

/// Grants every request. Suitable for CLI/batch contexts that have already
/// obtained consent out of band.
pub struct AlwaysAllow;

#[async_trait]
impl PermissionGate for AlwaysAllow {
    async fn ask(&self, _request: &EditPermissionRequest) -> bool {
        true
    }
}

/// Denies every request. Used in tests asserting the writer leaves prior
/// state untouched on a permission denial.
pub struct AlwaysDeny;

#[async_trait]
impl PermissionGate for AlwaysDeny {
    async fn ask(&self, _request: &EditPermissionRequest) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_allow_grants() {
        let req = EditPermissionRequest::for_paths(vec!["report.md".to_string()]);
        assert!(AlwaysAllow.ask(&req).await);
    }

    #[tokio::test]
    async fn always_deny_denies() {
        let req = EditPermissionRequest::for_paths(vec!["report.md".to_string()]);
        assert!(!AlwaysDeny.ask(&req).await);
    }
}
