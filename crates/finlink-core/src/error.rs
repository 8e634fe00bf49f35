use thiserror::Error;

/// Structured code carried by every [`ProviderError`].
///
/// A small closed set of reasons a provider fetch can fail, so callers can
/// branch on `code` instead of string-matching `message`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ProviderErrorCode {
    Timeout,
    Network,
    RateLimit,
    TierDenied,
    ProviderError,
    Unsupported,
    MissingAuth,
    /// An HTTP status that didn't map to a more specific code, e.g. "503".
    Http(u16),
}

impl std::fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::Network => write!(f, "NETWORK"),
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::TierDenied => write!(f, "TIER_DENIED"),
            Self::ProviderError => write!(f, "PROVIDER_ERROR"),
            Self::Unsupported => write!(f, "UNSUPPORTED"),
            Self::MissingAuth => write!(f, "MISSING_AUTH"),
            Self::Http(status) => write!(f, "{status}"),
        }
    }
}

/// Error raised by a single provider `fetch` call.
///
/// Never propagated as a hard failure by the federation engine: it is always
/// captured into `FinanceResult::errors` prefixed with `${source}:`.
#[derive(Error, Debug, Clone)]
#[error("{source}: {message}")]
pub struct ProviderError {
    pub source: String,
    pub message: String,
    pub code: ProviderErrorCode,
    pub retry_after_ms: Option<u64>,
}

impl ProviderError {
    pub fn new(source: impl Into<String>, message: impl Into<String>, code: ProviderErrorCode) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
            code,
            retry_after_ms: None,
        }
    }

    pub fn with_retry_after(mut self, ms: u64) -> Self {
        self.retry_after_ms = Some(ms);
        self
    }

    /// Classify a free-form upstream error message: anything that looks like
    /// a rate-limit complaint becomes `RATE_LIMIT` regardless of what the
    /// provider's own wire format calls it.
    pub fn classify(source: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();
        let code = if lowered.contains("429") || RATE_LIMIT_RE_FRAGMENTS.iter().any(|f| lowered.contains(f)) {
            ProviderErrorCode::RateLimit
        } else {
            ProviderErrorCode::ProviderError
        };
        Self::new(source, message, code)
    }

    /// Render as the `${source}: message` line the federation engine appends
    /// to `FinanceResult::errors`.
    pub fn to_envelope_line(&self) -> String {
        format!("{}: {}", self.source, self.message)
    }
}

// Cheap stand-in for `/rate.?limit/i` without pulling in `regex` for one check.
const RATE_LIMIT_RE_FRAGMENTS: &[&str] = &["rate limit", "ratelimit", "rate-limit"];

/// Top-level input errors: thrown at the entry point, never
/// surfaced through a `FinanceResult` envelope.
#[derive(Error, Debug, Clone)]
pub enum InputError {
    #[error("query must not be empty")]
    EmptyQuery,
    #[error("could not identify a ticker in query: {0}")]
    MissingTicker(String),
    #[error("unsupported intent: {0}")]
    UnsupportedIntent(String),
}

/// Strict workflow failures (backtest / anomaly detector). These are never
/// downgraded to a "best effort" partial result.
#[derive(Error, Debug, Clone)]
#[error("{code}: {details}")]
pub struct WorkflowError {
    pub code: String,
    pub details: String,
}

impl WorkflowError {
    pub fn new(code: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            details: details.into(),
        }
    }
}

/// Errors from the artifact writer: permission denial,
/// filesystem failure, or an archival step that failed before the write.
#[derive(Error, Debug, Clone)]
pub enum ArtifactError {
    #[error("edit permission denied for {0}")]
    PermissionDenied(String),
    #[error("filesystem error writing {path}: {message}")]
    FileSystem { path: String, message: String },
    #[error("failed to archive existing file {path}: {message}")]
    ArchiveFailed { path: String, message: String },
    #[error("artifact write to {0} cancelled before completion")]
    Cancelled(String),
}
