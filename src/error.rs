use thiserror::Error;

/// Failures of a single token refresh cycle.
///
/// All of them stay inside the refresh loop: they are logged, handed to the
/// completion callback and never surface to readers of the cached token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("secret '{key}' unavailable: {reason}")]
    SecretUnavailable { key: String, reason: String },

    #[error("assertion signing failed: {0}")]
    SigningFailed(String),

    #[error("token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("cache write for '{key}' failed: {reason}")]
    CacheWriteFailed { key: String, reason: String },

    #[error("malformed token endpoint response: {0}")]
    MalformedUpstreamResponse(String),
}

impl RefreshError {
    /// Short label used for metrics and structured logs.
    pub fn reason(&self) -> &'static str {
        match self {
            RefreshError::SecretUnavailable { .. } => "secret_unavailable",
            RefreshError::SigningFailed(_) => "signing_failed",
            RefreshError::TokenExchangeFailed(_) => "token_exchange_failed",
            RefreshError::CacheWriteFailed { .. } => "cache_write_failed",
            RefreshError::MalformedUpstreamResponse(_) => "malformed_upstream_response",
        }
    }
}
