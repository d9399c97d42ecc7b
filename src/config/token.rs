use serde::Deserialize;

use crate::utils::constants::{
    DEFAULT_ASSERTION_LIFETIME_SECS, DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_KEY_PREFIX,
    DEFAULT_SCOPE, DEFAULT_TOKEN_ENDPOINT,
};

/// ================================
/// OAuth2 JWT-bearer token
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct TokenConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// `aud` claim of the assertion, the endpoint when absent
    pub audience: Option<String>,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default = "default_assertion_lifetime_seconds")]
    pub assertion_lifetime_seconds: i64,
    /// cache entries: `<prefix>-access-token`, `<prefix>-access-token-expiry`
    #[serde(default = "default_prefix")]
    pub cache_prefix: String,
    /// secrets: `<prefix>.privKeyPem`, `<prefix>.jwt_issuer`
    #[serde(default = "default_prefix")]
    pub secret_prefix: String,
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,
}

impl TokenConfig {
    pub fn audience(&self) -> &str {
        self.audience.as_deref().unwrap_or(&self.endpoint)
    }
}

fn default_endpoint() -> String {
    DEFAULT_TOKEN_ENDPOINT.to_string()
}

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

fn default_assertion_lifetime_seconds() -> i64 {
    DEFAULT_ASSERTION_LIFETIME_SECS
}

fn default_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_string()
}

fn default_http_timeout_ms() -> u64 {
    DEFAULT_HTTP_TIMEOUT_MS
}
