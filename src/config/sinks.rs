use serde::Deserialize;

use crate::utils::constants::DEFAULT_TOKEN_VARIABLE;

/// ================================
/// Log sink
/// ================================
/// Every field is a template filled per log record, see `parser::template`.
#[derive(Debug, Deserialize, Clone)]
pub struct LogSinkConfig {
    pub endpoint: String,
    /// `Bearer {<token_variable>}` when absent
    pub authz_header: Option<String>,
    /// request body; the structured `entries:write` body when absent
    pub payload: Option<String>,
    /// variable the cached access token is exposed under
    #[serde(default = "default_token_variable")]
    pub token_variable: String,
    /// static variables available to every fill
    #[serde(default)]
    pub variables: std::collections::HashMap<String, String>,
}

impl LogSinkConfig {
    pub fn authz_header(&self) -> String {
        self.authz_header
            .clone()
            .unwrap_or_else(|| format!("Bearer {{{}}}", self.token_variable))
    }
}

fn default_token_variable() -> String {
    DEFAULT_TOKEN_VARIABLE.to_string()
}
