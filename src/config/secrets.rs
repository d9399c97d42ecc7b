use serde::Deserialize;
use std::collections::HashMap;

/// ================================
/// Secrets
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SecretsConfig {
    /// Google service-account key file; supplies issuer and private key
    pub service_account_file: Option<String>,
    #[serde(default)]
    pub values: HashMap<String, SecretValue>,
}

/// Where a secret value comes from. Env and files are re-read on every lookup.
#[derive(Deserialize, Clone)]
#[serde(untagged)]
pub enum SecretValue {
    Literal {
        value: String,
    },
    FromEnv {
        from_env: String,
    },
    FromFile {
        path: String,
    },
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretValue::Literal { .. } => f.debug_struct("Literal").field("value", &"[REDACTED]").finish(),
            SecretValue::FromEnv { from_env } => f.debug_struct("FromEnv").field("from_env", from_env).finish(),
            SecretValue::FromFile { path } => f.debug_struct("FromFile").field("path", path).finish(),
        }
    }
}
