use serde::Deserialize;

use crate::config::secrets::SecretsConfig;
use crate::config::settings::SettingsConfig;
use crate::config::sinks::LogSinkConfig;
use crate::config::token::TokenConfig;

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    pub token: TokenConfig,
    #[serde(default)]
    pub secrets: SecretsConfig,
    pub log_sink: Option<LogSinkConfig>,
}
