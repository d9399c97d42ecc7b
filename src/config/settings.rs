use serde::Deserialize;

use crate::utils::constants::{
    DEFAULT_METRICS_PATH, DEFAULT_SAFETY_MARGIN_SECS, DEFAULT_SCHEDULING_SLACK_SECS,
};

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct SettingsConfig {
    /// refresh once fewer than this many seconds of token lifetime remain
    #[serde(default = "default_safety_margin_seconds")]
    pub safety_margin_seconds: i64,
    /// wake up this many seconds before the margin boundary
    #[serde(default = "default_scheduling_slack_seconds")]
    pub scheduling_slack_seconds: i64,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    pub retry: Option<RetryConfig>,
    #[serde(default)]
    pub metrics: MetricsConfig,
    pub server: Option<ServerConfig>,
    pub logging: Option<LoggingConfig>,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            safety_margin_seconds: DEFAULT_SAFETY_MARGIN_SECS,
            scheduling_slack_seconds: DEFAULT_SCHEDULING_SLACK_SECS,
            failure_policy: FailurePolicy::default(),
            retry: None,
            metrics: MetricsConfig::default(),
            server: None,
            logging: None,
        }
    }
}

/// What the refresh loop does after a failed cycle.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// keep refreshing, backing off between failed cycles
    #[default]
    Retry,
    /// exit the loop after the first failed cycle
    Stop,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    pub attempts: Option<u32>,
    /// will be mutiply by 2 on every attempt until max_delay_ms
    pub base_delay_ms: Option<u64>,
    /// max delay for retrying
    /// invariant: >= base_delay_ms.
    pub max_delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_path")]
    pub path: String,
    #[serde(default)]
    pub is_enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { path: default_metrics_path(), is_enabled: false }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: String,
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

fn default_safety_margin_seconds() -> i64 {
    DEFAULT_SAFETY_MARGIN_SECS
}

fn default_scheduling_slack_seconds() -> i64 {
    DEFAULT_SCHEDULING_SLACK_SECS
}

fn default_metrics_path() -> String {
    DEFAULT_METRICS_PATH.to_string()
}
