//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Checks settings invariants (margin / slack / retry / logging / server)
//! - Checks the token endpoint and assertion parameters
//! - Checks that the signing secrets are resolvable
//! - Checks log sink templates

use tracing::{error, info};

use crate::config::secrets::SecretsConfig;
use crate::config::settings::{RetryConfig, SettingsConfig};
use crate::config::sinks::LogSinkConfig;
use crate::config::token::TokenConfig;
use crate::config::types::ServiceConfig;
use crate::observability::metrics::get_metrics;
use crate::parser::template::MessageTemplate;
use crate::secrets::store::SecretKeys;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_token(&cfg.token, &mut errors);
    validate_secrets(&cfg.secrets, &SecretKeys::from_prefix(&cfg.token.secret_prefix), &mut errors);
    if let Some(log_sink) = &cfg.log_sink {
        validate_log_sink(log_sink, &mut errors);
    }

    if errors.is_empty() {
        info!("config validation passed");
        Ok(())
    } else {
        let metrics = get_metrics().await;
        for e in &errors {
            error!("config validation: {}", e);
            metrics.config_validation_errors.inc();
        }
        Err(errors)
    }
}

fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if settings.safety_margin_seconds < 0 {
        errors.push(format!(
            "settings.safety_margin_seconds must be >= 0, got {}",
            settings.safety_margin_seconds
        ));
    }
    if settings.scheduling_slack_seconds < 0 {
        errors.push(format!(
            "settings.scheduling_slack_seconds must be >= 0, got {}",
            settings.scheduling_slack_seconds
        ));
    }
    if settings.safety_margin_seconds > 0 && settings.scheduling_slack_seconds >= settings.safety_margin_seconds {
        errors.push(format!(
            "settings.scheduling_slack_seconds ({}) must be smaller than settings.safety_margin_seconds ({})",
            settings.scheduling_slack_seconds, settings.safety_margin_seconds
        ));
    }

    if let Some(retry) = &settings.retry {
        validate_retry(retry, errors);
    }

    if let Some(logging) = &settings.logging {
        if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' is not one of {:?}",
                logging.level, LOG_LEVELS
            ));
        }
    }

    if settings.metrics.is_enabled && !settings.metrics.path.starts_with('/') {
        errors.push(format!("settings.metrics.path '{}' must start with '/'", settings.metrics.path));
    }

    if let Some(server) = &settings.server {
        if server.host.trim().is_empty() {
            errors.push("settings.server.host must not be empty".to_string());
        }
        if server.port.parse::<u16>().is_err() {
            errors.push(format!("settings.server.port '{}' is not a valid port", server.port));
        }
    }
}

fn validate_retry(retry: &RetryConfig, errors: &mut Vec<String>) {
    if retry.attempts == Some(0) {
        errors.push("settings.retry.attempts must be >= 1".to_string());
    }
    if let (Some(base), Some(max)) = (retry.base_delay_ms, retry.max_delay_ms) {
        if base > max {
            errors.push(format!(
                "settings.retry.base_delay_ms ({}) must be <= settings.retry.max_delay_ms ({})",
                base, max
            ));
        }
    }
    if retry.base_delay_ms == Some(0) {
        errors.push("settings.retry.base_delay_ms must be > 0".to_string());
    }
}

fn validate_token(token: &TokenConfig, errors: &mut Vec<String>) {
    if !is_http_url(&token.endpoint) {
        errors.push(format!("token.endpoint '{}' must be an http(s) URL", token.endpoint));
    }
    if token.audience().trim().is_empty() {
        errors.push("token.audience must not be empty".to_string());
    }
    if token.scope.trim().is_empty() {
        errors.push("token.scope must not be empty".to_string());
    }
    if token.assertion_lifetime_seconds <= 0 {
        errors.push(format!(
            "token.assertion_lifetime_seconds must be > 0, got {}",
            token.assertion_lifetime_seconds
        ));
    }
    if token.cache_prefix.trim().is_empty() {
        errors.push("token.cache_prefix must not be empty".to_string());
    }
    if token.http_timeout_ms == 0 {
        errors.push("token.http_timeout_ms must be > 0".to_string());
    }
}

fn validate_secrets(secrets: &SecretsConfig, keys: &SecretKeys, errors: &mut Vec<String>) {
    if secrets.service_account_file.is_some() {
        return;
    }
    for key in [&keys.private_key, &keys.issuer] {
        if !secrets.values.contains_key(key) {
            errors.push(format!(
                "secrets.values['{}'] is missing and no secrets.service_account_file is set",
                key
            ));
        }
    }
}

fn validate_log_sink(sink: &LogSinkConfig, errors: &mut Vec<String>) {
    if sink.endpoint.trim().is_empty() {
        errors.push("log_sink.endpoint must not be empty".to_string());
    }
    if sink.token_variable.trim().is_empty() {
        errors.push("log_sink.token_variable must not be empty".to_string());
    }
    let authz = MessageTemplate::new(sink.authz_header());
    if !authz.placeholders().iter().any(|p| p == &sink.token_variable) {
        errors.push(format!(
            "log_sink.authz_header '{}' does not reference the token variable '{{{}}}'",
            authz.as_str(),
            sink.token_variable
        ));
    }
}

fn is_http_url(url: &str) -> bool {
    (url.starts_with("https://") && url.len() > "https://".len())
        || (url.starts_with("http://") && url.len() > "http://".len())
}
