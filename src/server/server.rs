use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cache::token_cache::InMemoryTokenCache;
use crate::config::settings::SettingsConfig;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;
use crate::parser::context::VariableStore;
use crate::parser::flat_json::DEFAULT_OUTPUT_PREFIX;
use crate::sinks::log_sink::LogSink;

pub const NOT_FOUND_MESSAGE: &str = "This is not the server you're looking for.";

/// Inbound log messages. Their fields are template input, the cached token
/// is never substituted into the shipped body or endpoint.
pub const LOG_PATH: &str = "/log";

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    pub log_sink: Option<Arc<LogSink<InMemoryTokenCache>>>,
}

impl AppState {
    pub fn new(metrics: &Metrics, log_sink: Option<LogSink<InMemoryTokenCache>>) -> Self {
        Self {
            metrics_state: MetricsState::new(metrics.registry.clone()),
            log_sink: log_sink.map(Arc::new),
        }
    }
}

/// Health, metrics, inbound log messages and a JSON 404 for everything else.
pub fn router(settings_config: &SettingsConfig, state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .merge(state.metrics_state.router(&settings_config.metrics));
    if state.log_sink.is_some() {
        router = router.route(LOG_PATH, post(inbound_log));
    }
    router.fallback(not_found).with_state(state)
}

/// Serve until `cancel` fires. Without a `server` section nothing is bound.
pub async fn start(
    settings_config: &SettingsConfig,
    log_sink: Option<LogSink<InMemoryTokenCache>>,
    cancel: CancellationToken,
) -> Result<()> {
    let Some(server) = &settings_config.server else {
        info!("no server configured, http endpoints disabled");
        return Ok(());
    };

    let metrics = get_metrics().await;
    let app = router(settings_config, AppState::new(metrics, log_sink));

    let bind_addr = format!("{}:{}", server.host, server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {}", bind_addr))?;
    info!("http server listening on {}", bind_addr);
    metrics.up.set(1);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await;
    metrics.up.set(0);
    served.context("http server failed")
}

async fn health() -> &'static str {
    "ok"
}

// body is a flat JSON object, its fields become `json.<field>` variables
async fn inbound_log(State(state): State<AppState>, body: String) -> (StatusCode, Json<Value>) {
    if let Some(sink) = &state.log_sink {
        // delivery runs detached, the handle is not awaited
        let _ = sink.ship_message(DEFAULT_OUTPUT_PREFIX, &body, &VariableStore::new()).await;
    }
    (StatusCode::ACCEPTED, Json(json!({ "status": "accepted" })))
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "message": NOT_FOUND_MESSAGE })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::MetricsConfig;
    use crate::tests::common::spawn_axum;

    #[tokio::test]
    async fn health_metrics_and_fallback() {
        let settings = SettingsConfig {
            metrics: MetricsConfig { path: "/metrics".to_owned(), is_enabled: true },
            ..SettingsConfig::default()
        };
        let app = router(&settings, AppState::new(get_metrics().await, None));
        let (_h, addr) = spawn_axum(app).await;
        let client = reqwest::Client::new();

        let health = client.get(format!("http://{}/health", addr)).send().await.unwrap();
        assert_eq!(health.status(), StatusCode::OK);
        assert_eq!(health.text().await.unwrap(), "ok");

        let metrics = client.get(format!("http://{}/metrics", addr)).send().await.unwrap();
        assert_eq!(metrics.status(), StatusCode::OK);
        assert!(metrics.text().await.unwrap().contains("logtokenagent_up"));

        // no log sink configured, so /log is not routed either
        for path in ["/nope", LOG_PATH] {
            let resp = client.post(format!("http://{}{}", addr, path)).send().await.unwrap();
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
            let body: Value = resp.json().await.unwrap();
            assert_eq!(body, json!({ "message": NOT_FOUND_MESSAGE }));
        }
    }
}
