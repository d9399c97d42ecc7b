use anyhow::Result;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::token::CacheKeys;
use crate::cache::token_cache::{read_cached_token, TokenCacheStore};
use crate::config::sinks::LogSinkConfig;
use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;
use crate::parser::context::VariableStore;
use crate::parser::flat_json::extract_into;
use crate::parser::template::{fill, MessageTemplate, NOT_AVAILABLE};
use crate::sinks::log_entry::{
    LogEntriesRequest, DEFAULT_LOG_NAME_TEMPLATE, DEFAULT_MESSAGE_TEMPLATE, DEFAULT_SEVERITY, DEFAULT_SEVERITY_TEMPLATE,
};

/// A filled, ready to send log request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRequest {
    pub url: String,
    pub authorization: String,
    pub body: String,
}

/// Ships log records to the logging endpoint with the cached bearer token.
///
/// Delivery is fire-and-forget: [`LogSink::ship`] returns as soon as the
/// request is spawned, and an absent token or a failed post only shows up in
/// logs and metrics.
#[derive(Debug, Clone)]
pub struct LogSink<C> {
    endpoint: MessageTemplate,
    authz_header: MessageTemplate,
    payload: Option<MessageTemplate>,
    token_variable: String,
    variables: VariableStore,
    cache: C,
    cache_keys: CacheKeys,
    client: Client,
}

impl<C: TokenCacheStore> LogSink<C> {
    pub fn new(cfg: &LogSinkConfig, cache: C, cache_keys: CacheKeys, client: Client) -> Self {
        Self {
            endpoint: MessageTemplate::new(cfg.endpoint.to_owned()),
            authz_header: MessageTemplate::new(cfg.authz_header()),
            payload: cfg.payload.as_ref().map(|p| MessageTemplate::new(p.to_owned())),
            token_variable: cfg.token_variable.to_owned(),
            variables: cfg.variables.iter().map(|(k, v)| (k.to_owned(), v.to_owned())).collect(),
            cache,
            cache_keys,
            client,
        }
    }

    /// Fill endpoint, authorization header and body for `vars`.
    ///
    /// Static variables come first and `vars` override them. The cached
    /// token (when there is one) is only visible to the authorization
    /// header: filled values are scanned again, so an inbound field holding
    /// `{log.access_token}` must not reach the endpoint or the body.
    pub async fn prepare(&self, vars: &VariableStore) -> Result<LogRequest> {
        let mut ctx = self.variables.clone();
        ctx.merge(vars);
        ctx.unset(&self.token_variable);

        let body = match &self.payload {
            Some(payload) => payload.fill(&ctx),
            None => default_body(&ctx)?,
        };
        let url = self.endpoint.fill(&ctx);

        match read_cached_token(&self.cache, &self.cache_keys).await {
            Some(token) => {
                ctx.set(self.token_variable.to_owned(), token.access_token);
            }
            None => {
                debug!("no cached token, '{}' left unset", self.token_variable);
            }
        }

        Ok(LogRequest { url, authorization: self.authz_header.fill(&ctx), body })
    }

    /// Fill and post one record without waiting for the response.
    ///
    /// The returned handle only matters to callers that want to await
    /// delivery; failures are logged and counted, never returned.
    pub async fn ship(&self, vars: &VariableStore) -> JoinHandle<()> {
        let prepared = self.prepare(vars).await;
        let client = self.client.clone();
        tokio::spawn(async move {
            match prepared {
                Ok(request) => post(client, request).await,
                Err(err) => {
                    get_metrics().await.log_posts.with_label_values(&["render_error"]).inc();
                    warn!("log record dropped, rendering failed: {}", err);
                }
            }
        })
    }

    /// Ship an inbound flat JSON message, its fields exposed as `<prefix>.<field>`.
    pub async fn ship_message(&self, prefix: &str, raw_json: &str, vars: &VariableStore) -> JoinHandle<()> {
        let mut all = vars.clone();
        extract_into(&mut all, prefix, raw_json);
        self.ship(&all).await
    }
}

fn default_body(ctx: &VariableStore) -> Result<String> {
    let request = LogEntriesRequest::single(
        fill(DEFAULT_LOG_NAME_TEMPLATE, ctx),
        severity(ctx),
        fill(DEFAULT_MESSAGE_TEMPLATE, ctx),
    );
    Ok(serde_json::to_string(&request)?)
}

// unset severity falls back to INFO instead of "n/a"
fn severity(ctx: &VariableStore) -> String {
    let filled = fill(DEFAULT_SEVERITY_TEMPLATE, ctx);
    if filled.is_empty() || filled == NOT_AVAILABLE {
        DEFAULT_SEVERITY.to_owned()
    } else {
        filled
    }
}

async fn post(client: Client, request: LogRequest) {
    let metrics = get_metrics().await;
    let start = get_instant();
    let result = client
        .post(&request.url)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, &request.authorization)
        .body(request.body)
        .send()
        .await;
    metrics.log_post_duration.observe(start.elapsed().as_secs_f64());

    match result {
        Ok(response) if response.status().is_success() => {
            metrics.log_posts.with_label_values(&["success"]).inc();
            info!("log record delivered to {}", request.url);
        }
        Ok(response) => {
            metrics.log_posts.with_label_values(&["http_error"]).inc();
            warn!("log endpoint {} answered {}", request.url, response.status());
        }
        Err(err) => {
            metrics.log_posts.with_label_values(&["transport_error"]).inc();
            warn!("posting log record to {} failed: {}", request.url, err);
        }
    }
}
