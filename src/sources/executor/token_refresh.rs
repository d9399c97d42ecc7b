use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cache::freshness::{evaluate, TokenState};
use crate::cache::token::{CacheKeys, CachedToken};
use crate::cache::token_cache::TokenCacheStore;
use crate::config::settings::FailurePolicy;
use crate::config::types::ServiceConfig;
use crate::error::RefreshError;
use crate::helpers::time::{get_instant, system_clock, Clock};
use crate::observability::metrics::get_metrics;
use crate::resilience::retry::RetrySettings;
use crate::secrets::store::{load_signing_credential, SecretKeys, SecretStore};
use crate::sources::assertion::sign_assertion;
use crate::sources::oauth2::TokenExchange;
use crate::utils::constants::CACHE_TTL_SHORTFALL_SECS;

/// Shortest sleep between two iterations.
pub const MIN_DELAY_SECS: i64 = 1;

/// Constants of the refresh loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSettings {
    pub audience: String,
    pub scope: String,
    pub safety_margin_seconds: i64,
    pub scheduling_slack_seconds: i64,
    pub assertion_lifetime_seconds: i64,
    pub cache_keys: CacheKeys,
    pub secret_keys: SecretKeys,
    pub failure_policy: FailurePolicy,
    pub retry: RetrySettings,
}

impl RefreshSettings {
    pub fn from_config(cfg: &ServiceConfig) -> Self {
        Self {
            audience: cfg.token.audience().to_owned(),
            scope: cfg.token.scope.to_owned(),
            safety_margin_seconds: cfg.settings.safety_margin_seconds,
            scheduling_slack_seconds: cfg.settings.scheduling_slack_seconds,
            assertion_lifetime_seconds: cfg.token.assertion_lifetime_seconds,
            cache_keys: CacheKeys::from_prefix(&cfg.token.cache_prefix),
            secret_keys: SecretKeys::from_prefix(&cfg.token.secret_prefix),
            failure_policy: cfg.settings.failure_policy,
            retry: RetrySettings::from_config(&cfg.settings.retry),
        }
    }
}

/// Result of one successful iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// cached token still outside the margin, nothing was done
    Fresh { remaining_seconds: i64, next_check: Duration },
    /// a new token was obtained and cached
    Refreshed { token: CachedToken, ttl_seconds: i64, next_check: Duration },
}

impl RefreshOutcome {
    pub fn next_check(&self) -> Duration {
        match self {
            RefreshOutcome::Fresh { next_check, .. } | RefreshOutcome::Refreshed { next_check, .. } => *next_check,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            RefreshOutcome::Fresh { .. } => "fresh",
            RefreshOutcome::Refreshed { .. } => "refreshed",
        }
    }
}

/// Invoked after every iteration with its result.
pub type RefreshCallback = Arc<dyn Fn(Result<&RefreshOutcome, &RefreshError>) + Send + Sync>;

/// Keeps the cached access token ahead of its expiry.
///
/// Each iteration reads the cached expiry, and when the token is inside the
/// safety margin (or absent) signs a new assertion, exchanges it and writes
/// the token plus expiry back to the cache. Readers of the cache are never
/// blocked by a refresh.
pub struct TokenLifecycleManager<S, C> {
    settings: RefreshSettings,
    secrets: S,
    cache: C,
    exchange: TokenExchange,
    clock: Arc<dyn Clock>,
    callback: Option<RefreshCallback>,
}

impl<S: SecretStore, C: TokenCacheStore> TokenLifecycleManager<S, C> {
    pub fn new(settings: RefreshSettings, secrets: S, cache: C, exchange: TokenExchange) -> Self {
        Self {
            settings,
            secrets,
            cache,
            exchange,
            clock: system_clock(),
            callback: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(Result<&RefreshOutcome, &RefreshError>) + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    pub fn settings(&self) -> &RefreshSettings {
        &self.settings
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Freshness of the cached token right now. Read errors count as no token.
    pub async fn check_state(&self) -> TokenState {
        let expiry = self.read_expiry().await;
        let now = self.clock.now_epoch_seconds();
        evaluate(expiry, now, self.settings.safety_margin_seconds)
    }

    /// Run a single iteration: check, refresh when stale, report.
    pub async fn run_once(&self) -> Result<RefreshOutcome, RefreshError> {
        let metrics = get_metrics().await;
        let result = self.iterate().await;

        match &result {
            Ok(outcome) => {
                metrics.refresh_checks.with_label_values(&[outcome.label()]).inc();
                if let RefreshOutcome::Refreshed { token, .. } = outcome {
                    metrics.token_expiry_unix.set(token.expiry_epoch_seconds);
                }
            }
            Err(err) => {
                error!("token refresh failed: {}", err);
                metrics.refresh_checks.with_label_values(&["failed"]).inc();
                metrics.refresh_failures.with_label_values(&[err.reason()]).inc();
            }
        }

        if let Some(callback) = &self.callback {
            callback(result.as_ref());
        }
        result
    }

    /// Loop until `cancel` fires.
    ///
    /// With [`FailurePolicy::Stop`] the first failed iteration ends the loop
    /// and its error is returned; with [`FailurePolicy::Retry`] the loop backs
    /// off and tries again.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), RefreshError> {
        info!(
            "token maintenance started, margin {} seconds, failure policy {:?}",
            self.settings.safety_margin_seconds, self.settings.failure_policy
        );
        let mut failures: u32 = 0;

        loop {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("token maintenance cancelled");
                    return Ok(());
                }
                result = self.run_once() => result,
            };

            let delay = match result {
                Ok(outcome) => {
                    failures = 0;
                    outcome.next_check()
                }
                Err(err) => match self.settings.failure_policy {
                    FailurePolicy::Stop => {
                        error!("token maintenance stopped after failure: {}", err);
                        return Err(err);
                    }
                    FailurePolicy::Retry => {
                        failures = failures.saturating_add(1);
                        let delay = self.settings.retry.delay_after(failures);
                        warn!("refresh failure #{}, retrying in {:?}", failures, delay);
                        delay
                    }
                },
            };

            debug!("next token check in {:?}", delay);
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => {
                    info!("token maintenance cancelled");
                    return Ok(());
                }
            }
        }
    }

    async fn iterate(&self) -> Result<RefreshOutcome, RefreshError> {
        match self.check_state().await {
            TokenState::Fresh { remaining_seconds } => {
                info!("cached token current, {} seconds remaining", remaining_seconds);
                Ok(RefreshOutcome::Fresh {
                    remaining_seconds,
                    next_check: delay_from_seconds(remaining_seconds - self.settings.scheduling_slack_seconds),
                })
            }
            TokenState::Stale { remaining_seconds } => {
                info!("cached token stale ({} seconds remaining), generating new token", remaining_seconds);
                self.refresh().await
            }
        }
    }

    async fn read_expiry(&self) -> Option<i64> {
        match self.cache.get(&self.settings.cache_keys.expiry).await {
            Ok(Some(raw)) => raw.trim().parse::<i64>().ok(),
            Ok(None) => None,
            Err(err) => {
                warn!("reading '{}' failed, treating token as absent: {}", self.settings.cache_keys.expiry, err);
                None
            }
        }
    }

    async fn refresh(&self) -> Result<RefreshOutcome, RefreshError> {
        let start = get_instant();
        let credential = load_signing_credential(&self.secrets, &self.settings.secret_keys).await?;

        let now = self.clock.now_epoch_seconds();
        let assertion = sign_assertion(
            &credential,
            &self.settings.audience,
            &self.settings.scope,
            now,
            self.settings.assertion_lifetime_seconds,
        )?;

        let response = self.exchange.exchange(&assertion).await;
        get_metrics().await.refresh_duration.observe(start.elapsed().as_secs_f64());
        let response = response?;

        let now = self.clock.now_epoch_seconds();
        let ttl_seconds = response.expires_in - CACHE_TTL_SHORTFALL_SECS;
        let expiry = now.checked_add(response.expires_in).ok_or_else(|| {
            RefreshError::MalformedUpstreamResponse(format!("expires_in {} overflows the expiry", response.expires_in))
        })?;
        let token = CachedToken::new(response.access_token, expiry);
        self.store(&token, ttl_seconds).await?;

        info!("token cached until {}, ttl {} seconds", token.expiry_epoch_seconds, ttl_seconds);
        Ok(RefreshOutcome::Refreshed {
            next_check: delay_from_seconds(ttl_seconds - self.settings.safety_margin_seconds),
            token,
            ttl_seconds,
        })
    }

    // token first: an expiry entry always has its token next to it
    async fn store(&self, token: &CachedToken, ttl_seconds: i64) -> Result<(), RefreshError> {
        let keys = &self.settings.cache_keys;
        self.cache
            .put(&keys.token, &token.access_token, ttl_seconds)
            .await
            .map_err(|e| RefreshError::CacheWriteFailed { key: keys.token.to_owned(), reason: e.to_string() })?;
        self.cache
            .put(&keys.expiry, &token.expiry_epoch_seconds.to_string(), ttl_seconds)
            .await
            .map_err(|e| RefreshError::CacheWriteFailed { key: keys.expiry.to_owned(), reason: e.to_string() })
    }
}

impl<S, C> TokenLifecycleManager<S, C>
where
    S: SecretStore + 'static,
    C: TokenCacheStore + 'static,
{
    /// Run the loop on its own task.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<Result<(), RefreshError>> {
        tokio::spawn(async move { self.run(cancel).await })
    }
}

fn delay_from_seconds(seconds: i64) -> Duration {
    Duration::from_secs(seconds.max(MIN_DELAY_SECS) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_is_clamped_to_minimum() {
        assert_eq!(delay_from_seconds(-40), Duration::from_secs(1));
        assert_eq!(delay_from_seconds(0), Duration::from_secs(1));
        assert_eq!(delay_from_seconds(2998), Duration::from_secs(2998));
    }
}
