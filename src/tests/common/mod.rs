// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use anyhow::{anyhow, Result};
use axum::routing::post;
use http::StatusCode;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::cache::token::CacheKeys;
use crate::cache::token_cache::{InMemoryTokenCache, TokenCacheStore};
use crate::config::settings::FailurePolicy;
use crate::helpers::time::Clock;
use crate::resilience::retry::RetrySettings;
use crate::secrets::store::{InMemorySecretStore, SecretKeys};
use crate::sources::executor::token_refresh::RefreshSettings;

pub const TEST_RSA_PRIVATE_KEY: &str = include_str!("../fixtures/test_rsa_key.pem");
pub const TEST_RSA_PUBLIC_KEY: &str = include_str!("../fixtures/test_rsa_key.pub.pem");
pub const TEST_ISSUER: &str = "agent@test-project.iam.gserviceaccount.com";
pub const TEST_NOW: i64 = 1_700_000_000;

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

/// Token endpoint answering `status` / `body` and counting calls.
pub async fn spawn_token_endpoint(status: StatusCode, body: serde_json::Value) -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let router = Router::new().route(
        "/token",
        post(move || {
            let counter = counter.clone();
            let body = body.to_string();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (status, body)
            }
        }),
    );
    let (_handle, addr) = spawn_axum(router).await;
    (format!("http://{}/token", addr), calls)
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock(AtomicI64);

impl FixedClock {
    pub fn at(now: i64) -> Arc<Self> {
        Arc::new(Self(AtomicI64::new(now)))
    }

    pub fn set(&self, now: i64) {
        self.0.store(now, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_epoch_seconds(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// In-memory cache that records every write and can be told to fail them.
#[derive(Debug, Clone, Default)]
pub struct RecordingCache {
    inner: InMemoryTokenCache,
    pub puts: Arc<Mutex<Vec<(String, String, i64)>>>,
    fail_writes: Arc<AtomicBool>,
}

impl RecordingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_writes() -> Self {
        let cache = Self::default();
        cache.fail_writes.store(true, Ordering::SeqCst);
        cache
    }

    pub fn recorded(&self) -> Vec<(String, String, i64)> {
        self.puts.lock().unwrap().clone()
    }

    /// Seed an entry without recording it.
    pub async fn seed(&self, key: &str, value: &str) {
        self.inner.put(key, value, 86_400).await.unwrap();
    }
}

impl TokenCacheStore for RecordingCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: &str, ttl_seconds: i64) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("cache backend unavailable"));
        }
        self.puts.lock().unwrap().push((key.to_owned(), value.to_owned(), ttl_seconds));
        self.inner.put(key, value, ttl_seconds).await
    }
}

/// Secret store holding the test key and issuer under the `stackdriver` prefix.
pub async fn test_secrets() -> InMemorySecretStore {
    let keys = SecretKeys::from_prefix("stackdriver");
    let store = InMemorySecretStore::new();
    store.insert(keys.private_key, TEST_RSA_PRIVATE_KEY).await;
    store.insert(keys.issuer, TEST_ISSUER).await;
    store
}

/// Margin 600, slack 120, fast retries.
pub fn test_refresh_settings(policy: FailurePolicy) -> RefreshSettings {
    RefreshSettings {
        audience: "https://oauth2.example.test/token".to_owned(),
        scope: "https://www.googleapis.com/auth/logging.write".to_owned(),
        safety_margin_seconds: 600,
        scheduling_slack_seconds: 120,
        assertion_lifetime_seconds: 180,
        cache_keys: CacheKeys::from_prefix("stackdriver"),
        secret_keys: SecretKeys::from_prefix("stackdriver"),
        failure_policy: policy,
        retry: RetrySettings { attempts: 3, base_delay_ms: 20, max_delay_ms: 50 },
    }
}
