use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::token::{CacheKeys, CachedToken};

/// Shared key/value cache with per-entry TTL.
pub trait TokenCacheStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    fn put(&self, key: &str, value: &str, ttl_seconds: i64) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// Process-local cache; clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTokenCache {
    inner: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemoryTokenCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenCacheStore for InMemoryTokenCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let map = self.inner.read().await;
        Ok(map
            .get(key)
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.value.to_owned()))
    }

    async fn put(&self, key: &str, value: &str, ttl_seconds: i64) -> Result<()> {
        if ttl_seconds <= 0 {
            return Err(anyhow!("ttl must be positive, got {} for key '{}'", ttl_seconds, key));
        }
        let expires_at = Instant::now()
            .checked_add(Duration::from_secs(ttl_seconds as u64))
            .ok_or_else(|| anyhow!("ttl {} seconds out of range for key '{}'", ttl_seconds, key))?;
        let mut map = self.inner.write().await;
        map.insert(key.to_owned(), Entry { value: value.to_owned(), expires_at });
        debug!("cache entry '{}' stored, ttl {} seconds", key, ttl_seconds);
        Ok(())
    }
}

/// Read path for token consumers: whatever is cached, or nothing.
///
/// Never waits on a refresh and never fails; cache errors read as absent.
pub async fn read_cached_token<C: TokenCacheStore>(cache: &C, keys: &CacheKeys) -> Option<CachedToken> {
    let access_token = match cache.get(&keys.token).await {
        Ok(Some(token)) if !token.is_empty() => token,
        Ok(_) => return None,
        Err(err) => {
            debug!("reading cached token '{}' failed: {}", keys.token, err);
            return None;
        }
    };
    let expiry_epoch_seconds = cache
        .get(&keys.expiry)
        .await
        .ok()
        .flatten()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .unwrap_or(0);
    Some(CachedToken::new(access_token, expiry_epoch_seconds))
}
