/// Access token as published to the shared cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedToken {
    pub access_token: String,
    pub expiry_epoch_seconds: i64, // UNIX TIMESTAMP
}

impl CachedToken {
    pub fn new(access_token: String, expiry_epoch_seconds: i64) -> Self {
        Self { access_token, expiry_epoch_seconds }
    }
}

/// Cache entry names derived from a shared prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    pub token: String,
    pub expiry: String,
}

impl CacheKeys {
    pub fn from_prefix(prefix: &str) -> Self {
        Self {
            token: format!("{}-access-token", prefix),
            expiry: format!("{}-access-token-expiry", prefix),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_prefix() {
        let keys = CacheKeys::from_prefix("stackdriver");
        assert_eq!(keys.token, "stackdriver-access-token");
        assert_eq!(keys.expiry, "stackdriver-access-token-expiry");
    }
}
