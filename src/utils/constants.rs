//! Shared constants and invariants

pub const DEFAULT_SAFETY_MARGIN_SECS: i64 = 600;
pub const DEFAULT_SCHEDULING_SLACK_SECS: i64 = 120;
pub const DEFAULT_ASSERTION_LIFETIME_SECS: i64 = 180;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_METRICS_PATH: &str = "/metrics";

// cache entries expire this many seconds before the token does
pub const CACHE_TTL_SHORTFALL_SECS: i64 = 2;

// longest token lifetime accepted from the token endpoint (one year)
pub const MAX_EXPIRES_IN_SECS: i64 = 365 * 24 * 60 * 60;

pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v4/token";
pub const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/logging.write";
pub const DEFAULT_KEY_PREFIX: &str = "stackdriver";
pub const DEFAULT_TOKEN_VARIABLE: &str = "log.access_token";

pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
