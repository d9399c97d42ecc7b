//! # Log Token Agent Library
//!
//! Keeps an OAuth2 access token (JWT-bearer grant) fresh in a shared cache
//! and ships log records to a cloud logging endpoint using templates that
//! reference the cached token.
//!
//! Modules:
//! - `config`: YAML service configuration, loading and validation
//! - `cache`: token cache, cache keys and freshness evaluation
//! - `secrets`: signing credential lookup
//! - `sources`: assertion signing, token exchange and the refresh loop
//! - `parser`: `{variable}` templates and flat JSON extraction
//! - `sinks`: the log sink
//! - `server`: health, metrics and inbound log endpoints

pub mod cache;
pub mod config;
pub mod error;
pub mod helpers;
pub mod observability;
pub mod parser;
pub mod resilience;
pub mod secrets;
pub mod server;
pub mod sinks;
pub mod sources;
pub mod tests;
pub mod utils;

pub use crate::config::types::ServiceConfig;
pub use crate::error::RefreshError;
pub use crate::parser::template::fill;
