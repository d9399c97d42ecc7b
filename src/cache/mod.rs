pub mod freshness;
pub mod token;
pub mod token_cache;
