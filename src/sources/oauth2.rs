use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::RefreshError;
use crate::utils::constants::{JWT_BEARER_GRANT_TYPE, MAX_EXPIRES_IN_SECS};

// upstream bodies are cut to this many characters in errors
const MAX_ERROR_BODY_CHARS: usize = 256;

/// Successful token endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}

/// Client for the OAuth2 JWT-bearer grant.
#[derive(Debug, Clone)]
pub struct TokenExchange {
    client: Client,
    endpoint: String,
}

impl TokenExchange {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self { client, endpoint: endpoint.into() }
    }

    /// Build with a dedicated client using `timeout_ms` for every request.
    pub fn with_timeout(endpoint: impl Into<String>, timeout_ms: u64) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        Ok(Self::new(client, endpoint))
    }

    /// POST `grant_type=…jwt-bearer&assertion=<jwt>` and parse `{access_token, expires_in}`.
    pub async fn exchange(&self, assertion: &str) -> Result<TokenResponse, RefreshError> {
        debug!("exchanging assertion {}... at {}", prefix(assertion, 45), self.endpoint);
        let form = [("grant_type", JWT_BEARER_GRANT_TYPE), ("assertion", assertion)];

        let response = self
            .client
            .post(&self.endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| RefreshError::TokenExchangeFailed(format!("request to {} failed: {}", self.endpoint, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RefreshError::TokenExchangeFailed(format!("reading response body failed: {}", e)))?;

        if !status.is_success() {
            return Err(RefreshError::TokenExchangeFailed(format!(
                "HTTP {}: {}",
                status,
                prefix(&body, MAX_ERROR_BODY_CHARS)
            )));
        }

        let token = parse_token_response(&body)?;
        info!("token endpoint issued a token valid for {} seconds", token.expires_in);
        Ok(token)
    }
}

pub fn parse_token_response(body: &str) -> Result<TokenResponse, RefreshError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| RefreshError::MalformedUpstreamResponse(format!("body is not JSON: {}", e)))?;

    let access_token = value
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| RefreshError::MalformedUpstreamResponse("missing access_token".to_owned()))?;

    // some endpoints send expires_in as a string
    let expires_in = match value.get("expires_in") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .filter(|secs| *secs > 0 && *secs <= MAX_EXPIRES_IN_SECS)
    .ok_or_else(|| RefreshError::MalformedUpstreamResponse("missing or out of range expires_in".to_owned()))?;

    Ok(TokenResponse { access_token: access_token.to_owned(), expires_in })
}

fn prefix(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
