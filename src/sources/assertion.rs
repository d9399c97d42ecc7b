use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::error::RefreshError;
use crate::secrets::store::SigningCredential;

/// Claims of the JWT-bearer assertion presented to the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub aud: String,
    pub scope: String,
    pub iat: i64,
    pub exp: i64,
}

impl AssertionClaims {
    pub fn new(issuer: &str, audience: &str, scope: &str, now: i64, lifetime_seconds: i64) -> Self {
        Self {
            iss: issuer.to_owned(),
            aud: audience.to_owned(),
            scope: scope.to_owned(),
            iat: now,
            exp: now + lifetime_seconds,
        }
    }
}

/// Sign the assertion with RS256 using the credential's PEM private key.
pub fn sign_assertion(
    credential: &SigningCredential,
    audience: &str,
    scope: &str,
    now: i64,
    lifetime_seconds: i64,
) -> Result<String, RefreshError> {
    if now.checked_add(lifetime_seconds).is_none() {
        return Err(RefreshError::SigningFailed(format!(
            "assertion lifetime {} overflows issue time {}",
            lifetime_seconds, now
        )));
    }
    let claims = AssertionClaims::new(&credential.issuer, audience, scope, now, lifetime_seconds);
    let key = EncodingKey::from_rsa_pem(credential.private_key_pem.as_bytes())
        .map_err(|e| RefreshError::SigningFailed(format!("invalid private key: {}", e)))?;
    encode(&Header::new(Algorithm::RS256), &claims, &key)
        .map_err(|e| RefreshError::SigningFailed(e.to_string()))
}
