use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Deserialize;

use crate::{
    error::{ClientError, Result},
    models::{Role, User},
};

/// TokenClaims
///
/// The subset of the session token's payload segment the client reads. The token is
/// never verified here; the backend remains the only authority over its signature.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    pub id: i64,
    pub role: Role,
    /// Expiration Time (exp), seconds since the Unix epoch. Optional: not every backend revision sets it.
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    pub fn user(&self) -> User {
        User {
            id: self.id,
            role: self.role,
        }
    }

    /// True once `now` has reached the `exp` claim. Tokens without `exp` never expire client-side.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp.is_some_and(|exp| now >= exp)
    }
}

/// decode_claims
///
/// Reads the JSON object held in the middle segment of a `header.payload.signature`
/// token. Accepts both base64url and standard base64, padded or not.
pub fn decode_claims(token: &str) -> Result<TokenClaims> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) if !payload.is_empty() => payload,
        _ => {
            return Err(ClientError::Validation(
                "token is not a three-segment token".to_string(),
            ));
        }
    };

    let normalized: String = payload
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = URL_SAFE_NO_PAD
        .decode(normalized.as_bytes())
        .map_err(|e| ClientError::Validation(format!("token payload is not base64: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| ClientError::Validation(format!("token payload is not valid claims: {e}")))
}

/// True when the token carries an `exp` claim at or before `now`. Opaque tokens are
/// trusted until the server rejects them.
pub fn token_expired_at(token: &str, now: i64) -> bool {
    decode_claims(token)
        .map(|claims| claims.is_expired_at(now))
        .unwrap_or(false)
}
