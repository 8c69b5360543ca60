//! # Stateless bearer tokens
//!
//! Tokens are compact HS256 JWTs: `base64url(header).base64url(claims).base64url(mac)`
//! where `mac` is HMAC-SHA256 over the first two segments, keyed with the secret passed
//! to [`TokenIssuer::new`]. Claims carry the user id, the issue time and an absolute
//! expiry [`TOKEN_TTL_SECS`] after issuance.
//!
//! Nothing is stored server-side, so a token stays valid until it expires.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Token lifetime: 24 hours.
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

const ALGORITHM: &str = "HS256";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Token signature is invalid")]
    InvalidSignature,
    #[error("Token has expired")]
    Expired,
    #[error("Token is malformed")]
    Malformed,
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Decoded token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
}

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Signs and verifies bearer tokens with a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    key: Arc<[u8]>,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer").finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: Arc::from(secret.as_ref()),
        }
    }

    /// Issue a token for `user_id`, valid for 24 hours from now.
    pub fn issue(&self, user_id: i64) -> Result<String, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: i64, now: DateTime<Utc>) -> Result<String, TokenError> {
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        };
        let claims = Claims {
            user_id,
            iat: now.timestamp(),
            exp: now.timestamp() + TOKEN_TTL_SECS,
        };

        let signing_input = format!("{}.{}", encode_segment(&header)?, encode_segment(&claims)?);
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }

    /// Verify a token and return the user id it was issued for.
    pub fn verify(&self, token: &str) -> Result<i64, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<i64, TokenError> {
        self.decode_at(token, now).map(|claims| claims.user_id)
    }

    /// Check structure, signature and expiry, in that order, and return the claims.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let mut segments = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TokenError::Malformed);
        };

        let parsed: Header = decode_segment(header)?;
        if parsed.alg != ALGORITHM {
            return Err(TokenError::Malformed);
        }
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;

        let mut mac = self.mac()?;
        mac.update(&token.as_bytes()[..header.len() + 1 + payload.len()]);
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims: Claims = decode_segment(payload)?;
        if now.timestamp() > claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(&self.key).map_err(|e| TokenError::Signing(e.to_string()))
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value).map_err(|e| TokenError::Signing(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}
