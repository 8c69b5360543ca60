//! # Email verification lifecycle
//!
//! Each account is either `Unverified(code, expiry)` or `Verified`:
//!
//! ```text
//!   register ──► Unverified(code, now + 15m) ──verify(code)──► Verified
//!                      ▲            │
//!                      └── resend ──┘  (new code, now + 5m)
//! ```
//!
//! This module holds the pure parts: code generation, expiry windows and the ordered
//! checks a submitted code must pass. Persisting the transition is the store's job
//! (see [`crate::store::UserStore::mark_verified`]).

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;

use crate::error::ApiError;
use crate::models::User;

/// Number of digits in a verification code.
pub const CODE_LENGTH: usize = 6;

/// Lifetime of the code sent at registration.
pub const REGISTRATION_CODE_TTL_MINUTES: i64 = 15;

/// Lifetime of a code sent through `/resend-code`. Shorter than the registration window.
pub const RESEND_CODE_TTL_MINUTES: i64 = 5;

/// Current state of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationState<'a> {
    Unverified {
        code: Option<&'a str>,
        expires_at: Option<DateTime<Utc>>,
    },
    Verified,
}

impl<'a> VerificationState<'a> {
    pub fn of(user: &'a User) -> Self {
        if user.is_verified {
            VerificationState::Verified
        } else {
            VerificationState::Unverified {
                code: user.verification_code.as_deref(),
                expires_at: user.code_expiry_time,
            }
        }
    }
}

/// A freshly generated code together with its absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCode {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl PendingCode {
    pub fn for_registration(now: DateTime<Utc>) -> Self {
        Self::with_ttl(now, TimeDelta::minutes(REGISTRATION_CODE_TTL_MINUTES))
    }

    pub fn for_resend(now: DateTime<Utc>) -> Self {
        Self::with_ttl(now, TimeDelta::minutes(RESEND_CODE_TTL_MINUTES))
    }

    fn with_ttl(now: DateTime<Utc>, ttl: TimeDelta) -> Self {
        Self {
            code: generate_code(),
            expires_at: now + ttl,
        }
    }
}

/// Uniform six-digit code, zero-padded.
pub fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{n:0width$}", width = CODE_LENGTH)
}

/// Check a submitted code against the user's pending one.
///
/// Order: already verified, then exact string match, then expiry.
pub fn check_code(user: &User, submitted: &str, now: DateTime<Utc>) -> Result<(), ApiError> {
    match VerificationState::of(user) {
        VerificationState::Verified => Err(ApiError::AlreadyVerified),
        VerificationState::Unverified { code, expires_at } => {
            if code != Some(submitted) {
                return Err(ApiError::CodeMismatch);
            }
            match expires_at {
                Some(expires_at) if now <= expires_at => Ok(()),
                _ => Err(ApiError::CodeExpired),
            }
        }
    }
}
