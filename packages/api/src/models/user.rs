//! # User model
//!
//! ## [`User`]
//!
//! The complete row from the `users` table, loaded with [`sqlx::FromRow`]:
//!
//! - `id`: `BIGSERIAL` primary key.
//! - `username`, `email`: both unique; email is stored trimmed and lowercased.
//! - `password_hash`: Argon2id PHC string.
//! - `is_verified`, `verification_code`, `code_expiry_time`: the email verification
//!   state. A verified user never has a pending code or expiry.
//! - `created_at`: set by the store.
//!
//! ## [`UserInfo`]
//!
//! The subset that may leave the server. It omits the hash and the pending code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full user record from the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_verified: bool,
    pub verification_code: Option<String>,
    pub code_expiry_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Convert to UserInfo for client consumption.
    pub fn to_info(&self) -> UserInfo {
        UserInfo {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            is_verified: self.is_verified,
        }
    }
}

/// Fields supplied when inserting a user. Every new user starts unverified.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub verification_code: String,
    pub code_expiry_time: DateTime<Utc>,
}

/// User information safe to send to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_verified: bool,
}
