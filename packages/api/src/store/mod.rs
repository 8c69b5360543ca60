//! # Credential and note storage
//!
//! Two traits describe everything the HTTP layer needs from persistence:
//!
//! | Trait | Responsibility |
//! |-------|----------------|
//! | [`UserStore`] | Users, password hashes and the verification code/expiry pair |
//! | [`NoteStore`] | Diary notes, every query filtered by owner |
//!
//! [`PgStore`] implements both on PostgreSQL; [`MemoryStore`] implements both in
//! process for tests and local experiments.
//!
//! Verification transitions are conditional updates: [`UserStore::mark_verified`] only
//! succeeds while the row is unverified *and* still holds the submitted code, and
//! [`UserStore::replace_code`] only while the row is unverified. A stale code racing a
//! freshly resent one therefore cannot verify the account.

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::PendingCode;
use crate::models::{NewUser, Note, NoteInput, User};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique constraint violation (duplicate email or username).
    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert an unverified user. Fails with [`StoreError::Conflict`] on a duplicate.
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Set `is_verified` and clear the code and expiry, provided the user is still
    /// unverified and `code` is the pending code. Returns whether the row changed.
    async fn mark_verified(&self, user_id: i64, code: &str) -> Result<bool, StoreError>;

    /// Overwrite the pending code of an unverified user. Returns whether the row changed.
    async fn replace_code(&self, user_id: i64, pending: &PendingCode) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn create_note(&self, user_id: i64, input: &NoteInput) -> Result<Note, StoreError>;

    /// All notes of `user_id`, newest first.
    async fn list_notes(&self, user_id: i64) -> Result<Vec<Note>, StoreError>;

    async fn get_note(&self, user_id: i64, note_id: i64) -> Result<Option<Note>, StoreError>;

    /// Replace title, content and tag. `None` when the note is missing or not owned.
    async fn update_note(
        &self,
        user_id: i64,
        note_id: i64,
        input: &NoteInput,
    ) -> Result<Option<Note>, StoreError>;

    /// Returns whether a note was deleted.
    async fn delete_note(&self, user_id: i64, note_id: i64) -> Result<bool, StoreError>;
}

pub(crate) const DUPLICATE_USER: &str = "A user with this username or email already exists";
