//! PostgreSQL-backed store. All statements are parameterized.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{NoteStore, StoreError, UserStore, DUPLICATE_USER};
use crate::auth::PendingCode;
use crate::models::{NewUser, Note, NoteInput, User};

const USER_COLUMNS: &str = "id, username, email, password_hash, is_verified, \
                            verification_code, code_expiry_time, created_at";

const NOTE_COLUMNS: &str = "id, user_id, title, content, tag, created_at, updated_at";

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_insert_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(DUPLICATE_USER.to_string())
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (username, email, password_hash, is_verified, verification_code, code_expiry_time, created_at)
             VALUES ($1, $2, $3, FALSE, $4, $5, NOW())
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(&new_user.verification_code)
            .bind(new_user.code_expiry_time)
            .fetch_one(&self.pool)
            .await
            .map_err(map_insert_error)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn mark_verified(&self, user_id: i64, code: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE users
             SET is_verified = TRUE, verification_code = NULL, code_expiry_time = NULL
             WHERE id = $1 AND is_verified = FALSE AND verification_code = $2",
        )
        .bind(user_id)
        .bind(code)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn replace_code(&self, user_id: i64, pending: &PendingCode) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE users
             SET verification_code = $1, code_expiry_time = $2
             WHERE id = $3 AND is_verified = FALSE",
        )
        .bind(&pending.code)
        .bind(pending.expires_at)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl NoteStore for PgStore {
    async fn create_note(&self, user_id: i64, input: &NoteInput) -> Result<Note, StoreError> {
        let sql = format!(
            "INSERT INTO notes (user_id, title, content, tag, created_at, updated_at)
             VALUES ($1, $2, $3, $4, NOW(), NOW())
             RETURNING {NOTE_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Note>(&sql)
            .bind(user_id)
            .bind(&input.title)
            .bind(&input.content)
            .bind(&input.tag)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list_notes(&self, user_id: i64) -> Result<Vec<Note>, StoreError> {
        let sql = format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        );
        Ok(sqlx::query_as::<_, Note>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_note(&self, user_id: i64, note_id: i64) -> Result<Option<Note>, StoreError> {
        let sql = format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = $1 AND user_id = $2");
        Ok(sqlx::query_as::<_, Note>(&sql)
            .bind(note_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_note(
        &self,
        user_id: i64,
        note_id: i64,
        input: &NoteInput,
    ) -> Result<Option<Note>, StoreError> {
        let sql = format!(
            "UPDATE notes
             SET title = $1, content = $2, tag = $3, updated_at = NOW()
             WHERE id = $4 AND user_id = $5
             RETURNING {NOTE_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Note>(&sql)
            .bind(&input.title)
            .bind(&input.content)
            .bind(&input.tag)
            .bind(note_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_note(&self, user_id: i64, note_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND user_id = $2")
            .bind(note_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
