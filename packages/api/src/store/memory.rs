use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use super::{NoteStore, StoreError, UserStore, DUPLICATE_USER};
use crate::auth::PendingCode;
use crate::models::{NewUser, Note, NoteInput, User};

/// In-memory store for testing and local experiments.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    notes: Vec<Note>,
    next_user_id: i64,
    next_note_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored users.
    pub fn user_count(&self) -> usize {
        self.tables().users.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables();
        if tables
            .users
            .iter()
            .any(|u| u.email == new_user.email || u.username == new_user.username)
        {
            return Err(StoreError::Conflict(DUPLICATE_USER.to_string()));
        }

        tables.next_user_id += 1;
        let user = User {
            id: tables.next_user_id,
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            is_verified: false,
            verification_code: Some(new_user.verification_code),
            code_expiry_time: Some(new_user.code_expiry_time),
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.tables().users.iter().find(|u| u.email == email).cloned())
    }

    async fn mark_verified(&self, user_id: i64, code: &str) -> Result<bool, StoreError> {
        let mut tables = self.tables();
        let Some(user) = tables.users.iter_mut().find(|u| {
            u.id == user_id && !u.is_verified && u.verification_code.as_deref() == Some(code)
        }) else {
            return Ok(false);
        };
        user.is_verified = true;
        user.verification_code = None;
        user.code_expiry_time = None;
        Ok(true)
    }

    async fn replace_code(&self, user_id: i64, pending: &PendingCode) -> Result<bool, StoreError> {
        let mut tables = self.tables();
        let Some(user) = tables
            .users
            .iter_mut()
            .find(|u| u.id == user_id && !u.is_verified)
        else {
            return Ok(false);
        };
        user.verification_code = Some(pending.code.clone());
        user.code_expiry_time = Some(pending.expires_at);
        Ok(true)
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn create_note(&self, user_id: i64, input: &NoteInput) -> Result<Note, StoreError> {
        let mut tables = self.tables();
        tables.next_note_id += 1;
        let now = Utc::now();
        let note = Note {
            id: tables.next_note_id,
            user_id,
            title: input.title.clone(),
            content: input.content.clone(),
            tag: input.tag.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.notes.push(note.clone());
        Ok(note)
    }

    async fn list_notes(&self, user_id: i64) -> Result<Vec<Note>, StoreError> {
        let mut notes: Vec<Note> = self
            .tables()
            .notes
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(notes)
    }

    async fn get_note(&self, user_id: i64, note_id: i64) -> Result<Option<Note>, StoreError> {
        Ok(self
            .tables()
            .notes
            .iter()
            .find(|n| n.id == note_id && n.user_id == user_id)
            .cloned())
    }

    async fn update_note(
        &self,
        user_id: i64,
        note_id: i64,
        input: &NoteInput,
    ) -> Result<Option<Note>, StoreError> {
        let mut tables = self.tables();
        let Some(note) = tables
            .notes
            .iter_mut()
            .find(|n| n.id == note_id && n.user_id == user_id)
        else {
            return Ok(None);
        };
        note.title = input.title.clone();
        note.content = input.content.clone();
        note.tag = input.tag.clone();
        note.updated_at = Utc::now();
        Ok(Some(note.clone()))
    }

    async fn delete_note(&self, user_id: i64, note_id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables();
        let before = tables.notes.len();
        tables
            .notes
            .retain(|n| !(n.id == note_id && n.user_id == user_id));
        Ok(tables.notes.len() < before)
    }
}
