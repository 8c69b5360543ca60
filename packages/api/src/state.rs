//! Shared handler state.

use std::sync::Arc;

use crate::auth::TokenIssuer;
use crate::mail::Mailer;
use crate::store::{NoteStore, UserStore};

/// Cloned into every request. Everything inside is immutable or internally shared.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub notes: Arc<dyn NoteStore>,
    pub mailer: Arc<dyn Mailer>,
    pub tokens: TokenIssuer,
    /// Refuse login for accounts that have not confirmed their email.
    pub require_verification: bool,
}

impl AppState {
    /// Build state around a single store that holds both users and notes.
    pub fn new<S>(store: S, mailer: Arc<dyn Mailer>, tokens: TokenIssuer) -> Self
    where
        S: UserStore + NoteStore + 'static,
    {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            notes: store,
            mailer,
            tokens,
            require_verification: true,
        }
    }

    pub fn with_require_verification(mut self, required: bool) -> Self {
        self.require_verification = required;
        self
    }
}
