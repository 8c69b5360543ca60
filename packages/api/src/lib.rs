//! # API crate: the DiaryApp backend
//!
//! Email/password accounts with a verification-code lifecycle, bearer-token
//! authentication, and per-user notes, served over a JSON HTTP API.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`accounts`] | Register, login, verify and resend-code flows |
//! | [`auth`] | Password hashing and policy, signed tokens, verification codes, bearer gate |
//! | [`config`] | Layered settings: defaults, `diary.toml`, `DIARY__*` environment |
//! | [`db`] | PostgreSQL pool and schema bootstrap |
//! | [`error`] | [`ApiError`] and its HTTP mapping |
//! | [`mail`] | Verification email delivery (SMTP, log-only, in-memory) |
//! | [`models`] | `User`, `Note` and their request/response projections |
//! | [`routes`] | The axum [`Router`](axum::Router) with CORS and body limit |
//! | [`state`] | [`AppState`] shared by every handler |
//! | [`store`] | `UserStore`/`NoteStore` traits with Postgres and in-memory backends |

pub mod accounts;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod mail;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

pub use config::Settings;
pub use error::{ApiError, ApiResult};
pub use models::{Note, NoteInput, UserInfo};
pub use routes::router;
pub use state::AppState;
