//! # Database module: PostgreSQL connection pool and schema bootstrap
//!
//! [`connect`] opens a pool sized from [`DatabaseSettings`]; the pool is handed to
//! [`crate::store::PgStore`] explicitly rather than living in a process-wide static.
//!
//! [`ensure_schema`] creates the `users` and `notes` tables and their indexes when they
//! do not exist yet. It never alters existing tables.
//!
//! [`DatabaseSettings`]: crate::config::DatabaseSettings

mod pool;

pub use pool::{connect, ensure_schema};
