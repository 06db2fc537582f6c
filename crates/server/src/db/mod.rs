//! Database operations for the Fashion Advisor `SQLite` file.
//!
//! ## Tables
//!
//! - `users` - Registered users with their styling profile
//! - `tower_sessions` - Session storage (created by the session store)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/`, embedded at compile
//! time, and applied on server startup or via:
//! ```bash
//! cargo run -p fashion-advisor-cli -- migrate
//! ```

pub mod users;

use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `SQLite` connection pool with sensible defaults.
///
/// The database file is created if it does not exist.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is malformed or the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url.expose_secret())?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(8)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Create a pool over a private in-memory database.
///
/// Every `SQLite` memory connection is its own database, so the pool is pinned
/// to one connection that never idles out.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_memory_pool() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}

/// Apply embedded migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the history is inconsistent.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
