//! CLI command implementations.

pub mod migrate;
pub mod user;

use thiserror::Error;

use fashion_advisor_server::services::auth::AuthError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// User could not be created.
    #[error("{0}")]
    Auth(#[from] AuthError),
}
