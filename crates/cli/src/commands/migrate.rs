//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! fa-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `FASHION_DATABASE_URL` - `SQLite` connection string (fallback: `DATABASE_URL`)
//!
//! The server applies the same embedded migrations on startup; this command
//! exists to prepare a database ahead of time.

use fashion_advisor_server::{config, db};

use super::CommandError;

/// Apply the embedded schema to the configured database.
///
/// # Errors
///
/// Returns `CommandError` if the database cannot be opened or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let database_url = config::database_url_from_env();

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    db::run_migrations(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
