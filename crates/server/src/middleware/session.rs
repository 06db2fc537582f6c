//! Session middleware configuration.
//!
//! Sets up `SQLite`-backed sessions using tower-sessions. The store shares
//! the application pool.

use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;

use crate::config::ServerConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "fa_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer over a `SQLite` store.
///
/// The store's table must exist; call `SqliteStore::migrate` first.
#[must_use]
pub fn create_session_layer(
    store: SqliteStore,
    config: &ServerConfig,
) -> SessionManagerLayer<SqliteStore> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
