//! Router assembly.
//!
//! Kept separate from `main` so integration tests drive the same router
//! the binary serves.

use axum::{Router, extract::State, http::StatusCode, routing::get};
use sqlx::SqlitePool;
use thiserror::Error;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions_sqlx_store::SqliteStore;

use crate::middleware::create_session_layer;
use crate::routes;
use crate::services::uploads::UploadError;
use crate::state::AppState;

/// Errors raised while preparing the router.
#[derive(Debug, Error)]
pub enum AppBuildError {
    /// Session table could not be created.
    #[error("session store migration failed: {0}")]
    SessionStore(#[from] sqlx::Error),

    /// Upload directory could not be created.
    #[error("upload directory unavailable: {0}")]
    Upload(#[from] UploadError),
}

/// Create the session store on `pool`, creating its table if needed.
///
/// # Errors
///
/// Returns `sqlx::Error` if the session table cannot be created.
pub async fn session_store(pool: &SqlitePool) -> Result<SqliteStore, sqlx::Error> {
    let store = SqliteStore::new(pool.clone());
    store.migrate().await?;
    Ok(store)
}

/// Build the application router.
///
/// Creates the upload directory, then mounts health checks, page and API
/// routes, and `/static`. Sentry layers are added by the binary.
///
/// # Errors
///
/// Returns `AppBuildError::Upload` if the upload directory cannot be created.
pub async fn build_app(state: AppState, store: SqliteStore) -> Result<Router, AppBuildError> {
    state.uploads().ensure_dir().await?;

    let session_layer = create_session_layer(store, state.config());
    let static_dir = ServeDir::new(&state.config().static_dir);

    Ok(Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", static_dir)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
