//! HTTP middleware for the fashion advisor.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with `SQLite` store)

pub mod auth;
pub mod session;

pub use auth::{LOGIN_PATH, RequireAuth, clear_current_user, set_current_user};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
