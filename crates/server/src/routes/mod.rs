//! HTTP route handlers for the fashion advisor.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                 - Advisor page (requires auth)
//! GET  /register         - Registration page
//! POST /register         - Registration action
//! GET  /login            - Login page
//! POST /login            - Login action
//! GET  /logout           - Logout (requires auth)
//! POST /fashion-advisor  - Advice JSON (requires auth, multipart)
//! ```
//!
//! Health checks and `/static` are mounted in [`crate::app`].

pub mod advisor;
pub mod auth;
pub mod home;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::state::AppState;

/// Create all page and API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route(
            "/fashion-advisor",
            post(advisor::fashion_advisor).layer(DefaultBodyLimit::disable()),
        )
}
