//! Authentication extractors and session helpers.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};

/// Path unauthenticated requests are sent to.
pub const LOGIN_PATH: &str = "/login";

/// Extractor that requires a logged-in user.
///
/// Requests without a session user are redirected to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Rejection for [`RequireAuth`].
#[derive(Debug)]
pub struct RedirectToLogin;

impl IntoResponse for RedirectToLogin {
    fn into_response(self) -> Response {
        Redirect::to(LOGIN_PATH).into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = RedirectToLogin;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            tracing::warn!("session layer missing; treating request as anonymous");
            return Err(RedirectToLogin);
        };

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or(RedirectToLogin)?;

        Ok(Self(user))
    }
}

/// Store the logged-in user in the session.
///
/// The session ID is rotated first so a pre-login ID cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// End the session entirely (logout).
///
/// # Errors
///
/// Returns an error if the session record cannot be deleted.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
