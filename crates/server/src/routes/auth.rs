//! Authentication route handlers.
//!
//! Handles registration, password login, and logout. Sessions are stored
//! server side; the browser only carries the session cookie.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use fashion_advisor_core::BodyProfile;

use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{LOGIN_PATH, RequireAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::{AuthError, AuthService, MIN_PASSWORD_LENGTH};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub height: u16,
    pub weight: u16,
    pub skin_color: String,
    pub body_shape: String,
    pub gender: String,
    pub age: u16,
}

impl RegisterForm {
    fn profile(&self) -> BodyProfile {
        BodyProfile {
            name: self.name.trim().to_string(),
            gender: self.gender.trim().to_string(),
            age: self.age,
            height_cm: self.height,
            weight_kg: self.weight,
            skin_tone: self.skin_color.trim().to_string(),
            body_shape: self.body_shape.trim().to_string(),
        }
    }
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for error display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<&'static str>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub error: Option<&'static str>,
    pub min_password_length: usize,
}

/// Human-readable text for a `?error=` code.
fn error_message(code: Option<&str>) -> Option<&'static str> {
    match code? {
        "email_taken" => Some("An account with this email already exists."),
        "invalid_email" => Some("Please enter a valid email address."),
        "password_too_short" => Some("Your password is too short."),
        _ => Some("Something went wrong. Please try again."),
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    LoginTemplate {
        error: error_message(query.error.as_deref()),
    }
}

/// Handle login form submission.
///
/// Failures return 401 with a plain-text message rather than a redirect.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let user = match AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => user,
        Err(e @ AuthError::InvalidCredentials) => {
            tracing::info!("login rejected");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    let current = CurrentUser::from(&user);
    set_current_user(&session, &current).await?;

    set_sentry_user(&current.id, Some(current.email.as_str()));
    add_breadcrumb("auth", "Logged in", None);
    tracing::info!(user_id = %current.id, "user logged in");

    Ok(Redirect::to("/").into_response())
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    RegisterTemplate {
        error: error_message(query.error.as_deref()),
        min_password_length: MIN_PASSWORD_LENGTH,
    }
}

/// Handle registration form submission.
///
/// Validation failures redirect back to the form with an error code.
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let result = AuthService::new(state.pool())
        .register(&form.email, &form.password, &form.profile())
        .await;

    let code = match result {
        Ok(_) => return Ok(Redirect::to(LOGIN_PATH).into_response()),
        Err(AuthError::UserAlreadyExists) => "email_taken",
        Err(AuthError::InvalidEmail(_)) => "invalid_email",
        Err(AuthError::WeakPassword(_)) => "password_too_short",
        Err(e) => return Err(AppError::Auth(e)),
    };

    tracing::info!(reason = code, "registration rejected");
    Ok(Redirect::to(&format!("/register?error={code}")).into_response())
}

// =============================================================================
// Logout
// =============================================================================

/// Log out and end the session.
pub async fn logout(RequireAuth(user): RequireAuth, session: Session) -> Result<Redirect> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    tracing::info!(user_id = %user.id, "user logged out");

    Ok(Redirect::to(LOGIN_PATH))
}
