//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::uploads::UploadError;

/// Application-level error type for the fashion advisor.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Storing an uploaded image failed.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Malformed multipart body.
    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),
}

impl AppError {
    const fn is_server_error(&self) -> bool {
        match self {
            Self::Database(_) | Self::Upload(_) | Self::Session(_) => true,
            Self::Auth(err) => matches!(err, AuthError::Repository(_) | AuthError::PasswordHash),
            Self::Multipart(_) => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Database(_) | Self::Upload(_) | Self::Session(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            // Keep the status axum assigns (400, 413, ...)
            Self::Multipart(err) => err.status(),
        };

        // Don't expose internal error details to clients
        let message = if self.is_server_error() {
            "Internal server error".to_string()
        } else {
            match &self {
                Self::Auth(err) => match err {
                    AuthError::InvalidCredentials | AuthError::UserNotFound => {
                        "Invalid credentials. Please try again.".to_string()
                    }
                    AuthError::UserAlreadyExists => {
                        "An account with this email already exists".to_string()
                    }
                    AuthError::WeakPassword(msg) => msg.clone(),
                    _ => "Invalid email address".to_string(),
                },
                Self::Multipart(err) => err.body_text(),
                _ => self.to_string(),
            }
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("advisor", "Requested advice", Some(&[("has_image", "true")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::Upload(UploadError::Io(std::io::Error::other("disk full")));
        assert_eq!(err.to_string(), "Upload error: upload I/O error: disk full");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Upload(UploadError::Io(std::io::Error::other("disk full")))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::DataCorruption(
                "bad row".to_string()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(
            get_status(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::UserAlreadyExists)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::WeakPassword("short".to_string()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::PasswordHash)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let response = AppError::Database(RepositoryError::DataCorruption(
            "secret path /var/db".to_string(),
        ))
        .into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        assert_eq!(&body[..], b"Internal server error");
    }
}
