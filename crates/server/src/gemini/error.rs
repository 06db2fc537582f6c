//! Error types for the Gemini API client.

use thiserror::Error;

/// Errors that can occur when interacting with the Gemini API.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// No API key configured.
    #[error("GEMINI_API_KEY is not configured")]
    MissingApiKey,

    /// Gemini API returned an error.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// Rate limited by the API.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Failed to parse response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Response carried no text (blocked prompt or empty candidates).
    #[error("empty response: {0}")]
    EmptyResponse(String),

    /// Image could not be read back from disk.
    #[error("image unavailable: {0}")]
    Image(String),
}

impl GeminiError {
    /// Whether a single retry is worthwhile.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::RateLimited(_) => true,
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// API error response from Gemini.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    /// Nested error details.
    pub error: ApiError,
}

/// Nested error details.
#[derive(Debug, serde::Deserialize)]
pub struct ApiError {
    /// HTTP status code echoed by the API.
    pub code: u16,
    /// Error message.
    pub message: String,
    /// Canonical status (e.g. `INVALID_ARGUMENT`).
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_error_display() {
        let err = GeminiError::RateLimited(30);
        assert_eq!(err.to_string(), "rate limited, retry after 30 seconds");

        let err = GeminiError::Api {
            status: 400,
            message: "API key not valid".to_string(),
        };
        assert_eq!(err.to_string(), "API error (400): API key not valid");
    }

    #[test]
    fn test_is_retryable() {
        assert!(GeminiError::Timeout.is_retryable());
        assert!(GeminiError::RateLimited(1).is_retryable());
        assert!(
            GeminiError::Api {
                status: 503,
                message: "overloaded".to_string()
            }
            .is_retryable()
        );
        assert!(
            !GeminiError::Api {
                status: 400,
                message: "bad".to_string()
            }
            .is_retryable()
        );
        assert!(!GeminiError::MissingApiKey.is_retryable());
        assert!(!GeminiError::Unauthorized("key".to_string()).is_retryable());
    }

    #[test]
    fn test_api_error_deserialization() {
        let json = r#"{
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT"
            }
        }"#;

        let response: ApiErrorResponse = serde_json::from_str(json).expect("deserialize");
        assert_eq!(response.error.code, 400);
        assert_eq!(response.error.status.as_deref(), Some("INVALID_ARGUMENT"));
        assert!(response.error.message.starts_with("API key not valid"));
    }
}
