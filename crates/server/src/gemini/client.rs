//! Gemini API client.
//!
//! Non-streaming `generateContent` calls with a per-attempt timeout and a
//! single retry on transient failures.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use crate::config::GeminiConfig;

use super::ContentGenerator;
use super::error::{ApiErrorResponse, GeminiError};
use super::types::{GenerateContentRequest, GenerateContentResponse, GenerateRequest};

const API_KEY_HEADER: &str = "x-goog-api-key";
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    inner: Arc<GeminiClientInner>,
}

struct GeminiClientInner {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    model: String,
    endpoint: String,
}

impl GeminiClient {
    /// Create a new Gemini client.
    ///
    /// A missing API key is not an error here; every call then fails with
    /// [`GeminiError::MissingApiKey`].
    ///
    /// # Errors
    ///
    /// Returns `GeminiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &GeminiConfig) -> Result<Self, GeminiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            inner: Arc::new(GeminiClientInner {
                client,
                api_key: config.api_key.clone(),
                model: config.model.clone(),
                endpoint,
            }),
        })
    }

    /// Send one `generateContent` request and extract the reply text.
    #[instrument(skip(self, body), fields(model = %self.inner.model))]
    async fn send(&self, body: &GenerateContentRequest) -> Result<String, GeminiError> {
        let api_key = self
            .inner
            .api_key
            .as_ref()
            .ok_or(GeminiError::MissingApiKey)?;

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header(API_KEY_HEADER, api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let parsed = self.handle_response(response).await?;
        parsed
            .text()
            .ok_or_else(|| GeminiError::EmptyResponse(parsed.empty_reason()))
    }

    /// Handle a response.
    async fn handle_response(
        &self,
        response: reqwest::Response,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await.map_err(map_transport_error)?;
            serde_json::from_str(&body)
                .map_err(|e| GeminiError::Parse(format!("Failed to parse response: {e}")))
        } else {
            Err(self.handle_error_status(status, response).await)
        }
    }

    /// Handle an error status code.
    async fn handle_error_status(
        &self,
        status: StatusCode,
        response: reqwest::Response,
    ) -> GeminiError {
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return GeminiError::RateLimited(retry_after);
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return GeminiError::Unauthorized("API key rejected".to_string());
        }

        match response.text().await {
            Ok(body) => {
                let message = serde_json::from_str::<ApiErrorResponse>(&body)
                    .map_or(body, |api_error| api_error.error.message);
                GeminiError::Api {
                    status: status.as_u16(),
                    message,
                }
            }
            Err(e) => map_transport_error(e),
        }
    }
}

fn map_transport_error(e: reqwest::Error) -> GeminiError {
    if e.is_timeout() {
        GeminiError::Timeout
    } else {
        GeminiError::Http(e)
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, GeminiError> {
        let body = GenerateContentRequest::from(request);

        match self.send(&body).await {
            Err(e) if e.is_retryable() => {
                tracing::warn!(error = %e, "Gemini request failed, retrying once");
                self.send(&body).await
            }
            result => result,
        }
    }
}
