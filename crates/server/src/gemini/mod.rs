//! Google Gemini integration for styling advice.
//!
//! # Endpoint
//!
//! ```text
//! POST {base_url}/v1beta/models/{model}:generateContent
//! x-goog-api-key: <GEMINI_API_KEY>
//! ```
//!
//! The advisor only depends on [`ContentGenerator`]; [`GeminiClient`] is the
//! production implementation and tests inject scripted fakes.

mod client;
mod error;
mod types;

pub use client::GeminiClient;
pub use error::{ApiError, ApiErrorResponse, GeminiError};
pub use types::{
    Blob, Candidate, Content, GenerateContentRequest, GenerateContentResponse, GenerateRequest,
    InlineImage, Part, PromptFeedback,
};

use async_trait::async_trait;

/// A generative model that turns a prompt (text and optional image) into text.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Generate a text reply for the request.
    ///
    /// # Errors
    ///
    /// Returns `GeminiError` if the upstream call fails or yields no text.
    async fn generate(&self, request: &GenerateRequest) -> Result<String, GeminiError>;
}
