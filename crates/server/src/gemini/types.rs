//! Types for the Gemini `generateContent` API.
//!
//! Requests are sent in `snake_case` (accepted by the REST API); responses
//! arrive in `camelCase`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// A provider-neutral generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    /// Instruction text.
    pub prompt: String,
    /// Optional image sent alongside the prompt.
    pub image: Option<InlineImage>,
}

/// Raw image bytes tagged with their media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    /// Media type, e.g. `image/jpeg`.
    pub mime_type: String,
    /// Raw bytes.
    pub data: Vec<u8>,
}

impl GenerateRequest {
    /// Text-only request.
    #[must_use]
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
        }
    }

    /// Request with an image attached after the prompt.
    #[must_use]
    pub fn with_image(prompt: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            prompt: prompt.into(),
            image: Some(InlineImage {
                mime_type: mime_type.into(),
                data,
            }),
        }
    }
}

/// Request body for `generateContent`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    /// Conversation turns; a single user turn here.
    pub contents: Vec<Content>,
}

impl From<&GenerateRequest> for GenerateContentRequest {
    fn from(request: &GenerateRequest) -> Self {
        let mut parts = vec![Part::text(request.prompt.clone())];
        if let Some(image) = &request.image {
            parts.push(Part {
                text: None,
                inline_data: Some(Blob {
                    mime_type: image.mime_type.clone(),
                    data: STANDARD.encode(&image.data),
                }),
            });
        }

        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
        }
    }
}

/// A single turn of content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    /// "user" or "model".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Ordered parts.
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// One part of a content turn: text or inline binary data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    /// Text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Inline base64 data.
    #[serde(
        default,
        alias = "inlineData",
        skip_serializing_if = "Option::is_none"
    )]
    pub inline_data: Option<Blob>,
}

impl Part {
    /// Text part.
    #[must_use]
    pub const fn text(text: String) -> Self {
        Self {
            text: Some(text),
            inline_data: None,
        }
    }
}

/// Base64-encoded inline data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blob {
    /// Media type.
    #[serde(alias = "mimeType")]
    pub mime_type: String,
    /// Base64 payload.
    pub data: String,
}

/// Response body from `generateContent`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Candidate completions.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Present when the prompt itself was blocked.
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

/// A candidate completion.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Generated content.
    #[serde(default)]
    pub content: Option<Content>,
    /// Why generation stopped (e.g. `STOP`, `SAFETY`).
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Prompt-level feedback.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Reason the prompt was blocked.
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if any.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Human-readable reason the response had no text.
    #[must_use]
    pub fn empty_reason(&self) -> String {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return format!("prompt blocked: {reason}");
        }
        match self.candidates.first() {
            None => "no candidates".to_string(),
            Some(candidate) => format!(
                "finish reason {}",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ),
        }
    }
}
