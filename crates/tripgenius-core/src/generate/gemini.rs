//! Gemini `generateContent` client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{GenerateError, PlanGenerator, decode_generated};
use crate::itinerary::ItineraryPlan;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Upstream calls carry an explicit deadline instead of inheriting the
/// transport default, which is effectively unbounded.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Gemini generateContent request body.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

/// Gemini generateContent response body. A structured `error` object can
/// arrive with a 200 as well as with error statuses.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    error: Option<GeminiApiError>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct GeminiApiError {
    message: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Production [`PlanGenerator`] backed by the Gemini HTTP API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a client for the default model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_model(api_key, DEFAULT_MODEL)
    }

    /// Create a client for a specific model identifier.
    pub fn with_model(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{GEMINI_API_BASE}/{}:generateContent", self.model)
    }
}

#[async_trait]
impl PlanGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<ItineraryPlan, GenerateError> {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_owned(),
                }],
            }],
        };

        // The API key travels in a header, not the URL, so transport
        // errors and logs never carry it.
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerateError::Upstream(e.to_string()))?;

        let status = response.status();
        let payload = response
            .text()
            .await
            .map_err(|e| GenerateError::Upstream(e.to_string()))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "generation upstream returned error status");
            return Err(GenerateError::Upstream(format!(
                "status {status}: {}",
                condense(&payload)
            )));
        }

        let parsed: GeminiResponse = serde_json::from_str(&payload)
            .map_err(|e| GenerateError::Upstream(format!("unreadable provider response: {e}")))?;

        if let Some(api_error) = parsed.error {
            return Err(GenerateError::Upstream(condense(&api_error.message)));
        }

        let text: String = parsed
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .ok_or_else(|| GenerateError::Upstream("provider returned no candidates".to_owned()))?;

        decode_generated(&text)
    }
}

/// Collapse whitespace and bound the length of upstream error detail
/// before it lands in logs.
fn condense(raw: &str) -> String {
    const MAX_CHARS: usize = 256;
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > MAX_CHARS {
        let mut shortened: String = collapsed.chars().take(MAX_CHARS).collect();
        shortened.push_str("...[truncated]");
        return shortened;
    }
    collapsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_includes_model() {
        let client = GeminiClient::new("key");
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );

        let client = GeminiClient::with_model("key", "gemini-pro");
        assert!(client.endpoint().ends_with("/gemini-pro:generateContent"));
    }

    #[test]
    fn request_body_shape() {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: "hello".to_owned(),
                }],
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
    }

    #[test]
    fn response_with_error_field_parses() {
        let payload = r#"{ "error": { "code": 429, "message": "quota exceeded", "status": "RESOURCE_EXHAUSTED" } }"#;
        let parsed: GeminiResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(parsed.error.unwrap().message, "quota exceeded");
        assert!(parsed.candidates.is_empty());
    }

    #[test]
    fn response_with_candidates_parses() {
        let payload = r#"{ "candidates": [ { "content": { "parts": [ { "text": "{}" } ] } } ] }"#;
        let parsed: GeminiResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.candidates[0].content.parts[0].text, "{}");
    }

    #[test]
    fn condense_collapses_and_truncates() {
        assert_eq!(condense("a   b\n\nc"), "a b c");
        let long = "word ".repeat(200);
        let out = condense(&long);
        assert!(out.ends_with("...[truncated]"));
        assert!(out.chars().count() <= 256 + "...[truncated]".len());
    }
}
