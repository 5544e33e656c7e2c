//! Itinerary generation against an external text-generation service.
//!
//! The [`PlanGenerator`] trait is the seam the HTTP layer depends on, so
//! handlers can be tested with a stub while production wires in the
//! [`gemini::GeminiClient`]. One invocation means exactly one upstream
//! call: no caching, no deduplication, no internal retry.

pub mod gemini;

use async_trait::async_trait;

use crate::itinerary::{ItineraryPlan, decode_plan};

/// Errors returned by plan generation.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Network failure, non-2xx status, or a structured provider error.
    /// The detail is for server-side logs; clients get a generic message.
    #[error("upstream generation call failed: {0}")]
    Upstream(String),

    /// The model's output did not conform to the itinerary schema after
    /// repair. Not retried here; the caller decides.
    #[error("generated plan did not match the expected schema: {0}")]
    Parse(String),
}

/// A generation backend: one prompt in, one validated plan out.
#[async_trait]
pub trait PlanGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<ItineraryPlan, GenerateError>;
}

/// Repair and decode raw model output into a plan.
///
/// The model is asked for bare JSON but is not perfectly compliant; the
/// two known deviations are a markdown code fence around the JSON block
/// and stray prose before/after it. Both are stripped before decoding.
pub fn decode_generated(raw: &str) -> Result<ItineraryPlan, GenerateError> {
    let cleaned = extract_json_payload(raw);
    decode_plan(cleaned).map_err(|e| GenerateError::Parse(e.to_string()))
}

/// Strip markdown fences and surrounding prose, returning the outermost
/// `{ ... }` slice when one exists.
fn extract_json_payload(raw: &str) -> &str {
    // Cut everything outside the outermost braces. This removes fence
    // markers and prose in one step; a fenced block with no braces inside
    // falls through to the trimmed original and fails decode loudly.
    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => &raw[start..=end],
        _ => raw.trim(),
    }
}
