//! Itinerary generation handler.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use tracing::{debug, error};

use tripgenius_core::generate::GenerateError;
use tripgenius_core::itinerary::ItineraryPlan;
use tripgenius_core::prompt::build_prompt;
use tripgenius_core::request::{RawPlanRequest, validate};

use crate::extract::AuthUser;
use crate::serve_cmd::{ApiError, AppState};

/// `POST /api/plan`
///
/// Validate, build the prompt, make exactly one upstream call. Upstream
/// and parse failures are logged in full here and genericized for the
/// client; the caller may retry by resubmitting, this handler never does.
pub async fn generate_plan(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    body: Result<Json<RawPlanRequest>, JsonRejection>,
) -> Result<Json<ItineraryPlan>, ApiError> {
    let Some(generator) = state.generator.as_ref() else {
        error!("plan requested but no generation API key is configured");
        return Err(ApiError::server_error("Server misconfigured: Missing API Key"));
    };

    let Json(raw) = body.map_err(|e| ApiError::validation(e.body_text()))?;
    let request = validate(raw).map_err(|e| ApiError::validation(e.to_string()))?;

    let prompt = build_prompt(&request);
    debug!(
        user = principal.id,
        days = request.days,
        destinations = request.destinations.len(),
        "generating itinerary"
    );

    let plan = generator.generate(&prompt).await.map_err(|e| {
        match &e {
            GenerateError::Upstream(detail) => {
                error!(%detail, "generation upstream call failed");
            }
            GenerateError::Parse(detail) => {
                error!(%detail, "generated plan failed schema validation");
            }
        }
        ApiError::server_error("Failed to generate plan")
    })?;

    Ok(Json(plan))
}
