//! Trip CRUD handlers, every one scoped to the authenticated owner.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use tripgenius_core::auth::Principal;
use tripgenius_core::itinerary::{ItineraryPlan, decode_plan, encode_plan, validate_plan};
use tripgenius_db::models::Trip;
use tripgenius_db::queries::trips;

use crate::extract::AuthUser;
use crate::serve_cmd::{ApiError, AppState};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// A trip as returned to clients, with the itinerary decoded.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripResponse {
    pub id: i64,
    pub owner_id: i64,
    pub destinations: String,
    pub start_date: Option<NaiveDate>,
    pub duration: i32,
    pub budget: String,
    pub itinerary: ItineraryPlan,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTripRequest {
    pub destinations: String,
    pub start_date: Option<NaiveDate>,
    pub duration: i32,
    pub budget: String,
    pub itinerary: ItineraryPlan,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTripRequest {
    pub itinerary: ItineraryPlan,
}

/// Decode a stored trip for the response. A blob that no longer parses is
/// a persistence-layer defect and surfaces as a 500, never a panic.
fn to_response(trip: Trip, context: &'static str) -> Result<TripResponse, ApiError> {
    let itinerary = decode_plan(&trip.itinerary)
        .map_err(|e| ApiError::internal(context, anyhow::anyhow!("corrupt itinerary for trip {}: {e}", trip.id)))?;

    Ok(TripResponse {
        id: trip.id,
        owner_id: trip.owner_id,
        destinations: trip.destinations,
        start_date: trip.start_date,
        duration: trip.duration,
        budget: trip.budget,
        itinerary,
        created_at: trip.created_at,
    })
}

/// Load a trip and require that `principal` owns it.
///
/// The ownership boundary lives here, as an explicit read-then-compare
/// before any mutation: the storage layer has no access control of its
/// own. "Not found" and "not owned" collapse into the same 403 so the
/// response does not reveal whether a trip id exists.
async fn load_owned_trip(
    pool: &PgPool,
    trip_id: i64,
    principal: Principal,
    context: &'static str,
) -> Result<Trip, ApiError> {
    let trip = trips::get_trip(pool, trip_id)
        .await
        .map_err(|e| ApiError::internal(context, e))?;

    match trip {
        Some(t) if t.owner_id == principal.id => Ok(t),
        _ => Err(ApiError::forbidden("Not authorized")),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /api/trips`
pub async fn list_trips(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<Vec<TripResponse>>, ApiError> {
    let rows = trips::list_trips_for_owner(&state.pool, principal.id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch trips", e))?;

    let mut out = Vec::with_capacity(rows.len());
    for trip in rows {
        out.push(to_response(trip, "Failed to fetch trips")?);
    }
    Ok(Json(out))
}

/// `POST /api/trips`
pub async fn create_trip(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    body: Result<Json<CreateTripRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TripResponse>), ApiError> {
    let Json(body) = body.map_err(|e| ApiError::validation(e.body_text()))?;

    // A plan that would not survive its own decode must be rejected here,
    // not stored and broken on every later read.
    validate_plan(&body.itinerary).map_err(|e| ApiError::validation(e.to_string()))?;

    let encoded = encode_plan(&body.itinerary)
        .map_err(|e| ApiError::internal("Failed to save trip", anyhow::anyhow!(e)))?;

    let trip = trips::insert_trip(
        &state.pool,
        principal.id,
        &body.destinations,
        body.start_date,
        body.duration,
        &body.budget,
        &encoded,
    )
    .await
    .map_err(|e| ApiError::internal("Failed to save trip", e))?;

    Ok((StatusCode::CREATED, Json(to_response(trip, "Failed to save trip")?)))
}

/// `PUT /api/trips/{id}`
pub async fn update_trip(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(trip_id): Path<i64>,
    body: Result<Json<UpdateTripRequest>, JsonRejection>,
) -> Result<Json<TripResponse>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::validation(e.body_text()))?;

    validate_plan(&body.itinerary).map_err(|e| ApiError::validation(e.to_string()))?;

    load_owned_trip(&state.pool, trip_id, principal, "Failed to update trip").await?;

    let encoded = encode_plan(&body.itinerary)
        .map_err(|e| ApiError::internal("Failed to update trip", anyhow::anyhow!(e)))?;

    let updated = trips::update_trip_itinerary(&state.pool, trip_id, &encoded)
        .await
        .map_err(|e| ApiError::internal("Failed to update trip", e))?;

    Ok(Json(to_response(updated, "Failed to update trip")?))
}

/// `DELETE /api/trips/{id}`
pub async fn delete_trip(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(trip_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    load_owned_trip(&state.pool, trip_id, principal, "Failed to delete trip").await?;

    trips::delete_trip(&state.pool, trip_id)
        .await
        .map_err(|e| ApiError::internal("Failed to delete trip", e))?;

    Ok(Json(serde_json::json!({ "message": "Trip deleted" })))
}
