//! Database query functions for the `trips` table.
//!
//! Nothing here checks ownership: callers load the trip, compare
//! `owner_id` against the acting principal, and only then mutate. The
//! database has no row-level access control of its own.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::Trip;

/// Insert a new trip row. Returns the inserted trip with server-generated
/// defaults (id, created_at).
pub async fn insert_trip(
    pool: &PgPool,
    owner_id: i64,
    destinations: &str,
    start_date: Option<NaiveDate>,
    duration: i32,
    budget: &str,
    itinerary: &str,
) -> Result<Trip> {
    let trip = sqlx::query_as::<_, Trip>(
        "INSERT INTO trips (owner_id, destinations, start_date, duration, budget, itinerary) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING *",
    )
    .bind(owner_id)
    .bind(destinations)
    .bind(start_date)
    .bind(duration)
    .bind(budget)
    .bind(itinerary)
    .fetch_one(pool)
    .await
    .context("failed to insert trip")?;

    Ok(trip)
}

/// Fetch a trip by its ID.
pub async fn get_trip(pool: &PgPool, id: i64) -> Result<Option<Trip>> {
    let trip = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch trip")?;

    Ok(trip)
}

/// List all trips belonging to an owner, newest first.
///
/// Returns an empty vec (not an error) when the owner has no trips.
pub async fn list_trips_for_owner(pool: &PgPool, owner_id: i64) -> Result<Vec<Trip>> {
    let trips = sqlx::query_as::<_, Trip>(
        "SELECT * FROM trips WHERE owner_id = $1 ORDER BY created_at DESC",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await
    .context("failed to list trips")?;

    Ok(trips)
}

/// Overwrite the encoded itinerary of a trip. Returns the updated row.
pub async fn update_trip_itinerary(pool: &PgPool, id: i64, itinerary: &str) -> Result<Trip> {
    let trip = sqlx::query_as::<_, Trip>(
        "UPDATE trips SET itinerary = $1 WHERE id = $2 RETURNING *",
    )
    .bind(itinerary)
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("failed to update trip itinerary")?;

    match trip {
        Some(t) => Ok(t),
        None => anyhow::bail!("trip {id} not found"),
    }
}

/// Delete a trip row. Fails if the row does not exist.
pub async fn delete_trip(pool: &PgPool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM trips WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete trip")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("trip {id} not found");
    }

    Ok(())
}
