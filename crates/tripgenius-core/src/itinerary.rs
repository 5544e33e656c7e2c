//! The itinerary plan schema and its encode/decode boundary.
//!
//! Plans cross two untrusted boundaries as text: the generator's model
//! output and the `trips.itinerary` database column. Both decode through
//! [`decode_plan`], which validates the structural invariants (numeric,
//! non-negative cost on every item; day indices starting at 1) instead of
//! trusting the blob.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A geographic point, as emitted by the generator for map display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A flight or train leg between two places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightLeg {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub estimated_cost: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
}

/// A lodging option valid for the whole stay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lodging {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
    pub estimated_cost: f64,
}

/// A restaurant suggestion tied to a day and meal slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dining {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub day: u8,
    pub time: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    pub description: String,
    pub estimated_cost: f64,
}

/// An attraction or activity tied to a day and time-of-day slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub day: u8,
    pub time: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    pub description: String,
    pub estimated_cost: f64,
}

/// Cost roll-up. The model reports amounts as free text ("~$1200"), so the
/// summary passes values through rather than forcing them numeric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    #[serde(default)]
    pub total: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default)]
    pub breakdown: BTreeMap<String, Value>,
}

/// The full generated plan: the shape clients receive and trips persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryPlan {
    pub flights: Vec<FlightLeg>,
    pub hotels: Vec<Lodging>,
    pub restaurants: Vec<Dining>,
    pub itinerary: Vec<Activity>,
    #[serde(default)]
    pub costs: CostSummary,
}

/// Errors from decoding an encoded plan.
#[derive(Debug, thiserror::Error)]
pub enum PlanDecodeError {
    #[error("malformed itinerary JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("invalid itinerary: {0}")]
    Invalid(String),
}

/// Serialize a plan to the encoded text form stored in `trips.itinerary`.
pub fn encode_plan(plan: &ItineraryPlan) -> Result<String, serde_json::Error> {
    serde_json::to_string(plan)
}

/// Decode and validate an encoded plan.
///
/// Structural requirements beyond the type shape: every line item's
/// `estimatedCost` must be a finite non-negative number (serde already
/// guarantees presence and numericness), and every dated item's `day`
/// must be at least 1.
pub fn decode_plan(text: &str) -> Result<ItineraryPlan, PlanDecodeError> {
    let plan: ItineraryPlan = serde_json::from_str(text)?;
    validate_plan(&plan)?;
    Ok(plan)
}

/// Check the structural invariants of an already-typed plan. Applied by
/// [`decode_plan`], and separately to client-supplied plans before they
/// are persisted.
pub fn validate_plan(plan: &ItineraryPlan) -> Result<(), PlanDecodeError> {
    let mut costs = Vec::new();
    costs.extend(plan.flights.iter().map(|f| ("flights", &f.description, f.estimated_cost)));
    costs.extend(plan.hotels.iter().map(|h| ("hotels", &h.name, h.estimated_cost)));
    costs.extend(plan.restaurants.iter().map(|r| ("restaurants", &r.name, r.estimated_cost)));
    costs.extend(plan.itinerary.iter().map(|a| ("itinerary", &a.name, a.estimated_cost)));

    for (list, name, cost) in costs {
        if !cost.is_finite() || cost < 0.0 {
            return Err(PlanDecodeError::Invalid(format!(
                "{list} item {name:?} has invalid estimatedCost {cost}"
            )));
        }
    }

    for (list, name, day) in plan
        .restaurants
        .iter()
        .map(|r| ("restaurants", &r.name, r.day))
        .chain(plan.itinerary.iter().map(|a| ("itinerary", &a.name, a.day)))
    {
        if day == 0 {
            return Err(PlanDecodeError::Invalid(format!(
                "{list} item {name:?} has day 0 (days are 1-based)"
            )));
        }
    }

    Ok(())
}
