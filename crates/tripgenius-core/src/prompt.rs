//! Prompt construction for the itinerary generator.
//!
//! `build_prompt` is a pure function: the same validated request always
//! renders the same text. This is the single place user-controlled text
//! enters the instruction channel, which is why the request validator
//! sanitizes every field beforehand.

use crate::request::PlanRequest;

/// Placeholder used when the traveler did not name an origin city.
const DEFAULT_ORIGIN: &str = "User's Origin";

/// Render the generation prompt for a validated request.
///
/// The instructions pin down: the exact day count, flight/train coverage,
/// 3-4 lodging options at different price points, at least two restaurants
/// per day, a per-day/per-slot activity itinerary, a numeric
/// `estimatedCost` on every item, a stay-near-the-destinations constraint,
/// and a JSON-only output contract matching the itinerary schema.
pub fn build_prompt(request: &PlanRequest) -> String {
    let days = request.days;
    let destinations = request.destinations.join(", ");
    let origin = request.origin_city.as_deref().unwrap_or(DEFAULT_ORIGIN);
    let must_visit = if request.must_visit.is_empty() {
        "None".to_owned()
    } else {
        request.must_visit.join(", ")
    };
    let min_restaurants = u32::from(days) * 2;

    format!(
        r#"Role: Expert Travel Planner.
Task: Create a detailed {days}-day trip itinerary specifically for: {destinations}.
Origin: {origin}.

Requirements:
1. FLIGHTS: Suggest realistic flight/train routes.
2. HOTELS: Suggest 3-4 distinct hotel options (different price points/styles) valid for the entire stay.
3. DINING: Suggest at least 2 distinct restaurants (Lunch/Dinner) per day. Total of {min_restaurants} minimum.
4. ACTIVITIES: Detailed itinerary for {days} days.
5. COSTS: Provide "estimatedCost" (number) for EVERY single item.

Constraint: ALL suggestions MUST be within or very close to {destinations}. Do NOT suggest places in other countries or far away cities unless explicitly asked.
User Preferences: Budget: {budget}, Must-Visit: [{must_visit}].

Output Format: JSON ONLY. No markdown.
{{
  "flights": [{{ "from": "...", "to": "...", "type": "Flight", "description": "...", "estimatedCost": 500, "searchQuery": "..." }}],
  "hotels": [
     {{ "name": "Hotel A", "type": "Hotel", "city": "...", "coordinates": {{ "lat": 0, "lng": 0 }}, "description": "Luxury option...", "searchQuery": "...", "estimatedCost": 200 }}
  ],
  "restaurants": [
     {{ "name": "Rest A", "type": "Restaurant", "day": 1, "time": "Lunch", "city": "...", "coordinates": {{ "lat": 0, "lng": 0 }}, "description": "Local cuisine...", "estimatedCost": 30 }}
  ],
  "itinerary": [
     {{ "name": "Place A", "type": "Attraction", "day": 1, "time": "Morning", "city": "...", "coordinates": {{ "lat": 0, "lng": 0 }}, "description": "...", "estimatedCost": 20 }}
  ],
  "costs": {{ "total": "Calculated Total", "currency": "USD", "breakdown": {{ "flights": "...", "accommodation": "...", "food": "...", "activities": "...", "transport": "..." }} }}
}}"#,
        budget = request.budget,
    )
}
