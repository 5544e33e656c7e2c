//! Validation and sanitization of incoming plan requests.
//!
//! Everything arriving here is untrusted text that will end up inside the
//! generation prompt, so each free-text field is squeezed through
//! [`sanitize`] before use. Out-of-range day counts are clamped rather
//! than rejected, and unknown budget tiers fall back to `Moderate`; only a
//! missing/empty destination list fails the request.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Maximum length of any sanitized free-text field, in characters.
pub const MAX_FIELD_LEN: usize = 100;

/// Inclusive bounds for the trip length, in days.
pub const MIN_DAYS: i64 = 1;
pub const MAX_DAYS: i64 = 14;

/// Day count used when the request carries none.
pub const DEFAULT_DAYS: i64 = 3;

/// Errors raised for requests that cannot be repaired by clamping or
/// fallbacks.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} are required")]
    MissingField(&'static str),
}

// ---------------------------------------------------------------------------
// Budget tiers
// ---------------------------------------------------------------------------

/// Spending tier passed through to the prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetTier {
    Budget,
    #[default]
    Moderate,
    Luxury,
}

impl fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Budget => "Budget",
            Self::Moderate => "Moderate",
            Self::Luxury => "Luxury",
        };
        f.write_str(s)
    }
}

impl FromStr for BudgetTier {
    type Err = BudgetTierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Budget" => Ok(Self::Budget),
            "Moderate" => Ok(Self::Moderate),
            "Luxury" => Ok(Self::Luxury),
            other => Err(BudgetTierParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`BudgetTier`] string.
#[derive(Debug, Clone)]
pub struct BudgetTierParseError(pub String);

impl fmt::Display for BudgetTierParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid budget tier: {:?}", self.0)
    }
}

impl std::error::Error for BudgetTierParseError {}

// ---------------------------------------------------------------------------
// Raw and validated requests
// ---------------------------------------------------------------------------

/// A field that clients send either as a single string or as a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl StringOrList {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(s) => vec![s],
            Self::Many(v) => v,
        }
    }
}

/// The plan request exactly as deserialized from the client body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlanRequest {
    pub origin_city: Option<String>,
    pub destinations: Option<StringOrList>,
    pub days: Option<f64>,
    pub budget: Option<String>,
    pub must_visit: Option<Vec<String>>,
}

/// A validated, sanitized plan request, safe to embed in a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRequest {
    pub origin_city: Option<String>,
    pub destinations: Vec<String>,
    pub days: u8,
    pub budget: BudgetTier,
    pub must_visit: Vec<String>,
}

/// Strip a free-text field down to word characters, whitespace, commas,
/// periods, and hyphens, cap its length, and trim surrounding whitespace.
///
/// Idempotent: `sanitize(sanitize(x)) == sanitize(x)`.
pub fn sanitize(input: &str) -> String {
    let kept: String = input
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || matches!(*c, '_' | ',' | '.' | '-'))
        .take(MAX_FIELD_LEN)
        .collect();
    kept.trim().to_owned()
}

/// Validate a raw request into a [`PlanRequest`].
///
/// - `destinations`: required; single string or list; entries that
///   sanitize to empty are dropped; nothing left → error.
/// - `days`: clamped into `[MIN_DAYS, MAX_DAYS]`; missing or non-finite
///   values default to [`DEFAULT_DAYS`].
/// - `budget`: unknown tiers fall back to `Moderate`.
pub fn validate(raw: RawPlanRequest) -> Result<PlanRequest, ValidationError> {
    let destinations: Vec<String> = raw
        .destinations
        .map(StringOrList::into_vec)
        .unwrap_or_default()
        .iter()
        .map(|d| sanitize(d))
        .filter(|d| !d.is_empty())
        .collect();

    if destinations.is_empty() {
        return Err(ValidationError::MissingField("destinations"));
    }

    let days = match raw.days {
        Some(d) if d.is_finite() => (d as i64).clamp(MIN_DAYS, MAX_DAYS),
        _ => DEFAULT_DAYS,
    };

    let budget = raw
        .budget
        .as_deref()
        .and_then(|b| b.parse().ok())
        .unwrap_or_default();

    let origin_city = raw
        .origin_city
        .as_deref()
        .map(sanitize)
        .filter(|o| !o.is_empty());

    let must_visit: Vec<String> = raw
        .must_visit
        .unwrap_or_default()
        .iter()
        .map(|m| sanitize(m))
        .filter(|m| !m.is_empty())
        .collect();

    Ok(PlanRequest {
        origin_city,
        destinations,
        days: days as u8,
        budget,
        must_visit,
    })
}
