use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Role carried by an account and embedded in issued tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    User,
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
        };
        f.write_str(s)
    }
}

impl FromStr for UserRole {
    type Err = UserRoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Self::User),
            "ADMIN" => Ok(Self::Admin),
            other => Err(UserRoleParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`UserRole`] string.
#[derive(Debug, Clone)]
pub struct UserRoleParseError(pub String);

impl fmt::Display for UserRoleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid user role: {:?}", self.0)
    }
}

impl std::error::Error for UserRoleParseError {}

// ---------------------------------------------------------------------------

/// Account lifecycle status. Only `ACTIVE` accounts can log in; freshly
/// provisioned accounts sit in `PENDING` until approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountStatus {
    Active,
    Pending,
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "ACTIVE",
            Self::Pending => "PENDING",
        };
        f.write_str(s)
    }
}

impl FromStr for AccountStatus {
    type Err = AccountStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "PENDING" => Ok(Self::Pending),
            other => Err(AccountStatusParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`AccountStatus`] string.
#[derive(Debug, Clone)]
pub struct AccountStatusParseError(pub String);

impl fmt::Display for AccountStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid account status: {:?}", self.0)
    }
}

impl std::error::Error for AccountStatusParseError {}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// An account row. `password` holds the salted digest, never plaintext.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
}

/// A saved trip. `itinerary` is the generated plan as encoded JSON text;
/// it is decoded and validated at the API boundary, not here.
#[derive(Debug, Clone, FromRow)]
pub struct Trip {
    pub id: i64,
    pub owner_id: i64,
    pub destinations: String,
    pub start_date: Option<NaiveDate>,
    pub duration: i32,
    pub budget: String,
    pub itinerary: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_display_roundtrip() {
        for role in [UserRole::User, UserRole::Admin] {
            let parsed: UserRole = role.to_string().parse().expect("should parse");
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn role_rejects_unknown() {
        assert!("superuser".parse::<UserRole>().is_err());
        assert!("user".parse::<UserRole>().is_err(), "roles are uppercase");
    }

    #[test]
    fn status_display_roundtrip() {
        for status in [AccountStatus::Active, AccountStatus::Pending] {
            let parsed: AccountStatus = status.to_string().parse().expect("should parse");
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn status_rejects_unknown() {
        assert!("SUSPENDED".parse::<AccountStatus>().is_err());
    }

    #[test]
    fn role_serde_uses_uppercase() {
        let json = serde_json::to_string(&UserRole::Admin).unwrap();
        assert_eq!(json, "\"ADMIN\"");
        let back: UserRole = serde_json::from_str("\"USER\"").unwrap();
        assert_eq!(back, UserRole::User);
    }
}
