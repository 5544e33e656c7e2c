//! Authentication: password digests, bearer tokens, and the login path.
//!
//! The gate yields a [`Principal`] from a verified bearer token; everything
//! downstream trusts that principal for the lifetime of the request and
//! nothing else.

pub mod login;
pub mod password;
pub mod token;

use tripgenius_db::models::UserRole;

/// The authenticated identity attached to a request.
///
/// Produced only by [`token::verify_token`]; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub role: UserRole,
}
