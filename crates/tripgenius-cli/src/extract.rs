//! Bearer-token extraction for protected routes.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use tripgenius_core::auth::Principal;
use tripgenius_core::auth::token::verify_token;

use crate::serve_cmd::{ApiError, AppState};

/// Extractor yielding the authenticated [`Principal`].
///
/// A missing credential and an invalid one are distinct outcomes: absent
/// header → 401, present but unverifiable (bad signature, expired,
/// malformed) → 403.
pub struct AuthUser(pub Principal);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthenticated("Missing authentication token"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthenticated("Missing authentication token"))?;

        let principal = verify_token(&state.token_config, token)
            .map_err(|e| {
                tracing::debug!(error = %e, "token verification failed");
                ApiError::forbidden("Invalid or expired token")
            })?;

        Ok(Self(principal))
    }
}
