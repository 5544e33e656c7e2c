//! Login and registration handlers.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};

use tripgenius_core::auth::login::{LoginError, authenticate};
use tripgenius_core::auth::token::{DEFAULT_TTL_SECS, issue_token};
use tripgenius_db::models::UserRole;

use crate::serve_cmd::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: i64,
    pub email: String,
    pub role: UserRole,
}

/// `POST /auth/login`
///
/// Unknown account and wrong password surface identically; an inactive
/// account is the only credential failure with its own status (403).
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::validation(e.body_text()))?;

    let user = authenticate(&state.pool, &body.email, &body.password)
        .await
        .map_err(|e| match e {
            LoginError::InvalidFormat => {
                ApiError::validation("Invalid email or password format")
            }
            LoginError::InvalidCredentials => ApiError::validation("Invalid credentials"),
            LoginError::AccountInactive => ApiError::forbidden("Account is pending approval."),
            LoginError::Db(err) => ApiError::internal("Login failed", err),
        })?;

    let token = issue_token(&state.token_config, user.id, user.role, DEFAULT_TTL_SECS);

    Ok(Json(LoginResponse {
        token,
        user: UserInfo {
            id: user.id,
            email: user.email,
            role: user.role,
        },
    }))
}

/// `POST /auth/register`
///
/// Registration is closed by policy: only pre-seeded accounts exist. This
/// is a fixed refusal, not a stub.
pub async fn register() -> ApiError {
    ApiError::forbidden("Public registration is closed. Please use a provided test account.")
}
