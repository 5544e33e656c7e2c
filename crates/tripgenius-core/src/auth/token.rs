//! Signed bearer token generation and validation.
//!
//! Tokens are HMAC-SHA256 based and time-bounded.
//! Format: `tg1.<base64url(claims JSON)>.<hmac_hex>` where the HMAC is
//! computed over the encoded payload segment. Claims carry the account id,
//! role, and a unix expiry timestamp.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use tripgenius_db::models::UserRole;

use super::Principal;

type HmacSha256 = Hmac<Sha256>;

/// Token prefix used to identify tripgenius bearer tokens (and to allow a
/// future format revision to coexist with this one).
const TOKEN_PREFIX: &str = "tg1.";

/// Default token lifetime: one hour.
pub const DEFAULT_TTL_SECS: i64 = 3600;

/// Errors that can occur during token operations.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token format: {0}")]
    InvalidFormat(String),

    #[error("token signature verification failed")]
    SignatureMismatch,

    #[error("invalid token payload: {0}")]
    InvalidPayload(String),

    #[error("token has expired")]
    Expired,

    #[error("missing token secret")]
    MissingSecret,
}

/// Configuration for token signing and validation.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// The HMAC secret key bytes.
    pub secret: Vec<u8>,
}

impl TokenConfig {
    /// Create a new TokenConfig with the given secret.
    pub fn new(secret: Vec<u8>) -> Self {
        Self { secret }
    }

    /// Create a TokenConfig from the `TRIPGENIUS_TOKEN_SECRET` environment
    /// variable.
    ///
    /// The value must be a hex-encoded string (as written by
    /// `tripgenius init`). Returns an error if the variable is missing or
    /// contains invalid hex.
    pub fn from_env() -> Result<Self, TokenError> {
        let secret_hex =
            std::env::var("TRIPGENIUS_TOKEN_SECRET").map_err(|_| TokenError::MissingSecret)?;
        let secret = hex::decode(&secret_hex).map_err(|e| {
            TokenError::InvalidFormat(format!("TRIPGENIUS_TOKEN_SECRET is not valid hex: {e}"))
        })?;
        Ok(Self::new(secret))
    }
}

/// Claims embedded in a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Claims {
    id: i64,
    role: UserRole,
    exp: i64,
}

/// Issue a signed token for an account, valid for `ttl_secs` from now.
pub fn issue_token(config: &TokenConfig, user_id: i64, role: UserRole, ttl_secs: i64) -> String {
    issue_token_with_exp(config, user_id, role, Utc::now().timestamp() + ttl_secs)
}

/// Issue a signed token with an explicit expiry timestamp.
///
/// `issue_token` is the normal entry point; this one exists so expiry
/// handling can be exercised deterministically.
pub fn issue_token_with_exp(config: &TokenConfig, user_id: i64, role: UserRole, exp: i64) -> String {
    let claims = Claims {
        id: user_id,
        role,
        exp,
    };
    let payload = serde_json::to_vec(&claims).expect("claims always serialize");
    let payload_b64 = URL_SAFE_NO_PAD.encode(payload);
    let mac = compute_hmac(&config.secret, payload_b64.as_bytes());
    format!("{TOKEN_PREFIX}{payload_b64}.{}", hex::encode(mac))
}

/// Validate a bearer token and extract the principal it carries.
///
/// This function:
/// 1. Parses the token format
/// 2. Recomputes the HMAC over the payload segment and compares in
///    constant time
/// 3. Decodes the claims and checks expiry
///
/// The signature is checked before the payload is decoded, so a forged
/// payload is never parsed.
pub fn verify_token(config: &TokenConfig, token: &str) -> Result<Principal, TokenError> {
    let rest = token
        .strip_prefix(TOKEN_PREFIX)
        .ok_or_else(|| TokenError::InvalidFormat("token must start with 'tg1.'".to_string()))?;

    let (payload_b64, mac_hex) = rest
        .split_once('.')
        .ok_or_else(|| TokenError::InvalidFormat("expected '.' between payload and signature".to_string()))?;

    let provided_mac = hex::decode(mac_hex)
        .map_err(|e| TokenError::InvalidFormat(format!("invalid hex in signature: {e}")))?;

    verify_hmac_constant_time(&config.secret, payload_b64.as_bytes(), &provided_mac)?;

    let payload = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|e| TokenError::InvalidPayload(format!("invalid base64: {e}")))?;
    let claims: Claims = serde_json::from_slice(&payload)
        .map_err(|e| TokenError::InvalidPayload(e.to_string()))?;

    if claims.exp <= Utc::now().timestamp() {
        return Err(TokenError::Expired);
    }

    Ok(Principal {
        id: claims.id,
        role: claims.role,
    })
}

/// Compute HMAC-SHA256 over the given message with the given key.
fn compute_hmac(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Verify HMAC using constant-time comparison.
fn verify_hmac_constant_time(
    key: &[u8],
    message: &[u8],
    expected_mac: &[u8],
) -> Result<(), TokenError> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    mac.verify_slice(expected_mac)
        .map_err(|_| TokenError::SignatureMismatch)
}
