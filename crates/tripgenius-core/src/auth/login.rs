//! Credential check for the login path.
//!
//! Unknown accounts and wrong passwords are reported identically so the
//! response never reveals whether an email is registered. Inactive
//! accounts are rejected before the password is even checked: a pending
//! account cannot obtain a token with correct credentials.

use sqlx::PgPool;

use tripgenius_db::models::{AccountStatus, User};
use tripgenius_db::queries::users;

use super::password;

/// Errors from the login path. Mapped to 400/403/500 at the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("invalid email or password format")]
    InvalidFormat,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is pending approval")]
    AccountInactive,

    #[error(transparent)]
    Db(#[from] anyhow::Error),
}

/// Permissive email shape check: something before `@`, and a domain with a
/// dot-separated suffix. Stronger validation is deliberately out of scope.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty()
        && !tld.is_empty()
        && !domain.chars().any(char::is_whitespace)
}

/// Check email/password against the accounts table.
///
/// Returns the account on success; the caller issues the token.
pub async fn authenticate(pool: &PgPool, email: &str, password: &str) -> Result<User, LoginError> {
    if password.is_empty() || !is_valid_email(email) {
        return Err(LoginError::InvalidFormat);
    }

    let user = users::find_user_by_email(pool, email)
        .await?
        .ok_or(LoginError::InvalidCredentials)?;

    if user.status != AccountStatus::Active {
        return Err(LoginError::AccountInactive);
    }

    if !password::verify_password(password, &user.password) {
        return Err(LoginError::InvalidCredentials);
    }

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("user5@tripgenius.com"));
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last@sub.example.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("user@.com"));
        assert!(!is_valid_email("user@example."));
        assert!(!is_valid_email("spaced user@example.com"));
    }
}
