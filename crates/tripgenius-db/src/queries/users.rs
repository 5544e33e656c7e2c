//! Database query functions for the `users` table.

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::{AccountStatus, User, UserRole};

/// Fetch a user by email address.
pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("failed to fetch user by email")?;

    Ok(user)
}

/// Fetch a user by id.
pub async fn get_user(pool: &PgPool, id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch user")?;

    Ok(user)
}

/// Insert an account, keeping any existing row for the same email untouched.
///
/// Returns the row that ends up in the table — the freshly inserted one, or
/// the pre-existing one when the email was already taken. Used by the seed
/// command, which must be safe to re-run.
pub async fn upsert_user(
    pool: &PgPool,
    email: &str,
    password_digest: &str,
    role: UserRole,
    status: AccountStatus,
) -> Result<User> {
    let inserted = sqlx::query_as::<_, User>(
        "INSERT INTO users (email, password, role, status) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (email) DO NOTHING \
         RETURNING *",
    )
    .bind(email)
    .bind(password_digest)
    .bind(role)
    .bind(status)
    .fetch_optional(pool)
    .await
    .context("failed to upsert user")?;

    match inserted {
        Some(user) => Ok(user),
        None => find_user_by_email(pool, email)
            .await?
            .context("user vanished between upsert and fetch"),
    }
}
