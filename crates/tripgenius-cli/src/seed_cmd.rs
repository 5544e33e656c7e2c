//! The `tripgenius seed` command: insert the fixed demo accounts.
//!
//! Registration is closed, so these accounts are the only way in. Safe to
//! re-run: existing rows are left untouched.

use anyhow::Result;
use sqlx::PgPool;

use tripgenius_core::auth::password::hash_password;
use tripgenius_db::models::{AccountStatus, UserRole};
use tripgenius_db::queries::users;

pub async fn run_seed(pool: &PgPool) -> Result<()> {
    let admin_digest = hash_password("admin");
    let admin = users::upsert_user(
        pool,
        "admin@tripgenius.com",
        &admin_digest,
        UserRole::Admin,
        AccountStatus::Active,
    )
    .await?;
    println!("Seeded admin account: {}", admin.email);

    let test_digest = hash_password("password123");
    for i in 1..=5 {
        let email = format!("user{i}@tripgenius.com");
        let user = users::upsert_user(
            pool,
            &email,
            &test_digest,
            UserRole::User,
            AccountStatus::Active,
        )
        .await?;
        println!("Seeded test account: {}", user.email);
    }

    Ok(())
}
