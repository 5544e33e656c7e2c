//! Integration tests for the login path against a real database.

use tripgenius_core::auth::login::{LoginError, authenticate};
use tripgenius_core::auth::password::hash_password;
use tripgenius_db::models::{AccountStatus, UserRole};
use tripgenius_test_utils::{create_test_db, drop_test_db, seed_account};

#[tokio::test]
async fn active_account_with_correct_password_logs_in() {
    let (pool, db_name) = create_test_db().await;
    let digest = hash_password("password123");
    seed_account(
        &pool,
        "user5@tripgenius.com",
        &digest,
        UserRole::User,
        AccountStatus::Active,
    )
    .await;

    let user = authenticate(&pool, "user5@tripgenius.com", "password123")
        .await
        .expect("login should succeed");
    assert_eq!(user.email, "user5@tripgenius.com");
    assert_eq!(user.role, UserRole::User);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn unknown_account_and_wrong_password_look_identical() {
    let (pool, db_name) = create_test_db().await;
    let digest = hash_password("password123");
    seed_account(
        &pool,
        "user1@tripgenius.com",
        &digest,
        UserRole::User,
        AccountStatus::Active,
    )
    .await;

    let unknown = authenticate(&pool, "ghost@tripgenius.com", "password123")
        .await
        .unwrap_err();
    let wrong = authenticate(&pool, "user1@tripgenius.com", "nope")
        .await
        .unwrap_err();

    assert!(matches!(unknown, LoginError::InvalidCredentials));
    assert!(matches!(wrong, LoginError::InvalidCredentials));
    assert_eq!(
        unknown.to_string(),
        wrong.to_string(),
        "the two failures must not be distinguishable"
    );

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn pending_account_rejected_even_with_correct_password() {
    let (pool, db_name) = create_test_db().await;
    let digest = hash_password("password123");
    seed_account(
        &pool,
        "pending@tripgenius.com",
        &digest,
        UserRole::User,
        AccountStatus::Pending,
    )
    .await;

    let err = authenticate(&pool, "pending@tripgenius.com", "password123")
        .await
        .unwrap_err();
    assert!(matches!(err, LoginError::AccountInactive));

    // Wrong password on a pending account also reports inactive, never
    // hinting at password correctness.
    let err = authenticate(&pool, "pending@tripgenius.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, LoginError::AccountInactive));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn malformed_email_or_empty_password_is_a_format_error() {
    let (pool, db_name) = create_test_db().await;

    let err = authenticate(&pool, "not-an-email", "password123")
        .await
        .unwrap_err();
    assert!(matches!(err, LoginError::InvalidFormat));

    let err = authenticate(&pool, "user1@tripgenius.com", "")
        .await
        .unwrap_err();
    assert!(matches!(err, LoginError::InvalidFormat));

    pool.close().await;
    drop_test_db(&db_name).await;
}
