use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use tripgenius_core::auth::token::TokenConfig;
use tripgenius_core::generate::PlanGenerator;
use tripgenius_core::generate::gemini::GeminiClient;

use crate::config::TripgeniusConfig;
use crate::{auth_routes, plan_routes, trip_routes};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Shared per-request context. Holds no mutable state: everything mutable
/// lives in the database.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub token_config: TokenConfig,
    /// `None` when no generation API key is configured; the plan endpoint
    /// then reports a misconfiguration.
    pub generator: Option<Arc<dyn PlanGenerator>>,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// The stable client-facing failure shape: a status and `{ "error": msg }`.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// 400: malformed or out-of-policy input.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    /// 401: no credential presented.
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: msg.into(),
        }
    }

    /// 403: credential present but rejected, or ownership mismatch.
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: msg.into(),
        }
    }

    /// 500 with a caller-chosen generic message.
    pub fn server_error(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }

    /// 500: log the full failure server-side, hand the client only the
    /// generic message.
    pub fn internal(client_msg: &'static str, err: anyhow::Error) -> Self {
        tracing::error!(error = %format!("{err:#}"), context = client_msg, "request failed");
        Self::server_error(client_msg)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(auth_routes::login))
        .route("/auth/register", post(auth_routes::register))
        .route(
            "/api/trips",
            get(trip_routes::list_trips).post(trip_routes::create_trip),
        )
        .route(
            "/api/trips/{id}",
            put(trip_routes::update_trip).delete(trip_routes::delete_trip),
        )
        .route("/api/plan", post(plan_routes::generate_plan))
        .layer(build_cors(allowed_origins))
        .with_state(state)
}

/// With no configured origins the layer is permissive (development); with
/// an allowlist only those origins may call from a browser.
fn build_cors(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(
    pool: PgPool,
    config: &TripgeniusConfig,
    bind: &str,
    port: u16,
) -> Result<()> {
    let generator: Option<Arc<dyn PlanGenerator>> = match &config.gemini_api_key {
        Some(key) => Some(Arc::new(GeminiClient::with_model(
            key.clone(),
            config.gemini_model.clone(),
        ))),
        None if config.production => {
            anyhow::bail!("GEMINI_API_KEY is required in production; refusing to start")
        }
        None => {
            warn!("no generation API key configured; /api/plan will report a misconfiguration");
            None
        }
    };

    let state = AppState {
        pool,
        token_config: config.token_config.clone(),
        generator,
    };

    let app = build_router(state, &config.allowed_origins);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    info!("tripgenius listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("tripgenius shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use sqlx::PgPool;
    use tower::ServiceExt;

    use tripgenius_core::auth::password::hash_password;
    use tripgenius_core::auth::token::{
        DEFAULT_TTL_SECS, TokenConfig, issue_token, issue_token_with_exp, verify_token,
    };
    use tripgenius_core::generate::{GenerateError, PlanGenerator};
    use tripgenius_core::itinerary::ItineraryPlan;
    use tripgenius_db::models::{AccountStatus, User, UserRole};
    use tripgenius_test_utils::{create_test_db, drop_test_db, seed_account};

    use super::{AppState, build_router};

    // -----------------------------------------------------------------------
    // Generator stubs
    // -----------------------------------------------------------------------

    /// Returns a fixed schema-valid plan and records the prompt it saw.
    struct StubGenerator {
        plan: ItineraryPlan,
        last_prompt: Mutex<Option<String>>,
    }

    impl StubGenerator {
        fn new(plan: ItineraryPlan) -> Arc<Self> {
            Arc::new(Self {
                plan,
                last_prompt: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl PlanGenerator for StubGenerator {
        async fn generate(&self, prompt: &str) -> Result<ItineraryPlan, GenerateError> {
            *self.last_prompt.lock().unwrap() = Some(prompt.to_owned());
            Ok(self.plan.clone())
        }
    }

    /// Always fails the way a broken upstream would.
    struct FailingGenerator;

    #[async_trait]
    impl PlanGenerator for FailingGenerator {
        async fn generate(&self, _prompt: &str) -> Result<ItineraryPlan, GenerateError> {
            Err(GenerateError::Upstream(
                "secret provider detail: quota exceeded for key sk-123".to_owned(),
            ))
        }
    }

    // -----------------------------------------------------------------------
    // Fixtures
    // -----------------------------------------------------------------------

    fn test_token_config() -> TokenConfig {
        TokenConfig::new(b"test-secret-key-for-tripgenius".to_vec())
    }

    fn sample_plan(days: u8) -> ItineraryPlan {
        let mut restaurants = Vec::new();
        let mut activities = Vec::new();
        for day in 1..=days {
            for time in ["Lunch", "Dinner"] {
                restaurants.push(json!({
                    "name": format!("Bistro {day} {time}"),
                    "type": "Restaurant",
                    "day": day,
                    "time": time,
                    "city": "Paris",
                    "coordinates": { "lat": 48.85, "lng": 2.35 },
                    "description": "Local cuisine",
                    "estimatedCost": 30
                }));
            }
            activities.push(json!({
                "name": format!("Sight {day}"),
                "type": "Attraction",
                "day": day,
                "time": "Morning",
                "city": "Paris",
                "coordinates": { "lat": 48.86, "lng": 2.33 },
                "description": "Walkable",
                "estimatedCost": 20
            }));
        }
        serde_json::from_value(json!({
            "flights": [{
                "from": "Berlin", "to": "Paris", "type": "Flight",
                "description": "Direct", "estimatedCost": 180,
                "searchQuery": "Berlin Paris flights"
            }],
            "hotels": [{
                "name": "Hotel Lumiere", "type": "Hotel", "city": "Paris",
                "coordinates": { "lat": 48.85, "lng": 2.35 },
                "description": "Mid-range", "estimatedCost": 140
            }],
            "restaurants": restaurants,
            "itinerary": activities,
            "costs": { "total": "~$900", "currency": "USD",
                       "breakdown": { "food": "$180" } }
        }))
        .expect("sample plan should deserialize")
    }

    fn test_state(pool: PgPool, generator: Option<Arc<dyn PlanGenerator>>) -> AppState {
        AppState {
            pool,
            token_config: test_token_config(),
            generator,
        }
    }

    async fn seed_active_user(pool: &PgPool, email: &str) -> User {
        let digest = hash_password("password123");
        seed_account(pool, email, &digest, UserRole::User, AccountStatus::Active).await
    }

    fn token_for(user: &User) -> String {
        issue_token(&test_token_config(), user.id, user.role, DEFAULT_TTL_SECS)
    }

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(v) => builder
                .header("content-type", "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    // -----------------------------------------------------------------------
    // Health
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn health_is_open() {
        let (pool, db_name) = create_test_db().await;
        let app = build_router(test_state(pool.clone(), None), &[]);

        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    // -----------------------------------------------------------------------
    // Auth endpoints
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn login_returns_verifiable_token() {
        let (pool, db_name) = create_test_db().await;
        let user = seed_active_user(&pool, "user5@tripgenius.com").await;
        let app = build_router(test_state(pool.clone(), None), &[]);

        let (status, body) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "user5@tripgenius.com", "password": "password123" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["id"], user.id);
        assert_eq!(body["user"]["email"], "user5@tripgenius.com");
        assert_eq!(body["user"]["role"], "USER");

        let token = body["token"].as_str().expect("token should be a string");
        let principal =
            verify_token(&test_token_config(), token).expect("issued token should verify");
        assert_eq!(principal.id, user.id);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn login_pending_account_is_403_regardless_of_password() {
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
        let app = build_router(test_state(pool.clone(), None), &[]);

        for password in ["password123", "wrong"] {
            let (status, body) = send(
                &app,
                "POST",
                "/auth/login",
                None,
                Some(json!({ "email": "pending@tripgenius.com", "password": password })),
            )
            .await;
            assert_eq!(status, StatusCode::FORBIDDEN, "password={password}");
            assert_eq!(body["error"], "Account is pending approval.");
        }

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn login_failures_do_not_reveal_which_part_was_wrong() {
        let (pool, db_name) = create_test_db().await;
        seed_active_user(&pool, "user1@tripgenius.com").await;
        let app = build_router(test_state(pool.clone(), None), &[]);

        let (unknown_status, unknown_body) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "ghost@tripgenius.com", "password": "password123" })),
        )
        .await;
        let (wrong_status, wrong_body) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "user1@tripgenius.com", "password": "nope" })),
        )
        .await;

        assert_eq!(unknown_status, StatusCode::BAD_REQUEST);
        assert_eq!(wrong_status, StatusCode::BAD_REQUEST);
        assert_eq!(unknown_body["error"], wrong_body["error"]);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn login_malformed_email_is_400() {
        let (pool, db_name) = create_test_db().await;
        let app = build_router(test_state(pool.clone(), None), &[]);

        let (status, body) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "not-an-email", "password": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid email or password format");

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn registration_is_closed() {
        let (pool, db_name) = create_test_db().await;
        let app = build_router(test_state(pool.clone(), None), &[]);

        let (status, body) = send(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(json!({ "email": "new@tripgenius.com", "password": "hunter2" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(
            body["error"],
            "Public registration is closed. Please use a provided test account."
        );

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    // -----------------------------------------------------------------------
    // Bearer gate
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn missing_token_is_401_invalid_token_is_403() {
        let (pool, db_name) = create_test_db().await;
        let app = build_router(test_state(pool.clone(), None), &[]);

        let (status, _) = send(&app, "GET", "/api/trips", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, "GET", "/api/trips", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // Signed with the wrong secret.
        let other = TokenConfig::new(b"some-other-secret".to_vec());
        let forged = issue_token(&other, 1, UserRole::User, DEFAULT_TTL_SECS);
        let (status, _) = send(&app, "GET", "/api/trips", Some(&forged), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn expired_token_is_403() {
        let (pool, db_name) = create_test_db().await;
        let user = seed_active_user(&pool, "user2@tripgenius.com").await;
        let app = build_router(test_state(pool.clone(), None), &[]);

        let expired = issue_token_with_exp(
            &test_token_config(),
            user.id,
            user.role,
            chrono::Utc::now().timestamp() - 60,
        );
        let (status, body) = send(&app, "GET", "/api/trips", Some(&expired), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Invalid or expired token");

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    // -----------------------------------------------------------------------
    // Trip CRUD
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn save_then_list_roundtrips_the_itinerary() {
        let (pool, db_name) = create_test_db().await;
        let user = seed_active_user(&pool, "user3@tripgenius.com").await;
        let token = token_for(&user);
        let app = build_router(test_state(pool.clone(), None), &[]);

        let plan = sample_plan(3);
        let plan_json = serde_json::to_value(&plan).unwrap();

        let (status, created) = send(
            &app,
            "POST",
            "/api/trips",
            Some(&token),
            Some(json!({
                "destinations": "Paris, Lyon",
                "startDate": null,
                "duration": 3,
                "budget": "Moderate",
                "itinerary": plan_json
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["ownerId"], user.id);
        assert_eq!(created["itinerary"], plan_json, "create must echo the decoded plan");

        let (status, listed) = send(&app, "GET", "/api/trips", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let listed = listed.as_array().expect("list response should be an array");
        assert_eq!(listed.len(), 1);
        assert_eq!(
            listed[0]["itinerary"], plan_json,
            "itinerary must round-trip through save/list"
        );

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn list_is_empty_without_saved_trips() {
        let (pool, db_name) = create_test_db().await;
        let user = seed_active_user(&pool, "user4@tripgenius.com").await;
        let token = token_for(&user);
        let app = build_router(test_state(pool.clone(), None), &[]);

        let (status, body) = send(&app, "GET", "/api/trips", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn only_the_owner_can_update_or_delete() {
        let (pool, db_name) = create_test_db().await;
        let alice = seed_active_user(&pool, "alice@tripgenius.com").await;
        let bob = seed_active_user(&pool, "bob@tripgenius.com").await;
        let alice_token = token_for(&alice);
        let bob_token = token_for(&bob);
        let app = build_router(test_state(pool.clone(), None), &[]);

        let plan_json = serde_json::to_value(sample_plan(2)).unwrap();
        let (_, created) = send(
            &app,
            "POST",
            "/api/trips",
            Some(&alice_token),
            Some(json!({
                "destinations": "Rome",
                "duration": 2,
                "budget": "Budget",
                "itinerary": plan_json
            })),
        )
        .await;
        let trip_id = created["id"].as_i64().expect("created trip should have an id");

        // Bob can neither update nor delete Alice's trip.
        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/trips/{trip_id}"),
            Some(&bob_token),
            Some(json!({ "itinerary": plan_json })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Not authorized");

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/trips/{trip_id}"),
            Some(&bob_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // Alice's own calls succeed.
        let updated_plan = serde_json::to_value(sample_plan(1)).unwrap();
        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/api/trips/{trip_id}"),
            Some(&alice_token),
            Some(json!({ "itinerary": updated_plan })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["itinerary"], updated_plan);

        let (status, body) = send(
            &app,
            "DELETE",
            &format!("/api/trips/{trip_id}"),
            Some(&alice_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Trip deleted");

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn missing_trip_looks_like_not_owned() {
        let (pool, db_name) = create_test_db().await;
        let user = seed_active_user(&pool, "user1@tripgenius.com").await;
        let token = token_for(&user);
        let app = build_router(test_state(pool.clone(), None), &[]);

        // Nonexistent id must yield the same 403 as a not-owned trip, not
        // a 404 that would confirm nonexistence.
        let (status, body) = send(
            &app,
            "DELETE",
            "/api/trips/999999",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Not authorized");

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn saving_an_invalid_plan_is_rejected_up_front() {
        let (pool, db_name) = create_test_db().await;
        let user = seed_active_user(&pool, "user1@tripgenius.com").await;
        let token = token_for(&user);
        let app = build_router(test_state(pool.clone(), None), &[]);

        let mut plan_json = serde_json::to_value(sample_plan(1)).unwrap();
        plan_json["hotels"][0]["estimatedCost"] = json!(-10);

        let (status, body) = send(
            &app,
            "POST",
            "/api/trips",
            Some(&token),
            Some(json!({
                "destinations": "Oslo",
                "duration": 1,
                "budget": "Budget",
                "itinerary": plan_json
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

        // Nothing was stored, so listing still succeeds cleanly.
        let (status, listed) = send(&app, "GET", "/api/trips", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed, json!([]));

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    // -----------------------------------------------------------------------
    // Plan generation
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn plan_endpoint_end_to_end_with_stub() {
        let (pool, db_name) = create_test_db().await;
        let user = seed_active_user(&pool, "user5@tripgenius.com").await;
        let token = token_for(&user);
        let stub = StubGenerator::new(sample_plan(3));
        let app = build_router(test_state(pool.clone(), Some(stub.clone())), &[]);

        let (status, body) = send(
            &app,
            "POST",
            "/api/plan",
            Some(&token),
            Some(json!({ "destinations": ["Paris"], "days": 3, "budget": "Luxury" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // Every dated entry stays within the requested window.
        for item in body["itinerary"].as_array().expect("itinerary should be an array") {
            let day = item["day"].as_u64().expect("day should be numeric");
            assert!((1..=3).contains(&day), "day {day} outside 1..=3");
        }
        // Every item in every list carries a numeric estimatedCost.
        for list in ["flights", "hotels", "restaurants", "itinerary"] {
            for item in body[list].as_array().expect("list should be an array") {
                assert!(
                    item["estimatedCost"].is_number(),
                    "{list} item missing numeric estimatedCost: {item}"
                );
            }
        }

        // The stub saw the sanitized prompt with the requested parameters.
        let prompt = stub.last_prompt.lock().unwrap().clone().expect("prompt captured");
        assert!(prompt.contains("3-day trip itinerary"));
        assert!(prompt.contains("Budget: Luxury"));

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn plan_clamps_out_of_range_days() {
        let (pool, db_name) = create_test_db().await;
        let user = seed_active_user(&pool, "user1@tripgenius.com").await;
        let token = token_for(&user);
        let stub = StubGenerator::new(sample_plan(14));
        let app = build_router(test_state(pool.clone(), Some(stub.clone())), &[]);

        let (status, _) = send(
            &app,
            "POST",
            "/api/plan",
            Some(&token),
            Some(json!({ "destinations": ["Paris"], "days": 99 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let prompt = stub.last_prompt.lock().unwrap().clone().expect("prompt captured");
        assert!(
            prompt.contains("14-day trip itinerary"),
            "days=99 must clamp to 14 in the prompt"
        );

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn plan_without_destinations_is_400_and_never_calls_upstream() {
        let (pool, db_name) = create_test_db().await;
        let user = seed_active_user(&pool, "user1@tripgenius.com").await;
        let token = token_for(&user);
        let stub = StubGenerator::new(sample_plan(3));
        let app = build_router(test_state(pool.clone(), Some(stub.clone())), &[]);

        for body in [
            json!({ "days": 3 }),
            json!({ "destinations": [], "days": 3 }),
            json!({ "destinations": ["!!!"], "days": 3 }),
        ] {
            let (status, resp) = send(&app, "POST", "/api/plan", Some(&token), Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(resp["error"], "destinations are required");
        }
        assert!(
            stub.last_prompt.lock().unwrap().is_none(),
            "rejected requests must never reach the generator"
        );

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn upstream_failure_is_genericized() {
        let (pool, db_name) = create_test_db().await;
        let user = seed_active_user(&pool, "user1@tripgenius.com").await;
        let token = token_for(&user);
        let app = build_router(
            test_state(pool.clone(), Some(Arc::new(FailingGenerator))),
            &[],
        );

        let (status, body) = send(
            &app,
            "POST",
            "/api/plan",
            Some(&token),
            Some(json!({ "destinations": ["Paris"], "days": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to generate plan");
        assert!(
            !body.to_string().contains("secret provider detail"),
            "provider detail must never reach the client"
        );

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn plan_without_api_key_is_a_500_misconfiguration() {
        let (pool, db_name) = create_test_db().await;
        let user = seed_active_user(&pool, "user1@tripgenius.com").await;
        let token = token_for(&user);
        let app = build_router(test_state(pool.clone(), None), &[]);

        let (status, body) = send(
            &app,
            "POST",
            "/api/plan",
            Some(&token),
            Some(json!({ "destinations": ["Paris"], "days": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Server misconfigured: Missing API Key");

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn plan_requires_auth() {
        let (pool, db_name) = create_test_db().await;
        let stub = StubGenerator::new(sample_plan(3));
        let app = build_router(test_state(pool.clone(), Some(stub)), &[]);

        let (status, _) = send(
            &app,
            "POST",
            "/api/plan",
            None,
            Some(json!({ "destinations": ["Paris"], "days": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        pool.close().await;
        drop_test_db(&db_name).await;
    }
}
