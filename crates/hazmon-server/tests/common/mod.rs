#![allow(dead_code)]

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use chrono::Utc;
use hazmon_feeds::seismic::SeismicClient;
use hazmon_feeds::weather::WeatherClient;
use hazmon_server::app;
use hazmon_server::config::ServerConfig;
use hazmon_server::state::AppState;
use hazmon_storage::auth::hash_password;
use hazmon_storage::Store;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

pub const TEST_ADMIN_EMAIL: &str = "admin@example.org";
pub const TEST_ADMIN_PASSWORD: &str = "changeme";

pub struct TestContext {
    pub state: AppState,
    pub app: axum::Router,
}

pub async fn build_test_context() -> Result<TestContext> {
    hazmon_common::id::init(1, 1);

    let store = Arc::new(Store::new("sqlite::memory:").await?);
    let password_hash = hash_password(TEST_ADMIN_PASSWORD)?;
    store.create_admin(TEST_ADMIN_EMAIL, &password_hash).await?;
    hazmon_server::seed::init_default_settings(&store).await?;

    let config = ServerConfig::default();
    let weather = Arc::new(WeatherClient::new(&config.feeds)?);
    let seismic = Arc::new(SeismicClient::new(&config.feeds)?);

    let state = AppState {
        store,
        weather,
        seismic,
        refire_policy: config.alerting.refire_policy,
        start_time: Utc::now(),
        jwt_secret: Arc::new("test-secret".to_string()),
        token_expire_secs: 3600,
        config: Arc::new(config),
    };

    let app = app::build_http_app(state.clone());
    Ok(TestContext { state, app })
}

/// Drive one request through the router and decode the JSON envelope.
pub async fn request_json(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(value) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(value.to_string()))
            .expect("request should build"),
        None => builder.body(Body::empty()).expect("request should build"),
    };

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("request should not fail at the transport level");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should collect");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Log in as the seeded test admin and return a bearer token.
pub async fn login(app: &axum::Router) -> String {
    let (status, body) = request_json(
        app,
        "POST",
        "/v1/auth/login",
        None,
        Some(json!({"email": TEST_ADMIN_EMAIL, "password": TEST_ADMIN_PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["data"]["token"]
        .as_str()
        .expect("login response should carry a token")
        .to_string()
}

/// Create a location through the API and return its ID.
pub async fn create_location(app: &axum::Router, token: &str, name: &str, coords: &str) -> String {
    let (status, body) = request_json(
        app,
        "POST",
        "/v1/locations",
        Some(token),
        Some(json!({"name": name, "coordinates": coords})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create location failed: {body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

/// Create a disaster through the API and return its ID.
pub async fn create_disaster(app: &axum::Router, token: &str, name: &str) -> String {
    let (status, body) = request_json(
        app,
        "POST",
        "/v1/disasters",
        Some(token),
        Some(json!({"name": name})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create disaster failed: {body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

/// Create a rule through the API and return its ID.
pub async fn create_rule(app: &axum::Router, token: &str, rule: Value) -> String {
    let (status, body) = request_json(app, "POST", "/v1/rules", Some(token), Some(rule)).await;
    assert_eq!(status, StatusCode::CREATED, "create rule failed: {body}");
    body["data"]["id"].as_str().unwrap().to_string()
}
