mod common;

use axum::http::StatusCode;
use common::{
    build_test_context, create_disaster, create_location, create_rule, login, request_json,
    TEST_ADMIN_EMAIL,
};
use serde_json::json;

#[tokio::test]
async fn health_is_public_and_reports_counts() {
    let ctx = build_test_context().await.unwrap();

    let (status, body) = request_json(&ctx.app, "GET", "/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["err_code"], 0);
    assert_eq!(body["data"]["storage_status"], "ok");
    assert_eq!(body["data"]["monitored_locations"], 0);
    assert_eq!(body["data"]["active_alerts"], 0);
}

#[tokio::test]
async fn login_rejects_bad_credentials_and_issues_tokens() {
    let ctx = build_test_context().await.unwrap();

    let (status, _) = request_json(
        &ctx.app,
        "POST",
        "/v1/auth/login",
        None,
        Some(json!({"email": TEST_ADMIN_EMAIL, "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = request_json(
        &ctx.app,
        "POST",
        "/v1/auth/login",
        None,
        Some(json!({"email": "", "password": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["err_code"], 1001);

    let token = login(&ctx.app).await;
    assert!(!token.is_empty());
}

#[tokio::test]
async fn admin_routes_require_a_valid_bearer_token() {
    let ctx = build_test_context().await.unwrap();

    let (status, body) = request_json(&ctx.app, "GET", "/v1/locations", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["err_code"], 1002);

    let (status, _) =
        request_json(&ctx.app, "GET", "/v1/locations", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The public feed stays reachable without a token
    let (status, _) = request_json(&ctx.app, "GET", "/v1/alerts", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn location_crud_validates_coordinates_at_the_boundary() {
    let ctx = build_test_context().await.unwrap();
    let token = login(&ctx.app).await;

    // Malformed coordinate string is rejected before anything is stored
    let (status, body) = request_json(
        &ctx.app,
        "POST",
        "/v1/locations",
        Some(&token),
        Some(json!({"name": "Dhaka", "coordinates": "somewhere up north"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["err_code"], 1101);

    // Out-of-range latitude too
    let (status, _) = request_json(
        &ctx.app,
        "POST",
        "/v1/locations",
        Some(&token),
        Some(json!({"name": "Dhaka", "coordinates": "95.0° N, 90.4152° E"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let id = create_location(&ctx.app, &token, "Dhaka", "23.8041° N, 90.4152° E").await;

    // Duplicate name conflicts
    let (status, body) = request_json(
        &ctx.app,
        "POST",
        "/v1/locations",
        Some(&token),
        Some(json!({"name": "Dhaka", "coordinates": "23.8041° N, 90.4152° E"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, body) = request_json(
        &ctx.app,
        "GET",
        &format!("/v1/locations/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Dhaka");
    assert!((body["data"]["latitude"].as_f64().unwrap() - 23.8041).abs() < 1e-6);
    assert_eq!(body["data"]["enabled"], true);

    // Disable, then confirm the filter sees it
    let (status, _) = request_json(
        &ctx.app,
        "PUT",
        &format!("/v1/locations/{id}/enable"),
        Some(&token),
        Some(json!({"enabled": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = request_json(
        &ctx.app,
        "GET",
        "/v1/locations?enabled__eq=true",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["data"]["total"], 0);

    let (status, _) = request_json(
        &ctx.app,
        "DELETE",
        &format!("/v1/locations/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request_json(
        &ctx.app,
        "GET",
        &format!("/v1/locations/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rule_creation_enforces_enum_and_threshold_bounds() {
    let ctx = build_test_context().await.unwrap();
    let token = login(&ctx.app).await;
    let disaster_id = create_disaster(&ctx.app, &token, "Flood").await;

    // Unknown metric
    let (status, _) = request_json(
        &ctx.app,
        "POST",
        "/v1/rules",
        Some(&token),
        Some(json!({
            "disaster_id": disaster_id, "metric": "sunshine",
            "operator": ">", "threshold": 10.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown operator
    let (status, _) = request_json(
        &ctx.app,
        "POST",
        "/v1/rules",
        Some(&token),
        Some(json!({
            "disaster_id": disaster_id, "metric": "rain_sum",
            "operator": "==", "threshold": 10.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Humidity out of percentage range
    let (status, body) = request_json(
        &ctx.app,
        "POST",
        "/v1/rules",
        Some(&token),
        Some(json!({
            "disaster_id": disaster_id, "metric": "humidity",
            "operator": ">", "threshold": 150.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["err_code"], 1102);

    // Implausible magnitude ceiling
    let (status, _) = request_json(
        &ctx.app,
        "POST",
        "/v1/rules",
        Some(&token),
        Some(json!({
            "disaster_id": disaster_id, "metric": "earthquake_magnitude",
            "operator": ">", "threshold": 20.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Negative rain threshold
    let (status, _) = request_json(
        &ctx.app,
        "POST",
        "/v1/rules",
        Some(&token),
        Some(json!({
            "disaster_id": disaster_id, "metric": "rain_sum",
            "operator": ">", "threshold": -5.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown disaster reference
    let (status, _) = request_json(
        &ctx.app,
        "POST",
        "/v1/rules",
        Some(&token),
        Some(json!({
            "disaster_id": "missing", "metric": "rain_sum",
            "operator": ">", "threshold": 50.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Negative temperature thresholds are legitimate
    let (status, _) = request_json(
        &ctx.app,
        "POST",
        "/v1/rules",
        Some(&token),
        Some(json!({
            "disaster_id": disaster_id, "metric": "temperature",
            "operator": "<", "threshold": -5.0, "severity": "Low"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn weather_simulation_fires_matching_rules_and_dedups_refires() {
    let ctx = build_test_context().await.unwrap();
    let token = login(&ctx.app).await;

    let location_id = create_location(&ctx.app, &token, "Dhaka", "23.8041° N, 90.4152° E").await;
    let disaster_id = create_disaster(&ctx.app, &token, "Flood").await;
    create_rule(
        &ctx.app,
        &token,
        json!({
            "location_id": location_id, "disaster_id": disaster_id,
            "metric": "rain_sum", "operator": ">", "threshold": 50.0,
            "severity": "High"
        }),
    )
    .await;

    // Below threshold: no alert
    let (status, body) = request_json(
        &ctx.app,
        "POST",
        "/v1/simulate/weather",
        Some(&token),
        Some(json!({"location_id": location_id, "rain_sum": 30.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["alerts"].as_array().unwrap().len(), 0);

    // Above threshold: exactly one High alert
    let (status, body) = request_json(
        &ctx.app,
        "POST",
        "/v1/simulate/weather",
        Some(&token),
        Some(json!({"location_id": location_id, "rain_sum": 75.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let alerts = body["data"]["alerts"].as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["severity"], "High");
    let alert_id = alerts[0]["id"].as_str().unwrap().to_string();

    // The public feed shows it with joined names
    let (status, body) = request_json(&ctx.app, "GET", "/v1/alerts", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    let item = &body["data"]["items"][0];
    assert_eq!(item["disaster_name"], "Flood");
    assert_eq!(item["location_name"], "Dhaka");
    assert_eq!(item["active"], true);
    assert_eq!(item["metric"], "rain_sum");
    assert!((item["observed_value"].as_f64().unwrap() - 75.0).abs() < 1e-9);

    // Re-running the identical observation does not duplicate the active
    // alert (skip_while_active policy)
    let (_, body) = request_json(
        &ctx.app,
        "POST",
        "/v1/simulate/weather",
        Some(&token),
        Some(json!({"location_id": location_id, "rain_sum": 75.0})),
    )
    .await;
    assert_eq!(body["data"]["alerts"].as_array().unwrap().len(), 0);
    let (_, body) = request_json(&ctx.app, "GET", "/v1/alerts", None, None).await;
    assert_eq!(body["data"]["total"], 1);

    // Archiving reopens the path for the next matching tick
    let (status, _) = request_json(
        &ctx.app,
        "POST",
        &format!("/v1/alerts/{alert_id}/archive"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = request_json(
        &ctx.app,
        "POST",
        "/v1/simulate/weather",
        Some(&token),
        Some(json!({"location_id": location_id, "rain_sum": 75.0})),
    )
    .await;
    assert_eq!(body["data"]["alerts"].as_array().unwrap().len(), 1);

    // One archived + one active in the feed now
    let (_, body) = request_json(&ctx.app, "GET", "/v1/alerts?active__eq=true", None, None).await;
    assert_eq!(body["data"]["total"], 1);
    let (_, body) = request_json(&ctx.app, "GET", "/v1/alerts", None, None).await;
    assert_eq!(body["data"]["total"], 2);
}

#[tokio::test]
async fn global_aqi_rule_only_fires_for_the_location_over_threshold() {
    let ctx = build_test_context().await.unwrap();
    let token = login(&ctx.app).await;

    let l1 = create_location(&ctx.app, &token, "Dhaka", "23.8041° N, 90.4152° E").await;
    let l2 = create_location(&ctx.app, &token, "Sylhet", "24.8949° N, 91.8687° E").await;
    let disaster_id = create_disaster(&ctx.app, &token, "Air Quality Emergency").await;
    create_rule(
        &ctx.app,
        &token,
        json!({
            "disaster_id": disaster_id, "metric": "aqi",
            "operator": ">", "threshold": 300.0, "severity": "Critical"
        }),
    )
    .await;

    let (_, body) = request_json(
        &ctx.app,
        "POST",
        "/v1/simulate/weather",
        Some(&token),
        Some(json!({"location_id": l1, "aqi": 350.0})),
    )
    .await;
    assert_eq!(body["data"]["alerts"].as_array().unwrap().len(), 1);

    let (_, body) = request_json(
        &ctx.app,
        "POST",
        "/v1/simulate/weather",
        Some(&token),
        Some(json!({"location_id": l2, "aqi": 100.0})),
    )
    .await;
    assert_eq!(body["data"]["alerts"].as_array().unwrap().len(), 0);

    let (_, body) = request_json(&ctx.app, "GET", "/v1/alerts?active__eq=true", None, None).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["location_name"], "Dhaka");
}

#[tokio::test]
async fn earthquake_simulation_respects_the_qualifying_radius() {
    let ctx = build_test_context().await.unwrap();
    let token = login(&ctx.app).await;

    // ~200 km and ~600 km north of the epicenter at (23.80, 90.41)
    let near = create_location(&ctx.app, &token, "Mymensingh", "25.6000° N, 90.4100° E").await;
    let _far = create_location(&ctx.app, &token, "Lhasa", "29.2000° N, 90.4100° E").await;
    let disaster_id = create_disaster(&ctx.app, &token, "Earthquake").await;
    create_rule(
        &ctx.app,
        &token,
        json!({
            "disaster_id": disaster_id, "metric": "earthquake_magnitude",
            "operator": ">", "threshold": 5.0, "severity": "Critical"
        }),
    )
    .await;

    let (status, body) = request_json(
        &ctx.app,
        "POST",
        "/v1/simulate/earthquake",
        Some(&token),
        Some(json!({"latitude": 23.80, "longitude": 90.41, "magnitude": 6.5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Only the near location qualifies, regardless of threshold
    let affected = body["data"]["affected_locations"].as_array().unwrap();
    assert_eq!(affected.len(), 1, "{body}");
    assert_eq!(affected[0]["id"], near.as_str());
    let distance = affected[0]["distance_km"].as_f64().unwrap();
    assert!((distance - 200.0).abs() < 3.0, "got {distance}");
    assert_eq!(affected[0]["alerts"].as_array().unwrap().len(), 1);

    // The alert carries the structured seismic columns
    let (_, body) = request_json(&ctx.app, "GET", "/v1/alerts?active__eq=true", None, None).await;
    assert_eq!(body["data"]["total"], 1);
    let item = &body["data"]["items"][0];
    assert!((item["magnitude"].as_f64().unwrap() - 6.5).abs() < 1e-9);
    assert!(item["epicenter"].as_str().unwrap().contains("Simulated event"));
    assert!((item["distance_km"].as_f64().unwrap() - 200.0).abs() < 3.0);

    // Below the rule threshold: in range but no alert
    let (_, body) = request_json(
        &ctx.app,
        "POST",
        "/v1/simulate/earthquake",
        Some(&token),
        Some(json!({"latitude": 23.80, "longitude": 90.41, "magnitude": 4.0})),
    )
    .await;
    let affected = body["data"]["affected_locations"].as_array().unwrap();
    assert_eq!(affected.len(), 1);
    assert_eq!(affected[0]["alerts"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn settings_updates_enforce_the_thirty_second_floor() {
    let ctx = build_test_context().await.unwrap();
    let token = login(&ctx.app).await;

    let (status, body) = request_json(&ctx.app, "GET", "/v1/settings", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["weather_fetch_interval"], 300);
    assert_eq!(body["data"]["earthquake_fetch_interval"], 60);

    // Below the floor is rejected and nothing changes
    let (status, body) = request_json(
        &ctx.app,
        "PUT",
        "/v1/settings",
        Some(&token),
        Some(json!({"weather_fetch_interval": 20})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["err_code"], 1103);

    let (_, body) = request_json(&ctx.app, "GET", "/v1/settings", Some(&token), None).await;
    assert_eq!(body["data"]["weather_fetch_interval"], 300);

    // An empty update is rejected
    let (status, _) = request_json(&ctx.app, "PUT", "/v1/settings", Some(&token), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Valid values persist
    let (status, body) = request_json(
        &ctx.app,
        "PUT",
        "/v1/settings",
        Some(&token),
        Some(json!({"weather_fetch_interval": 45, "earthquake_fetch_interval": 3600})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["weather_fetch_interval"], 45);
    assert_eq!(body["data"]["earthquake_fetch_interval"], 3600);
}

#[tokio::test]
async fn admin_accounts_cannot_be_emptied() {
    let ctx = build_test_context().await.unwrap();
    let token = login(&ctx.app).await;

    let (status, body) = request_json(&ctx.app, "GET", "/v1/accounts", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let accounts = body["data"].as_array().unwrap();
    assert_eq!(accounts.len(), 1);
    let first_id = accounts[0]["id"].as_str().unwrap().to_string();
    assert!(accounts[0].get("password_hash").is_none());

    // Bad inputs
    let (status, _) = request_json(
        &ctx.app,
        "POST",
        "/v1/accounts",
        Some(&token),
        Some(json!({"email": "not-an-email", "password": "longenough"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = request_json(
        &ctx.app,
        "POST",
        "/v1/accounts",
        Some(&token),
        Some(json!({"email": "second@example.org", "password": "short"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Deleting the only account is refused
    let (status, body) = request_json(
        &ctx.app,
        "DELETE",
        &format!("/v1/accounts/{first_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["err_code"], 1105);

    // With a second account it works
    let (status, _) = request_json(
        &ctx.app,
        "POST",
        "/v1/accounts",
        Some(&token),
        Some(json!({"email": "second@example.org", "password": "longenough"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = request_json(
        &ctx.app,
        "DELETE",
        &format!("/v1/accounts/{first_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn deleting_a_location_cascades_through_the_api_view() {
    let ctx = build_test_context().await.unwrap();
    let token = login(&ctx.app).await;

    let location_id = create_location(&ctx.app, &token, "Dhaka", "23.8041° N, 90.4152° E").await;
    let disaster_id = create_disaster(&ctx.app, &token, "Flood").await;
    let rule_id = create_rule(
        &ctx.app,
        &token,
        json!({
            "location_id": location_id, "disaster_id": disaster_id,
            "metric": "rain_sum", "operator": ">", "threshold": 50.0
        }),
    )
    .await;
    // Fire an alert so the cascade has something to sweep
    let (_, body) = request_json(
        &ctx.app,
        "POST",
        "/v1/simulate/weather",
        Some(&token),
        Some(json!({"location_id": location_id, "rain_sum": 75.0})),
    )
    .await;
    assert_eq!(body["data"]["alerts"].as_array().unwrap().len(), 1);

    let (status, _) = request_json(
        &ctx.app,
        "DELETE",
        &format!("/v1/locations/{location_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request_json(
        &ctx.app,
        "GET",
        &format!("/v1/rules/{rule_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = request_json(&ctx.app, "GET", "/v1/alerts", None, None).await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn observation_log_endpoints_list_and_clear() {
    let ctx = build_test_context().await.unwrap();
    let token = login(&ctx.app).await;

    let (status, body) =
        request_json(&ctx.app, "GET", "/v1/weather-logs", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 0);

    let (status, body) =
        request_json(&ctx.app, "GET", "/v1/earthquake-logs", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 0);

    let (status, _) =
        request_json(&ctx.app, "DELETE", "/v1/weather-logs/all", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = request_json(
        &ctx.app,
        "DELETE",
        "/v1/earthquake-logs/all",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn rule_updates_revalidate_the_effective_condition() {
    let ctx = build_test_context().await.unwrap();
    let token = login(&ctx.app).await;

    let disaster_id = create_disaster(&ctx.app, &token, "Heatwave").await;
    let rule_id = create_rule(
        &ctx.app,
        &token,
        json!({
            "disaster_id": disaster_id, "metric": "temperature",
            "operator": ">=", "threshold": 40.0, "severity": "High"
        }),
    )
    .await;

    // Switching the metric to humidity while keeping threshold 40 is fine
    let (status, _) = request_json(
        &ctx.app,
        "PUT",
        &format!("/v1/rules/{rule_id}"),
        Some(&token),
        Some(json!({
            "location_id": null, "disaster_id": disaster_id,
            "metric": "humidity", "operator": ">=", "threshold": 40.0,
            "severity": "High"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // But a humidity threshold above 100 is not
    let (status, body) = request_json(
        &ctx.app,
        "PUT",
        &format!("/v1/rules/{rule_id}"),
        Some(&token),
        Some(json!({
            "location_id": null, "disaster_id": disaster_id,
            "metric": "humidity", "operator": ">=", "threshold": 120.0,
            "severity": "High"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["err_code"], 1102);

    let (_, body) = request_json(
        &ctx.app,
        "GET",
        &format!("/v1/rules/{rule_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["data"]["metric"], "humidity");
    assert!(body["data"]["location_id"].is_null());

    // Disable and verify the enabled filter
    let (status, _) = request_json(
        &ctx.app,
        "PUT",
        &format!("/v1/rules/{rule_id}/enable"),
        Some(&token),
        Some(json!({"enabled": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = request_json(
        &ctx.app,
        "GET",
        "/v1/rules?enabled__eq=true",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["data"]["total"], 0);
}
