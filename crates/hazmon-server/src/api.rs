pub mod accounts;
pub mod alerts;
pub mod disasters;
pub mod locations;
pub mod observations;
pub mod pagination;
pub mod rules;
pub mod settings;
pub mod simulate;
pub mod snapshot;

use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// API error response.
#[derive(Serialize, ToSchema)]
pub struct ApiError {
    /// Error code (0 on success)
    pub err_code: i32,
    /// Error message
    pub err_msg: String,
    /// Trace ID for log correlation
    pub trace_id: String,
}

/// Uniform response envelope.
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    /// Error code (0 on success)
    pub err_code: i32,
    /// Error message ("success" on success)
    pub err_msg: String,
    /// Trace ID for log correlation
    pub trace_id: String,
    /// Payload, when there is one
    pub data: Option<T>,
}

/// Paginated list payload.
#[derive(Serialize, ToSchema)]
pub struct PaginatedData<T>
where
    T: Serialize,
{
    pub items: Vec<T>,
    pub total: u64,
    pub limit: usize,
    pub offset: usize,
}

/// Payload carrying just a row ID (create/update/delete results).
#[derive(Serialize, ToSchema)]
pub struct IdResponse {
    pub id: String,
}

pub fn success_response<T>(status: StatusCode, trace_id: &str, data: T) -> Response
where
    T: Serialize,
{
    (
        status,
        Json(ApiResponse {
            err_code: 0,
            err_msg: "success".to_string(),
            trace_id: trace_id.to_string(),
            data: Some(data),
        }),
    )
        .into_response()
}

pub fn success_empty_response(status: StatusCode, trace_id: &str, msg: &str) -> Response {
    (
        status,
        Json(ApiResponse::<Value> {
            err_code: 0,
            err_msg: msg.to_string(),
            trace_id: trace_id.to_string(),
            data: None,
        }),
    )
        .into_response()
}

pub fn success_id_response(status: StatusCode, trace_id: &str, id: String) -> Response {
    success_response(status, trace_id, IdResponse { id })
}

pub fn success_paginated_response<T>(
    status: StatusCode,
    trace_id: &str,
    items: Vec<T>,
    total: u64,
    limit: usize,
    offset: usize,
) -> Response
where
    T: Serialize,
{
    success_response(
        status,
        trace_id,
        PaginatedData {
            items,
            total,
            limit,
            offset,
        },
    )
}

fn to_custom_error_code(code: &str) -> i32 {
    match code {
        "bad_request" => 1001,
        "unauthorized" => 1002,
        "token_expired" => 1003,
        "not_found" => 1004,
        "conflict" => 1005,
        "invalid_coordinates" => 1101,
        "invalid_threshold" => 1102,
        "invalid_interval" => 1103,
        "upstream_unavailable" => 1104,
        "last_admin" => 1105,
        "storage_error" => 1501,
        "internal_error" => 1500,
        _ => 1999,
    }
}

pub fn error_response(status: StatusCode, trace_id: &str, code: &str, msg: &str) -> Response {
    (
        status,
        Json(ApiResponse::<Value> {
            err_code: to_custom_error_code(code),
            err_msg: msg.to_string(),
            trace_id: trace_id.to_string(),
            data: None,
        }),
    )
        .into_response()
}

/// Shorthand used all over the handlers for store failures.
pub fn storage_error(trace_id: &str) -> Response {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        trace_id,
        "storage_error",
        "Database error",
    )
}

/// Health check response.
#[derive(Serialize, ToSchema)]
struct HealthResponse {
    /// Service version
    version: String,
    /// Uptime in seconds
    uptime_secs: i64,
    /// Number of enabled monitored locations
    monitored_locations: u64,
    /// Number of currently active alerts
    active_alerts: u64,
    /// Storage status (ok / error)
    storage_status: String,
}

/// Service health. Public, no auth.
#[utoipa::path(
    get,
    path = "/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service health", body = HealthResponse)
    )
)]
async fn health(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let uptime = (Utc::now() - state.start_time).num_seconds();

    let (monitored_locations, active_alerts, storage_status) = match (
        state.store.count_locations(None, Some(true)).await,
        state.store.count_active_alerts().await,
    ) {
        (Ok(locations), Ok(alerts)) => (locations, alerts, "ok".to_string()),
        (locations, alerts) => {
            if let Err(e) = &locations {
                tracing::error!(error = %e, "Health check failed to count locations");
            }
            if let Err(e) = &alerts {
                tracing::error!(error = %e, "Health check failed to count alerts");
            }
            (
                locations.unwrap_or(0),
                alerts.unwrap_or(0),
                "error".to_string(),
            )
        }
    };

    success_response(
        StatusCode::OK,
        &trace_id,
        HealthResponse {
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: uptime,
            monitored_locations,
            active_alerts,
            storage_status,
        },
    )
}

pub fn public_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(health))
        .merge(alerts::public_alert_routes())
        .merge(snapshot::snapshot_routes())
}

pub fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(crate::auth::login))
}

pub fn protected_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(locations::location_routes())
        .merge(disasters::disaster_routes())
        .merge(rules::rule_routes())
        .merge(alerts::admin_alert_routes())
        .merge(observations::observation_routes())
        .merge(settings::settings_routes())
        .merge(accounts::account_routes())
        .merge(simulate::simulate_routes())
}
