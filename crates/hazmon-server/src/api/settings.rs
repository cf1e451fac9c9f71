use crate::api::{error_response, storage_error, success_response};
use crate::logging::TraceId;
use crate::scheduler::{
    DEFAULT_EARTHQUAKE_INTERVAL_SECS, DEFAULT_WEATHER_INTERVAL_SECS, MIN_FETCH_INTERVAL_SECS,
};
use crate::state::AppState;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hazmon_storage::{EARTHQUAKE_FETCH_INTERVAL_KEY, WEATHER_FETCH_INTERVAL_KEY};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Poll interval settings, in seconds.
#[derive(Serialize, ToSchema)]
pub struct SettingsResponse {
    pub weather_fetch_interval: u64,
    pub earthquake_fetch_interval: u64,
}

/// Read the poll intervals.
#[utoipa::path(
    get,
    path = "/v1/settings",
    tag = "Settings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current settings", body = SettingsResponse),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError)
    )
)]
async fn get_settings(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let weather = state
        .store
        .get_setting_u64(WEATHER_FETCH_INTERVAL_KEY, DEFAULT_WEATHER_INTERVAL_SECS)
        .await;
    let earthquake = state
        .store
        .get_setting_u64(
            EARTHQUAKE_FETCH_INTERVAL_KEY,
            DEFAULT_EARTHQUAKE_INTERVAL_SECS,
        )
        .await;
    success_response(
        StatusCode::OK,
        &trace_id,
        SettingsResponse {
            weather_fetch_interval: weather,
            earthquake_fetch_interval: earthquake,
        },
    )
}

#[derive(Deserialize, ToSchema)]
struct UpdateSettingsRequest {
    /// New weather poll interval in seconds (min 30)
    #[serde(
        default,
        deserialize_with = "crate::api::pagination::deserialize_optional_u64"
    )]
    weather_fetch_interval: Option<u64>,
    /// New earthquake poll interval in seconds (min 30)
    #[serde(
        default,
        deserialize_with = "crate::api::pagination::deserialize_optional_u64"
    )]
    earthquake_fetch_interval: Option<u64>,
}

fn check_interval(trace_id: &str, name: &str, value: u64) -> Result<(), Response> {
    if value < MIN_FETCH_INTERVAL_SECS {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            trace_id,
            "invalid_interval",
            &format!("{name} must be at least {MIN_FETCH_INTERVAL_SECS} seconds"),
        ));
    }
    Ok(())
}

/// Update one or both poll intervals. Values below the 30-second floor
/// are rejected. Running pollers pick up the change on their next loop
/// iteration, not mid-sleep.
#[utoipa::path(
    put,
    path = "/v1/settings",
    tag = "Settings",
    security(("bearer_auth" = [])),
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Settings updated", body = SettingsResponse),
        (status = 400, description = "Interval below the 30-second floor", body = crate::api::ApiError),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError)
    )
)]
async fn update_settings(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Json(req): Json<UpdateSettingsRequest>,
) -> impl IntoResponse {
    if req.weather_fetch_interval.is_none() && req.earthquake_fetch_interval.is_none() {
        return error_response(
            StatusCode::BAD_REQUEST,
            &trace_id,
            "bad_request",
            "no settings provided",
        );
    }

    if let Some(value) = req.weather_fetch_interval {
        if let Err(resp) = check_interval(&trace_id, WEATHER_FETCH_INTERVAL_KEY, value) {
            return resp;
        }
    }
    if let Some(value) = req.earthquake_fetch_interval {
        if let Err(resp) = check_interval(&trace_id, EARTHQUAKE_FETCH_INTERVAL_KEY, value) {
            return resp;
        }
    }

    if let Some(value) = req.weather_fetch_interval {
        if let Err(e) = state
            .store
            .upsert_setting(WEATHER_FETCH_INTERVAL_KEY, &value.to_string())
            .await
        {
            tracing::error!(error = %e, "Failed to update weather interval");
            return storage_error(&trace_id);
        }
        tracing::info!(value, "Weather fetch interval updated");
    }
    if let Some(value) = req.earthquake_fetch_interval {
        if let Err(e) = state
            .store
            .upsert_setting(EARTHQUAKE_FETCH_INTERVAL_KEY, &value.to_string())
            .await
        {
            tracing::error!(error = %e, "Failed to update earthquake interval");
            return storage_error(&trace_id);
        }
        tracing::info!(value, "Earthquake fetch interval updated");
    }

    let weather = state
        .store
        .get_setting_u64(WEATHER_FETCH_INTERVAL_KEY, DEFAULT_WEATHER_INTERVAL_SECS)
        .await;
    let earthquake = state
        .store
        .get_setting_u64(
            EARTHQUAKE_FETCH_INTERVAL_KEY,
            DEFAULT_EARTHQUAKE_INTERVAL_SECS,
        )
        .await;
    success_response(
        StatusCode::OK,
        &trace_id,
        SettingsResponse {
            weather_fetch_interval: weather,
            earthquake_fetch_interval: earthquake,
        },
    )
}

pub fn settings_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(get_settings, update_settings))
}
