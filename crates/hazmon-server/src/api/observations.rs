use crate::api::pagination::PaginationParams;
use crate::api::{storage_error, success_empty_response, success_paginated_response};
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use hazmon_storage::ObservationLogFilter;
use serde::Deserialize;
use utoipa_axum::{router::OpenApiRouter, routes};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
struct ListLogsParams {
    /// Exact match on the location
    #[param(required = false, rename = "location_id__eq")]
    #[serde(rename = "location_id__eq")]
    location_id_eq: Option<String>,
    /// Lower bound on the observation time
    #[param(required = false, rename = "recorded_at__gte")]
    #[serde(rename = "recorded_at__gte")]
    recorded_at_gte: Option<DateTime<Utc>>,
    /// Upper bound on the observation time
    #[param(required = false, rename = "recorded_at__lte")]
    #[serde(rename = "recorded_at__lte")]
    recorded_at_lte: Option<DateTime<Utc>>,
    /// Page size (default 20)
    #[param(required = false)]
    #[serde(
        default,
        deserialize_with = "crate::api::pagination::deserialize_optional_u64"
    )]
    limit: Option<u64>,
    /// Offset (default 0)
    #[param(required = false)]
    #[serde(
        default,
        deserialize_with = "crate::api::pagination::deserialize_optional_u64"
    )]
    offset: Option<u64>,
}

impl ListLogsParams {
    fn to_filter(&self) -> ObservationLogFilter {
        ObservationLogFilter {
            location_id_eq: self.location_id_eq.clone(),
            recorded_gte: self.recorded_at_gte,
            recorded_lte: self.recorded_at_lte,
        }
    }
}

/// List weather observation logs, newest first.
#[utoipa::path(
    get,
    path = "/v1/weather-logs",
    tag = "Observations",
    security(("bearer_auth" = [])),
    params(ListLogsParams),
    responses(
        (status = 200, description = "Paginated weather log list"),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError)
    )
)]
async fn list_weather_logs(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Query(params): Query<ListLogsParams>,
) -> impl IntoResponse {
    let limit = PaginationParams::resolve_limit(params.limit);
    let offset = PaginationParams::resolve_offset(params.offset);
    let filter = params.to_filter();

    let total = match state.store.count_weather_logs(&filter).await {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Failed to count weather logs");
            return storage_error(&trace_id);
        }
    };

    match state.store.list_weather_logs(&filter, limit, offset).await {
        Ok(rows) => success_paginated_response(StatusCode::OK, &trace_id, rows, total, limit, offset),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list weather logs");
            storage_error(&trace_id)
        }
    }
}

/// Delete every weather observation log.
#[utoipa::path(
    delete,
    path = "/v1/weather-logs/all",
    tag = "Observations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All weather logs deleted"),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError)
    )
)]
async fn delete_all_weather_logs(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state.store.delete_all_weather_logs().await {
        Ok(removed) => success_empty_response(
            StatusCode::OK,
            &trace_id,
            &format!("{removed} weather logs deleted"),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete weather logs");
            storage_error(&trace_id)
        }
    }
}

/// List earthquake observation logs, newest first.
#[utoipa::path(
    get,
    path = "/v1/earthquake-logs",
    tag = "Observations",
    security(("bearer_auth" = [])),
    params(ListLogsParams),
    responses(
        (status = 200, description = "Paginated earthquake log list"),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError)
    )
)]
async fn list_earthquake_logs(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Query(params): Query<ListLogsParams>,
) -> impl IntoResponse {
    let limit = PaginationParams::resolve_limit(params.limit);
    let offset = PaginationParams::resolve_offset(params.offset);
    let filter = params.to_filter();

    let total = match state.store.count_earthquake_logs(&filter).await {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Failed to count earthquake logs");
            return storage_error(&trace_id);
        }
    };

    match state
        .store
        .list_earthquake_logs(&filter, limit, offset)
        .await
    {
        Ok(rows) => success_paginated_response(StatusCode::OK, &trace_id, rows, total, limit, offset),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list earthquake logs");
            storage_error(&trace_id)
        }
    }
}

/// Delete every earthquake observation log.
#[utoipa::path(
    delete,
    path = "/v1/earthquake-logs/all",
    tag = "Observations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All earthquake logs deleted"),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError)
    )
)]
async fn delete_all_earthquake_logs(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state.store.delete_all_earthquake_logs().await {
        Ok(removed) => success_empty_response(
            StatusCode::OK,
            &trace_id,
            &format!("{removed} earthquake logs deleted"),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete earthquake logs");
            storage_error(&trace_id)
        }
    }
}

pub fn observation_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_weather_logs))
        .routes(routes!(delete_all_weather_logs))
        .routes(routes!(list_earthquake_logs))
        .routes(routes!(delete_all_earthquake_logs))
}
