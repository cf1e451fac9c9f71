use crate::api::pagination::PaginationParams;
use crate::api::{
    error_response, storage_error, success_empty_response, success_id_response,
    success_paginated_response,
};
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use hazmon_storage::AlertFilter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Alert feed entry, joined with disaster and location names.
#[derive(Serialize, ToSchema)]
pub struct AlertResponse {
    pub id: String,
    pub rule_id: Option<String>,
    pub disaster_id: String,
    pub disaster_name: String,
    pub location_id: String,
    pub location_name: String,
    /// Metric that fired the alert
    pub metric: String,
    pub severity: String,
    pub message: String,
    pub observed_value: f64,
    pub threshold: f64,
    /// Structured seismic fields; absent for weather alerts
    pub magnitude: Option<f64>,
    pub epicenter: Option<String>,
    pub distance_km: Option<f64>,
    /// Unresolved until archived through the API
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
struct ListAlertsParams {
    /// Exact match on the location
    #[param(required = false, rename = "location_id__eq")]
    #[serde(rename = "location_id__eq")]
    location_id_eq: Option<String>,
    /// Exact match on the disaster
    #[param(required = false, rename = "disaster_id__eq")]
    #[serde(rename = "disaster_id__eq")]
    disaster_id_eq: Option<String>,
    /// Exact match on the severity
    #[param(required = false, rename = "severity__eq")]
    #[serde(rename = "severity__eq")]
    severity_eq: Option<String>,
    /// Exact match on the active flag
    #[param(required = false, rename = "active__eq")]
    #[serde(rename = "active__eq")]
    active_eq: Option<bool>,
    /// Lower bound on creation time
    #[param(required = false, rename = "created_at__gte")]
    #[serde(rename = "created_at__gte")]
    created_at_gte: Option<DateTime<Utc>>,
    /// Upper bound on creation time
    #[param(required = false, rename = "created_at__lte")]
    #[serde(rename = "created_at__lte")]
    created_at_lte: Option<DateTime<Utc>>,
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

/// Public alert feed, newest first. No auth so the public dashboard can
/// poll it.
#[utoipa::path(
    get,
    path = "/v1/alerts",
    tag = "Alerts",
    params(ListAlertsParams),
    responses(
        (status = 200, description = "Paginated alert list", body = Vec<AlertResponse>)
    )
)]
async fn list_alerts(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Query(params): Query<ListAlertsParams>,
) -> impl IntoResponse {
    let limit = PaginationParams::resolve_limit(params.limit);
    let offset = PaginationParams::resolve_offset(params.offset);
    let filter = AlertFilter {
        location_id_eq: params.location_id_eq,
        disaster_id_eq: params.disaster_id_eq,
        severity_eq: params.severity_eq,
        active_eq: params.active_eq,
        created_gte: params.created_at_gte,
        created_lte: params.created_at_lte,
    };

    let total = match state.store.count_alerts(&filter).await {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Failed to count alerts");
            return storage_error(&trace_id);
        }
    };

    let rows = match state.store.list_alerts(&filter, limit, offset).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list alerts");
            return storage_error(&trace_id);
        }
    };

    // Resolve disaster/location names in bulk for the join columns
    let disaster_names: HashMap<String, String> =
        match state.store.list_disasters(None, None, 10000, 0).await {
            Ok(list) => list.into_iter().map(|d| (d.id, d.name)).collect(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load disaster names");
                return storage_error(&trace_id);
            }
        };
    let location_names: HashMap<String, String> =
        match state.store.list_locations(None, None, 10000, 0).await {
            Ok(list) => list.into_iter().map(|l| (l.id, l.name)).collect(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load location names");
                return storage_error(&trace_id);
            }
        };

    let items: Vec<AlertResponse> = rows
        .into_iter()
        .map(|a| AlertResponse {
            disaster_name: disaster_names
                .get(&a.disaster_id)
                .cloned()
                .unwrap_or_else(|| "Unknown".to_string()),
            location_name: location_names
                .get(&a.location_id)
                .cloned()
                .unwrap_or_else(|| "Unknown".to_string()),
            id: a.id,
            rule_id: a.rule_id,
            disaster_id: a.disaster_id,
            location_id: a.location_id,
            metric: a.metric,
            severity: a.severity,
            message: a.message,
            observed_value: a.observed_value,
            threshold: a.threshold,
            magnitude: a.magnitude,
            epicenter: a.epicenter,
            distance_km: a.distance_km,
            active: a.active,
            created_at: a.created_at,
        })
        .collect();

    success_paginated_response(StatusCode::OK, &trace_id, items, total, limit, offset)
}

/// Archive an alert, flipping it inactive. This is the only resolution
/// path; alerts never auto-resolve when the condition subsides.
#[utoipa::path(
    post,
    path = "/v1/alerts/{id}/archive",
    tag = "Alerts",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Alert ID")),
    responses(
        (status = 200, description = "Alert archived", body = crate::api::IdResponse),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError),
        (status = 404, description = "Alert not found", body = crate::api::ApiError)
    )
)]
async fn archive_alert(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.archive_alert(&id).await {
        Ok(Some(archived)) => success_id_response(StatusCode::OK, &trace_id, archived.id),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            &trace_id,
            "not_found",
            "Alert not found",
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to archive alert");
            storage_error(&trace_id)
        }
    }
}

/// Delete every alert record.
#[utoipa::path(
    delete,
    path = "/v1/alerts/all",
    tag = "Alerts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All alerts deleted"),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError)
    )
)]
async fn delete_all_alerts(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state.store.delete_all_alerts().await {
        Ok(removed) => success_empty_response(
            StatusCode::OK,
            &trace_id,
            &format!("{removed} alerts deleted"),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete alerts");
            storage_error(&trace_id)
        }
    }
}

pub fn public_alert_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(list_alerts))
}

pub fn admin_alert_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(archive_alert))
        .routes(routes!(delete_all_alerts))
}
