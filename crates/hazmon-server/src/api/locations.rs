use crate::api::pagination::PaginationParams;
use crate::api::{
    error_response, storage_error, success_empty_response, success_id_response,
    success_paginated_response, success_response,
};
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use hazmon_common::geo::{format_coordinates, parse_coordinates};
use hazmon_storage::LocationRow;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Monitored location.
#[derive(Serialize, ToSchema)]
pub struct LocationResponse {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Display form, e.g. `"23.8041° N, 90.4152° E"`
    pub coordinates: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LocationRow> for LocationResponse {
    fn from(r: LocationRow) -> Self {
        Self {
            coordinates: format_coordinates(r.latitude, r.longitude),
            id: r.id,
            name: r.name,
            latitude: r.latitude,
            longitude: r.longitude,
            enabled: r.enabled,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
struct ListLocationsParams {
    /// Substring match on the location name
    #[param(required = false, rename = "name__contains")]
    #[serde(rename = "name__contains")]
    name_contains: Option<String>,
    /// Exact match on the enabled flag
    #[param(required = false, rename = "enabled__eq")]
    #[serde(rename = "enabled__eq")]
    enabled_eq: Option<bool>,
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

/// List locations, newest first.
#[utoipa::path(
    get,
    path = "/v1/locations",
    tag = "Locations",
    security(("bearer_auth" = [])),
    params(ListLocationsParams),
    responses(
        (status = 200, description = "Paginated location list", body = Vec<LocationResponse>),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError)
    )
)]
async fn list_locations(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Query(params): Query<ListLocationsParams>,
) -> impl IntoResponse {
    let limit = PaginationParams::resolve_limit(params.limit);
    let offset = PaginationParams::resolve_offset(params.offset);
    let name_contains = params.name_contains.as_deref();

    let total = match state
        .store
        .count_locations(name_contains, params.enabled_eq)
        .await
    {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Failed to count locations");
            return storage_error(&trace_id);
        }
    };

    match state
        .store
        .list_locations(name_contains, params.enabled_eq, limit, offset)
        .await
    {
        Ok(rows) => {
            let items: Vec<LocationResponse> =
                rows.into_iter().map(LocationResponse::from).collect();
            success_paginated_response(StatusCode::OK, &trace_id, items, total, limit, offset)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to list locations");
            storage_error(&trace_id)
        }
    }
}

/// Fetch one location.
#[utoipa::path(
    get,
    path = "/v1/locations/{id}",
    tag = "Locations",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Location ID")),
    responses(
        (status = 200, description = "Location detail", body = LocationResponse),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError),
        (status = 404, description = "Location not found", body = crate::api::ApiError)
    )
)]
async fn get_location(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.get_location_by_id(&id).await {
        Ok(Some(row)) => {
            success_response(StatusCode::OK, &trace_id, LocationResponse::from(row))
        }
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            &trace_id,
            "not_found",
            "Location not found",
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to get location");
            storage_error(&trace_id)
        }
    }
}

#[derive(Deserialize, ToSchema)]
struct CreateLocationRequest {
    name: String,
    /// Coordinate pair in the admin format, e.g. `"23.8041° N, 90.4152° E"`
    coordinates: String,
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Create a location. The coordinate string is parsed and range-checked
/// here; nothing malformed reaches the pollers.
#[utoipa::path(
    post,
    path = "/v1/locations",
    tag = "Locations",
    security(("bearer_auth" = [])),
    request_body = CreateLocationRequest,
    responses(
        (status = 201, description = "Location created", body = crate::api::IdResponse),
        (status = 400, description = "Invalid name or coordinates", body = crate::api::ApiError),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError),
        (status = 409, description = "Name already exists", body = crate::api::ApiError)
    )
)]
async fn create_location(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Json(req): Json<CreateLocationRequest>,
) -> impl IntoResponse {
    if req.name.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            &trace_id,
            "bad_request",
            "name is required",
        );
    }
    let (latitude, longitude) = match parse_coordinates(&req.coordinates) {
        Ok(pair) => pair,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                &trace_id,
                "invalid_coordinates",
                &e,
            );
        }
    };

    let now = Utc::now();
    let row = LocationRow {
        id: hazmon_common::id::next_id(),
        name: req.name.trim().to_string(),
        latitude,
        longitude,
        enabled: req.enabled,
        created_at: now,
        updated_at: now,
    };
    match state.store.insert_location(&row).await {
        Ok(inserted) => success_id_response(StatusCode::CREATED, &trace_id, inserted.id),
        Err(e) => {
            let msg = e.to_string();
            if msg.contains("UNIQUE constraint") {
                error_response(
                    StatusCode::CONFLICT,
                    &trace_id,
                    "conflict",
                    "Location name already exists",
                )
            } else {
                tracing::error!(error = %e, "Failed to create location");
                storage_error(&trace_id)
            }
        }
    }
}

#[derive(Deserialize, ToSchema)]
struct UpdateLocationRequest {
    name: String,
    coordinates: String,
}

/// Update a location's name and coordinates.
#[utoipa::path(
    put,
    path = "/v1/locations/{id}",
    tag = "Locations",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Location ID")),
    request_body = UpdateLocationRequest,
    responses(
        (status = 200, description = "Location updated", body = crate::api::IdResponse),
        (status = 400, description = "Invalid coordinates", body = crate::api::ApiError),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError),
        (status = 404, description = "Location not found", body = crate::api::ApiError)
    )
)]
async fn update_location(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateLocationRequest>,
) -> impl IntoResponse {
    let (latitude, longitude) = match parse_coordinates(&req.coordinates) {
        Ok(pair) => pair,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                &trace_id,
                "invalid_coordinates",
                &e,
            );
        }
    };

    match state
        .store
        .update_location(&id, req.name.trim(), latitude, longitude)
        .await
    {
        Ok(Some(updated)) => success_id_response(StatusCode::OK, &trace_id, updated.id),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            &trace_id,
            "not_found",
            "Location not found",
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to update location");
            storage_error(&trace_id)
        }
    }
}

#[derive(Deserialize, ToSchema)]
struct EnableRequest {
    enabled: bool,
}

/// Enable or disable a location. Disabled locations are skipped by both
/// pollers.
#[utoipa::path(
    put,
    path = "/v1/locations/{id}/enable",
    tag = "Locations",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Location ID")),
    request_body = EnableRequest,
    responses(
        (status = 200, description = "Location state updated", body = crate::api::IdResponse),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError),
        (status = 404, description = "Location not found", body = crate::api::ApiError)
    )
)]
async fn set_location_enabled(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<EnableRequest>,
) -> impl IntoResponse {
    match state.store.set_location_enabled(&id, req.enabled).await {
        Ok(Some(updated)) => success_id_response(StatusCode::OK, &trace_id, updated.id),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            &trace_id,
            "not_found",
            "Location not found",
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to update location enabled state");
            storage_error(&trace_id)
        }
    }
}

/// Delete a location. Its rules, alerts, and observation logs cascade
/// away with it.
#[utoipa::path(
    delete,
    path = "/v1/locations/{id}",
    tag = "Locations",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Location ID")),
    responses(
        (status = 200, description = "Location deleted", body = crate::api::IdResponse),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError),
        (status = 404, description = "Location not found", body = crate::api::ApiError)
    )
)]
async fn delete_location(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.delete_location(&id).await {
        Ok(true) => success_id_response(StatusCode::OK, &trace_id, id),
        Ok(false) => error_response(
            StatusCode::NOT_FOUND,
            &trace_id,
            "not_found",
            "Location not found",
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete location");
            storage_error(&trace_id)
        }
    }
}

/// Delete every location (and, via cascades, everything scoped to them).
#[utoipa::path(
    delete,
    path = "/v1/locations",
    tag = "Locations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All locations deleted"),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError)
    )
)]
async fn delete_all_locations(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state.store.delete_all_locations().await {
        Ok(removed) => success_empty_response(
            StatusCode::OK,
            &trace_id,
            &format!("{removed} locations deleted"),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete locations");
            storage_error(&trace_id)
        }
    }
}

pub fn location_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_locations, create_location, delete_all_locations))
        .routes(routes!(get_location, update_location, delete_location))
        .routes(routes!(set_location_enabled))
}
