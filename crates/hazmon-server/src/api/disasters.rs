use crate::api::pagination::PaginationParams;
use crate::api::{
    error_response, storage_error, success_id_response, success_paginated_response,
    success_response,
};
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use hazmon_storage::DisasterRow;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Disaster category.
#[derive(Serialize, ToSchema)]
pub struct DisasterResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DisasterRow> for DisasterResponse {
    fn from(r: DisasterRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
            enabled: r.enabled,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
struct ListDisastersParams {
    /// Substring match on the disaster name
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

/// List disaster categories, newest first.
#[utoipa::path(
    get,
    path = "/v1/disasters",
    tag = "Disasters",
    security(("bearer_auth" = [])),
    params(ListDisastersParams),
    responses(
        (status = 200, description = "Paginated disaster list", body = Vec<DisasterResponse>),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError)
    )
)]
async fn list_disasters(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Query(params): Query<ListDisastersParams>,
) -> impl IntoResponse {
    let limit = PaginationParams::resolve_limit(params.limit);
    let offset = PaginationParams::resolve_offset(params.offset);
    let name_contains = params.name_contains.as_deref();

    let total = match state
        .store
        .count_disasters(name_contains, params.enabled_eq)
        .await
    {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Failed to count disasters");
            return storage_error(&trace_id);
        }
    };

    match state
        .store
        .list_disasters(name_contains, params.enabled_eq, limit, offset)
        .await
    {
        Ok(rows) => {
            let items: Vec<DisasterResponse> =
                rows.into_iter().map(DisasterResponse::from).collect();
            success_paginated_response(StatusCode::OK, &trace_id, items, total, limit, offset)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to list disasters");
            storage_error(&trace_id)
        }
    }
}

/// Fetch one disaster category.
#[utoipa::path(
    get,
    path = "/v1/disasters/{id}",
    tag = "Disasters",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Disaster ID")),
    responses(
        (status = 200, description = "Disaster detail", body = DisasterResponse),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError),
        (status = 404, description = "Disaster not found", body = crate::api::ApiError)
    )
)]
async fn get_disaster(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.get_disaster_by_id(&id).await {
        Ok(Some(row)) => {
            success_response(StatusCode::OK, &trace_id, DisasterResponse::from(row))
        }
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            &trace_id,
            "not_found",
            "Disaster not found",
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to get disaster");
            storage_error(&trace_id)
        }
    }
}

#[derive(Deserialize, ToSchema)]
struct CreateDisasterRequest {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Create a disaster category.
#[utoipa::path(
    post,
    path = "/v1/disasters",
    tag = "Disasters",
    security(("bearer_auth" = [])),
    request_body = CreateDisasterRequest,
    responses(
        (status = 201, description = "Disaster created", body = crate::api::IdResponse),
        (status = 400, description = "Missing name", body = crate::api::ApiError),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError),
        (status = 409, description = "Name already exists", body = crate::api::ApiError)
    )
)]
async fn create_disaster(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Json(req): Json<CreateDisasterRequest>,
) -> impl IntoResponse {
    if req.name.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            &trace_id,
            "bad_request",
            "name is required",
        );
    }

    let now = Utc::now();
    let row = DisasterRow {
        id: hazmon_common::id::next_id(),
        name: req.name.trim().to_string(),
        description: req.description,
        enabled: req.enabled,
        created_at: now,
        updated_at: now,
    };
    match state.store.insert_disaster(&row).await {
        Ok(inserted) => success_id_response(StatusCode::CREATED, &trace_id, inserted.id),
        Err(e) => {
            let msg = e.to_string();
            if msg.contains("UNIQUE constraint") {
                error_response(
                    StatusCode::CONFLICT,
                    &trace_id,
                    "conflict",
                    "Disaster name already exists",
                )
            } else {
                tracing::error!(error = %e, "Failed to create disaster");
                storage_error(&trace_id)
            }
        }
    }
}

#[derive(Deserialize, ToSchema)]
struct UpdateDisasterRequest {
    name: String,
    #[serde(default)]
    description: Option<String>,
}

/// Update a disaster category.
#[utoipa::path(
    put,
    path = "/v1/disasters/{id}",
    tag = "Disasters",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Disaster ID")),
    request_body = UpdateDisasterRequest,
    responses(
        (status = 200, description = "Disaster updated", body = crate::api::IdResponse),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError),
        (status = 404, description = "Disaster not found", body = crate::api::ApiError)
    )
)]
async fn update_disaster(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateDisasterRequest>,
) -> impl IntoResponse {
    match state
        .store
        .update_disaster(&id, req.name.trim(), req.description.as_deref())
        .await
    {
        Ok(Some(updated)) => success_id_response(StatusCode::OK, &trace_id, updated.id),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            &trace_id,
            "not_found",
            "Disaster not found",
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to update disaster");
            storage_error(&trace_id)
        }
    }
}

#[derive(Deserialize, ToSchema)]
struct EnableRequest {
    enabled: bool,
}

/// Enable or disable a disaster category.
#[utoipa::path(
    put,
    path = "/v1/disasters/{id}/enable",
    tag = "Disasters",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Disaster ID")),
    request_body = EnableRequest,
    responses(
        (status = 200, description = "Disaster state updated", body = crate::api::IdResponse),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError),
        (status = 404, description = "Disaster not found", body = crate::api::ApiError)
    )
)]
async fn set_disaster_enabled(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<EnableRequest>,
) -> impl IntoResponse {
    match state.store.set_disaster_enabled(&id, req.enabled).await {
        Ok(Some(updated)) => success_id_response(StatusCode::OK, &trace_id, updated.id),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            &trace_id,
            "not_found",
            "Disaster not found",
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to update disaster enabled state");
            storage_error(&trace_id)
        }
    }
}

/// Delete a disaster category; its rules and alerts cascade away.
#[utoipa::path(
    delete,
    path = "/v1/disasters/{id}",
    tag = "Disasters",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Disaster ID")),
    responses(
        (status = 200, description = "Disaster deleted", body = crate::api::IdResponse),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError),
        (status = 404, description = "Disaster not found", body = crate::api::ApiError)
    )
)]
async fn delete_disaster(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.delete_disaster(&id).await {
        Ok(true) => success_id_response(StatusCode::OK, &trace_id, id),
        Ok(false) => error_response(
            StatusCode::NOT_FOUND,
            &trace_id,
            "not_found",
            "Disaster not found",
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete disaster");
            storage_error(&trace_id)
        }
    }
}

pub fn disaster_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_disasters, create_disaster))
        .routes(routes!(get_disaster, update_disaster, delete_disaster))
        .routes(routes!(set_disaster_enabled))
}
