use crate::api::{error_response, storage_error, success_id_response, success_response};
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use hazmon_storage::auth::hash_password;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Admin account. Password hashes never leave the store.
#[derive(Serialize, ToSchema)]
pub struct AccountResponse {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// List admin accounts.
#[utoipa::path(
    get,
    path = "/v1/accounts",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Admin account list", body = Vec<AccountResponse>),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError)
    )
)]
async fn list_accounts(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state.store.list_admins().await {
        Ok(rows) => {
            let items: Vec<AccountResponse> = rows
                .into_iter()
                .map(|a| AccountResponse {
                    id: a.id,
                    email: a.email,
                    created_at: a.created_at,
                })
                .collect();
            success_response(StatusCode::OK, &trace_id, items)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to list admin accounts");
            storage_error(&trace_id)
        }
    }
}

#[derive(Deserialize, ToSchema)]
struct CreateAccountRequest {
    email: String,
    password: String,
}

/// Create an admin account. The password is bcrypt-hashed here.
#[utoipa::path(
    post,
    path = "/v1/accounts",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = crate::api::IdResponse),
        (status = 400, description = "Invalid email or password", body = crate::api::ApiError),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError),
        (status = 409, description = "Email already registered", body = crate::api::ApiError)
    )
)]
async fn create_account(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Json(req): Json<CreateAccountRequest>,
) -> impl IntoResponse {
    let email = req.email.trim();
    if email.is_empty() || !email.contains('@') {
        return error_response(
            StatusCode::BAD_REQUEST,
            &trace_id,
            "bad_request",
            "a valid email is required",
        );
    }
    if req.password.len() < 8 {
        return error_response(
            StatusCode::BAD_REQUEST,
            &trace_id,
            "bad_request",
            "password must be at least 8 characters",
        );
    }

    let hash = match hash_password(&req.password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!(error = %e, "Failed to hash password");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &trace_id,
                "internal_error",
                "internal error",
            );
        }
    };

    match state.store.create_admin(email, &hash).await {
        Ok(created) => success_id_response(StatusCode::CREATED, &trace_id, created.id),
        Err(e) => {
            let msg = e.to_string();
            if msg.contains("UNIQUE constraint") {
                error_response(
                    StatusCode::CONFLICT,
                    &trace_id,
                    "conflict",
                    "Email already registered",
                )
            } else {
                tracing::error!(error = %e, "Failed to create admin account");
                storage_error(&trace_id)
            }
        }
    }
}

/// Delete an admin account. The last remaining account cannot be removed,
/// or nobody could log in again.
#[utoipa::path(
    delete,
    path = "/v1/accounts/{id}",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account deleted", body = crate::api::IdResponse),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError),
        (status = 404, description = "Account not found", body = crate::api::ApiError),
        (status = 409, description = "Cannot delete the last admin", body = crate::api::ApiError)
    )
)]
async fn delete_account(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.count_admins().await {
        Ok(count) if count <= 1 => {
            return error_response(
                StatusCode::CONFLICT,
                &trace_id,
                "last_admin",
                "Cannot delete the last admin account",
            );
        }
        Ok(_) => {}
        Err(e) => {
            tracing::error!(error = %e, "Failed to count admin accounts");
            return storage_error(&trace_id);
        }
    }

    match state.store.delete_admin(&id).await {
        Ok(true) => success_id_response(StatusCode::OK, &trace_id, id),
        Ok(false) => error_response(
            StatusCode::NOT_FOUND,
            &trace_id,
            "not_found",
            "Account not found",
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete admin account");
            storage_error(&trace_id)
        }
    }
}

pub fn account_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_accounts, create_account))
        .routes(routes!(delete_account))
}
