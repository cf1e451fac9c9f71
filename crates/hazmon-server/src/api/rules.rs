use crate::api::pagination::PaginationParams;
use crate::api::{
    error_response, storage_error, success_empty_response, success_id_response,
    success_paginated_response, success_response,
};
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use hazmon_alert::engine::{validate_threshold, CompareOp};
use hazmon_common::types::{Severity, WeatherMetric};
use hazmon_storage::{AlertRuleFilter, AlertRuleRow, AlertRuleUpdate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Alert rule.
#[derive(Serialize, ToSchema)]
pub struct AlertRuleResponse {
    pub id: String,
    /// Absent for global rules
    pub location_id: Option<String>,
    pub disaster_id: String,
    /// Metric key (rain_sum / wind_speed / temperature / humidity / aqi / earthquake_magnitude)
    pub metric: String,
    /// Comparison operator (> / >= / < / <=)
    pub operator: String,
    pub threshold: f64,
    /// Severity (Low / Medium / High / Critical)
    pub severity: String,
    pub message_prefix: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AlertRuleRow> for AlertRuleResponse {
    fn from(r: AlertRuleRow) -> Self {
        Self {
            id: r.id,
            location_id: r.location_id,
            disaster_id: r.disaster_id,
            metric: r.metric,
            operator: r.operator,
            threshold: r.threshold,
            severity: r.severity,
            message_prefix: r.message_prefix,
            enabled: r.enabled,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
struct ListRulesParams {
    /// Exact match on the rule's location scope
    #[param(required = false, rename = "location_id__eq")]
    #[serde(rename = "location_id__eq")]
    location_id_eq: Option<String>,
    /// Exact match on the disaster reference
    #[param(required = false, rename = "disaster_id__eq")]
    #[serde(rename = "disaster_id__eq")]
    disaster_id_eq: Option<String>,
    /// Exact match on the metric key
    #[param(required = false, rename = "metric__eq")]
    #[serde(rename = "metric__eq")]
    metric_eq: Option<String>,
    /// Exact match on the severity
    #[param(required = false, rename = "severity__eq")]
    #[serde(rename = "severity__eq")]
    severity_eq: Option<String>,
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

/// List alert rules, newest first.
#[utoipa::path(
    get,
    path = "/v1/rules",
    tag = "Rules",
    security(("bearer_auth" = [])),
    params(ListRulesParams),
    responses(
        (status = 200, description = "Paginated rule list", body = Vec<AlertRuleResponse>),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError)
    )
)]
async fn list_rules(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Query(params): Query<ListRulesParams>,
) -> impl IntoResponse {
    let limit = PaginationParams::resolve_limit(params.limit);
    let offset = PaginationParams::resolve_offset(params.offset);
    let filter = AlertRuleFilter {
        location_id_eq: params.location_id_eq,
        disaster_id_eq: params.disaster_id_eq,
        metric_eq: params.metric_eq,
        severity_eq: params.severity_eq,
        enabled_eq: params.enabled_eq,
    };

    let total = match state.store.count_alert_rules(&filter).await {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Failed to count rules");
            return storage_error(&trace_id);
        }
    };

    match state.store.list_alert_rules(&filter, limit, offset).await {
        Ok(rows) => {
            let items: Vec<AlertRuleResponse> =
                rows.into_iter().map(AlertRuleResponse::from).collect();
            success_paginated_response(StatusCode::OK, &trace_id, items, total, limit, offset)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to list rules");
            storage_error(&trace_id)
        }
    }
}

/// Fetch one alert rule.
#[utoipa::path(
    get,
    path = "/v1/rules/{id}",
    tag = "Rules",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Rule ID")),
    responses(
        (status = 200, description = "Rule detail", body = AlertRuleResponse),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError),
        (status = 404, description = "Rule not found", body = crate::api::ApiError)
    )
)]
async fn get_rule(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.get_alert_rule_by_id(&id).await {
        Ok(Some(row)) => {
            success_response(StatusCode::OK, &trace_id, AlertRuleResponse::from(row))
        }
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            &trace_id,
            "not_found",
            "Rule not found",
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to get rule");
            storage_error(&trace_id)
        }
    }
}

#[derive(Deserialize, ToSchema)]
struct CreateRuleRequest {
    /// Omit (or null) for a global rule evaluated against every location
    #[serde(default)]
    location_id: Option<String>,
    disaster_id: String,
    metric: String,
    operator: String,
    threshold: f64,
    #[serde(default = "default_severity")]
    severity: String,
    #[serde(default)]
    message_prefix: Option<String>,
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_severity() -> String {
    "Medium".to_string()
}

fn default_enabled() -> bool {
    true
}

/// Parsed-and-validated form of the enum-ish request fields.
struct ValidatedCondition {
    metric: WeatherMetric,
    operator: CompareOp,
    severity: Severity,
}

fn validate_condition(
    trace_id: &str,
    metric: &str,
    operator: &str,
    severity: &str,
    threshold: f64,
) -> Result<ValidatedCondition, Response> {
    let metric: WeatherMetric = metric.parse().map_err(|e: String| {
        error_response(StatusCode::BAD_REQUEST, trace_id, "bad_request", &e)
    })?;
    let operator: CompareOp = operator.parse().map_err(|e: String| {
        error_response(StatusCode::BAD_REQUEST, trace_id, "bad_request", &e)
    })?;
    let severity: Severity = severity.parse().map_err(|e: String| {
        error_response(StatusCode::BAD_REQUEST, trace_id, "bad_request", &e)
    })?;
    validate_threshold(metric, threshold).map_err(|e| {
        error_response(StatusCode::BAD_REQUEST, trace_id, "invalid_threshold", &e)
    })?;
    Ok(ValidatedCondition {
        metric,
        operator,
        severity,
    })
}

/// Create an alert rule. Metric, operator, and severity are parsed into
/// their closed enums and the threshold is range-checked here, so the
/// evaluator never sees an invalid condition.
#[utoipa::path(
    post,
    path = "/v1/rules",
    tag = "Rules",
    security(("bearer_auth" = [])),
    request_body = CreateRuleRequest,
    responses(
        (status = 201, description = "Rule created", body = crate::api::IdResponse),
        (status = 400, description = "Invalid metric, operator, severity, or threshold", body = crate::api::ApiError),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError),
        (status = 404, description = "Referenced disaster or location not found", body = crate::api::ApiError)
    )
)]
async fn create_rule(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Json(req): Json<CreateRuleRequest>,
) -> impl IntoResponse {
    let condition = match validate_condition(
        &trace_id,
        &req.metric,
        &req.operator,
        &req.severity,
        req.threshold,
    ) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    // Referential checks before insert so the caller gets a 404 instead
    // of an opaque constraint error.
    match state.store.get_disaster_by_id(&req.disaster_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                &trace_id,
                "not_found",
                "Disaster not found",
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to check disaster");
            return storage_error(&trace_id);
        }
    }
    if let Some(location_id) = &req.location_id {
        match state.store.get_location_by_id(location_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return error_response(
                    StatusCode::NOT_FOUND,
                    &trace_id,
                    "not_found",
                    "Location not found",
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to check location");
                return storage_error(&trace_id);
            }
        }
    }

    let now = Utc::now();
    let row = AlertRuleRow {
        id: hazmon_common::id::next_id(),
        location_id: req.location_id,
        disaster_id: req.disaster_id,
        metric: condition.metric.to_string(),
        operator: condition.operator.to_string(),
        threshold: req.threshold,
        severity: condition.severity.to_string(),
        message_prefix: req.message_prefix,
        enabled: req.enabled,
        created_at: now,
        updated_at: now,
    };
    match state.store.insert_alert_rule(&row).await {
        Ok(inserted) => success_id_response(StatusCode::CREATED, &trace_id, inserted.id),
        Err(e) => {
            tracing::error!(error = %e, "Failed to create rule");
            storage_error(&trace_id)
        }
    }
}

pub fn rule_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_rules, create_rule, delete_all_rules))
        .routes(routes!(get_rule, update_rule, delete_rule))
        .routes(routes!(set_rule_enabled))
}

#[derive(Deserialize, ToSchema)]
struct UpdateRuleBody {
    /// Null (or absent) makes the rule global
    #[serde(default)]
    location_id: Option<String>,
    disaster_id: String,
    metric: String,
    operator: String,
    threshold: f64,
    severity: String,
    #[serde(default)]
    message_prefix: Option<String>,
}

/// Replace an alert rule's condition. The payload is the full rule shape,
/// validated the same way as creation.
#[utoipa::path(
    put,
    path = "/v1/rules/{id}",
    tag = "Rules",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Rule ID")),
    request_body = UpdateRuleBody,
    responses(
        (status = 200, description = "Rule updated", body = crate::api::IdResponse),
        (status = 400, description = "Invalid metric, operator, severity, or threshold", body = crate::api::ApiError),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError),
        (status = 404, description = "Rule not found", body = crate::api::ApiError)
    )
)]
async fn update_rule(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRuleBody>,
) -> impl IntoResponse {
    let condition = match validate_condition(
        &trace_id,
        &req.metric,
        &req.operator,
        &req.severity,
        req.threshold,
    ) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match state.store.get_disaster_by_id(&req.disaster_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                &trace_id,
                "not_found",
                "Disaster not found",
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to check disaster");
            return storage_error(&trace_id);
        }
    }
    if let Some(location_id) = &req.location_id {
        match state.store.get_location_by_id(location_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return error_response(
                    StatusCode::NOT_FOUND,
                    &trace_id,
                    "not_found",
                    "Location not found",
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to check location");
                return storage_error(&trace_id);
            }
        }
    }

    let update = AlertRuleUpdate {
        location_id: Some(req.location_id),
        disaster_id: Some(req.disaster_id),
        metric: Some(condition.metric.to_string()),
        operator: Some(condition.operator.to_string()),
        threshold: Some(req.threshold),
        severity: Some(condition.severity.to_string()),
        message_prefix: Some(req.message_prefix),
    };
    match state.store.update_alert_rule(&id, &update).await {
        Ok(Some(updated)) => success_id_response(StatusCode::OK, &trace_id, updated.id),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            &trace_id,
            "not_found",
            "Rule not found",
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to update rule");
            storage_error(&trace_id)
        }
    }
}

#[derive(Deserialize, ToSchema)]
struct EnableRequest {
    enabled: bool,
}

/// Enable or disable a rule.
#[utoipa::path(
    put,
    path = "/v1/rules/{id}/enable",
    tag = "Rules",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Rule ID")),
    request_body = EnableRequest,
    responses(
        (status = 200, description = "Rule state updated", body = crate::api::IdResponse),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError),
        (status = 404, description = "Rule not found", body = crate::api::ApiError)
    )
)]
async fn set_rule_enabled(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<EnableRequest>,
) -> impl IntoResponse {
    match state.store.set_alert_rule_enabled(&id, req.enabled).await {
        Ok(Some(updated)) => success_id_response(StatusCode::OK, &trace_id, updated.id),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            &trace_id,
            "not_found",
            "Rule not found",
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to update rule enabled state");
            storage_error(&trace_id)
        }
    }
}

/// Delete a rule. Alerts it produced survive with a cleared rule
/// reference.
#[utoipa::path(
    delete,
    path = "/v1/rules/{id}",
    tag = "Rules",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Rule ID")),
    responses(
        (status = 200, description = "Rule deleted", body = crate::api::IdResponse),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError),
        (status = 404, description = "Rule not found", body = crate::api::ApiError)
    )
)]
async fn delete_rule(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.delete_alert_rule(&id).await {
        Ok(true) => success_id_response(StatusCode::OK, &trace_id, id),
        Ok(false) => error_response(
            StatusCode::NOT_FOUND,
            &trace_id,
            "not_found",
            "Rule not found",
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete rule");
            storage_error(&trace_id)
        }
    }
}

/// Delete every rule.
#[utoipa::path(
    delete,
    path = "/v1/rules",
    tag = "Rules",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All rules deleted"),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError)
    )
)]
async fn delete_all_rules(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state.store.delete_all_alert_rules().await {
        Ok(removed) => success_empty_response(
            StatusCode::OK,
            &trace_id,
            &format!("{removed} rules deleted"),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete rules");
            storage_error(&trace_id)
        }
    }
}
