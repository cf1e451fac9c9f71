use crate::alerting;
use crate::api::{error_response, storage_error, success_response};
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use hazmon_common::types::WeatherMetric;
use hazmon_feeds::seismic::{SeismicEvent, QUALIFYING_RADIUS_KM};
use hazmon_storage::AlertRow;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Summary of one alert fired by a simulation.
#[derive(Serialize, ToSchema)]
pub struct FiredAlert {
    pub id: String,
    pub severity: String,
    pub message: String,
}

impl From<AlertRow> for FiredAlert {
    fn from(a: AlertRow) -> Self {
        Self {
            id: a.id,
            severity: a.severity,
            message: a.message,
        }
    }
}

#[derive(Deserialize, ToSchema)]
struct SimulateWeatherRequest {
    location_id: String,
    #[serde(default)]
    temperature: Option<f64>,
    #[serde(default)]
    rain_sum: Option<f64>,
    #[serde(default)]
    wind_speed: Option<f64>,
    #[serde(default)]
    humidity: Option<f64>,
    #[serde(default)]
    aqi: Option<f64>,
}

#[derive(Serialize, ToSchema)]
struct SimulateWeatherResponse {
    location: String,
    /// Number of metric observations evaluated
    evaluated: usize,
    alerts: Vec<FiredAlert>,
}

/// Inject synthetic weather values for one location and run them through
/// the normal evaluator and alert writer (re-fire dedup included). Only
/// the provided fields are evaluated; no observation log is written.
#[utoipa::path(
    post,
    path = "/v1/simulate/weather",
    tag = "Simulate",
    security(("bearer_auth" = [])),
    request_body = SimulateWeatherRequest,
    responses(
        (status = 200, description = "Simulation result", body = SimulateWeatherResponse),
        (status = 400, description = "No metric values provided", body = crate::api::ApiError),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError),
        (status = 404, description = "Location not found", body = crate::api::ApiError)
    )
)]
async fn simulate_weather(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Json(req): Json<SimulateWeatherRequest>,
) -> impl IntoResponse {
    let location = match state.store.get_location_by_id(&req.location_id).await {
        Ok(Some(location)) => location,
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                &trace_id,
                "not_found",
                "Location not found",
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to get location");
            return storage_error(&trace_id);
        }
    };

    let observations: Vec<(WeatherMetric, f64)> = [
        (WeatherMetric::Temperature, req.temperature),
        (WeatherMetric::RainSum, req.rain_sum),
        (WeatherMetric::WindSpeed, req.wind_speed),
        (WeatherMetric::Humidity, req.humidity),
        (WeatherMetric::Aqi, req.aqi),
    ]
    .into_iter()
    .filter_map(|(metric, value)| value.map(|v| (metric, v)))
    .collect();

    if observations.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            &trace_id,
            "bad_request",
            "at least one metric value is required",
        );
    }

    let rules = match alerting::load_enabled_rules(&state.store).await {
        Ok(rules) => rules,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load rules");
            return storage_error(&trace_id);
        }
    };

    let mut alerts = Vec::new();
    let evaluated = observations.len();
    for (metric, value) in observations {
        match alerting::fire_weather_matches(
            &state.store,
            state.refire_policy,
            &rules,
            &location,
            metric,
            value,
        )
        .await
        {
            Ok(fired) => alerts.extend(fired.into_iter().map(FiredAlert::from)),
            Err(e) => {
                tracing::error!(metric = %metric, error = %e, "Simulation evaluation failed");
                return storage_error(&trace_id);
            }
        }
    }

    tracing::info!(
        location = %location.name,
        evaluated,
        fired = alerts.len(),
        "Weather simulation ran"
    );
    success_response(
        StatusCode::OK,
        &trace_id,
        SimulateWeatherResponse {
            location: location.name,
            evaluated,
            alerts,
        },
    )
}

#[derive(Deserialize, ToSchema)]
struct SimulateEarthquakeRequest {
    latitude: f64,
    longitude: f64,
    magnitude: f64,
}

#[derive(Serialize, ToSchema)]
struct AffectedLocation {
    id: String,
    name: String,
    distance_km: f64,
    alerts: Vec<FiredAlert>,
}

#[derive(Serialize, ToSchema)]
struct SimulateEarthquakeResponse {
    /// Enabled locations within the qualifying radius of the epicenter
    affected_locations: Vec<AffectedLocation>,
}

/// Inject a synthetic seismic event and evaluate the magnitude rules for
/// every enabled location within the 500 km qualifying radius.
#[utoipa::path(
    post,
    path = "/v1/simulate/earthquake",
    tag = "Simulate",
    security(("bearer_auth" = [])),
    request_body = SimulateEarthquakeRequest,
    responses(
        (status = 200, description = "Simulation result", body = SimulateEarthquakeResponse),
        (status = 400, description = "Invalid coordinates or magnitude", body = crate::api::ApiError),
        (status = 401, description = "Unauthenticated", body = crate::api::ApiError)
    )
)]
async fn simulate_earthquake(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Json(req): Json<SimulateEarthquakeRequest>,
) -> impl IntoResponse {
    if !(-90.0..=90.0).contains(&req.latitude) || !(-180.0..=180.0).contains(&req.longitude) {
        return error_response(
            StatusCode::BAD_REQUEST,
            &trace_id,
            "invalid_coordinates",
            "epicenter coordinates out of range",
        );
    }
    if !req.magnitude.is_finite() || req.magnitude < 0.0 {
        return error_response(
            StatusCode::BAD_REQUEST,
            &trace_id,
            "bad_request",
            "magnitude must be a non-negative number",
        );
    }

    let event = SeismicEvent {
        id: format!("sim-{}", hazmon_common::id::next_id()),
        magnitude: req.magnitude,
        place: format!(
            "Simulated event at {:.4}, {:.4}",
            req.latitude, req.longitude
        ),
        latitude: req.latitude,
        longitude: req.longitude,
        event_time: Utc::now(),
    };
    let events = [event];

    let locations = match state.store.list_enabled_locations().await {
        Ok(locations) => locations,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list locations");
            return storage_error(&trace_id);
        }
    };
    let rules = match alerting::load_enabled_rules(&state.store).await {
        Ok(rules) => rules,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load rules");
            return storage_error(&trace_id);
        }
    };

    let mut affected = Vec::new();
    for location in &locations {
        let Some(nearby) = hazmon_feeds::seismic::nearest_event_within(
            &events,
            location.latitude,
            location.longitude,
            QUALIFYING_RADIUS_KM,
        ) else {
            continue;
        };

        let fired = match alerting::fire_seismic_matches(
            &state.store,
            state.refire_policy,
            &rules,
            location,
            &nearby,
        )
        .await
        {
            Ok(fired) => fired,
            Err(e) => {
                tracing::error!(location = %location.name, error = %e, "Simulation evaluation failed");
                return storage_error(&trace_id);
            }
        };

        affected.push(AffectedLocation {
            id: location.id.clone(),
            name: location.name.clone(),
            distance_km: (nearby.distance_km * 10.0).round() / 10.0,
            alerts: fired.into_iter().map(FiredAlert::from).collect(),
        });
    }

    tracing::info!(
        magnitude = req.magnitude,
        affected = affected.len(),
        "Earthquake simulation ran"
    );
    success_response(
        StatusCode::OK,
        &trace_id,
        SimulateEarthquakeResponse {
            affected_locations: affected,
        },
    )
}

pub fn simulate_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(simulate_weather))
        .routes(routes!(simulate_earthquake))
}
