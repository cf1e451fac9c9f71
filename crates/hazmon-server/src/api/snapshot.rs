use crate::api::{error_response, storage_error, success_response};
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use hazmon_feeds::seismic::{nearest_event_within, QUALIFYING_RADIUS_KM};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
struct SnapshotParams {
    /// Location to snapshot
    location_id: String,
}

#[derive(Serialize, ToSchema)]
struct SnapshotLocation {
    id: String,
    name: String,
    latitude: f64,
    longitude: f64,
}

#[derive(Serialize, ToSchema)]
struct SnapshotWeather {
    temperature_c: f64,
    humidity_pct: f64,
    rain_mm: f64,
    wind_speed_kmh: f64,
    us_aqi: Option<f64>,
    observed_at: DateTime<Utc>,
}

/// Current earthquake view for the location. Comes from the structured
/// columns of the newest active seismic alert when one exists, otherwise
/// from a live feed lookup.
#[derive(Serialize, ToSchema)]
struct SnapshotEarthquake {
    magnitude: f64,
    place: String,
    /// Absent when the active alert predates distance tracking
    distance_km: Option<f64>,
    time: DateTime<Utc>,
    /// "active_alert" or "live_feed"
    source: String,
}

#[derive(Serialize, ToSchema)]
struct SnapshotResponse {
    location: SnapshotLocation,
    weather: SnapshotWeather,
    earthquake: Option<SnapshotEarthquake>,
}

/// Live weather and current-earthquake snapshot for one location. Public,
/// no auth; the public dashboard polls it.
#[utoipa::path(
    get,
    path = "/v1/snapshot",
    tag = "Snapshot",
    params(SnapshotParams),
    responses(
        (status = 200, description = "Current conditions", body = SnapshotResponse),
        (status = 404, description = "Location not found", body = crate::api::ApiError),
        (status = 503, description = "Upstream weather feed unavailable", body = crate::api::ApiError)
    )
)]
async fn snapshot(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Query(params): Query<SnapshotParams>,
) -> impl IntoResponse {
    let location = match state.store.get_location_by_id(&params.location_id).await {
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

    let reading = match state
        .weather
        .fetch_current(location.latitude, location.longitude)
        .await
    {
        Ok(reading) => reading,
        Err(e) => {
            tracing::warn!(location = %location.name, error = %e, "Snapshot weather fetch failed");
            return error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                &trace_id,
                "upstream_unavailable",
                "Unable to fetch weather data from the upstream feed",
            );
        }
    };

    // Prefer the structured columns of an active seismic alert over a
    // fresh feed lookup.
    let earthquake = match state.store.latest_active_seismic_alert(&location.id).await {
        Ok(Some(alert)) => alert.magnitude.map(|magnitude| SnapshotEarthquake {
            magnitude,
            place: alert
                .epicenter
                .unwrap_or_else(|| "Unknown location".to_string()),
            distance_km: alert.distance_km,
            time: alert.created_at,
            source: "active_alert".to_string(),
        }),
        Ok(None) => match state.seismic.fetch_recent().await {
            Ok(events) => nearest_event_within(
                &events,
                location.latitude,
                location.longitude,
                QUALIFYING_RADIUS_KM,
            )
            .map(|nearby| SnapshotEarthquake {
                magnitude: nearby.event.magnitude,
                place: nearby.event.place,
                distance_km: Some(nearby.distance_km),
                time: nearby.event.event_time,
                source: "live_feed".to_string(),
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Snapshot seismic fetch failed");
                None
            }
        },
        Err(e) => {
            tracing::error!(error = %e, "Failed to query active seismic alert");
            return storage_error(&trace_id);
        }
    };

    success_response(
        StatusCode::OK,
        &trace_id,
        SnapshotResponse {
            location: SnapshotLocation {
                id: location.id,
                name: location.name,
                latitude: location.latitude,
                longitude: location.longitude,
            },
            weather: SnapshotWeather {
                temperature_c: reading.temperature_c,
                humidity_pct: reading.humidity_pct,
                rain_mm: reading.rain_mm,
                wind_speed_kmh: reading.wind_speed_kmh,
                us_aqi: reading.us_aqi,
                observed_at: reading.observed_at,
            },
            earthquake,
        },
    )
}

pub fn snapshot_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(snapshot))
}
