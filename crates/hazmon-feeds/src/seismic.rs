use crate::error::{FeedError, Result};
use crate::FeedEndpoints;
use chrono::{DateTime, Utc};
use hazmon_common::geo::haversine_km;
use reqwest::Client;
use serde::Deserialize;

/// Radius within which a seismic event is considered relevant to a
/// monitored location.
pub const QUALIFYING_RADIUS_KM: f64 = 500.0;

/// One event from the recent-earthquakes feed.
#[derive(Debug, Clone)]
pub struct SeismicEvent {
    pub id: String,
    pub magnitude: f64,
    pub place: String,
    pub latitude: f64,
    pub longitude: f64,
    pub event_time: DateTime<Utc>,
}

/// A qualifying event paired with its distance to a monitored location.
#[derive(Debug, Clone)]
pub struct NearbyEvent {
    pub event: SeismicEvent,
    pub distance_km: f64,
}

#[derive(Debug, Deserialize)]
struct FeedDocument {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    id: Option<String>,
    properties: FeatureProperties,
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct FeatureProperties {
    mag: Option<f64>,
    place: Option<String>,
    /// Milliseconds since the epoch.
    time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    /// `[longitude, latitude, depth]`
    coordinates: Vec<f64>,
}

pub struct SeismicClient {
    client: Client,
    feed_url: String,
}

impl SeismicClient {
    pub fn new(endpoints: &FeedEndpoints) -> Result<Self> {
        let client = Client::builder()
            .use_rustls_tls()
            .timeout(std::time::Duration::from_secs(endpoints.http_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            feed_url: endpoints.seismic_feed_url.clone(),
        })
    }

    /// Fetch the recent-events summary feed. Features with missing
    /// magnitude, time, or geometry are skipped rather than failing the
    /// whole fetch.
    pub async fn fetch_recent(&self) -> Result<Vec<SeismicEvent>> {
        let response = self.client.get(&self.feed_url).send().await?;
        if !response.status().is_success() {
            return Err(FeedError::Http {
                service: "usgs",
                status: response.status().as_u16(),
            });
        }
        let document: FeedDocument = response.json().await.map_err(|e| FeedError::Payload {
            service: "usgs",
            detail: e.to_string(),
        })?;

        let mut events = Vec::with_capacity(document.features.len());
        for feature in document.features {
            match decode_feature(feature) {
                Some(event) => events.push(event),
                None => tracing::debug!("Skipping incomplete seismic feature"),
            }
        }
        Ok(events)
    }
}

fn decode_feature(feature: Feature) -> Option<SeismicEvent> {
    let geometry = feature.geometry?;
    if geometry.coordinates.len() < 2 {
        return None;
    }
    let magnitude = feature.properties.mag?;
    let event_time = DateTime::<Utc>::from_timestamp_millis(feature.properties.time?)?;
    Some(SeismicEvent {
        id: feature.id?,
        magnitude,
        place: feature
            .properties
            .place
            .unwrap_or_else(|| "Unknown location".to_string()),
        longitude: geometry.coordinates[0],
        latitude: geometry.coordinates[1],
        event_time,
    })
}

/// Find the nearest event within `radius_km` of a coordinate pair.
///
/// The closest event wins; distance ties break toward the earliest event
/// time so the result is deterministic regardless of feed ordering.
/// Returns `None` when every event is out of range.
pub fn nearest_event_within(
    events: &[SeismicEvent],
    latitude: f64,
    longitude: f64,
    radius_km: f64,
) -> Option<NearbyEvent> {
    events
        .iter()
        .map(|event| NearbyEvent {
            distance_km: haversine_km(latitude, longitude, event.latitude, event.longitude),
            event: event.clone(),
        })
        .filter(|near| near.distance_km <= radius_km)
        .min_by(|a, b| {
            a.distance_km
                .total_cmp(&b.distance_km)
                .then_with(|| a.event.event_time.cmp(&b.event.event_time))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_event(id: &str, mag: f64, lat: f64, lon: f64, secs: i64) -> SeismicEvent {
        SeismicEvent {
            id: id.to_string(),
            magnitude: mag,
            place: format!("near {id}"),
            latitude: lat,
            longitude: lon,
            event_time: DateTime::<Utc>::from_timestamp(secs, 0).unwrap(),
        }
    }

    #[test]
    fn feed_document_decodes_and_skips_incomplete_features() {
        let raw = serde_json::json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "id": "us7000abcd",
                    "properties": {"mag": 6.5, "place": "14 km NE of Dhaka, Bangladesh", "time": 1754380800000i64},
                    "geometry": {"type": "Point", "coordinates": [90.41, 23.80, 10.0]}
                },
                {
                    "id": "us7000null",
                    "properties": {"mag": null, "place": "nowhere", "time": 1754380800000i64},
                    "geometry": {"type": "Point", "coordinates": [0.0, 0.0, 0.0]}
                },
                {
                    "id": "us7000nogeo",
                    "properties": {"mag": 4.0, "place": "nowhere", "time": 1754380800000i64},
                    "geometry": null
                }
            ]
        });
        let document: FeedDocument = serde_json::from_value(raw).unwrap();
        let events: Vec<SeismicEvent> = document
            .features
            .into_iter()
            .filter_map(decode_feature)
            .collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "us7000abcd");
        assert!((events[0].latitude - 23.80).abs() < 1e-9);
        assert!((events[0].longitude - 90.41).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_location_finds_no_event() {
        // Scenario D, far branch: every event beyond 500 km yields None
        let events = vec![make_event("far", 7.0, 35.0, 139.0, 1000)];
        assert!(nearest_event_within(&events, 23.80, 90.41, QUALIFYING_RADIUS_KM).is_none());
    }

    #[test]
    fn nearest_qualifying_event_wins() {
        // ~1° of latitude is ~111 km, both within range of (23.8, 90.41)
        let events = vec![
            make_event("two-degrees", 5.0, 25.80, 90.41, 1000),
            make_event("one-degree", 6.0, 24.80, 90.41, 2000),
        ];
        let near = nearest_event_within(&events, 23.80, 90.41, QUALIFYING_RADIUS_KM).unwrap();
        assert_eq!(near.event.id, "one-degree");
        assert!((near.distance_km - 111.0).abs() < 2.0, "got {}", near.distance_km);
    }

    #[test]
    fn distance_tie_breaks_toward_earliest_event() {
        // Same epicenter, different times: the earlier event is chosen
        let events = vec![
            make_event("later", 5.5, 24.80, 90.41, 5000),
            make_event("earlier", 5.5, 24.80, 90.41, 1000),
        ];
        let near = nearest_event_within(&events, 23.80, 90.41, QUALIFYING_RADIUS_KM).unwrap();
        assert_eq!(near.event.id, "earlier");
    }

    #[test]
    fn scenario_distance_is_recorded() {
        // Scenario D, near branch: event ~200 km away matches with the
        // distance derivable from the result. 1.8° latitude ≈ 200 km.
        let events = vec![make_event("regional", 6.5, 25.60, 90.41, 1000)];
        let near = nearest_event_within(&events, 23.80, 90.41, QUALIFYING_RADIUS_KM).unwrap();
        assert!((near.distance_km - 200.0).abs() < 3.0, "got {}", near.distance_km);
    }
}
