//! Clients for the two upstream data feeds: Open-Meteo (weather + air
//! quality) and the USGS recent-earthquake summary feed.
//!
//! Both clients are plain HTTP GET + JSON decode with no retries; a failed
//! fetch is reported through [`error::FeedError`] and the caller decides
//! to skip the tick. The seismic module also hosts the
//! nearest-qualifying-event lookup used by the poller and the snapshot
//! endpoint.

pub mod error;
pub mod seismic;
pub mod weather;

use serde::{Deserialize, Serialize};

/// Endpoint configuration shared by both clients. Base URLs are
/// configurable so tests can point at local fixtures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedEndpoints {
    #[serde(default = "default_forecast_base_url")]
    pub forecast_base_url: String,
    #[serde(default = "default_air_quality_base_url")]
    pub air_quality_base_url: String,
    #[serde(default = "default_seismic_feed_url")]
    pub seismic_feed_url: String,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

impl Default for FeedEndpoints {
    fn default() -> Self {
        Self {
            forecast_base_url: default_forecast_base_url(),
            air_quality_base_url: default_air_quality_base_url(),
            seismic_feed_url: default_seismic_feed_url(),
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

fn default_forecast_base_url() -> String {
    "https://api.open-meteo.com".to_string()
}

fn default_air_quality_base_url() -> String {
    "https://air-quality-api.open-meteo.com".to_string()
}

fn default_seismic_feed_url() -> String {
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_hour.geojson".to_string()
}

fn default_http_timeout_secs() -> u64 {
    15
}
