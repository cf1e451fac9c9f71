use crate::error::{FeedError, Result};
use crate::FeedEndpoints;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

/// One current-conditions reading for a coordinate pair.
#[derive(Debug, Clone)]
pub struct WeatherReading {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub rain_mm: f64,
    pub wind_speed_kmh: f64,
    /// `None` when the air-quality endpoint was unavailable; the reading
    /// is still usable for the other metrics.
    pub us_aqi: Option<f64>,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentWeather,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    time: i64,
    temperature_2m: f64,
    relative_humidity_2m: f64,
    rain: f64,
    wind_speed_10m: f64,
}

#[derive(Debug, Deserialize)]
struct AirQualityResponse {
    current: CurrentAirQuality,
}

#[derive(Debug, Deserialize)]
struct CurrentAirQuality {
    us_aqi: Option<f64>,
}

pub struct WeatherClient {
    client: Client,
    forecast_base_url: String,
    air_quality_base_url: String,
}

impl WeatherClient {
    pub fn new(endpoints: &FeedEndpoints) -> Result<Self> {
        let client = Client::builder()
            .use_rustls_tls()
            .timeout(std::time::Duration::from_secs(endpoints.http_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            forecast_base_url: endpoints.forecast_base_url.clone(),
            air_quality_base_url: endpoints.air_quality_base_url.clone(),
        })
    }

    /// Fetch current weather plus US AQI for a coordinate pair.
    ///
    /// A forecast failure fails the whole fetch; an air-quality failure
    /// only degrades `us_aqi` to `None` with a warning.
    pub async fn fetch_current(&self, latitude: f64, longitude: f64) -> Result<WeatherReading> {
        let url = format!(
            "{}/v1/forecast?latitude={latitude}&longitude={longitude}\
             &current=temperature_2m,relative_humidity_2m,rain,wind_speed_10m\
             &timeformat=unixtime",
            self.forecast_base_url
        );
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FeedError::Http {
                service: "open-meteo",
                status: response.status().as_u16(),
            });
        }
        let forecast: ForecastResponse =
            response.json().await.map_err(|e| FeedError::Payload {
                service: "open-meteo",
                detail: e.to_string(),
            })?;

        let observed_at = DateTime::<Utc>::from_timestamp(forecast.current.time, 0).ok_or_else(
            || FeedError::Payload {
                service: "open-meteo",
                detail: format!("invalid observation timestamp {}", forecast.current.time),
            },
        )?;

        let us_aqi = match self.fetch_us_aqi(latitude, longitude).await {
            Ok(aqi) => aqi,
            Err(e) => {
                tracing::warn!(latitude, longitude, error = %e, "Air quality fetch failed");
                None
            }
        };

        Ok(WeatherReading {
            temperature_c: forecast.current.temperature_2m,
            humidity_pct: forecast.current.relative_humidity_2m,
            rain_mm: forecast.current.rain,
            wind_speed_kmh: forecast.current.wind_speed_10m,
            us_aqi,
            observed_at,
        })
    }

    async fn fetch_us_aqi(&self, latitude: f64, longitude: f64) -> Result<Option<f64>> {
        let url = format!(
            "{}/v1/air-quality?latitude={latitude}&longitude={longitude}&current=us_aqi",
            self.air_quality_base_url
        );
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FeedError::Http {
                service: "open-meteo-air-quality",
                status: response.status().as_u16(),
            });
        }
        let aq: AirQualityResponse = response.json().await.map_err(|e| FeedError::Payload {
            service: "open-meteo-air-quality",
            detail: e.to_string(),
        })?;
        Ok(aq.current.us_aqi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_payload_decodes_expected_fields() {
        let raw = serde_json::json!({
            "latitude": 23.75,
            "longitude": 90.375,
            "current_units": {"temperature_2m": "°C"},
            "current": {
                "time": 1754380800,
                "temperature_2m": 31.4,
                "relative_humidity_2m": 78.0,
                "rain": 2.5,
                "wind_speed_10m": 14.2
            }
        });
        let parsed: ForecastResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.current.time, 1754380800);
        assert!((parsed.current.temperature_2m - 31.4).abs() < 1e-9);
        assert!((parsed.current.rain - 2.5).abs() < 1e-9);
    }

    #[test]
    fn air_quality_payload_tolerates_null_aqi() {
        let raw = serde_json::json!({"current": {"us_aqi": null}});
        let parsed: AirQualityResponse = serde_json::from_value(raw).unwrap();
        assert!(parsed.current.us_aqi.is_none());

        let raw = serde_json::json!({"current": {"us_aqi": 154.0}});
        let parsed: AirQualityResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.current.us_aqi, Some(154.0));
    }

    #[test]
    fn forecast_payload_missing_current_block_is_an_error() {
        let raw = serde_json::json!({"latitude": 23.75});
        assert!(serde_json::from_value::<ForecastResponse>(raw).is_err());
    }
}
