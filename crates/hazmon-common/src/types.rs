use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Alert severity level, ordered from lowest to highest.
///
/// # Examples
///
/// ```
/// use hazmon_common::types::Severity;
///
/// let sev: Severity = "High".parse().unwrap();
/// assert_eq!(sev, Severity::High);
/// assert_eq!(sev.to_string(), "High");
/// assert!(Severity::Critical > Severity::Low);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
            Severity::Critical => write!(f, "Critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

/// The closed set of observed metrics a rule can reference.
///
/// The same enum is used at the CRUD boundary, in the rule engine, and in
/// the storage schema, so an unknown metric never reaches evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WeatherMetric {
    RainSum,
    WindSpeed,
    Temperature,
    Humidity,
    Aqi,
    EarthquakeMagnitude,
}

impl WeatherMetric {
    /// Human-readable label used in alert messages.
    pub fn label(&self) -> &'static str {
        match self {
            WeatherMetric::RainSum => "Rainfall",
            WeatherMetric::WindSpeed => "Wind speed",
            WeatherMetric::Temperature => "Temperature",
            WeatherMetric::Humidity => "Humidity",
            WeatherMetric::Aqi => "Air quality index",
            WeatherMetric::EarthquakeMagnitude => "Earthquake magnitude",
        }
    }

    /// Display unit for the metric value.
    pub fn unit(&self) -> &'static str {
        match self {
            WeatherMetric::RainSum => "mm",
            WeatherMetric::WindSpeed => "km/h",
            WeatherMetric::Temperature => "°C",
            WeatherMetric::Humidity => "%",
            WeatherMetric::Aqi => "AQI",
            WeatherMetric::EarthquakeMagnitude => "M",
        }
    }
}

impl std::fmt::Display for WeatherMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WeatherMetric::RainSum => "rain_sum",
            WeatherMetric::WindSpeed => "wind_speed",
            WeatherMetric::Temperature => "temperature",
            WeatherMetric::Humidity => "humidity",
            WeatherMetric::Aqi => "aqi",
            WeatherMetric::EarthquakeMagnitude => "earthquake_magnitude",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for WeatherMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rain_sum" => Ok(WeatherMetric::RainSum),
            "wind_speed" => Ok(WeatherMetric::WindSpeed),
            "temperature" => Ok(WeatherMetric::Temperature),
            "humidity" => Ok(WeatherMetric::Humidity),
            "aqi" => Ok(WeatherMetric::Aqi),
            "earthquake_magnitude" => Ok(WeatherMetric::EarthquakeMagnitude),
            _ => Err(format!("unknown metric: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: u64,
}
