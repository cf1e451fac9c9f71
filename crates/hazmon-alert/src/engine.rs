use hazmon_common::types::{Severity, WeatherMetric};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    GreaterThan,
    GreaterEqual,
    LessThan,
    LessEqual,
}

impl FromStr for CompareOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ">" | "gt" => Ok(Self::GreaterThan),
            ">=" | "gte" => Ok(Self::GreaterEqual),
            "<" | "lt" => Ok(Self::LessThan),
            "<=" | "lte" => Ok(Self::LessEqual),
            _ => Err(format!("unknown compare operator: {s}")),
        }
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GreaterThan => write!(f, ">"),
            Self::GreaterEqual => write!(f, ">="),
            Self::LessThan => write!(f, "<"),
            Self::LessEqual => write!(f, "<="),
        }
    }
}

impl CompareOp {
    pub fn check(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::GreaterThan => value > threshold,
            Self::GreaterEqual => value >= threshold,
            Self::LessThan => value < threshold,
            Self::LessEqual => value <= threshold,
        }
    }

    /// Wording used when composing alert messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::GreaterThan => "above",
            Self::GreaterEqual => "at or above",
            Self::LessThan => "below",
            Self::LessEqual => "at or below",
        }
    }
}

/// A stored condition, decoded from an `alert_rules` row.
#[derive(Debug, Clone)]
pub struct ThresholdRule {
    pub id: String,
    pub disaster_id: String,
    /// `None` means the rule is global and applies to every location.
    pub location_id: Option<String>,
    pub metric: WeatherMetric,
    pub operator: CompareOp,
    pub threshold: f64,
    pub severity: Severity,
    pub message_prefix: Option<String>,
}

impl ThresholdRule {
    /// Whether this rule is in scope for the given metric and location.
    pub fn applies_to(&self, metric: WeatherMetric, location_id: &str) -> bool {
        if self.metric != metric {
            return false;
        }
        match &self.location_id {
            None => true,
            Some(scope) => scope == location_id,
        }
    }

    /// Whether the observed value satisfies the rule's comparison.
    pub fn matches(&self, value: f64) -> bool {
        self.operator.check(value, self.threshold)
    }
}

/// Evaluate one observation against a rule set.
///
/// Returns every rule that is in scope for `(metric, location_id)` and
/// whose comparison holds for `value`. Rules are independent: several can
/// match the same reading and each match becomes its own alert.
pub fn evaluate<'a>(
    rules: &'a [ThresholdRule],
    metric: WeatherMetric,
    value: f64,
    location_id: &str,
) -> Vec<&'a ThresholdRule> {
    rules
        .iter()
        .filter(|r| r.applies_to(metric, location_id) && r.matches(value))
        .collect()
}

/// Creation-time sanity bounds for rule thresholds.
///
/// These are boundary checks only; evaluation never re-validates. Humidity
/// is a percentage, AQI and magnitude get loose upper bounds, and every
/// metric except temperature must be non-negative.
pub fn validate_threshold(metric: WeatherMetric, threshold: f64) -> Result<(), String> {
    if !threshold.is_finite() {
        return Err("threshold must be a finite number".to_string());
    }
    if metric == WeatherMetric::Humidity && !(0.0..=100.0).contains(&threshold) {
        return Err("humidity threshold must be between 0 and 100".to_string());
    }
    if metric != WeatherMetric::Temperature && threshold < 0.0 {
        return Err(format!(
            "{} threshold cannot be negative",
            metric.label().to_lowercase()
        ));
    }
    if metric == WeatherMetric::Aqi && threshold > 5000.0 {
        return Err("AQI threshold is implausibly high (max 5000)".to_string());
    }
    if metric == WeatherMetric::EarthquakeMagnitude && threshold > 15.0 {
        return Err("earthquake magnitude threshold is implausibly high (max 15)".to_string());
    }
    Ok(())
}
