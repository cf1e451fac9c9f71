//! Glue between the stored rule rows, the pure rule engine, and the alert
//! table: decodes rows into [`ThresholdRule`]s, composes alert messages,
//! and writes alert rows subject to the configured re-fire policy.

use anyhow::Result;
use chrono::Utc;
use hazmon_alert::engine::{evaluate, ThresholdRule};
use hazmon_alert::RefirePolicy;
use hazmon_common::types::WeatherMetric;
use hazmon_feeds::seismic::NearbyEvent;
use hazmon_feeds::weather::WeatherReading;
use hazmon_storage::{AlertRow, AlertRuleRow, LocationRow, Store};

/// Decode a stored rule row into an engine rule.
///
/// The CRUD boundary only writes canonical enum strings, so a decode
/// failure means the row was edited out-of-band; it is skipped with a
/// warning rather than poisoning the whole evaluation pass.
pub fn decode_rule(row: &AlertRuleRow) -> Option<ThresholdRule> {
    let metric = match row.metric.parse() {
        Ok(metric) => metric,
        Err(e) => {
            tracing::warn!(rule_id = %row.id, error = %e, "Skipping rule with unknown metric");
            return None;
        }
    };
    let operator = match row.operator.parse() {
        Ok(op) => op,
        Err(e) => {
            tracing::warn!(rule_id = %row.id, error = %e, "Skipping rule with unknown operator");
            return None;
        }
    };
    let severity = match row.severity.parse() {
        Ok(sev) => sev,
        Err(e) => {
            tracing::warn!(rule_id = %row.id, error = %e, "Skipping rule with unknown severity");
            return None;
        }
    };
    Some(ThresholdRule {
        id: row.id.clone(),
        disaster_id: row.disaster_id.clone(),
        location_id: row.location_id.clone(),
        metric,
        operator,
        threshold: row.threshold,
        severity,
        message_prefix: row.message_prefix.clone(),
    })
}

/// Load and decode every enabled rule, once per evaluation pass.
pub async fn load_enabled_rules(store: &Store) -> Result<Vec<ThresholdRule>> {
    let rows = store.list_enabled_alert_rules().await?;
    Ok(rows.iter().filter_map(decode_rule).collect())
}

/// The metric/value pairs carried by one weather reading. AQI is absent
/// when the air-quality fetch degraded.
pub fn reading_metrics(reading: &WeatherReading) -> Vec<(WeatherMetric, f64)> {
    let mut metrics = vec![
        (WeatherMetric::RainSum, reading.rain_mm),
        (WeatherMetric::WindSpeed, reading.wind_speed_kmh),
        (WeatherMetric::Temperature, reading.temperature_c),
        (WeatherMetric::Humidity, reading.humidity_pct),
    ];
    if let Some(aqi) = reading.us_aqi {
        metrics.push((WeatherMetric::Aqi, aqi));
    }
    metrics
}

fn with_prefix(prefix: Option<&str>, body: String) -> String {
    match prefix {
        Some(p) if !p.is_empty() => format!("{p}: {body}"),
        _ => body,
    }
}

fn weather_message(rule: &ThresholdRule, value: f64) -> String {
    let unit = rule.metric.unit();
    with_prefix(
        rule.message_prefix.as_deref(),
        format!(
            "{} {} {}{}: observed {:.1}{}",
            rule.metric.label(),
            rule.operator.describe(),
            rule.threshold,
            unit,
            value,
            unit
        ),
    )
}

fn seismic_message(rule: &ThresholdRule, nearby: &NearbyEvent) -> String {
    with_prefix(
        rule.message_prefix.as_deref(),
        format!(
            "Magnitude {:.1} earthquake {:.0} km away (epicenter: {}); magnitude {} {:.1}",
            nearby.event.magnitude,
            nearby.distance_km,
            nearby.event.place,
            rule.operator.describe(),
            rule.threshold
        ),
    )
}

async fn fire(
    store: &Store,
    policy: RefirePolicy,
    location: &LocationRow,
    rule: &ThresholdRule,
    row: AlertRow,
) -> Result<Option<AlertRow>> {
    if policy == RefirePolicy::SkipWhileActive {
        if let Some(existing) = store.find_active_alert(&rule.id, &location.id).await? {
            tracing::debug!(
                rule_id = %rule.id,
                location = %location.name,
                alert_id = %existing.id,
                "Alert already active, not re-firing"
            );
            return Ok(None);
        }
    }
    let inserted = store.insert_alert(&row).await?;
    tracing::info!(
        alert_id = %inserted.id,
        rule_id = %rule.id,
        location = %location.name,
        severity = %inserted.severity,
        "Alert fired"
    );
    Ok(Some(inserted))
}

fn base_row(rule: &ThresholdRule, location: &LocationRow, value: f64, message: String) -> AlertRow {
    let now = Utc::now();
    AlertRow {
        id: hazmon_common::id::next_id(),
        rule_id: Some(rule.id.clone()),
        disaster_id: rule.disaster_id.clone(),
        location_id: location.id.clone(),
        metric: rule.metric.to_string(),
        severity: rule.severity.to_string(),
        message,
        observed_value: value,
        threshold: rule.threshold,
        magnitude: None,
        epicenter: None,
        distance_km: None,
        active: true,
        created_at: now,
        updated_at: now,
    }
}

/// Evaluate one weather metric observation and persist alerts for every
/// matching rule. Returns the rows actually inserted (re-fires that were
/// suppressed by the policy are not included).
pub async fn fire_weather_matches(
    store: &Store,
    policy: RefirePolicy,
    rules: &[ThresholdRule],
    location: &LocationRow,
    metric: WeatherMetric,
    value: f64,
) -> Result<Vec<AlertRow>> {
    let mut fired = Vec::new();
    for rule in evaluate(rules, metric, value, &location.id) {
        let row = base_row(rule, location, value, weather_message(rule, value));
        if let Some(inserted) = fire(store, policy, location, rule, row).await? {
            fired.push(inserted);
        }
    }
    Ok(fired)
}

/// Evaluate a nearby seismic event against the magnitude rules and persist
/// alerts with the structured magnitude/epicenter/distance columns filled.
pub async fn fire_seismic_matches(
    store: &Store,
    policy: RefirePolicy,
    rules: &[ThresholdRule],
    location: &LocationRow,
    nearby: &NearbyEvent,
) -> Result<Vec<AlertRow>> {
    let mut fired = Vec::new();
    for rule in evaluate(
        rules,
        WeatherMetric::EarthquakeMagnitude,
        nearby.event.magnitude,
        &location.id,
    ) {
        let mut row = base_row(
            rule,
            location,
            nearby.event.magnitude,
            seismic_message(rule, nearby),
        );
        row.magnitude = Some(nearby.event.magnitude);
        row.epicenter = Some(nearby.event.place.clone());
        row.distance_km = Some(nearby.distance_km);
        if let Some(inserted) = fire(store, policy, location, rule, row).await? {
            fired.push(inserted);
        }
    }
    Ok(fired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use hazmon_alert::engine::CompareOp;
    use hazmon_common::types::Severity;
    use hazmon_feeds::seismic::SeismicEvent;

    fn make_rule(prefix: Option<&str>) -> ThresholdRule {
        ThresholdRule {
            id: "r1".to_string(),
            disaster_id: "d1".to_string(),
            location_id: None,
            metric: WeatherMetric::RainSum,
            operator: CompareOp::GreaterThan,
            threshold: 50.0,
            severity: Severity::High,
            message_prefix: prefix.map(str::to_string),
        }
    }

    #[test]
    fn weather_message_embeds_threshold_and_observation() {
        let msg = weather_message(&make_rule(None), 75.0);
        assert_eq!(msg, "Rainfall above 50mm: observed 75.0mm");

        let msg = weather_message(&make_rule(Some("Flood watch")), 75.0);
        assert!(msg.starts_with("Flood watch: "));
    }

    #[test]
    fn seismic_message_names_epicenter_and_distance() {
        let mut rule = make_rule(None);
        rule.metric = WeatherMetric::EarthquakeMagnitude;
        rule.threshold = 5.0;
        let nearby = NearbyEvent {
            event: SeismicEvent {
                id: "us7000abcd".to_string(),
                magnitude: 6.5,
                place: "14 km NE of Dhaka, Bangladesh".to_string(),
                latitude: 23.9,
                longitude: 90.5,
                event_time: DateTime::from_timestamp(1_754_380_800, 0).unwrap(),
            },
            distance_km: 200.4,
        };
        let msg = seismic_message(&rule, &nearby);
        assert!(msg.contains("Magnitude 6.5"));
        assert!(msg.contains("200 km"));
        assert!(msg.contains("14 km NE of Dhaka, Bangladesh"));
    }

    #[test]
    fn reading_metrics_skips_missing_aqi() {
        let reading = WeatherReading {
            temperature_c: 31.0,
            humidity_pct: 80.0,
            rain_mm: 3.0,
            wind_speed_kmh: 12.0,
            us_aqi: None,
            observed_at: DateTime::from_timestamp(1_754_380_800, 0).unwrap(),
        };
        let metrics = reading_metrics(&reading);
        assert_eq!(metrics.len(), 4);
        assert!(!metrics.iter().any(|(m, _)| *m == WeatherMetric::Aqi));

        let with_aqi = WeatherReading {
            us_aqi: Some(120.0),
            ..reading
        };
        assert_eq!(reading_metrics(&with_aqi).len(), 5);
    }

    #[test]
    fn decode_rule_skips_unknown_enum_values() {
        let now = Utc::now();
        let mut row = AlertRuleRow {
            id: "r1".to_string(),
            location_id: None,
            disaster_id: "d1".to_string(),
            metric: "rain_sum".to_string(),
            operator: ">".to_string(),
            threshold: 50.0,
            severity: "High".to_string(),
            message_prefix: None,
            enabled: true,
            created_at: now,
            updated_at: now,
        };
        assert!(decode_rule(&row).is_some());

        row.metric = "sunshine".to_string();
        assert!(decode_rule(&row).is_none());

        row.metric = "rain_sum".to_string();
        row.operator = "~".to_string();
        assert!(decode_rule(&row).is_none());
    }
}
