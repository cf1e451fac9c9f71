use crate::store::{
    AlertFilter, AlertRow, AlertRuleFilter, AlertRuleRow, DisasterRow, EarthquakeLogRow,
    LocationRow, ObservationLogFilter, Store, WeatherLogRow, WEATHER_FETCH_INTERVAL_KEY,
};
use chrono::Utc;

async fn setup() -> Store {
    hazmon_common::id::init(1, 1);
    Store::new("sqlite::memory:").await.unwrap()
}

fn make_location(name: &str) -> LocationRow {
    let now = Utc::now();
    LocationRow {
        id: hazmon_common::id::next_id(),
        name: name.to_string(),
        latitude: 23.8041,
        longitude: 90.4152,
        enabled: true,
        created_at: now,
        updated_at: now,
    }
}

fn make_disaster(name: &str) -> DisasterRow {
    let now = Utc::now();
    DisasterRow {
        id: hazmon_common::id::next_id(),
        name: name.to_string(),
        description: None,
        enabled: true,
        created_at: now,
        updated_at: now,
    }
}

fn make_rule(location_id: Option<&str>, disaster_id: &str) -> AlertRuleRow {
    let now = Utc::now();
    AlertRuleRow {
        id: hazmon_common::id::next_id(),
        location_id: location_id.map(str::to_string),
        disaster_id: disaster_id.to_string(),
        metric: "rain_sum".to_string(),
        operator: ">".to_string(),
        threshold: 50.0,
        severity: "High".to_string(),
        message_prefix: None,
        enabled: true,
        created_at: now,
        updated_at: now,
    }
}

fn make_alert(rule_id: &str, disaster_id: &str, location_id: &str) -> AlertRow {
    let now = Utc::now();
    AlertRow {
        id: hazmon_common::id::next_id(),
        rule_id: Some(rule_id.to_string()),
        disaster_id: disaster_id.to_string(),
        location_id: location_id.to_string(),
        metric: "rain_sum".to_string(),
        severity: "High".to_string(),
        message: "Rainfall above 50 mm: observed 75 mm".to_string(),
        observed_value: 75.0,
        threshold: 50.0,
        magnitude: None,
        epicenter: None,
        distance_km: None,
        active: true,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn insert_and_list_locations_with_filters() {
    let store = setup().await;
    store.insert_location(&make_location("Dhaka")).await.unwrap();
    let mut sylhet = make_location("Sylhet");
    sylhet.enabled = false;
    store.insert_location(&sylhet).await.unwrap();

    assert_eq!(store.count_locations(None, None).await.unwrap(), 2);
    assert_eq!(store.count_locations(None, Some(true)).await.unwrap(), 1);

    let hits = store
        .list_locations(Some("Syl"), None, 20, 0)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Sylhet");

    let enabled = store.list_enabled_locations().await.unwrap();
    assert_eq!(enabled.len(), 1);
    assert_eq!(enabled[0].name, "Dhaka");
}

#[tokio::test]
async fn location_name_is_unique() {
    let store = setup().await;
    store.insert_location(&make_location("Dhaka")).await.unwrap();
    assert!(store.insert_location(&make_location("Dhaka")).await.is_err());
}

#[tokio::test]
async fn deleting_location_cascades_to_rules_alerts_and_logs() {
    let store = setup().await;
    let location = store.insert_location(&make_location("Dhaka")).await.unwrap();
    let disaster = store.insert_disaster(&make_disaster("Flood")).await.unwrap();
    let rule = store
        .insert_alert_rule(&make_rule(Some(&location.id), &disaster.id))
        .await
        .unwrap();
    store
        .insert_alert(&make_alert(&rule.id, &disaster.id, &location.id))
        .await
        .unwrap();
    let now = Utc::now();
    store
        .insert_weather_log(&WeatherLogRow {
            id: hazmon_common::id::next_id(),
            location_id: location.id.clone(),
            temperature_c: 31.0,
            humidity_pct: 80.0,
            rain_mm: 3.0,
            wind_speed_kmh: 12.0,
            us_aqi: Some(90.0),
            recorded_at: now,
            created_at: now,
        })
        .await
        .unwrap();

    assert!(store.delete_location(&location.id).await.unwrap());

    let filter = AlertRuleFilter::default();
    assert_eq!(store.count_alert_rules(&filter).await.unwrap(), 0);
    assert_eq!(store.count_alerts(&AlertFilter::default()).await.unwrap(), 0);
    assert_eq!(
        store
            .count_weather_logs(&ObservationLogFilter::default())
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn deleting_disaster_cascades_to_rules() {
    let store = setup().await;
    let disaster = store.insert_disaster(&make_disaster("Flood")).await.unwrap();
    store
        .insert_alert_rule(&make_rule(None, &disaster.id))
        .await
        .unwrap();

    assert!(store.delete_disaster(&disaster.id).await.unwrap());
    assert_eq!(
        store
            .count_alert_rules(&AlertRuleFilter::default())
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn deleting_rule_keeps_alert_with_null_rule_reference() {
    let store = setup().await;
    let location = store.insert_location(&make_location("Dhaka")).await.unwrap();
    let disaster = store.insert_disaster(&make_disaster("Flood")).await.unwrap();
    let rule = store
        .insert_alert_rule(&make_rule(Some(&location.id), &disaster.id))
        .await
        .unwrap();
    let alert = store
        .insert_alert(&make_alert(&rule.id, &disaster.id, &location.id))
        .await
        .unwrap();

    assert!(store.delete_alert_rule(&rule.id).await.unwrap());

    let kept = store.get_alert_by_id(&alert.id).await.unwrap().unwrap();
    assert!(kept.rule_id.is_none());
    assert!(kept.active);
}

#[tokio::test]
async fn active_alert_lookup_and_archive() {
    let store = setup().await;
    let location = store.insert_location(&make_location("Dhaka")).await.unwrap();
    let disaster = store.insert_disaster(&make_disaster("Flood")).await.unwrap();
    let rule = store
        .insert_alert_rule(&make_rule(Some(&location.id), &disaster.id))
        .await
        .unwrap();

    assert!(store
        .find_active_alert(&rule.id, &location.id)
        .await
        .unwrap()
        .is_none());

    let alert = store
        .insert_alert(&make_alert(&rule.id, &disaster.id, &location.id))
        .await
        .unwrap();
    assert!(store
        .find_active_alert(&rule.id, &location.id)
        .await
        .unwrap()
        .is_some());
    assert_eq!(store.count_active_alerts().await.unwrap(), 1);

    let archived = store.archive_alert(&alert.id).await.unwrap().unwrap();
    assert!(!archived.active);
    assert!(store
        .find_active_alert(&rule.id, &location.id)
        .await
        .unwrap()
        .is_none());
    assert_eq!(store.count_active_alerts().await.unwrap(), 0);
}

#[tokio::test]
async fn latest_active_seismic_alert_ignores_weather_alerts() {
    let store = setup().await;
    let location = store.insert_location(&make_location("Dhaka")).await.unwrap();
    let disaster = store.insert_disaster(&make_disaster("Earthquake")).await.unwrap();
    let rule = store
        .insert_alert_rule(&make_rule(Some(&location.id), &disaster.id))
        .await
        .unwrap();

    // A weather alert has no magnitude column set
    store
        .insert_alert(&make_alert(&rule.id, &disaster.id, &location.id))
        .await
        .unwrap();
    assert!(store
        .latest_active_seismic_alert(&location.id)
        .await
        .unwrap()
        .is_none());

    let mut seismic = make_alert(&rule.id, &disaster.id, &location.id);
    seismic.id = hazmon_common::id::next_id();
    seismic.metric = "earthquake_magnitude".to_string();
    seismic.magnitude = Some(6.5);
    seismic.epicenter = Some("14 km NE of Dhaka, Bangladesh".to_string());
    seismic.distance_km = Some(200.0);
    store.insert_alert(&seismic).await.unwrap();

    let found = store
        .latest_active_seismic_alert(&location.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.magnitude, Some(6.5));
    assert_eq!(found.distance_km, Some(200.0));
}

#[tokio::test]
async fn rule_filters_match_scope_and_metric() {
    let store = setup().await;
    let location = store.insert_location(&make_location("Dhaka")).await.unwrap();
    let disaster = store.insert_disaster(&make_disaster("Flood")).await.unwrap();
    store
        .insert_alert_rule(&make_rule(Some(&location.id), &disaster.id))
        .await
        .unwrap();
    let mut global = make_rule(None, &disaster.id);
    global.metric = "aqi".to_string();
    global.enabled = false;
    store.insert_alert_rule(&global).await.unwrap();

    let by_location = AlertRuleFilter {
        location_id_eq: Some(location.id.clone()),
        ..Default::default()
    };
    assert_eq!(store.count_alert_rules(&by_location).await.unwrap(), 1);

    let by_metric = AlertRuleFilter {
        metric_eq: Some("aqi".to_string()),
        ..Default::default()
    };
    let hits = store.list_alert_rules(&by_metric, 20, 0).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].location_id.is_none());

    // Disabled rules are excluded from the evaluation load
    assert_eq!(store.list_enabled_alert_rules().await.unwrap().len(), 1);
}

#[tokio::test]
async fn earthquake_logs_filter_by_location() {
    let store = setup().await;
    let location = store.insert_location(&make_location("Dhaka")).await.unwrap();
    let other = store.insert_location(&make_location("Sylhet")).await.unwrap();
    let now = Utc::now();
    for loc in [&location, &other] {
        store
            .insert_earthquake_log(&EarthquakeLogRow {
                id: hazmon_common::id::next_id(),
                location_id: loc.id.clone(),
                event_id: "us7000abcd".to_string(),
                magnitude: 6.5,
                place: "14 km NE of Dhaka, Bangladesh".to_string(),
                latitude: 23.9,
                longitude: 90.5,
                distance_km: 15.2,
                event_time: now,
                created_at: now,
            })
            .await
            .unwrap();
    }

    let filter = ObservationLogFilter {
        location_id_eq: Some(location.id.clone()),
        ..Default::default()
    };
    assert_eq!(store.count_earthquake_logs(&filter).await.unwrap(), 1);
    assert_eq!(
        store
            .count_earthquake_logs(&ObservationLogFilter::default())
            .await
            .unwrap(),
        2
    );
}

#[tokio::test]
async fn settings_default_seed_and_upsert() {
    let store = setup().await;

    // Missing key falls back to the default
    assert_eq!(
        store.get_setting_u64(WEATHER_FETCH_INTERVAL_KEY, 300).await,
        300
    );

    assert!(store
        .insert_setting_if_missing(WEATHER_FETCH_INTERVAL_KEY, "300")
        .await
        .unwrap());
    assert!(!store
        .insert_setting_if_missing(WEATHER_FETCH_INTERVAL_KEY, "999")
        .await
        .unwrap());
    assert_eq!(
        store.get_setting_u64(WEATHER_FETCH_INTERVAL_KEY, 0).await,
        300
    );

    store
        .upsert_setting(WEATHER_FETCH_INTERVAL_KEY, "120")
        .await
        .unwrap();
    assert_eq!(
        store.get_setting_u64(WEATHER_FETCH_INTERVAL_KEY, 0).await,
        120
    );

    // Garbage value falls back to the default instead of erroring
    store
        .upsert_setting(WEATHER_FETCH_INTERVAL_KEY, "soon")
        .await
        .unwrap();
    assert_eq!(
        store.get_setting_u64(WEATHER_FETCH_INTERVAL_KEY, 300).await,
        300
    );
}

#[tokio::test]
async fn admin_accounts_round_trip() {
    let store = setup().await;
    assert_eq!(store.count_admins().await.unwrap(), 0);

    let hash = crate::auth::hash_password("hstuadmin").unwrap();
    let created = store.create_admin("admin@example.org", &hash).await.unwrap();
    assert_eq!(store.count_admins().await.unwrap(), 1);

    let found = store
        .get_admin_by_email("admin@example.org")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, created.id);
    assert!(crate::auth::verify_password("hstuadmin", &found.password_hash).unwrap());

    // Duplicate email rejected by the unique index
    assert!(store.create_admin("admin@example.org", &hash).await.is_err());

    assert!(store.delete_admin(&created.id).await.unwrap());
    assert_eq!(store.count_admins().await.unwrap(), 0);
}
