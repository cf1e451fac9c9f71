use anyhow::Result;
use chrono::Utc;
use hazmon_alert::engine::ThresholdRule;
use hazmon_alert::RefirePolicy;
use hazmon_feeds::weather::WeatherClient;
use hazmon_storage::{LocationRow, Store, WeatherLogRow, WEATHER_FETCH_INTERVAL_KEY};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::{sleep, Duration};

use super::{DEFAULT_WEATHER_INTERVAL_SECS, MIN_FETCH_INTERVAL_SECS};
use crate::alerting;

pub struct WeatherPoller {
    store: Arc<Store>,
    client: Arc<WeatherClient>,
    refire_policy: RefirePolicy,
    max_concurrent: usize,
}

impl WeatherPoller {
    pub fn new(
        store: Arc<Store>,
        client: Arc<WeatherClient>,
        refire_policy: RefirePolicy,
        max_concurrent: usize,
    ) -> Self {
        Self {
            store,
            client,
            refire_policy,
            max_concurrent,
        }
    }

    pub async fn run(&self) {
        tracing::info!(
            max_concurrent = self.max_concurrent,
            "Weather poller started"
        );

        loop {
            let interval_secs = self
                .store
                .get_setting_u64(WEATHER_FETCH_INTERVAL_KEY, DEFAULT_WEATHER_INTERVAL_SECS)
                .await
                .max(MIN_FETCH_INTERVAL_SECS);
            sleep(Duration::from_secs(interval_secs)).await;

            if let Err(e) = self.tick().await {
                tracing::error!(error = %e, "Weather poll cycle failed");
            }
        }
    }

    async fn tick(&self) -> Result<()> {
        let locations = self.store.list_enabled_locations().await?;
        if locations.is_empty() {
            return Ok(());
        }

        let rules = Arc::new(alerting::load_enabled_rules(&self.store).await?);
        tracing::debug!(
            locations = locations.len(),
            rules = rules.len(),
            "Weather tick starting"
        );

        // Locations share no state, so per-location fetches fan out under
        // a concurrency cap.
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut handles = Vec::with_capacity(locations.len());

        for location in locations {
            let permit = semaphore.clone().acquire_owned().await?;
            let store = self.store.clone();
            let client = self.client.clone();
            let rules = rules.clone();
            let policy = self.refire_policy;

            handles.push(tokio::spawn(async move {
                poll_location(&store, &client, &rules, policy, &location).await;
                drop(permit);
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Weather poll task panicked");
            }
        }
        Ok(())
    }
}

/// One location within one tick: fetch, log the observation, evaluate.
/// A fetch failure skips the location until the next tick.
async fn poll_location(
    store: &Store,
    client: &WeatherClient,
    rules: &[ThresholdRule],
    policy: RefirePolicy,
    location: &LocationRow,
) {
    let reading = match client
        .fetch_current(location.latitude, location.longitude)
        .await
    {
        Ok(reading) => reading,
        Err(e) => {
            tracing::warn!(
                location = %location.name,
                error = %e,
                "Weather fetch failed, skipping location this tick"
            );
            return;
        }
    };

    let log_row = WeatherLogRow {
        id: hazmon_common::id::next_id(),
        location_id: location.id.clone(),
        temperature_c: reading.temperature_c,
        humidity_pct: reading.humidity_pct,
        rain_mm: reading.rain_mm,
        wind_speed_kmh: reading.wind_speed_kmh,
        us_aqi: reading.us_aqi,
        recorded_at: reading.observed_at,
        created_at: Utc::now(),
    };
    if let Err(e) = store.insert_weather_log(&log_row).await {
        tracing::error!(location = %location.name, error = %e, "Failed to write weather log");
    }

    for (metric, value) in alerting::reading_metrics(&reading) {
        match alerting::fire_weather_matches(store, policy, rules, location, metric, value).await {
            Ok(fired) if !fired.is_empty() => {
                tracing::info!(
                    location = %location.name,
                    metric = %metric,
                    value,
                    fired = fired.len(),
                    "Weather alerts fired"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(
                    location = %location.name,
                    metric = %metric,
                    error = %e,
                    "Failed to evaluate weather metric"
                );
            }
        }
    }
}
