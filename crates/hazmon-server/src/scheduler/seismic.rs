use anyhow::Result;
use chrono::Utc;
use hazmon_alert::RefirePolicy;
use hazmon_feeds::seismic::{nearest_event_within, SeismicClient, QUALIFYING_RADIUS_KM};
use hazmon_storage::{EarthquakeLogRow, Store, EARTHQUAKE_FETCH_INTERVAL_KEY};
use std::sync::Arc;
use tokio::time::{sleep, Duration};

use super::{DEFAULT_EARTHQUAKE_INTERVAL_SECS, MIN_FETCH_INTERVAL_SECS};
use crate::alerting;

pub struct SeismicPoller {
    store: Arc<Store>,
    client: Arc<SeismicClient>,
    refire_policy: RefirePolicy,
}

impl SeismicPoller {
    pub fn new(store: Arc<Store>, client: Arc<SeismicClient>, refire_policy: RefirePolicy) -> Self {
        Self {
            store,
            client,
            refire_policy,
        }
    }

    pub async fn run(&self) {
        tracing::info!("Seismic poller started");

        loop {
            let interval_secs = self
                .store
                .get_setting_u64(
                    EARTHQUAKE_FETCH_INTERVAL_KEY,
                    DEFAULT_EARTHQUAKE_INTERVAL_SECS,
                )
                .await
                .max(MIN_FETCH_INTERVAL_SECS);
            sleep(Duration::from_secs(interval_secs)).await;

            if let Err(e) = self.tick().await {
                tracing::error!(error = %e, "Seismic poll cycle failed");
            }
        }
    }

    /// One tick: fetch the feed once, then match every enabled location
    /// against it. Per-location store failures are logged and the loop
    /// moves on to the next location.
    async fn tick(&self) -> Result<()> {
        let events = self.client.fetch_recent().await?;
        if events.is_empty() {
            return Ok(());
        }

        let locations = self.store.list_enabled_locations().await?;
        if locations.is_empty() {
            return Ok(());
        }

        let rules = alerting::load_enabled_rules(&self.store).await?;
        tracing::debug!(
            events = events.len(),
            locations = locations.len(),
            "Seismic tick starting"
        );

        for location in &locations {
            let Some(nearby) = nearest_event_within(
                &events,
                location.latitude,
                location.longitude,
                QUALIFYING_RADIUS_KM,
            ) else {
                continue;
            };

            let log_row = EarthquakeLogRow {
                id: hazmon_common::id::next_id(),
                location_id: location.id.clone(),
                event_id: nearby.event.id.clone(),
                magnitude: nearby.event.magnitude,
                place: nearby.event.place.clone(),
                latitude: nearby.event.latitude,
                longitude: nearby.event.longitude,
                distance_km: nearby.distance_km,
                event_time: nearby.event.event_time,
                created_at: Utc::now(),
            };
            if let Err(e) = self.store.insert_earthquake_log(&log_row).await {
                tracing::error!(
                    location = %location.name,
                    error = %e,
                    "Failed to write earthquake log"
                );
            }

            match alerting::fire_seismic_matches(
                &self.store,
                self.refire_policy,
                &rules,
                location,
                &nearby,
            )
            .await
            {
                Ok(fired) if !fired.is_empty() => {
                    tracing::info!(
                        location = %location.name,
                        magnitude = nearby.event.magnitude,
                        distance_km = nearby.distance_km,
                        fired = fired.len(),
                        "Seismic alerts fired"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(
                        location = %location.name,
                        error = %e,
                        "Failed to evaluate seismic event"
                    );
                }
            }
        }
        Ok(())
    }
}
