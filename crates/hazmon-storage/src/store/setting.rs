use anyhow::Result;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait};

use crate::entities::setting::{self, Entity};
use crate::store::Store;

/// Seconds between weather poll ticks.
pub const WEATHER_FETCH_INTERVAL_KEY: &str = "weather_fetch_interval";
/// Seconds between seismic poll ticks.
pub const EARTHQUAKE_FETCH_INTERVAL_KEY: &str = "earthquake_fetch_interval";

impl Store {
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let model = Entity::find_by_id(key).one(self.db()).await?;
        Ok(model.map(|m| m.value))
    }

    /// Read a numeric setting, falling back to `default` when the key is
    /// missing or unparseable. Pollers call this once per loop iteration.
    pub async fn get_setting_u64(&self, key: &str, default: u64) -> u64 {
        match self.get_setting(key).await {
            Ok(Some(value)) => value.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(key, value, "Setting is not a valid integer, using default");
                default
            }),
            Ok(None) => default,
            Err(e) => {
                tracing::error!(key, error = %e, "Failed to read setting, using default");
                default
            }
        }
    }

    pub async fn upsert_setting(&self, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().fixed_offset();
        let existing = Entity::find_by_id(key).one(self.db()).await?;
        match existing {
            Some(m) => {
                let mut am: setting::ActiveModel = m.into();
                am.value = Set(value.to_owned());
                am.updated_at = Set(now);
                am.update(self.db()).await?;
            }
            None => {
                let am = setting::ActiveModel {
                    key: Set(key.to_owned()),
                    value: Set(value.to_owned()),
                    updated_at: Set(now),
                };
                am.insert(self.db()).await?;
            }
        }
        Ok(())
    }

    /// Insert a setting only when the key does not exist yet (seeding).
    pub async fn insert_setting_if_missing(&self, key: &str, value: &str) -> Result<bool> {
        if self.get_setting(key).await?.is_some() {
            return Ok(false);
        }
        let am = setting::ActiveModel {
            key: Set(key.to_owned()),
            value: Set(value.to_owned()),
            updated_at: Set(Utc::now().fixed_offset()),
        };
        am.insert(self.db()).await?;
        Ok(true)
    }
}
