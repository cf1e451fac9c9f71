use anyhow::Result;
use hazmon_storage::{Store, EARTHQUAKE_FETCH_INTERVAL_KEY, WEATHER_FETCH_INTERVAL_KEY};

use crate::scheduler::{DEFAULT_EARTHQUAKE_INTERVAL_SECS, DEFAULT_WEATHER_INTERVAL_SECS};

/// Seed the poll interval settings when the table is empty of them, so
/// the settings API always has rows to show.
pub async fn init_default_settings(store: &Store) -> Result<()> {
    for (key, default) in [
        (WEATHER_FETCH_INTERVAL_KEY, DEFAULT_WEATHER_INTERVAL_SECS),
        (
            EARTHQUAKE_FETCH_INTERVAL_KEY,
            DEFAULT_EARTHQUAKE_INTERVAL_SECS,
        ),
    ] {
        if store
            .insert_setting_if_missing(key, &default.to_string())
            .await?
        {
            tracing::info!(key, value = default, "Seeded default setting");
        }
    }
    Ok(())
}

/// Create the default admin account when the admins table is empty.
pub async fn ensure_default_admin(store: &Store, email: &str, password: &str) -> Result<()> {
    match store.count_admins().await? {
        0 => {
            let hash = hazmon_storage::auth::hash_password(password)?;
            store.create_admin(email, &hash).await?;
            tracing::info!(email, "Created default admin account");
        }
        count => {
            tracing::info!(count, "Admins table already has accounts, skipping default");
        }
    }
    Ok(())
}
