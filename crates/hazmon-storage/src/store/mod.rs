use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection};

pub mod admin;
pub mod alert;
pub mod disaster;
pub mod location;
pub mod observation;
pub mod rule;
pub mod setting;

// ---- Public row types, re-exported from the submodules ----
pub use admin::AdminRow;
pub use alert::{AlertFilter, AlertRow};
pub use disaster::DisasterRow;
pub use location::LocationRow;
pub use observation::{EarthquakeLogRow, ObservationLogFilter, WeatherLogRow};
pub use rule::{AlertRuleFilter, AlertRuleRow, AlertRuleUpdate};
pub use setting::{EARTHQUAKE_FETCH_INTERVAL_KEY, WEATHER_FETCH_INTERVAL_KEY};

/// Unified access layer for the hazmon database.
///
/// Every method is an `async fn` over SeaORM. Referential integrity
/// (location/disaster cascades) lives in the schema, so the store enables
/// SQLite foreign-key enforcement on connect.
pub struct Store {
    pub(crate) db: DatabaseConnection,
}

impl Store {
    /// Connect and initialize the database.
    ///
    /// `db_url` is the full connection URL provided by server config,
    /// e.g. `sqlite://data/hazmon.db?mode=rwc`. Pending
    /// `sea-orm-migration` migrations run automatically.
    pub async fn new(db_url: &str) -> Result<Self> {
        let db = Database::connect(db_url).await?;

        // Pragmas only apply to SQLite
        if db_url.starts_with("sqlite:") {
            db.execute_unprepared("PRAGMA journal_mode=WAL;").await?;
            db.execute_unprepared("PRAGMA foreign_keys=ON;").await?;
        }

        Migrator::up(&db, None).await?;

        tracing::info!(db_url = %db_url, "Initialized store");
        Ok(Self { db })
    }

    /// Underlying connection handle, for the submodules.
    pub(crate) fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}
