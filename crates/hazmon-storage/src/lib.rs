//! Persistence layer for hazmon: SeaORM entities over a single SQLite
//! database (WAL mode), plus bcrypt password helpers for the admin table.
//!
//! All access goes through [`store::Store`], which runs the
//! `sea-orm-migration` migrations on connect. Scheduler code writes
//! observation logs and alerts; the admin API owns location, disaster,
//! rule, and settings rows.

pub mod auth;
pub mod entities;
pub mod store;

#[cfg(test)]
mod tests;

pub use store::{
    AdminRow, AlertFilter, AlertRow, AlertRuleFilter, AlertRuleRow, AlertRuleUpdate, DisasterRow,
    EarthquakeLogRow, LocationRow, ObservationLogFilter, Store, WeatherLogRow,
    EARTHQUAKE_FETCH_INTERVAL_KEY, WEATHER_FETCH_INTERVAL_KEY,
};
