use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};

use crate::entities::{earthquake_log, weather_log};
use crate::store::Store;

/// Weather observation row, one per location per weather tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherLogRow {
    pub id: String,
    pub location_id: String,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub rain_mm: f64,
    pub wind_speed_kmh: f64,
    pub us_aqi: Option<f64>,
    pub recorded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Seismic observation row, one per location per seismic tick with a
/// qualifying event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarthquakeLogRow {
    pub id: String,
    pub location_id: String,
    pub event_id: String,
    pub magnitude: f64,
    pub place: String,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_km: f64,
    pub event_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Shared filter for both observation logs.
#[derive(Debug, Clone, Default)]
pub struct ObservationLogFilter {
    pub location_id_eq: Option<String>,
    pub recorded_gte: Option<DateTime<Utc>>,
    pub recorded_lte: Option<DateTime<Utc>>,
}

fn to_weather_row(m: weather_log::Model) -> WeatherLogRow {
    WeatherLogRow {
        id: m.id,
        location_id: m.location_id,
        temperature_c: m.temperature_c,
        humidity_pct: m.humidity_pct,
        rain_mm: m.rain_mm,
        wind_speed_kmh: m.wind_speed_kmh,
        us_aqi: m.us_aqi,
        recorded_at: m.recorded_at.with_timezone(&Utc),
        created_at: m.created_at.with_timezone(&Utc),
    }
}

fn to_earthquake_row(m: earthquake_log::Model) -> EarthquakeLogRow {
    EarthquakeLogRow {
        id: m.id,
        location_id: m.location_id,
        event_id: m.event_id,
        magnitude: m.magnitude,
        place: m.place,
        latitude: m.latitude,
        longitude: m.longitude,
        distance_km: m.distance_km,
        event_time: m.event_time.with_timezone(&Utc),
        created_at: m.created_at.with_timezone(&Utc),
    }
}

impl Store {
    pub async fn insert_weather_log(&self, row: &WeatherLogRow) -> Result<WeatherLogRow> {
        let am = weather_log::ActiveModel {
            id: Set(row.id.clone()),
            location_id: Set(row.location_id.clone()),
            temperature_c: Set(row.temperature_c),
            humidity_pct: Set(row.humidity_pct),
            rain_mm: Set(row.rain_mm),
            wind_speed_kmh: Set(row.wind_speed_kmh),
            us_aqi: Set(row.us_aqi),
            recorded_at: Set(row.recorded_at.fixed_offset()),
            created_at: Set(Utc::now().fixed_offset()),
        };
        let model = am.insert(self.db()).await?;
        Ok(to_weather_row(model))
    }

    pub async fn list_weather_logs(
        &self,
        filter: &ObservationLogFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<WeatherLogRow>> {
        let mut q = weather_log::Entity::find();
        if let Some(loc) = &filter.location_id_eq {
            q = q.filter(weather_log::Column::LocationId.eq(loc.clone()));
        }
        if let Some(from) = filter.recorded_gte {
            q = q.filter(weather_log::Column::RecordedAt.gte(from.fixed_offset()));
        }
        if let Some(to) = filter.recorded_lte {
            q = q.filter(weather_log::Column::RecordedAt.lte(to.fixed_offset()));
        }
        let rows = q
            .order_by(weather_log::Column::RecordedAt, Order::Desc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(to_weather_row).collect())
    }

    pub async fn count_weather_logs(&self, filter: &ObservationLogFilter) -> Result<u64> {
        let mut q = weather_log::Entity::find();
        if let Some(loc) = &filter.location_id_eq {
            q = q.filter(weather_log::Column::LocationId.eq(loc.clone()));
        }
        if let Some(from) = filter.recorded_gte {
            q = q.filter(weather_log::Column::RecordedAt.gte(from.fixed_offset()));
        }
        if let Some(to) = filter.recorded_lte {
            q = q.filter(weather_log::Column::RecordedAt.lte(to.fixed_offset()));
        }
        Ok(q.count(self.db()).await?)
    }

    pub async fn delete_all_weather_logs(&self) -> Result<u64> {
        let res = weather_log::Entity::delete_many().exec(self.db()).await?;
        Ok(res.rows_affected)
    }

    pub async fn insert_earthquake_log(&self, row: &EarthquakeLogRow) -> Result<EarthquakeLogRow> {
        let am = earthquake_log::ActiveModel {
            id: Set(row.id.clone()),
            location_id: Set(row.location_id.clone()),
            event_id: Set(row.event_id.clone()),
            magnitude: Set(row.magnitude),
            place: Set(row.place.clone()),
            latitude: Set(row.latitude),
            longitude: Set(row.longitude),
            distance_km: Set(row.distance_km),
            event_time: Set(row.event_time.fixed_offset()),
            created_at: Set(Utc::now().fixed_offset()),
        };
        let model = am.insert(self.db()).await?;
        Ok(to_earthquake_row(model))
    }

    pub async fn list_earthquake_logs(
        &self,
        filter: &ObservationLogFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<EarthquakeLogRow>> {
        let mut q = earthquake_log::Entity::find();
        if let Some(loc) = &filter.location_id_eq {
            q = q.filter(earthquake_log::Column::LocationId.eq(loc.clone()));
        }
        if let Some(from) = filter.recorded_gte {
            q = q.filter(earthquake_log::Column::EventTime.gte(from.fixed_offset()));
        }
        if let Some(to) = filter.recorded_lte {
            q = q.filter(earthquake_log::Column::EventTime.lte(to.fixed_offset()));
        }
        let rows = q
            .order_by(earthquake_log::Column::EventTime, Order::Desc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(to_earthquake_row).collect())
    }

    pub async fn count_earthquake_logs(&self, filter: &ObservationLogFilter) -> Result<u64> {
        let mut q = earthquake_log::Entity::find();
        if let Some(loc) = &filter.location_id_eq {
            q = q.filter(earthquake_log::Column::LocationId.eq(loc.clone()));
        }
        if let Some(from) = filter.recorded_gte {
            q = q.filter(earthquake_log::Column::EventTime.gte(from.fixed_offset()));
        }
        if let Some(to) = filter.recorded_lte {
            q = q.filter(earthquake_log::Column::EventTime.lte(to.fixed_offset()));
        }
        Ok(q.count(self.db()).await?)
    }

    pub async fn delete_all_earthquake_logs(&self) -> Result<u64> {
        let res = earthquake_log::Entity::delete_many().exec(self.db()).await?;
        Ok(res.rows_affected)
    }
}
