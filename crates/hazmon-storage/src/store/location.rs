use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};

use crate::entities::location::{self, Column, Entity};
use crate::store::Store;

/// Monitored location row (from the `locations` table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationRow {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn to_row(m: location::Model) -> LocationRow {
    LocationRow {
        id: m.id,
        name: m.name,
        latitude: m.latitude,
        longitude: m.longitude,
        enabled: m.enabled,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    }
}

impl Store {
    pub async fn insert_location(&self, row: &LocationRow) -> Result<LocationRow> {
        let now = Utc::now().fixed_offset();
        let am = location::ActiveModel {
            id: Set(row.id.clone()),
            name: Set(row.name.clone()),
            latitude: Set(row.latitude),
            longitude: Set(row.longitude),
            enabled: Set(row.enabled),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = am.insert(self.db()).await?;
        Ok(to_row(model))
    }

    pub async fn get_location_by_id(&self, id: &str) -> Result<Option<LocationRow>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        Ok(model.map(to_row))
    }

    pub async fn list_locations(
        &self,
        name_contains: Option<&str>,
        enabled: Option<bool>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LocationRow>> {
        let mut q = Entity::find();
        if let Some(name) = name_contains {
            q = q.filter(Column::Name.contains(name));
        }
        if let Some(en) = enabled {
            q = q.filter(Column::Enabled.eq(en));
        }
        let rows = q
            .order_by(Column::CreatedAt, Order::Desc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(to_row).collect())
    }

    pub async fn count_locations(
        &self,
        name_contains: Option<&str>,
        enabled: Option<bool>,
    ) -> Result<u64> {
        let mut q = Entity::find();
        if let Some(name) = name_contains {
            q = q.filter(Column::Name.contains(name));
        }
        if let Some(en) = enabled {
            q = q.filter(Column::Enabled.eq(en));
        }
        Ok(q.count(self.db()).await?)
    }

    /// Locations the pollers iterate on each tick.
    pub async fn list_enabled_locations(&self) -> Result<Vec<LocationRow>> {
        let rows = Entity::find()
            .filter(Column::Enabled.eq(true))
            .order_by(Column::CreatedAt, Order::Asc)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(to_row).collect())
    }

    pub async fn update_location(
        &self,
        id: &str,
        name: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<LocationRow>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        if let Some(m) = model {
            let mut am: location::ActiveModel = m.into();
            am.name = Set(name.to_owned());
            am.latitude = Set(latitude);
            am.longitude = Set(longitude);
            am.updated_at = Set(Utc::now().fixed_offset());
            let updated = am.update(self.db()).await?;
            Ok(Some(to_row(updated)))
        } else {
            Ok(None)
        }
    }

    pub async fn set_location_enabled(
        &self,
        id: &str,
        enabled: bool,
    ) -> Result<Option<LocationRow>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        if let Some(m) = model {
            let mut am: location::ActiveModel = m.into();
            am.enabled = Set(enabled);
            am.updated_at = Set(Utc::now().fixed_offset());
            let updated = am.update(self.db()).await?;
            Ok(Some(to_row(updated)))
        } else {
            Ok(None)
        }
    }

    /// Delete a location. Rules, alerts, and observation logs for it go
    /// with it via schema cascades.
    pub async fn delete_location(&self, id: &str) -> Result<bool> {
        let res = Entity::delete_by_id(id).exec(self.db()).await?;
        Ok(res.rows_affected > 0)
    }

    pub async fn delete_all_locations(&self) -> Result<u64> {
        let res = Entity::delete_many().exec(self.db()).await?;
        Ok(res.rows_affected)
    }
}
