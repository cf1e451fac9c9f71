use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};

use crate::entities::disaster::{self, Column, Entity};
use crate::store::Store;

/// Disaster category row (from the `disasters` table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisasterRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn to_row(m: disaster::Model) -> DisasterRow {
    DisasterRow {
        id: m.id,
        name: m.name,
        description: m.description,
        enabled: m.enabled,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    }
}

impl Store {
    pub async fn insert_disaster(&self, row: &DisasterRow) -> Result<DisasterRow> {
        let now = Utc::now().fixed_offset();
        let am = disaster::ActiveModel {
            id: Set(row.id.clone()),
            name: Set(row.name.clone()),
            description: Set(row.description.clone()),
            enabled: Set(row.enabled),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = am.insert(self.db()).await?;
        Ok(to_row(model))
    }

    pub async fn get_disaster_by_id(&self, id: &str) -> Result<Option<DisasterRow>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        Ok(model.map(to_row))
    }

    pub async fn list_disasters(
        &self,
        name_contains: Option<&str>,
        enabled: Option<bool>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DisasterRow>> {
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

    pub async fn count_disasters(
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

    pub async fn update_disaster(
        &self,
        id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<Option<DisasterRow>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        if let Some(m) = model {
            let mut am: disaster::ActiveModel = m.into();
            am.name = Set(name.to_owned());
            am.description = Set(description.map(str::to_owned));
            am.updated_at = Set(Utc::now().fixed_offset());
            let updated = am.update(self.db()).await?;
            Ok(Some(to_row(updated)))
        } else {
            Ok(None)
        }
    }

    pub async fn set_disaster_enabled(
        &self,
        id: &str,
        enabled: bool,
    ) -> Result<Option<DisasterRow>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        if let Some(m) = model {
            let mut am: disaster::ActiveModel = m.into();
            am.enabled = Set(enabled);
            am.updated_at = Set(Utc::now().fixed_offset());
            let updated = am.update(self.db()).await?;
            Ok(Some(to_row(updated)))
        } else {
            Ok(None)
        }
    }

    /// Delete a disaster. Rules and alerts referencing it cascade away.
    pub async fn delete_disaster(&self, id: &str) -> Result<bool> {
        let res = Entity::delete_by_id(id).exec(self.db()).await?;
        Ok(res.rows_affected > 0)
    }
}
