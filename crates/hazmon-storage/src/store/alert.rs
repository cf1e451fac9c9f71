use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};

use crate::entities::alert::{self, Column, Entity};
use crate::store::Store;

/// Alert row (from the `alerts` table).
///
/// Seismic alerts carry their magnitude, epicenter, and distance as typed
/// columns; the message text is display-only and is never parsed back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRow {
    pub id: String,
    pub rule_id: Option<String>,
    pub disaster_id: String,
    pub location_id: String,
    pub metric: String,
    pub severity: String,
    pub message: String,
    pub observed_value: f64,
    pub threshold: f64,
    pub magnitude: Option<f64>,
    pub epicenter: Option<String>,
    pub distance_km: Option<f64>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Alert list filter.
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub location_id_eq: Option<String>,
    pub disaster_id_eq: Option<String>,
    pub severity_eq: Option<String>,
    pub active_eq: Option<bool>,
    pub created_gte: Option<DateTime<Utc>>,
    pub created_lte: Option<DateTime<Utc>>,
}

fn to_row(m: alert::Model) -> AlertRow {
    AlertRow {
        id: m.id,
        rule_id: m.rule_id,
        disaster_id: m.disaster_id,
        location_id: m.location_id,
        metric: m.metric,
        severity: m.severity,
        message: m.message,
        observed_value: m.observed_value,
        threshold: m.threshold,
        magnitude: m.magnitude,
        epicenter: m.epicenter,
        distance_km: m.distance_km,
        active: m.active,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    }
}

fn apply_filter(mut q: sea_orm::Select<Entity>, filter: &AlertFilter) -> sea_orm::Select<Entity> {
    if let Some(loc) = &filter.location_id_eq {
        q = q.filter(Column::LocationId.eq(loc.clone()));
    }
    if let Some(dis) = &filter.disaster_id_eq {
        q = q.filter(Column::DisasterId.eq(dis.clone()));
    }
    if let Some(sev) = &filter.severity_eq {
        q = q.filter(Column::Severity.eq(sev.clone()));
    }
    if let Some(active) = filter.active_eq {
        q = q.filter(Column::Active.eq(active));
    }
    if let Some(from) = filter.created_gte {
        q = q.filter(Column::CreatedAt.gte(from.fixed_offset()));
    }
    if let Some(to) = filter.created_lte {
        q = q.filter(Column::CreatedAt.lte(to.fixed_offset()));
    }
    q
}

impl Store {
    pub async fn insert_alert(&self, row: &AlertRow) -> Result<AlertRow> {
        let now = Utc::now().fixed_offset();
        let am = alert::ActiveModel {
            id: Set(row.id.clone()),
            rule_id: Set(row.rule_id.clone()),
            disaster_id: Set(row.disaster_id.clone()),
            location_id: Set(row.location_id.clone()),
            metric: Set(row.metric.clone()),
            severity: Set(row.severity.clone()),
            message: Set(row.message.clone()),
            observed_value: Set(row.observed_value),
            threshold: Set(row.threshold),
            magnitude: Set(row.magnitude),
            epicenter: Set(row.epicenter.clone()),
            distance_km: Set(row.distance_km),
            active: Set(row.active),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = am.insert(self.db()).await?;
        Ok(to_row(model))
    }

    pub async fn get_alert_by_id(&self, id: &str) -> Result<Option<AlertRow>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        Ok(model.map(to_row))
    }

    pub async fn list_alerts(
        &self,
        filter: &AlertFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<AlertRow>> {
        let rows = apply_filter(Entity::find(), filter)
            .order_by(Column::CreatedAt, Order::Desc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(to_row).collect())
    }

    pub async fn count_alerts(&self, filter: &AlertFilter) -> Result<u64> {
        Ok(apply_filter(Entity::find(), filter).count(self.db()).await?)
    }

    pub async fn count_active_alerts(&self) -> Result<u64> {
        Ok(Entity::find()
            .filter(Column::Active.eq(true))
            .count(self.db())
            .await?)
    }

    /// The re-fire dedup lookup: an active alert for this rule+location
    /// pair, if one exists.
    pub async fn find_active_alert(
        &self,
        rule_id: &str,
        location_id: &str,
    ) -> Result<Option<AlertRow>> {
        let model = Entity::find()
            .filter(Column::RuleId.eq(rule_id))
            .filter(Column::LocationId.eq(location_id))
            .filter(Column::Active.eq(true))
            .one(self.db())
            .await?;
        Ok(model.map(to_row))
    }

    /// Newest active seismic alert for a location, used by the snapshot
    /// endpoint. Seismic alerts are the ones with a magnitude column.
    pub async fn latest_active_seismic_alert(
        &self,
        location_id: &str,
    ) -> Result<Option<AlertRow>> {
        let model = Entity::find()
            .filter(Column::LocationId.eq(location_id))
            .filter(Column::Active.eq(true))
            .filter(Column::Magnitude.is_not_null())
            .order_by(Column::CreatedAt, Order::Desc)
            .one(self.db())
            .await?;
        Ok(model.map(to_row))
    }

    /// Archive an alert (the only resolution path; nothing auto-resolves).
    pub async fn archive_alert(&self, id: &str) -> Result<Option<AlertRow>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        if let Some(m) = model {
            let mut am: alert::ActiveModel = m.into();
            am.active = Set(false);
            am.updated_at = Set(Utc::now().fixed_offset());
            let updated = am.update(self.db()).await?;
            Ok(Some(to_row(updated)))
        } else {
            Ok(None)
        }
    }

    pub async fn delete_all_alerts(&self) -> Result<u64> {
        let res = Entity::delete_many().exec(self.db()).await?;
        Ok(res.rows_affected)
    }
}
