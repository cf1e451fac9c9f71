use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};

use crate::entities::alert_rule::{self, Column, Entity};
use crate::store::Store;

/// Alert rule row (from the `alert_rules` table).
///
/// Metric, operator, and severity are stored as their string forms; the
/// CRUD boundary only ever writes values that parse into the closed enums,
/// so decoding on the way out is a formality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRuleRow {
    pub id: String,
    pub location_id: Option<String>,
    pub disaster_id: String,
    pub metric: String,
    pub operator: String,
    pub threshold: f64,
    pub severity: String,
    pub message_prefix: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Rule update request.
#[derive(Debug, Clone, Default)]
pub struct AlertRuleUpdate {
    pub location_id: Option<Option<String>>,
    pub disaster_id: Option<String>,
    pub metric: Option<String>,
    pub operator: Option<String>,
    pub threshold: Option<f64>,
    pub severity: Option<String>,
    pub message_prefix: Option<Option<String>>,
}

/// Rule list filter.
#[derive(Debug, Clone, Default)]
pub struct AlertRuleFilter {
    pub location_id_eq: Option<String>,
    pub disaster_id_eq: Option<String>,
    pub metric_eq: Option<String>,
    pub severity_eq: Option<String>,
    pub enabled_eq: Option<bool>,
}

fn to_row(m: alert_rule::Model) -> AlertRuleRow {
    AlertRuleRow {
        id: m.id,
        location_id: m.location_id,
        disaster_id: m.disaster_id,
        metric: m.metric,
        operator: m.operator,
        threshold: m.threshold,
        severity: m.severity,
        message_prefix: m.message_prefix,
        enabled: m.enabled,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    }
}

fn apply_filter(
    mut q: sea_orm::Select<Entity>,
    filter: &AlertRuleFilter,
) -> sea_orm::Select<Entity> {
    if let Some(loc) = &filter.location_id_eq {
        q = q.filter(Column::LocationId.eq(loc.clone()));
    }
    if let Some(dis) = &filter.disaster_id_eq {
        q = q.filter(Column::DisasterId.eq(dis.clone()));
    }
    if let Some(metric) = &filter.metric_eq {
        q = q.filter(Column::Metric.eq(metric.clone()));
    }
    if let Some(sev) = &filter.severity_eq {
        q = q.filter(Column::Severity.eq(sev.clone()));
    }
    if let Some(en) = filter.enabled_eq {
        q = q.filter(Column::Enabled.eq(en));
    }
    q
}

impl Store {
    pub async fn insert_alert_rule(&self, row: &AlertRuleRow) -> Result<AlertRuleRow> {
        let now = Utc::now().fixed_offset();
        let am = alert_rule::ActiveModel {
            id: Set(row.id.clone()),
            location_id: Set(row.location_id.clone()),
            disaster_id: Set(row.disaster_id.clone()),
            metric: Set(row.metric.clone()),
            operator: Set(row.operator.clone()),
            threshold: Set(row.threshold),
            severity: Set(row.severity.clone()),
            message_prefix: Set(row.message_prefix.clone()),
            enabled: Set(row.enabled),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = am.insert(self.db()).await?;
        Ok(to_row(model))
    }

    pub async fn get_alert_rule_by_id(&self, id: &str) -> Result<Option<AlertRuleRow>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        Ok(model.map(to_row))
    }

    pub async fn list_alert_rules(
        &self,
        filter: &AlertRuleFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<AlertRuleRow>> {
        let rows = apply_filter(Entity::find(), filter)
            .order_by(Column::CreatedAt, Order::Desc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(to_row).collect())
    }

    pub async fn count_alert_rules(&self, filter: &AlertRuleFilter) -> Result<u64> {
        Ok(apply_filter(Entity::find(), filter).count(self.db()).await?)
    }

    /// All enabled rules, loaded once per evaluation pass.
    pub async fn list_enabled_alert_rules(&self) -> Result<Vec<AlertRuleRow>> {
        let rows = Entity::find()
            .filter(Column::Enabled.eq(true))
            .order_by(Column::CreatedAt, Order::Asc)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(to_row).collect())
    }

    pub async fn update_alert_rule(
        &self,
        id: &str,
        update: &AlertRuleUpdate,
    ) -> Result<Option<AlertRuleRow>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        if let Some(m) = model {
            let mut am: alert_rule::ActiveModel = m.into();
            if let Some(loc) = &update.location_id {
                am.location_id = Set(loc.clone());
            }
            if let Some(dis) = &update.disaster_id {
                am.disaster_id = Set(dis.clone());
            }
            if let Some(metric) = &update.metric {
                am.metric = Set(metric.clone());
            }
            if let Some(op) = &update.operator {
                am.operator = Set(op.clone());
            }
            if let Some(threshold) = update.threshold {
                am.threshold = Set(threshold);
            }
            if let Some(sev) = &update.severity {
                am.severity = Set(sev.clone());
            }
            if let Some(prefix) = &update.message_prefix {
                am.message_prefix = Set(prefix.clone());
            }
            am.updated_at = Set(Utc::now().fixed_offset());
            let updated = am.update(self.db()).await?;
            Ok(Some(to_row(updated)))
        } else {
            Ok(None)
        }
    }

    pub async fn set_alert_rule_enabled(
        &self,
        id: &str,
        enabled: bool,
    ) -> Result<Option<AlertRuleRow>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        if let Some(m) = model {
            let mut am: alert_rule::ActiveModel = m.into();
            am.enabled = Set(enabled);
            am.updated_at = Set(Utc::now().fixed_offset());
            let updated = am.update(self.db()).await?;
            Ok(Some(to_row(updated)))
        } else {
            Ok(None)
        }
    }

    pub async fn delete_alert_rule(&self, id: &str) -> Result<bool> {
        let res = Entity::delete_by_id(id).exec(self.db()).await?;
        Ok(res.rows_affected > 0)
    }

    pub async fn delete_all_alert_rules(&self) -> Result<u64> {
        let res = Entity::delete_many().exec(self.db()).await?;
        Ok(res.rows_affected)
    }
}
