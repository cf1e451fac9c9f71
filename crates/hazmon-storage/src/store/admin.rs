use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};

use crate::entities::admin::{self, Column, Entity};
use crate::store::Store;

/// Admin account row (from the `admins` table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminRow {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn to_row(m: admin::Model) -> AdminRow {
    AdminRow {
        id: m.id,
        email: m.email,
        password_hash: m.password_hash,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    }
}

impl Store {
    pub async fn get_admin_by_email(&self, email: &str) -> Result<Option<AdminRow>> {
        let model = Entity::find()
            .filter(Column::Email.eq(email))
            .one(self.db())
            .await?;
        Ok(model.map(to_row))
    }

    pub async fn create_admin(&self, email: &str, password_hash: &str) -> Result<AdminRow> {
        let now = Utc::now().fixed_offset();
        let am = admin::ActiveModel {
            id: Set(hazmon_common::id::next_id()),
            email: Set(email.to_owned()),
            password_hash: Set(password_hash.to_owned()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = am.insert(self.db()).await?;
        Ok(to_row(model))
    }

    pub async fn list_admins(&self) -> Result<Vec<AdminRow>> {
        let rows = Entity::find()
            .order_by(Column::CreatedAt, Order::Asc)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(to_row).collect())
    }

    pub async fn delete_admin(&self, id: &str) -> Result<bool> {
        let res = Entity::delete_by_id(id).exec(self.db()).await?;
        Ok(res.rows_affected > 0)
    }

    pub async fn count_admins(&self) -> Result<u64> {
        Ok(Entity::find().count(self.db()).await?)
    }
}
