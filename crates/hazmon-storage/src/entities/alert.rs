use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "alerts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// SET NULL when the originating rule is deleted.
    pub rule_id: Option<String>,
    pub disaster_id: String,
    pub location_id: String,
    pub metric: String,
    pub severity: String,
    pub message: String,
    pub observed_value: f64,
    pub threshold: f64,
    /// Structured seismic fields; NULL for weather alerts.
    pub magnitude: Option<f64>,
    pub epicenter: Option<String>,
    pub distance_km: Option<f64>,
    pub active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
