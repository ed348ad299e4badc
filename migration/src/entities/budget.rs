use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub category_id: Option<i64>,
    pub name: String,
    pub amount_cents: i64,
    /// "weekly" | "monthly" | "yearly"
    pub period: String,
    pub start_date: Date,
    pub alert_period_start: Option<Date>,
    /// "warning" | "exceeded"
    pub alert_level: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
