use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ActiveValue::Set, ColumnTrait, Condition, EntityTrait,
    QueryFilter, QueryOrder,
};

use super::SeaOrmStorage;
use super::converters::{budget_from_model, collect_models};
use crate::errors::{FintrackError, Result};
use crate::storage::models::{AlertLevel, Budget, NewBudget};
use crate::utils::money::to_cents;
use migration::entities::budget;

impl SeaOrmStorage {
    pub async fn list_budgets(&self, user_id: i64) -> Result<Vec<Budget>> {
        let models = budget::Entity::find()
            .filter(budget::Column::UserId.eq(user_id))
            .order_by_asc(budget::Column::Name)
            .all(&self.db)
            .await?;
        collect_models(models, budget_from_model)
    }

    /// 适用于某分类支出的预算：同分类预算 + 不限分类的总预算
    pub async fn budgets_covering(
        &self,
        user_id: i64,
        category_id: Option<i64>,
    ) -> Result<Vec<Budget>> {
        let mut scope = Condition::any().add(budget::Column::CategoryId.is_null());
        if let Some(category_id) = category_id {
            scope = scope.add(budget::Column::CategoryId.eq(category_id));
        }

        let models = budget::Entity::find()
            .filter(budget::Column::UserId.eq(user_id))
            .filter(scope)
            .all(&self.db)
            .await?;
        collect_models(models, budget_from_model)
    }

    pub async fn get_budget(&self, user_id: i64, id: i64) -> Result<Option<Budget>> {
        budget::Entity::find_by_id(id)
            .filter(budget::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .map(budget_from_model)
            .transpose()
    }

    pub async fn create_budget(&self, user_id: i64, new: NewBudget) -> Result<Budget> {
        let now = Utc::now();
        let model = budget::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            category_id: Set(new.category_id),
            name: Set(new.name),
            amount_cents: Set(to_cents(new.amount)?),
            period: Set(new.period.as_ref().to_string()),
            start_date: Set(new.start_date),
            alert_period_start: Set(None),
            alert_level: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        budget_from_model(model.insert(&self.db).await?)
    }

    /// 整体更新预算；周期或金额变化后提醒状态重置
    pub async fn update_budget(&self, user_id: i64, id: i64, update: NewBudget) -> Result<Budget> {
        let existing = budget::Entity::find_by_id(id)
            .filter(budget::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| FintrackError::not_found(format!("Budget {} not found", id)))?;

        let mut active: budget::ActiveModel = existing.into();
        active.category_id = Set(update.category_id);
        active.name = Set(update.name);
        active.amount_cents = Set(to_cents(update.amount)?);
        active.period = Set(update.period.as_ref().to_string());
        active.start_date = Set(update.start_date);
        active.alert_period_start = Set(None);
        active.alert_level = Set(None);
        active.updated_at = Set(Utc::now());

        budget_from_model(active.update(&self.db).await?)
    }

    pub async fn delete_budget(&self, user_id: i64, id: i64) -> Result<()> {
        let result = budget::Entity::delete_many()
            .filter(budget::Column::Id.eq(id))
            .filter(budget::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(FintrackError::not_found(format!("Budget {} not found", id)));
        }
        Ok(())
    }

    /// 记录某周期已发送的最高提醒级别
    pub async fn record_budget_alert(
        &self,
        budget_id: i64,
        period_start: NaiveDate,
        level: AlertLevel,
    ) -> Result<()> {
        budget::Entity::update_many()
            .col_expr(
                budget::Column::AlertPeriodStart,
                sea_orm::sea_query::Expr::value(period_start),
            )
            .col_expr(
                budget::Column::AlertLevel,
                sea_orm::sea_query::Expr::value(level.as_ref()),
            )
            .filter(budget::Column::Id.eq(budget_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
