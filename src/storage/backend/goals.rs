use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ActiveValue::Set, ColumnTrait, EntityTrait,
    QueryFilter, QueryOrder,
};

use super::SeaOrmStorage;
use super::converters::goal_from_model;
use crate::errors::{FintrackError, Result};
use crate::storage::models::{Goal, NewGoal};
use crate::utils::money::to_cents;
use migration::entities::goal;

impl SeaOrmStorage {
    pub async fn list_goals(&self, user_id: i64) -> Result<Vec<Goal>> {
        let models = goal::Entity::find()
            .filter(goal::Column::UserId.eq(user_id))
            .order_by_asc(goal::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(goal_from_model).collect())
    }

    pub async fn get_goal(&self, user_id: i64, id: i64) -> Result<Option<Goal>> {
        let model = goal::Entity::find_by_id(id)
            .filter(goal::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(model.map(goal_from_model))
    }

    pub async fn create_goal(
        &self,
        user_id: i64,
        new: NewGoal,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Goal> {
        let now = Utc::now();
        let model = goal::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            name: Set(new.name),
            target_cents: Set(to_cents(new.target_amount)?),
            current_cents: Set(to_cents(new.current_amount)?),
            deadline: Set(new.deadline),
            completed_at: Set(completed_at),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(goal_from_model(model.insert(&self.db).await?))
    }

    pub async fn update_goal(
        &self,
        user_id: i64,
        id: i64,
        update: NewGoal,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Goal> {
        let mut active = self.goal_active_model(user_id, id).await?;
        active.name = Set(update.name);
        active.target_cents = Set(to_cents(update.target_amount)?);
        active.current_cents = Set(to_cents(update.current_amount)?);
        active.deadline = Set(update.deadline);
        active.completed_at = Set(completed_at);
        active.updated_at = Set(Utc::now());

        Ok(goal_from_model(active.update(&self.db).await?))
    }

    /// 只更新当前进度与完成时间
    pub async fn set_goal_progress(
        &self,
        user_id: i64,
        id: i64,
        current_amount: Decimal,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Goal> {
        let mut active = self.goal_active_model(user_id, id).await?;
        active.current_cents = Set(to_cents(current_amount)?);
        active.completed_at = Set(completed_at);
        active.updated_at = Set(Utc::now());

        Ok(goal_from_model(active.update(&self.db).await?))
    }

    pub async fn delete_goal(&self, user_id: i64, id: i64) -> Result<()> {
        let result = goal::Entity::delete_many()
            .filter(goal::Column::Id.eq(id))
            .filter(goal::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(FintrackError::not_found(format!("Goal {} not found", id)));
        }
        Ok(())
    }

    async fn goal_active_model(&self, user_id: i64, id: i64) -> Result<goal::ActiveModel> {
        goal::Entity::find_by_id(id)
            .filter(goal::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .map(Into::into)
            .ok_or_else(|| FintrackError::not_found(format!("Goal {} not found", id)))
    }
}
