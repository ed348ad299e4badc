use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter};

use super::SeaOrmStorage;
use super::converters::user_from_model;
use crate::errors::{FintrackError, Result};
use crate::storage::models::{NewUser, User, UserSettingsUpdate};
use migration::entities::user;

/// 新用户默认的预算提醒阈值（百分比）
pub const DEFAULT_ALERT_THRESHOLD: i32 = 80;

impl SeaOrmStorage {
    pub async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let now = Utc::now();
        let model = user::ActiveModel {
            id: NotSet,
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            name: Set(new_user.name),
            currency: Set(new_user.currency),
            email_notifications: Set(true),
            push_notifications: Set(false),
            budget_alert_threshold: Set(DEFAULT_ALERT_THRESHOLD),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let db = &self.db;
        let inserted = self
            .retry
            .run("create_user", || {
                let model = model.clone();
                async move { model.insert(db).await }
            })
            .await
            .map_err(|e| match FintrackError::from(e) {
                FintrackError::Conflict(_) => {
                    FintrackError::conflict("Email is already registered")
                }
                other => other,
            })?;

        Ok(user_from_model(inserted))
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let model = user::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(user_from_model))
    }

    /// 邮箱需已规范化为小写
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(model.map(user_from_model))
    }

    async fn find_user_model(&self, id: i64) -> Result<user::Model> {
        user::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| FintrackError::not_found("User not found"))
    }

    pub async fn update_user_settings(&self, id: i64, update: UserSettingsUpdate) -> Result<User> {
        let mut active: user::ActiveModel = self.find_user_model(id).await?.into();

        if let Some(name) = update.name {
            active.name = Set(name);
        }
        if let Some(currency) = update.currency {
            active.currency = Set(currency);
        }
        if let Some(enabled) = update.email_notifications {
            active.email_notifications = Set(enabled);
        }
        if let Some(enabled) = update.push_notifications {
            active.push_notifications = Set(enabled);
        }
        if let Some(threshold) = update.budget_alert_threshold {
            active.budget_alert_threshold = Set(i32::from(threshold));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&self.db).await?;
        Ok(user_from_model(updated))
    }

    pub async fn update_password_hash(&self, id: i64, password_hash: String) -> Result<()> {
        let mut active: user::ActiveModel = self.find_user_model(id).await?.into();
        active.password_hash = Set(password_hash);
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await?;
        Ok(())
    }
}
