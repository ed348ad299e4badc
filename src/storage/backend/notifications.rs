//! 站内通知与推送订阅

use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ActiveValue::Set, ColumnTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

use super::SeaOrmStorage;
use super::converters::{collect_models, notification_from_model, subscription_from_model};
use crate::errors::{FintrackError, Result};
use crate::storage::models::{Notification, NotificationKind, PushSubscription};
use migration::entities::{notification, push_subscription};

impl SeaOrmStorage {
    pub async fn create_notification(
        &self,
        user_id: i64,
        kind: NotificationKind,
        title: &str,
        body: &str,
    ) -> Result<Notification> {
        let model = notification::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            kind: Set(kind.as_ref().to_string()),
            title: Set(title.to_string()),
            body: Set(body.to_string()),
            is_read: Set(false),
            created_at: Set(Utc::now()),
        };

        let db = &self.db;
        let inserted = self
            .retry
            .run("create_notification", || {
                let model = model.clone();
                async move { model.insert(db).await }
            })
            .await?;
        notification_from_model(inserted)
    }

    /// 最新优先
    pub async fn list_notifications(
        &self,
        user_id: i64,
        unread_only: bool,
        limit: u64,
    ) -> Result<Vec<Notification>> {
        let mut query =
            notification::Entity::find().filter(notification::Column::UserId.eq(user_id));
        if unread_only {
            query = query.filter(notification::Column::IsRead.eq(false));
        }

        let models = query
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?;
        collect_models(models, notification_from_model)
    }

    pub async fn unread_notification_count(&self, user_id: i64) -> Result<u64> {
        Ok(notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(&self.db)
            .await?)
    }

    pub async fn mark_notification_read(&self, user_id: i64, id: i64) -> Result<()> {
        let result = notification::Entity::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(notification::Column::Id.eq(id))
            .filter(notification::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(FintrackError::not_found(format!(
                "Notification {} not found",
                id
            )));
        }
        Ok(())
    }

    /// 返回本次标记的条数
    pub async fn mark_all_notifications_read(&self, user_id: i64) -> Result<u64> {
        let result = notification::Entity::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn delete_notification(&self, user_id: i64, id: i64) -> Result<()> {
        let result = notification::Entity::delete_many()
            .filter(notification::Column::Id.eq(id))
            .filter(notification::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(FintrackError::not_found(format!(
                "Notification {} not found",
                id
            )));
        }
        Ok(())
    }

    /// 按 endpoint 插入或更新订阅；同一浏览器换账号登录时归属转移到新用户
    pub async fn upsert_push_subscription(
        &self,
        user_id: i64,
        endpoint: &str,
        p256dh: &str,
        auth: &str,
    ) -> Result<PushSubscription> {
        let model = push_subscription::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            endpoint: Set(endpoint.to_string()),
            p256dh: Set(p256dh.to_string()),
            auth: Set(auth.to_string()),
            created_at: Set(Utc::now()),
        };

        push_subscription::Entity::insert(model)
            .on_conflict(
                OnConflict::column(push_subscription::Column::Endpoint)
                    .update_columns([
                        push_subscription::Column::UserId,
                        push_subscription::Column::P256dh,
                        push_subscription::Column::Auth,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;

        push_subscription::Entity::find()
            .filter(push_subscription::Column::Endpoint.eq(endpoint))
            .one(&self.db)
            .await?
            .map(subscription_from_model)
            .ok_or_else(|| FintrackError::internal("Subscription vanished after upsert"))
    }

    pub async fn list_push_subscriptions(&self, user_id: i64) -> Result<Vec<PushSubscription>> {
        let models = push_subscription::Entity::find()
            .filter(push_subscription::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(subscription_from_model).collect())
    }

    /// 用户主动取消订阅
    pub async fn delete_push_subscription(&self, user_id: i64, endpoint: &str) -> Result<()> {
        let result = push_subscription::Entity::delete_many()
            .filter(push_subscription::Column::UserId.eq(user_id))
            .filter(push_subscription::Column::Endpoint.eq(endpoint))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(FintrackError::not_found("Subscription not found"));
        }
        Ok(())
    }

    /// 推送服务报告订阅失效（404/410）时清理
    pub async fn prune_push_subscription(&self, id: i64) -> Result<()> {
        push_subscription::Entity::delete_by_id(id)
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
