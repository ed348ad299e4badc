//! Sea-ORM Model 与领域模型之间的转换

use std::str::FromStr;

use crate::errors::{FintrackError, Result};
use crate::storage::models::{
    AlertLevel, Budget, BudgetPeriod, Category, Goal, Notification, NotificationKind,
    PushSubscription, Transaction, TransactionKind, User,
};
use crate::utils::money::from_cents;
use migration::entities::{
    budget, category, goal, notification, push_subscription, transaction, user,
};

/// 解析数据库中保存的枚举字符串
fn parse_enum<T: FromStr>(value: &str, column: &str) -> Result<T> {
    T::from_str(value).map_err(|_| {
        FintrackError::database_operation(format!("Unexpected value '{}' in {}", value, column))
    })
}

pub fn user_from_model(model: user::Model) -> User {
    User {
        id: model.id,
        email: model.email,
        password_hash: model.password_hash,
        name: model.name,
        currency: model.currency,
        email_notifications: model.email_notifications,
        push_notifications: model.push_notifications,
        budget_alert_threshold: model.budget_alert_threshold.clamp(1, 100) as u8,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

pub fn category_from_model(model: category::Model) -> Result<Category> {
    Ok(Category {
        id: model.id,
        user_id: model.user_id,
        kind: parse_enum::<TransactionKind>(&model.kind, "categories.kind")?,
        name: model.name,
        color: model.color,
        icon: model.icon,
        created_at: model.created_at,
    })
}

pub fn transaction_from_model(model: transaction::Model) -> Result<Transaction> {
    Ok(Transaction {
        id: model.id,
        user_id: model.user_id,
        category_id: model.category_id,
        kind: parse_enum(&model.kind, "transactions.kind")?,
        amount: from_cents(model.amount_cents),
        description: model.description,
        date: model.date,
        import_batch: model.import_batch,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

pub fn budget_from_model(model: budget::Model) -> Result<Budget> {
    let alert_level = model
        .alert_level
        .as_deref()
        .map(|level| parse_enum::<AlertLevel>(level, "budgets.alert_level"))
        .transpose()?;

    Ok(Budget {
        id: model.id,
        user_id: model.user_id,
        category_id: model.category_id,
        period: parse_enum::<BudgetPeriod>(&model.period, "budgets.period")?,
        name: model.name,
        amount: from_cents(model.amount_cents),
        start_date: model.start_date,
        alert_period_start: model.alert_period_start,
        alert_level,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

pub fn goal_from_model(model: goal::Model) -> Goal {
    Goal {
        id: model.id,
        user_id: model.user_id,
        name: model.name,
        target_amount: from_cents(model.target_cents),
        current_amount: from_cents(model.current_cents),
        deadline: model.deadline,
        completed_at: model.completed_at,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

pub fn notification_from_model(model: notification::Model) -> Result<Notification> {
    Ok(Notification {
        id: model.id,
        user_id: model.user_id,
        kind: parse_enum::<NotificationKind>(&model.kind, "notifications.kind")?,
        title: model.title,
        body: model.body,
        is_read: model.is_read,
        created_at: model.created_at,
    })
}

pub fn subscription_from_model(model: push_subscription::Model) -> PushSubscription {
    PushSubscription {
        id: model.id,
        user_id: model.user_id,
        endpoint: model.endpoint,
        p256dh: model.p256dh,
        auth: model.auth,
        created_at: model.created_at,
    }
}

/// 批量转换，遇到第一条损坏数据即返回错误
pub fn collect_models<M, T>(models: Vec<M>, convert: fn(M) -> Result<T>) -> Result<Vec<T>> {
    models.into_iter().map(convert).collect()
}
