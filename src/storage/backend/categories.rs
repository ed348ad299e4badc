use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ActiveValue::Set, ColumnTrait, EntityTrait,
    QueryFilter, QueryOrder, TransactionTrait, Value,
};
use tracing::debug;

use super::SeaOrmStorage;
use super::converters::{category_from_model, collect_models};
use crate::errors::{FintrackError, Result};
use crate::storage::models::{Category, CategoryKind, NewCategory};
use migration::entities::{budget, category, transaction};

/// 新用户的默认分类：(名称, 类型, 颜色)
pub const DEFAULT_CATEGORIES: &[(&str, CategoryKind, &str)] = &[
    ("Salary", CategoryKind::Income, "#2e7d32"),
    ("Other income", CategoryKind::Income, "#66bb6a"),
    ("Food", CategoryKind::Expense, "#ef6c00"),
    ("Housing", CategoryKind::Expense, "#6d4c41"),
    ("Transport", CategoryKind::Expense, "#1565c0"),
    ("Utilities", CategoryKind::Expense, "#00838f"),
    ("Entertainment", CategoryKind::Expense, "#8e24aa"),
    ("Health", CategoryKind::Expense, "#c62828"),
    ("Other", CategoryKind::Expense, "#757575"),
];

impl SeaOrmStorage {
    pub async fn list_categories(
        &self,
        user_id: i64,
        kind: Option<CategoryKind>,
    ) -> Result<Vec<Category>> {
        let mut query = category::Entity::find().filter(category::Column::UserId.eq(user_id));
        if let Some(kind) = kind {
            query = query.filter(category::Column::Kind.eq(kind.as_ref()));
        }

        let models = query
            .order_by_asc(category::Column::Kind)
            .order_by_asc(category::Column::Name)
            .all(&self.db)
            .await?;
        collect_models(models, category_from_model)
    }

    /// 只返回属于该用户的分类
    pub async fn get_category(&self, user_id: i64, id: i64) -> Result<Option<Category>> {
        category::Entity::find_by_id(id)
            .filter(category::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .map(category_from_model)
            .transpose()
    }

    /// 按名称查找（大小写不敏感）
    pub async fn find_category_by_name(
        &self,
        user_id: i64,
        kind: CategoryKind,
        name: &str,
    ) -> Result<Option<Category>> {
        let wanted = name.trim().to_lowercase();
        Ok(self
            .list_categories(user_id, Some(kind))
            .await?
            .into_iter()
            .find(|c| c.name.to_lowercase() == wanted))
    }

    pub async fn create_category(&self, user_id: i64, new: NewCategory) -> Result<Category> {
        let inserted = category_active_model(user_id, new)
            .insert(&self.db)
            .await
            .map_err(category_conflict)?;
        category_from_model(inserted)
    }

    pub async fn update_category(
        &self,
        user_id: i64,
        id: i64,
        update: NewCategory,
    ) -> Result<Category> {
        let existing = category::Entity::find_by_id(id)
            .filter(category::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| FintrackError::not_found(format!("Category {} not found", id)))?;

        let mut active: category::ActiveModel = existing.into();
        active.name = Set(update.name);
        active.kind = Set(update.kind.as_ref().to_string());
        active.color = Set(update.color);
        active.icon = Set(update.icon);

        let updated = active.update(&self.db).await.map_err(category_conflict)?;
        category_from_model(updated)
    }

    /// 删除分类，关联的交易与预算解除分类而不删除
    pub async fn delete_category(&self, user_id: i64, id: i64) -> Result<()> {
        let txn = self.db.begin().await?;

        let detached = transaction::Entity::update_many()
            .col_expr(transaction::Column::CategoryId, Expr::value(Value::BigInt(None)))
            .filter(transaction::Column::UserId.eq(user_id))
            .filter(transaction::Column::CategoryId.eq(id))
            .exec(&txn)
            .await?;

        budget::Entity::update_many()
            .col_expr(budget::Column::CategoryId, Expr::value(Value::BigInt(None)))
            .filter(budget::Column::UserId.eq(user_id))
            .filter(budget::Column::CategoryId.eq(id))
            .exec(&txn)
            .await?;

        let deleted = category::Entity::delete_many()
            .filter(category::Column::Id.eq(id))
            .filter(category::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;

        if deleted.rows_affected == 0 {
            txn.rollback().await?;
            return Err(FintrackError::not_found(format!("Category {} not found", id)));
        }

        txn.commit().await?;
        debug!(
            "Category {} deleted, {} transactions detached",
            id, detached.rows_affected
        );
        Ok(())
    }

    pub async fn create_default_categories(&self, user_id: i64) -> Result<()> {
        let now = Utc::now();
        let models = DEFAULT_CATEGORIES
            .iter()
            .map(|(name, kind, color)| category::ActiveModel {
                id: NotSet,
                user_id: Set(user_id),
                name: Set(name.to_string()),
                kind: Set(kind.as_ref().to_string()),
                color: Set(Some(color.to_string())),
                icon: Set(None),
                created_at: Set(now),
            });

        category::Entity::insert_many(models).exec(&self.db).await?;
        Ok(())
    }
}

pub(super) fn category_active_model(user_id: i64, new: NewCategory) -> category::ActiveModel {
    category::ActiveModel {
        id: NotSet,
        user_id: Set(user_id),
        name: Set(new.name),
        kind: Set(new.kind.as_ref().to_string()),
        color: Set(new.color),
        icon: Set(new.icon),
        created_at: Set(Utc::now()),
    }
}

pub(super) fn category_conflict(err: sea_orm::DbErr) -> FintrackError {
    match FintrackError::from(err) {
        FintrackError::Conflict(_) => {
            FintrackError::conflict("A category with this name and kind already exists")
        }
        other => other,
    }
}
