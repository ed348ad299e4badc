//! 交易记录的查询与写入

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ActiveValue::Set, ColumnTrait, Condition, EntityTrait,
    ExprTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, TransactionTrait,
};
use tracing::info;

use super::SeaOrmStorage;
use super::categories::{category_active_model, category_conflict};
use super::converters::{category_from_model, collect_models, transaction_from_model};
use crate::errors::{FintrackError, Result};
use crate::storage::models::{
    Category, ImportBatch, NewTransaction, Transaction, TransactionFilter, TransactionKind,
};
use crate::utils::money::to_cents;
use migration::entities::transaction;

/// 重复检测键：日期、金额（分）、类型、小写描述
pub type DuplicateKey = (NaiveDate, i64, TransactionKind, String);

pub fn duplicate_key(
    date: NaiveDate,
    amount_cents: i64,
    kind: TransactionKind,
    description: &str,
) -> DuplicateKey {
    (date, amount_cents, kind, description.trim().to_lowercase())
}

fn active_model(
    user_id: i64,
    tx: &NewTransaction,
    import_batch: Option<String>,
) -> Result<transaction::ActiveModel> {
    let now = Utc::now();
    Ok(transaction::ActiveModel {
        id: NotSet,
        user_id: Set(user_id),
        category_id: Set(tx.category_id),
        kind: Set(tx.kind.as_ref().to_string()),
        amount_cents: Set(to_cents(tx.amount)?),
        description: Set(tx.description.clone()),
        date: Set(tx.date),
        import_batch: Set(import_batch),
        created_at: Set(now),
        updated_at: Set(now),
    })
}

/// 转义 LIKE 通配符，使搜索词按字面匹配
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn filtered(user_id: i64, filter: &TransactionFilter) -> Select<transaction::Entity> {
    let mut condition = Condition::all().add(transaction::Column::UserId.eq(user_id));

    if let Some(from) = filter.from {
        condition = condition.add(transaction::Column::Date.gte(from));
    }
    if let Some(to) = filter.to {
        condition = condition.add(transaction::Column::Date.lte(to));
    }
    if let Some(kind) = filter.kind {
        condition = condition.add(transaction::Column::Kind.eq(kind.as_ref()));
    }
    if let Some(category_id) = filter.category_id {
        condition = condition.add(transaction::Column::CategoryId.eq(category_id));
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        // 各数据库 LIKE 大小写规则不同，统一转小写比较
        let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
        condition = condition.add(
            Expr::expr(Func::lower(Expr::col(transaction::Column::Description)))
                .like(LikeExpr::new(pattern).escape('\\')),
        );
    }

    transaction::Entity::find()
        .filter(condition)
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::Id)
}

impl SeaOrmStorage {
    /// 分页查询，返回 (当前页, 总数)；`page` 从 1 开始
    pub async fn list_transactions(
        &self,
        user_id: i64,
        filter: &TransactionFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<Transaction>, u64)> {
        let paginator = filtered(user_id, filter).paginate(&self.db, page_size);
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((collect_models(models, transaction_from_model)?, total))
    }

    /// 不分页的过滤查询（导出、汇总）
    pub async fn find_transactions(
        &self,
        user_id: i64,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        let models = filtered(user_id, filter).all(&self.db).await?;
        collect_models(models, transaction_from_model)
    }

    pub async fn get_transaction(&self, user_id: i64, id: i64) -> Result<Option<Transaction>> {
        transaction::Entity::find_by_id(id)
            .filter(transaction::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .map(transaction_from_model)
            .transpose()
    }

    pub async fn create_transaction(
        &self,
        user_id: i64,
        tx: &NewTransaction,
    ) -> Result<Transaction> {
        let model = active_model(user_id, tx, None)?;
        let db = &self.db;

        let inserted = self
            .retry
            .run("create_transaction", || {
                let model = model.clone();
                async move { model.insert(db).await }
            })
            .await?;
        transaction_from_model(inserted)
    }

    pub async fn update_transaction(
        &self,
        user_id: i64,
        id: i64,
        tx: &NewTransaction,
    ) -> Result<Transaction> {
        let existing = transaction::Entity::find_by_id(id)
            .filter(transaction::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| FintrackError::not_found(format!("Transaction {} not found", id)))?;

        let mut active: transaction::ActiveModel = existing.into();
        active.category_id = Set(tx.category_id);
        active.kind = Set(tx.kind.as_ref().to_string());
        active.amount_cents = Set(to_cents(tx.amount)?);
        active.description = Set(tx.description.clone());
        active.date = Set(tx.date);
        active.updated_at = Set(Utc::now());

        let updated = active.update(&self.db).await?;
        transaction_from_model(updated)
    }

    pub async fn delete_transaction(&self, user_id: i64, id: i64) -> Result<()> {
        let result = transaction::Entity::delete_many()
            .filter(transaction::Column::Id.eq(id))
            .filter(transaction::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(FintrackError::not_found(format!(
                "Transaction {} not found",
                id
            )));
        }
        Ok(())
    }

    /// `[start, end)` 内支出合计（分）；`category_id` 为 None 时统计全部支出
    pub async fn sum_expense_cents(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
        category_id: Option<i64>,
    ) -> Result<i64> {
        let mut query = transaction::Entity::find()
            .select_only()
            .column(transaction::Column::AmountCents)
            .filter(transaction::Column::UserId.eq(user_id))
            .filter(transaction::Column::Kind.eq(TransactionKind::Expense.as_ref()))
            .filter(transaction::Column::Date.gte(start))
            .filter(transaction::Column::Date.lt(end));
        if let Some(category_id) = category_id {
            query = query.filter(transaction::Column::CategoryId.eq(category_id));
        }

        // 逐行累加，避免各数据库 SUM 返回类型不一致
        let amounts: Vec<i64> = query.into_tuple::<i64>().all(&self.db).await?;
        let total: i128 = amounts.iter().map(|cents| i128::from(*cents)).sum();
        i64::try_from(total)
            .map_err(|_| FintrackError::internal(format!("Expense total out of range: {}", total)))
    }

    /// 日期区间 `[from, to]` 内已有交易的重复检测键
    pub async fn duplicate_keys_between(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<HashSet<DuplicateKey>> {
        let filter = TransactionFilter {
            from: Some(from),
            to: Some(to),
            ..Default::default()
        };
        let existing = filtered(user_id, &filter).all(&self.db).await?;

        let mut keys = HashSet::with_capacity(existing.len());
        for model in existing {
            let tx = transaction_from_model(model)?;
            keys.insert(duplicate_key(
                tx.date,
                to_cents(tx.amount)?,
                tx.kind,
                &tx.description,
            ));
        }
        Ok(keys)
    }

    /// 在单个数据库事务中创建批次所需分类并写入交易，任一失败则整体回滚
    ///
    /// 返回新建的分类，顺序与 `batch.categories` 一致。
    pub async fn insert_import_batch(
        &self,
        user_id: i64,
        batch: &ImportBatch,
        import_batch: &str,
    ) -> Result<Vec<Category>> {
        if batch.rows.is_empty() {
            return Ok(Vec::new());
        }

        let txn = self.db.begin().await?;

        let mut categories = Vec::with_capacity(batch.categories.len());
        for new in &batch.categories {
            let model = category_active_model(user_id, new.clone())
                .insert(&txn)
                .await
                .map_err(category_conflict)?;
            categories.push(category_from_model(model)?);
        }

        let category_ids: Vec<i64> = categories.iter().map(|c| c.id).collect();
        let models = batch
            .resolve(&category_ids)
            .iter()
            .map(|tx| active_model(user_id, tx, Some(import_batch.to_string())))
            .collect::<Result<Vec<_>>>()?;

        // SQLite 单条语句的绑定参数有上限，分块写入
        for chunk in models.chunks(500) {
            transaction::Entity::insert_many(chunk.to_vec())
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;

        info!(
            "Imported {} transactions and {} new categories for user {} (batch {})",
            batch.rows.len(),
            categories.len(),
            user_id,
            import_batch
        );
        Ok(categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("coffee"), "coffee");
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_duplicate_key_normalizes_description() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert_eq!(
            duplicate_key(date, 100, TransactionKind::Expense, "  Coffee "),
            duplicate_key(date, 100, TransactionKind::Expense, "coffee")
        );
        assert_ne!(
            duplicate_key(date, 100, TransactionKind::Expense, "coffee"),
            duplicate_key(date, 100, TransactionKind::Income, "coffee")
        );
    }
}
