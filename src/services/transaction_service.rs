//! Transactions: CRUD, filtered listing, summaries and export

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::errors::{FintrackError, Result};
use crate::services::budget_service::BudgetService;
use crate::storage::{
    Category, NewTransaction, SeaOrmStorage, Transaction, TransactionFilter, TransactionKind,
};
use crate::utils::money::validate_positive;
use crate::utils::validators::normalize_text;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;
/// Upper bound for `page`; keeps the SQL offset well inside i64
pub const MAX_PAGE: u64 = 1_000_000;
pub const DESCRIPTION_MAX: usize = 255;

/// Label used for transactions without a category
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone)]
pub struct TransactionRequest {
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub category_id: Option<i64>,
}

/// Clamp raw pagination parameters: page in 1..=MAX_PAGE, page_size in 1..=100
pub fn clamp_pagination(page: Option<u64>, page_size: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(1).clamp(1, MAX_PAGE);
    let page_size = page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    (page, page_size)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category_id: Option<i64>,
    pub name: String,
    pub kind: TransactionKind,
    pub total: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthTotal {
    /// `YYYY-MM`
    pub month: String,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionSummary {
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
    pub count: usize,
    pub by_category: Vec<CategoryTotal>,
    pub by_month: Vec<MonthTotal>,
}

/// Aggregate transactions into totals, per-category and per-month buckets
///
/// Category buckets are sorted by total descending; months ascending.
pub fn summarize(transactions: &[Transaction], categories: &[Category]) -> TransactionSummary {
    let names: HashMap<i64, &str> = categories.iter().map(|c| (c.id, c.name.as_str())).collect();

    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;
    let mut by_category: HashMap<(Option<i64>, TransactionKind), (Decimal, usize)> =
        HashMap::new();
    let mut by_month: BTreeMap<(i32, u32), (Decimal, Decimal)> = BTreeMap::new();

    for tx in transactions {
        let month = by_month
            .entry((tx.date.year(), tx.date.month()))
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        match tx.kind {
            TransactionKind::Income => {
                income += tx.amount;
                month.0 += tx.amount;
            }
            TransactionKind::Expense => {
                expense += tx.amount;
                month.1 += tx.amount;
            }
        }

        let bucket = by_category
            .entry((tx.category_id, tx.kind))
            .or_insert((Decimal::ZERO, 0));
        bucket.0 += tx.amount;
        bucket.1 += 1;
    }

    let mut by_category: Vec<CategoryTotal> = by_category
        .into_iter()
        .map(|((category_id, kind), (total, count))| CategoryTotal {
            category_id,
            name: category_id
                .and_then(|id| names.get(&id).copied())
                .unwrap_or(UNCATEGORIZED)
                .to_string(),
            kind,
            total,
            count,
        })
        .collect();
    by_category.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));

    let by_month = by_month
        .into_iter()
        .map(|((year, month), (income, expense))| MonthTotal {
            month: format!("{:04}-{:02}", year, month),
            income,
            expense,
            net: income - expense,
        })
        .collect();

    TransactionSummary {
        income,
        expense,
        net: income - expense,
        count: transactions.len(),
        by_category,
        by_month,
    }
}

pub struct TransactionService {
    storage: Arc<SeaOrmStorage>,
    budgets: Arc<BudgetService>,
}

impl TransactionService {
    pub fn new(storage: Arc<SeaOrmStorage>, budgets: Arc<BudgetService>) -> Self {
        Self { storage, budgets }
    }

    pub async fn list(
        &self,
        user_id: i64,
        filter: &TransactionFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<Transaction>, u64)> {
        validate_range(filter)?;
        self.storage
            .list_transactions(user_id, filter, page, page_size)
            .await
    }

    pub async fn get(&self, user_id: i64, id: i64) -> Result<Transaction> {
        self.storage
            .get_transaction(user_id, id)
            .await?
            .ok_or_else(|| FintrackError::not_found(format!("Transaction {} not found", id)))
    }

    pub async fn create(&self, user_id: i64, req: TransactionRequest) -> Result<Transaction> {
        let new = self.validate(user_id, req).await?;
        let tx = self.storage.create_transaction(user_id, &new).await?;
        self.after_write(user_id, &tx).await;
        Ok(tx)
    }

    pub async fn update(
        &self,
        user_id: i64,
        id: i64,
        req: TransactionRequest,
    ) -> Result<Transaction> {
        let new = self.validate(user_id, req).await?;
        let tx = self.storage.update_transaction(user_id, id, &new).await?;
        self.after_write(user_id, &tx).await;
        Ok(tx)
    }

    pub async fn delete(&self, user_id: i64, id: i64) -> Result<()> {
        self.storage.delete_transaction(user_id, id).await
    }

    pub async fn summary(
        &self,
        user_id: i64,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<TransactionSummary> {
        let filter = TransactionFilter {
            from,
            to,
            ..Default::default()
        };
        validate_range(&filter)?;

        let transactions = self.storage.find_transactions(user_id, &filter).await?;
        let categories = self.storage.list_categories(user_id, None).await?;
        Ok(summarize(&transactions, &categories))
    }

    /// Transactions for export with category names resolved, oldest first
    pub async fn export_rows(
        &self,
        user_id: i64,
        filter: &TransactionFilter,
    ) -> Result<Vec<(Transaction, Option<String>)>> {
        validate_range(filter)?;
        let mut transactions = self.storage.find_transactions(user_id, filter).await?;
        transactions.reverse();

        let names: HashMap<i64, String> = self
            .storage
            .list_categories(user_id, None)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        Ok(transactions
            .into_iter()
            .map(|tx| {
                let name = tx.category_id.and_then(|id| names.get(&id).cloned());
                (tx, name)
            })
            .collect())
    }

    async fn validate(&self, user_id: i64, req: TransactionRequest) -> Result<NewTransaction> {
        let amount = validate_positive(req.amount, "amount")?;
        let description = normalize_text(req.description.as_deref(), "description", DESCRIPTION_MAX)?;

        if let Some(category_id) = req.category_id {
            let category = self
                .storage
                .get_category(user_id, category_id)
                .await?
                .ok_or_else(|| {
                    FintrackError::not_found(format!("Category {} not found", category_id))
                })?;
            if category.kind != req.kind {
                return Err(FintrackError::validation(format!(
                    "Category \"{}\" is an {} category and cannot hold {} transactions",
                    category.name, category.kind, req.kind
                )));
            }
        }

        Ok(NewTransaction {
            category_id: req.category_id,
            kind: req.kind,
            amount,
            description,
            date: req.date,
        })
    }

    async fn after_write(&self, user_id: i64, tx: &Transaction) {
        if tx.kind != TransactionKind::Expense {
            return;
        }
        match self.storage.get_user(user_id).await {
            Ok(Some(user)) => {
                self.budgets
                    .check_alerts(&user, tx.category_id, tx.date)
                    .await
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to load user {} for budget alerts: {}", user_id, e),
        }
    }
}

fn validate_range(filter: &TransactionFilter) -> Result<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from > to
    {
        return Err(FintrackError::validation("'from' must not be after 'to'"));
    }
    Ok(())
}
