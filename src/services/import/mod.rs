//! 交易导入（CSV / XLSX / XLS / ODS）
//!
//! 流程：读取为二维表 → 映射表头 → 逐行转换 → 解析分类 → 去重 → 单事务写入。
//! 行级错误只记录在报告里，不会中断整个批次。

pub mod coercion;
pub mod mapping;
pub mod reader;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use crate::api::services::types::TS_EXPORT_PATH;
use crate::errors::{FintrackError, Result};
use crate::services::budget_service::BudgetService;
use crate::services::notification::{NotificationEvent, NotificationService};
use crate::services::transaction_service::DESCRIPTION_MAX;
use crate::storage::{
    ImportBatch, ImportBatchRow, NewCategory, NewTransaction, SeaOrmStorage, TransactionKind,
    User, duplicate_key,
};
use crate::utils::money::{MAX_AMOUNT, to_cents};

use coercion::{parse_amount, parse_date, parse_kind};
use mapping::ColumnMap;
use reader::{Cell, RawTable, detect_format, read_table};

use crate::services::category_service::CATEGORY_NAME_MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// 没有类型列且金额为正时使用的类型
    pub default_kind: Option<TransactionKind>,
    pub create_categories: bool,
    pub skip_duplicates: bool,
    pub dry_run: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            default_kind: None,
            create_categories: true,
            skip_duplicates: true,
            dry_run: false,
        }
    }
}

/// 行级错误，`row` 从 1 开始计数且表头为第 1 行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ImportReport {
    /// 非空数据行数
    pub total: usize,
    pub imported: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<RowError>,
    pub dry_run: bool,
}

/// 转换成功的一行，金额已取绝对值
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub row: usize,
    pub date: NaiveDate,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub description: String,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub total: usize,
    pub rows: Vec<ParsedRow>,
    pub errors: Vec<RowError>,
}

/// 把原始表转换为交易行
///
/// 空行被忽略且不计入 `total`；超过 `max_rows` 的行记为错误。
pub fn parse_rows(table: &RawTable, options: &ImportOptions, max_rows: usize) -> ParseOutcome {
    let columns = ColumnMap::from_headers(&table.headers);
    let missing = columns.missing_required();
    let mut outcome = ParseOutcome::default();

    for (index, cells) in table.rows.iter().enumerate() {
        if cells.iter().all(Cell::is_empty) {
            continue;
        }
        let row = index + 2;
        outcome.total += 1;

        let result = if outcome.total > max_rows {
            Err(format!("Row limit of {} exceeded", max_rows))
        } else if !missing.is_empty() {
            Err(format!("Missing required column: {}", missing.join(", ")))
        } else {
            parse_row(row, cells, &columns, options)
        };

        match result {
            Ok(parsed) => outcome.rows.push(parsed),
            Err(message) => outcome.errors.push(RowError { row, message }),
        }
    }

    outcome
}

fn cell(cells: &[Cell], index: Option<usize>) -> &Cell {
    index.and_then(|i| cells.get(i)).unwrap_or(&Cell::Empty)
}

/// 非空且非零时返回金额
fn split_amount(c: &Cell) -> std::result::Result<Option<Decimal>, String> {
    if c.is_empty() {
        return Ok(None);
    }
    let amount = parse_amount(c)?.abs();
    Ok((!amount.is_zero()).then_some(amount))
}

fn parse_row(
    row: usize,
    cells: &[Cell],
    columns: &ColumnMap,
    options: &ImportOptions,
) -> std::result::Result<ParsedRow, String> {
    let date = parse_date(cell(cells, columns.date))?;

    // 带符号金额与由列推断出的类型
    let amount_cell = cell(cells, columns.amount);
    let (signed, column_kind) = if !amount_cell.is_empty() || !columns.has_split_amount() {
        (parse_amount(amount_cell)?, None)
    } else {
        let debit = split_amount(cell(cells, columns.debit))?;
        let credit = split_amount(cell(cells, columns.credit))?;
        match (debit, credit) {
            (Some(_), Some(_)) => return Err("Both debit and credit are set".to_string()),
            (Some(d), None) => (d, Some(TransactionKind::Expense)),
            (None, Some(c)) => (c, Some(TransactionKind::Income)),
            (None, None) => return Err("Amount is required".to_string()),
        }
    };

    let amount = signed.abs();
    if amount.is_zero() {
        return Err("Amount must not be zero".to_string());
    }
    if amount > MAX_AMOUNT {
        return Err(format!("Amount must not exceed {}", MAX_AMOUNT));
    }

    let kind_cell = cell(cells, columns.kind);
    let kind = if !kind_cell.is_empty() {
        let text = kind_cell.as_text();
        parse_kind(&text).ok_or_else(|| format!("Unknown transaction type '{}'", text))?
    } else if let Some(kind) = column_kind {
        kind
    } else if signed.is_sign_negative() {
        TransactionKind::Expense
    } else {
        options.default_kind.unwrap_or(TransactionKind::Income)
    };

    let description: String = cell(cells, columns.description)
        .as_text()
        .chars()
        .take(DESCRIPTION_MAX)
        .collect();

    let category = Some(cell(cells, columns.category).as_text()).filter(|c| !c.is_empty());
    if let Some(name) = &category
        && name.chars().count() > CATEGORY_NAME_MAX
    {
        return Err(format!(
            "Category name must be at most {} characters",
            CATEGORY_NAME_MAX
        ));
    }

    Ok(ParsedRow {
        row,
        date,
        kind,
        amount,
        description,
        category,
    })
}

pub struct ImportService {
    storage: Arc<SeaOrmStorage>,
    budgets: Arc<BudgetService>,
    notifications: Arc<NotificationService>,
    max_rows: usize,
}

impl ImportService {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        budgets: Arc<BudgetService>,
        notifications: Arc<NotificationService>,
        max_rows: usize,
    ) -> Self {
        Self {
            storage,
            budgets,
            notifications,
            max_rows,
        }
    }

    pub async fn import(
        &self,
        user_id: i64,
        bytes: Vec<u8>,
        filename: Option<String>,
        options: ImportOptions,
    ) -> Result<ImportReport> {
        let user = self
            .storage
            .get_user(user_id)
            .await?
            .ok_or_else(|| FintrackError::not_found("User not found"))?;

        // 解析文件是 CPU 密集操作，放到阻塞线程池
        let table = tokio::task::spawn_blocking(move || {
            let format = detect_format(filename.as_deref(), &bytes)?;
            read_table(format, &bytes)
        })
        .await
        .map_err(|e| FintrackError::internal(format!("Import parser task failed: {}", e)))??;

        let parsed = parse_rows(&table, &options, self.max_rows);
        let total = parsed.total;
        let mut errors = parsed.errors;
        debug!(
            "Parsed import for user {}: {} rows, {} errors",
            user_id,
            parsed.rows.len(),
            errors.len()
        );

        let rows = self
            .resolve_categories(user_id, parsed.rows, &options, &mut errors)
            .await?;

        let (rows, skipped) = if options.skip_duplicates {
            self.drop_duplicates(user_id, rows).await?
        } else {
            (rows, 0)
        };
        // 只为最终保留的行创建分类
        let batch = build_batch(rows);

        errors.sort_by_key(|e| e.row);
        let failed = errors.len();

        let imported = if options.dry_run || batch.rows.is_empty() {
            batch.rows.len()
        } else {
            let batch_id = uuid::Uuid::new_v4().to_string();
            let created = self
                .storage
                .insert_import_batch(user_id, &batch, &batch_id)
                .await?;
            for category in &created {
                info!(
                    "Created {} category '{}' during import for user {}",
                    category.kind, category.name, user_id
                );
            }
            let inserted = batch.rows.len();

            self.notifications
                .notify_quietly(
                    &user,
                    NotificationEvent::ImportCompleted {
                        imported: inserted,
                        skipped,
                        failed,
                    },
                )
                .await;
            let category_ids: Vec<i64> = created.iter().map(|c| c.id).collect();
            self.check_budgets(&user, &batch.resolve(&category_ids)).await;
            inserted
        };

        info!(
            "Import for user {}: total={}, imported={}, skipped={}, failed={}, dry_run={}",
            user_id, total, imported, skipped, failed, options.dry_run
        );

        Ok(ImportReport {
            total,
            imported,
            skipped,
            failed,
            errors,
            dry_run: options.dry_run,
        })
    }

    /// 分类名称 → 已有分类 id；缺失的分类记为待创建（不写库）
    async fn resolve_categories(
        &self,
        user_id: i64,
        rows: Vec<ParsedRow>,
        options: &ImportOptions,
        errors: &mut Vec<RowError>,
    ) -> Result<Vec<(ParsedRow, CategoryRef)>> {
        let known: HashMap<(TransactionKind, String), i64> = self
            .storage
            .list_categories(user_id, None)
            .await?
            .into_iter()
            .map(|c| ((c.kind, c.name.to_lowercase()), c.id))
            .collect();

        let mut resolved = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(name) = row.category.clone() else {
                resolved.push((row, CategoryRef::Existing(None)));
                continue;
            };

            if let Some(id) = known.get(&(row.kind, name.to_lowercase())) {
                resolved.push((row, CategoryRef::Existing(Some(*id))));
            } else if options.create_categories {
                resolved.push((row, CategoryRef::Missing(name)));
            } else {
                errors.push(RowError {
                    row: row.row,
                    message: format!("Category '{}' does not exist", name),
                });
            }
        }

        Ok(resolved)
    }

    /// 去掉与已有交易或文件中前面行重复的行，返回保留行和跳过数
    async fn drop_duplicates(
        &self,
        user_id: i64,
        rows: Vec<(ParsedRow, CategoryRef)>,
    ) -> Result<(Vec<(ParsedRow, CategoryRef)>, usize)> {
        let (Some(from), Some(to)) = (
            rows.iter().map(|(r, _)| r.date).min(),
            rows.iter().map(|(r, _)| r.date).max(),
        ) else {
            return Ok((Vec::new(), 0));
        };

        let existing = self.storage.duplicate_keys_between(user_id, from, to).await?;
        let mut seen = HashSet::with_capacity(rows.len());
        let mut kept = Vec::with_capacity(rows.len());
        let mut skipped = 0;

        for (row, category) in rows {
            let key = duplicate_key(row.date, to_cents(row.amount)?, row.kind, &row.description);
            if existing.contains(&key) || !seen.insert(key) {
                skipped += 1;
                continue;
            }
            kept.push((row, category));
        }

        Ok((kept, skipped))
    }

    /// 每个支出分类按最晚日期检查一次预算
    async fn check_budgets(&self, user: &User, rows: &[NewTransaction]) {
        let mut latest: BTreeMap<Option<i64>, NaiveDate> = BTreeMap::new();
        for tx in rows.iter().filter(|t| t.kind == TransactionKind::Expense) {
            let entry = latest.entry(tx.category_id).or_insert(tx.date);
            if tx.date > *entry {
                *entry = tx.date;
            }
        }

        for (category_id, date) in latest {
            self.budgets.check_alerts(user, category_id, date).await;
        }
    }
}

/// 行的分类：已有分类（或无分类），或需要在写入时新建的分类名
#[derive(Debug, Clone, PartialEq, Eq)]
enum CategoryRef {
    Existing(Option<i64>),
    Missing(String),
}

/// 组装写入批次，同名（不区分大小写）同类型的缺失分类只创建一次
fn build_batch(rows: Vec<(ParsedRow, CategoryRef)>) -> ImportBatch {
    let mut batch = ImportBatch::default();
    let mut pending: HashMap<(TransactionKind, String), usize> = HashMap::new();

    for (row, category) in rows {
        let (category_id, pending_category) = match category {
            CategoryRef::Existing(id) => (id, None),
            CategoryRef::Missing(name) => {
                let index = *pending
                    .entry((row.kind, name.to_lowercase()))
                    .or_insert_with(|| {
                        batch.categories.push(NewCategory {
                            name,
                            kind: row.kind,
                            color: None,
                            icon: None,
                        });
                        batch.categories.len() - 1
                    });
                (None, Some(index))
            }
        };

        batch.rows.push(ImportBatchRow {
            transaction: NewTransaction {
                category_id,
                kind: row.kind,
                amount: row.amount,
                description: row.description,
                date: row.date,
            },
            pending_category,
        });
    }

    batch
}
