//! 领域模型
//!
//! 存储层对外暴露的类型。金额统一为两位小数的 `Decimal`，
//! 枚举字段在数据库中以小写字符串保存。

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use ts_rs::TS;

use crate::api::services::types::TS_EXPORT_PATH;

/// 收入 / 支出
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    AsRefStr,
    Display,
    TS,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub enum TransactionKind {
    Income,
    Expense,
}

/// 分类类型与交易类型取值相同
pub type CategoryKind = TransactionKind;

/// 预算周期
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumString,
    AsRefStr,
    Display,
    TS,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub enum BudgetPeriod {
    Weekly,
    Monthly,
    Yearly,
}

/// 预算提醒级别，按严重程度排序
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AlertLevel {
    Warning,
    Exceeded,
}

/// 站内通知类型
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumString,
    AsRefStr,
    Display,
    TS,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub enum NotificationKind {
    BudgetWarning,
    BudgetExceeded,
    GoalReached,
    ImportCompleted,
    Welcome,
    Test,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub currency: String,
    pub email_notifications: bool,
    pub push_notifications: bool,
    pub budget_alert_threshold: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub currency: String,
}

/// 用户设置的部分更新，`None` 表示保持不变
#[derive(Debug, Clone, Default)]
pub struct UserSettingsUpdate {
    pub name: Option<String>,
    pub currency: Option<String>,
    pub email_notifications: Option<bool>,
    pub push_notifications: Option<bool>,
    pub budget_alert_threshold: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct Category {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub kind: CategoryKind,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub kind: CategoryKind,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub category_id: Option<i64>,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
    pub import_batch: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 新建 / 整体替换交易时的输入
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub category_id: Option<i64>,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
}

/// 导入批次：本批次需新建的分类与待写入的交易
///
/// `pending_category` 为 `categories` 中的下标，写入时替换为新分类的 id。
#[derive(Debug, Clone, Default)]
pub struct ImportBatch {
    pub categories: Vec<NewCategory>,
    pub rows: Vec<ImportBatchRow>,
}

#[derive(Debug, Clone)]
pub struct ImportBatchRow {
    pub transaction: NewTransaction,
    pub pending_category: Option<usize>,
}

impl ImportBatch {
    /// 用新分类的 id（与 `categories` 同序）补全交易的分类
    pub fn resolve(&self, category_ids: &[i64]) -> Vec<NewTransaction> {
        self.rows
            .iter()
            .map(|row| {
                let mut tx = row.transaction.clone();
                if let Some(index) = row.pending_category {
                    tx.category_id = category_ids.get(index).copied();
                }
                tx
            })
            .collect()
    }
}

/// 交易列表过滤条件
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// 起始日期（含）
    pub from: Option<NaiveDate>,
    /// 截止日期（含）
    pub to: Option<NaiveDate>,
    pub kind: Option<TransactionKind>,
    pub category_id: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Budget {
    pub id: i64,
    pub user_id: i64,
    pub category_id: Option<i64>,
    pub name: String,
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    /// 最近一次已发送提醒所属周期的起始日
    pub alert_period_start: Option<NaiveDate>,
    pub alert_level: Option<AlertLevel>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBudget {
    pub category_id: Option<i64>,
    pub name: String,
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct Goal {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub deadline: Option<NaiveDate>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGoal {
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PushSubscription {
    pub id: i64,
    pub user_id: i64,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_kind_parsing_is_case_insensitive() {
        assert_eq!(
            TransactionKind::from_str("Income").unwrap(),
            TransactionKind::Income
        );
        assert_eq!(
            TransactionKind::from_str("EXPENSE").unwrap(),
            TransactionKind::Expense
        );
        assert!(TransactionKind::from_str("transfer").is_err());
        assert_eq!(TransactionKind::Expense.as_ref(), "expense");
    }

    #[test]
    fn test_notification_kind_strings() {
        assert_eq!(NotificationKind::BudgetWarning.as_ref(), "budget_warning");
        assert_eq!(
            NotificationKind::from_str("import_completed").unwrap(),
            NotificationKind::ImportCompleted
        );
    }

    #[test]
    fn test_alert_level_ordering() {
        assert!(AlertLevel::Exceeded > AlertLevel::Warning);
        assert_eq!(AlertLevel::from_str("exceeded").unwrap(), AlertLevel::Exceeded);
    }
}
