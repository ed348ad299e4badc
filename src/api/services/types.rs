//! API 类型定义

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::services::{
    BudgetProgress, BudgetStatus, CategoryTotal, MonthTotal, TransactionSummary, progress_percent,
};
use crate::storage::{
    Budget, BudgetPeriod, Category, CategoryKind, Goal, Notification, NotificationKind,
    Transaction, TransactionKind, User,
};

/// 输出目录常量
pub const TS_EXPORT_PATH: &str = "../web/src/api/types.generated.ts";

/// 统一响应信封
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: Option<T>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PaginatedResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: Vec<T>,
    pub pagination: PaginationInfo,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct PaginationInfo {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl PaginationInfo {
    pub fn new(page: u64, page_size: u64, total: u64) -> Self {
        Self {
            page,
            page_size,
            total,
            total_pages: total.div_ceil(page_size.max(1)),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct MessageResponse {
    pub message: String,
}

// ============ 认证 ============

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct RegisterBody {
    pub email: String,
    pub password: String,
    pub name: String,
    pub currency: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct RefreshBody {
    pub refresh_token: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// access token 有效期（秒）
    pub expires_in: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub currency: String,
    pub email_notifications: bool,
    pub push_notifications: bool,
    pub budget_alert_threshold: u8,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            currency: user.currency,
            email_notifications: user.email_notifications,
            push_notifications: user.push_notifications,
            budget_alert_threshold: user.budget_alert_threshold,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

// ============ 设置 ============

#[derive(Serialize, Deserialize, Clone, Debug, Default, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct SettingsBody {
    pub name: Option<String>,
    pub currency: Option<String>,
    pub email_notifications: Option<bool>,
    pub push_notifications: Option<bool>,
    pub budget_alert_threshold: Option<i64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ChangePasswordBody {
    pub current_password: String,
    pub new_password: String,
}

// ============ 分类 ============

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct CategoryBody {
    pub name: String,
    pub kind: CategoryKind,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct CategoryQuery {
    pub kind: Option<CategoryKind>,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
    pub kind: CategoryKind,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub created_at: String,
}

impl From<Category> for CategoryResponse {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            kind: c.kind,
            color: c.color,
            icon: c.icon,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

// ============ 交易 ============

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct TransactionBody {
    pub kind: TransactionKind,
    #[ts(type = "string")]
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub category_id: Option<i64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct TransactionQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub kind: Option<TransactionKind>,
    pub category_id: Option<i64>,
    pub search: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct TransactionResponse {
    pub id: i64,
    pub kind: TransactionKind,
    #[ts(type = "string")]
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: String,
    pub category_id: Option<i64>,
    pub import_batch: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Transaction> for TransactionResponse {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id,
            kind: tx.kind,
            amount: tx.amount,
            date: tx.date,
            description: tx.description,
            category_id: tx.category_id,
            import_batch: tx.import_batch,
            created_at: tx.created_at.to_rfc3339(),
            updated_at: tx.updated_at.to_rfc3339(),
        }
    }
}

/// 汇总与导出共用的日期区间
#[derive(Serialize, Deserialize, Clone, Debug, Default, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct DateRangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct CategoryTotalResponse {
    pub category_id: Option<i64>,
    pub name: String,
    pub kind: TransactionKind,
    #[ts(type = "string")]
    pub total: Decimal,
    pub count: usize,
}

impl From<CategoryTotal> for CategoryTotalResponse {
    fn from(t: CategoryTotal) -> Self {
        Self {
            category_id: t.category_id,
            name: t.name,
            kind: t.kind,
            total: t.total,
            count: t.count,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct MonthTotalResponse {
    pub month: String,
    #[ts(type = "string")]
    pub income: Decimal,
    #[ts(type = "string")]
    pub expense: Decimal,
    #[ts(type = "string")]
    pub net: Decimal,
}

impl From<MonthTotal> for MonthTotalResponse {
    fn from(m: MonthTotal) -> Self {
        Self {
            month: m.month,
            income: m.income,
            expense: m.expense,
            net: m.net,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct SummaryResponse {
    #[ts(type = "string")]
    pub income: Decimal,
    #[ts(type = "string")]
    pub expense: Decimal,
    #[ts(type = "string")]
    pub net: Decimal,
    pub count: usize,
    pub by_category: Vec<CategoryTotalResponse>,
    pub by_month: Vec<MonthTotalResponse>,
}

impl From<TransactionSummary> for SummaryResponse {
    fn from(s: TransactionSummary) -> Self {
        Self {
            income: s.income,
            expense: s.expense,
            net: s.net,
            count: s.count,
            by_category: s.by_category.into_iter().map(Into::into).collect(),
            by_month: s.by_month.into_iter().map(Into::into).collect(),
        }
    }
}

// ============ 预算 ============

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct BudgetBody {
    pub name: String,
    #[ts(type = "string")]
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub category_id: Option<i64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ProgressQuery {
    /// 参考日期，默认今天
    pub date: Option<NaiveDate>,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct BudgetProgressResponse {
    pub period_start: NaiveDate,
    /// 不含
    pub period_end: NaiveDate,
    #[ts(type = "string")]
    pub spent: Decimal,
    #[ts(type = "string")]
    pub remaining: Decimal,
    #[ts(type = "string")]
    pub percent: Decimal,
    pub status: BudgetStatus,
}

impl From<BudgetProgress> for BudgetProgressResponse {
    fn from(p: BudgetProgress) -> Self {
        Self {
            period_start: p.window.start,
            period_end: p.window.end,
            spent: p.spent,
            remaining: p.remaining,
            percent: p.percent,
            status: p.status,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct BudgetResponse {
    pub id: i64,
    pub name: String,
    #[ts(type = "string")]
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub category_id: Option<i64>,
    pub progress: BudgetProgressResponse,
    pub created_at: String,
    pub updated_at: String,
}

impl BudgetResponse {
    pub fn new(budget: Budget, progress: BudgetProgress) -> Self {
        Self {
            id: budget.id,
            name: budget.name,
            amount: budget.amount,
            period: budget.period,
            start_date: budget.start_date,
            category_id: budget.category_id,
            progress: progress.into(),
            created_at: budget.created_at.to_rfc3339(),
            updated_at: budget.updated_at.to_rfc3339(),
        }
    }
}

// ============ 储蓄目标 ============

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct GoalBody {
    pub name: String,
    #[ts(type = "string")]
    pub target_amount: Decimal,
    #[ts(type = "string | null")]
    pub current_amount: Option<Decimal>,
    pub deadline: Option<NaiveDate>,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ContributeBody {
    /// 负数表示取出
    #[ts(type = "string")]
    pub amount: Decimal,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct GoalResponse {
    pub id: i64,
    pub name: String,
    #[ts(type = "string")]
    pub target_amount: Decimal,
    #[ts(type = "string")]
    pub current_amount: Decimal,
    pub deadline: Option<NaiveDate>,
    #[ts(type = "string")]
    pub progress_percent: Decimal,
    pub completed: bool,
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Goal> for GoalResponse {
    fn from(goal: Goal) -> Self {
        Self {
            progress_percent: progress_percent(&goal),
            completed: goal.completed_at.is_some(),
            completed_at: goal.completed_at.map(|t| t.to_rfc3339()),
            id: goal.id,
            name: goal.name,
            target_amount: goal.target_amount,
            current_amount: goal.current_amount,
            deadline: goal.deadline,
            created_at: goal.created_at.to_rfc3339(),
            updated_at: goal.updated_at.to_rfc3339(),
        }
    }
}

// ============ 通知 ============

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct NotificationQuery {
    pub unread_only: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct NotificationResponse {
    pub id: i64,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub read: bool,
    pub created_at: String,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            kind: n.kind,
            title: n.title,
            body: n.body,
            read: n.is_read,
            created_at: n.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct UnreadCountResponse {
    pub count: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// 浏览器 `PushSubscription.toJSON()` 的结构
#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct SubscriptionBody {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct UnsubscribeBody {
    pub endpoint: String,
}

// ============ 健康检查 ============

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct HealthDatabaseCheck {
    pub status: String,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct HealthChecks {
    pub database: HealthDatabaseCheck,
}

#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    /// 运行时长（秒）
    pub uptime: u64,
    pub checks: HealthChecks,
    pub response_time_ms: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{ImportReport, RowError};

    #[test]
    fn test_pagination_total_pages() {
        assert_eq!(PaginationInfo::new(1, 20, 0).total_pages, 0);
        assert_eq!(PaginationInfo::new(1, 20, 20).total_pages, 1);
        assert_eq!(PaginationInfo::new(2, 20, 41).total_pages, 3);
    }

    #[test]
    fn test_transaction_body_accepts_numbers_and_strings() {
        let from_number: TransactionBody = serde_json::from_value(serde_json::json!({
            "kind": "expense",
            "amount": 12.5,
            "date": "2025-03-01",
        }))
        .unwrap();
        assert_eq!(from_number.amount, Decimal::new(125, 1));

        let from_string: TransactionBody = serde_json::from_value(serde_json::json!({
            "kind": "income",
            "amount": "1000.00",
            "date": "2025-03-01",
            "category_id": 4,
        }))
        .unwrap();
        assert_eq!(from_string.amount, Decimal::new(100_000, 2));
        assert_eq!(from_string.category_id, Some(4));
    }

    #[test]
    fn export_typescript_types() {
        // 运行此测试会自动生成 TypeScript 类型文件
        // cargo test export_typescript_types -- --nocapture
        let cfg = ts_rs::Config::from_env();
        PaginationInfo::export_all(&cfg).expect("Failed to export PaginationInfo");
        MessageResponse::export_all(&cfg).expect("Failed to export MessageResponse");
        RegisterBody::export_all(&cfg).expect("Failed to export RegisterBody");
        LoginCredentials::export_all(&cfg).expect("Failed to export LoginCredentials");
        RefreshBody::export_all(&cfg).expect("Failed to export RefreshBody");
        TokenResponse::export_all(&cfg).expect("Failed to export TokenResponse");
        UserResponse::export_all(&cfg).expect("Failed to export UserResponse");
        SettingsBody::export_all(&cfg).expect("Failed to export SettingsBody");
        ChangePasswordBody::export_all(&cfg).expect("Failed to export ChangePasswordBody");
        CategoryBody::export_all(&cfg).expect("Failed to export CategoryBody");
        CategoryResponse::export_all(&cfg).expect("Failed to export CategoryResponse");
        TransactionBody::export_all(&cfg).expect("Failed to export TransactionBody");
        TransactionQuery::export_all(&cfg).expect("Failed to export TransactionQuery");
        TransactionResponse::export_all(&cfg).expect("Failed to export TransactionResponse");
        DateRangeQuery::export_all(&cfg).expect("Failed to export DateRangeQuery");
        SummaryResponse::export_all(&cfg).expect("Failed to export SummaryResponse");
        BudgetBody::export_all(&cfg).expect("Failed to export BudgetBody");
        BudgetResponse::export_all(&cfg).expect("Failed to export BudgetResponse");
        GoalBody::export_all(&cfg).expect("Failed to export GoalBody");
        ContributeBody::export_all(&cfg).expect("Failed to export ContributeBody");
        GoalResponse::export_all(&cfg).expect("Failed to export GoalResponse");
        NotificationResponse::export_all(&cfg).expect("Failed to export NotificationResponse");
        UnreadCountResponse::export_all(&cfg).expect("Failed to export UnreadCountResponse");
        SubscriptionBody::export_all(&cfg).expect("Failed to export SubscriptionBody");
        UnsubscribeBody::export_all(&cfg).expect("Failed to export UnsubscribeBody");
        ImportReport::export_all(&cfg).expect("Failed to export ImportReport");
        RowError::export_all(&cfg).expect("Failed to export RowError");
        HealthResponse::export_all(&cfg).expect("Failed to export HealthResponse");

        println!("TypeScript types exported to {}", TS_EXPORT_PATH);
    }
}
