//! Budgets and period-bucketed progress
//!
//! A budget's periods are anchored at its `start_date`; progress is always
//! computed for the window containing a reference date. Alerts fire at most
//! once per level per window.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::api::services::types::TS_EXPORT_PATH;
use crate::errors::{FintrackError, Result};
use crate::services::notification::{NotificationEvent, NotificationService};
use crate::storage::{
    AlertLevel, Budget, BudgetPeriod, CategoryKind, NewBudget, SeaOrmStorage, User,
};
use crate::utils::money::{from_cents, percent_of, validate_positive};
use crate::utils::period::{PeriodWindow, period_window};
use crate::utils::validators::normalize_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub enum BudgetStatus {
    OnTrack,
    Warning,
    Exceeded,
}

impl BudgetStatus {
    /// `threshold` is the user's warning percentage (1..=100)
    pub fn from_percent(percent: Decimal, threshold: u8) -> Self {
        if percent >= Decimal::ONE_HUNDRED {
            BudgetStatus::Exceeded
        } else if percent >= Decimal::from(threshold) {
            BudgetStatus::Warning
        } else {
            BudgetStatus::OnTrack
        }
    }

    pub fn alert_level(self) -> Option<AlertLevel> {
        match self {
            BudgetStatus::OnTrack => None,
            BudgetStatus::Warning => Some(AlertLevel::Warning),
            BudgetStatus::Exceeded => Some(AlertLevel::Exceeded),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetProgress {
    pub window: PeriodWindow,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub percent: Decimal,
    pub status: BudgetStatus,
}

impl BudgetProgress {
    pub fn compute(window: PeriodWindow, limit: Decimal, spent: Decimal, threshold: u8) -> Self {
        let percent = percent_of(spent, limit);
        Self {
            window,
            spent,
            remaining: limit - spent,
            percent,
            status: BudgetStatus::from_percent(percent, threshold),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BudgetRequest {
    pub name: String,
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub category_id: Option<i64>,
}

pub struct BudgetService {
    storage: Arc<SeaOrmStorage>,
    notifications: Arc<NotificationService>,
}

impl BudgetService {
    pub fn new(storage: Arc<SeaOrmStorage>, notifications: Arc<NotificationService>) -> Self {
        Self {
            storage,
            notifications,
        }
    }

    pub async fn list_with_progress(
        &self,
        user: &User,
        on: NaiveDate,
    ) -> Result<Vec<(Budget, BudgetProgress)>> {
        let budgets = self.storage.list_budgets(user.id).await?;
        let mut out = Vec::with_capacity(budgets.len());
        for budget in budgets {
            let progress = self.progress(user, &budget, on).await?;
            out.push((budget, progress));
        }
        Ok(out)
    }

    pub async fn get(&self, user_id: i64, id: i64) -> Result<Budget> {
        self.storage
            .get_budget(user_id, id)
            .await?
            .ok_or_else(|| FintrackError::not_found(format!("Budget {} not found", id)))
    }

    /// Progress of `budget` in the window containing `on`
    pub async fn progress(
        &self,
        user: &User,
        budget: &Budget,
        on: NaiveDate,
    ) -> Result<BudgetProgress> {
        let window = period_window(budget.period, budget.start_date, on);
        let spent_cents = self
            .storage
            .sum_expense_cents(user.id, window.start, window.end, budget.category_id)
            .await?;

        Ok(BudgetProgress::compute(
            window,
            budget.amount,
            from_cents(spent_cents),
            user.budget_alert_threshold,
        ))
    }

    pub async fn create(&self, user_id: i64, req: BudgetRequest) -> Result<Budget> {
        let new = self.validate(user_id, req).await?;
        self.storage.create_budget(user_id, new).await
    }

    pub async fn update(&self, user_id: i64, id: i64, req: BudgetRequest) -> Result<Budget> {
        self.get(user_id, id).await?;
        let new = self.validate(user_id, req).await?;
        self.storage.update_budget(user_id, id, new).await
    }

    pub async fn delete(&self, user_id: i64, id: i64) -> Result<()> {
        self.storage.delete_budget(user_id, id).await
    }

    async fn validate(&self, user_id: i64, req: BudgetRequest) -> Result<NewBudget> {
        let name = normalize_name(&req.name, "Budget name", 100)?;
        let amount = validate_positive(req.amount, "amount")?;

        if let Some(category_id) = req.category_id {
            let category = self
                .storage
                .get_category(user_id, category_id)
                .await?
                .ok_or_else(|| {
                    FintrackError::not_found(format!("Category {} not found", category_id))
                })?;
            if category.kind != CategoryKind::Expense {
                return Err(FintrackError::validation(
                    "Budgets can only track expense categories",
                ));
            }
        }

        Ok(NewBudget {
            category_id: req.category_id,
            name,
            amount,
            period: req.period,
            start_date: req.start_date,
        })
    }

    /// Re-evaluate budgets affected by an expense on `date` in `category_id`
    ///
    /// Only the window containing today is alerted on; backdated expenses in
    /// closed periods change progress but do not notify.
    pub async fn check_alerts(&self, user: &User, category_id: Option<i64>, date: NaiveDate) {
        let today = Utc::now().date_naive();
        if let Err(e) = self.check_alerts_on(user, category_id, date, today).await {
            warn!("Budget alert evaluation failed for user {}: {}", user.id, e);
        }
    }

    pub async fn check_alerts_on(
        &self,
        user: &User,
        category_id: Option<i64>,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Result<usize> {
        let budgets = self.storage.budgets_covering(user.id, category_id).await?;
        let mut sent = 0;

        for budget in budgets {
            let window = period_window(budget.period, budget.start_date, today);
            if !window.contains(date) {
                continue;
            }

            let progress = self.progress(user, &budget, today).await?;
            let Some(level) = progress.status.alert_level() else {
                continue;
            };

            let already_sent = budget.alert_period_start == Some(window.start)
                && budget.alert_level.is_some_and(|sent| sent >= level);
            if already_sent {
                debug!("Budget {} already alerted at {:?}", budget.id, level);
                continue;
            }

            self.storage
                .record_budget_alert(budget.id, window.start, level)
                .await?;
            self.notifications
                .notify_quietly(user, alert_event(&budget, &progress, level))
                .await;
            sent += 1;
        }

        Ok(sent)
    }
}

fn alert_event(budget: &Budget, progress: &BudgetProgress, level: AlertLevel) -> NotificationEvent {
    let budget_id = budget.id;
    let budget_name = budget.name.clone();
    let spent = progress.spent;
    let limit = budget.amount;
    let percent = progress.percent;
    let period_end = progress.window.last_day();

    match level {
        AlertLevel::Warning => NotificationEvent::BudgetWarning {
            budget_id,
            budget_name,
            spent,
            limit,
            percent,
            period_end,
        },
        AlertLevel::Exceeded => NotificationEvent::BudgetExceeded {
            budget_id,
            budget_name,
            spent,
            limit,
            percent,
            period_end,
        },
    }
}
