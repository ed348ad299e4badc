//! Savings goals

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::info;

use crate::errors::{FintrackError, Result};
use crate::services::notification::{NotificationEvent, NotificationService};
use crate::storage::{Goal, NewGoal, SeaOrmStorage};
use crate::utils::money::{MAX_AMOUNT, normalize, percent_of, validate_non_negative, validate_positive};
use crate::utils::validators::normalize_name;

#[derive(Debug, Clone)]
pub struct GoalRequest {
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Option<Decimal>,
    pub deadline: Option<NaiveDate>,
}

/// Progress towards the target, capped at 100 for display
pub fn progress_percent(goal: &Goal) -> Decimal {
    percent_of(goal.current_amount, goal.target_amount).min(Decimal::ONE_HUNDRED)
}

/// New `completed_at` after the current amount changed
///
/// Keeps the first completion time while the goal stays reached and clears
/// it when the amount drops below the target.
pub fn next_completed_at(
    previous: Option<DateTime<Utc>>,
    current: Decimal,
    target: Decimal,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if current >= target {
        Some(previous.unwrap_or(now))
    } else {
        None
    }
}

pub struct GoalService {
    storage: Arc<SeaOrmStorage>,
    notifications: Arc<NotificationService>,
}

impl GoalService {
    pub fn new(storage: Arc<SeaOrmStorage>, notifications: Arc<NotificationService>) -> Self {
        Self {
            storage,
            notifications,
        }
    }

    pub async fn list(&self, user_id: i64) -> Result<Vec<Goal>> {
        self.storage.list_goals(user_id).await
    }

    pub async fn get(&self, user_id: i64, id: i64) -> Result<Goal> {
        self.storage
            .get_goal(user_id, id)
            .await?
            .ok_or_else(|| FintrackError::not_found(format!("Goal {} not found", id)))
    }

    pub async fn create(&self, user_id: i64, req: GoalRequest) -> Result<Goal> {
        let new = validate(req)?;
        let completed_at = next_completed_at(None, new.current_amount, new.target_amount, Utc::now());
        let goal = self.storage.create_goal(user_id, new, completed_at).await?;

        if goal.completed_at.is_some() {
            self.announce(user_id, &goal).await;
        }
        Ok(goal)
    }

    pub async fn update(&self, user_id: i64, id: i64, req: GoalRequest) -> Result<Goal> {
        let existing = self.get(user_id, id).await?;
        // 未提供 current_amount 时保留原进度
        let new = validate(GoalRequest {
            current_amount: req.current_amount.or(Some(existing.current_amount)),
            ..req
        })?;

        let completed_at = next_completed_at(
            existing.completed_at,
            new.current_amount,
            new.target_amount,
            Utc::now(),
        );
        let goal = self
            .storage
            .update_goal(user_id, id, new, completed_at)
            .await?;

        if existing.completed_at.is_none() && goal.completed_at.is_some() {
            self.announce(user_id, &goal).await;
        }
        Ok(goal)
    }

    pub async fn delete(&self, user_id: i64, id: i64) -> Result<()> {
        self.storage.delete_goal(user_id, id).await
    }

    /// Add `amount` (negative for a withdrawal) to the goal
    pub async fn contribute(&self, user_id: i64, id: i64, amount: Decimal) -> Result<Goal> {
        let amount = normalize(amount);
        if amount.is_zero() {
            return Err(FintrackError::validation("Contribution amount must not be zero"));
        }

        if amount.abs() > MAX_AMOUNT {
            return Err(FintrackError::validation(format!(
                "Contribution amount must not exceed {}",
                MAX_AMOUNT
            )));
        }

        let existing = self.get(user_id, id).await?;
        let current = existing
            .current_amount
            .checked_add(amount)
            .ok_or_else(|| FintrackError::validation("Contribution amount out of range"))?;
        if current < Decimal::ZERO {
            return Err(FintrackError::validation(format!(
                "Withdrawal exceeds the saved amount of {}",
                existing.current_amount
            )));
        }
        if current > MAX_AMOUNT {
            return Err(FintrackError::validation(format!(
                "Goal amount must not exceed {}",
                MAX_AMOUNT
            )));
        }

        let completed_at = next_completed_at(
            existing.completed_at,
            current,
            existing.target_amount,
            Utc::now(),
        );
        let goal = self
            .storage
            .set_goal_progress(user_id, id, current, completed_at)
            .await?;

        if existing.completed_at.is_none() && goal.completed_at.is_some() {
            self.announce(user_id, &goal).await;
        }
        Ok(goal)
    }

    async fn announce(&self, user_id: i64, goal: &Goal) {
        info!("Goal {} reached by user {}", goal.id, user_id);
        if let Ok(Some(user)) = self.storage.get_user(user_id).await {
            self.notifications
                .notify_quietly(
                    &user,
                    NotificationEvent::GoalReached {
                        goal_id: goal.id,
                        goal_name: goal.name.clone(),
                        target: goal.target_amount,
                    },
                )
                .await;
        }
    }
}

fn validate(req: GoalRequest) -> Result<NewGoal> {
    Ok(NewGoal {
        name: normalize_name(&req.name, "Goal name", 100)?,
        target_amount: validate_positive(req.target_amount, "target_amount")?,
        current_amount: validate_non_negative(
            req.current_amount.unwrap_or(Decimal::ZERO),
            "current_amount",
        )?,
        deadline: req.deadline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn goal(current: i64, target: i64) -> Goal {
        Goal {
            id: 1,
            user_id: 1,
            name: "Trip".to_string(),
            target_amount: Decimal::from(target),
            current_amount: Decimal::from(current),
            deadline: None,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_progress_percent_capped() {
        assert_eq!(progress_percent(&goal(50, 200)), Decimal::from(25));
        assert_eq!(progress_percent(&goal(300, 200)), Decimal::ONE_HUNDRED);
        assert_eq!(progress_percent(&goal(0, 200)), Decimal::ZERO);
    }

    #[test]
    fn test_next_completed_at() {
        let now = Utc::now();
        let earlier = now - Duration::days(3);
        let target = Decimal::from(100);

        assert_eq!(next_completed_at(None, Decimal::from(99), target, now), None);
        assert_eq!(next_completed_at(None, target, target, now), Some(now));
        // 已完成的目标保留首次完成时间
        assert_eq!(
            next_completed_at(Some(earlier), Decimal::from(150), target, now),
            Some(earlier)
        );
        // 回落到目标以下时清除
        assert_eq!(
            next_completed_at(Some(earlier), Decimal::from(10), target, now),
            None
        );
    }

    #[test]
    fn test_validate_rejects_negative_current() {
        let err = validate(GoalRequest {
            name: "Car".to_string(),
            target_amount: Decimal::from(1000),
            current_amount: Some(Decimal::from(-1)),
            deadline: None,
        })
        .unwrap_err();
        assert!(matches!(err, FintrackError::Validation(_)));
    }
}
