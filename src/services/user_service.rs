//! Account management: registration, login and user settings
//!
//! Shared between HTTP handlers and the CLI (`create-user`, `reset-password`).

use std::sync::Arc;

use tracing::{info, warn};

use crate::errors::{FintrackError, Result};
use crate::services::notification::{NotificationEvent, NotificationService};
use crate::storage::{NewUser, SeaOrmStorage, User, UserSettingsUpdate};
use crate::utils::password::{hash_password, validate_new_password, verify_password};
use crate::utils::validators::{normalize_currency, normalize_email, normalize_name};

pub const DEFAULT_CURRENCY: &str = "USD";

/// Unified message for unknown email and wrong password
const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub currency: Option<String>,
}

/// Partial settings update; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct SettingsRequest {
    pub name: Option<String>,
    pub currency: Option<String>,
    pub email_notifications: Option<bool>,
    pub push_notifications: Option<bool>,
    pub budget_alert_threshold: Option<i64>,
}

pub struct UserService {
    storage: Arc<SeaOrmStorage>,
    notifications: Arc<NotificationService>,
}

impl UserService {
    pub fn new(storage: Arc<SeaOrmStorage>, notifications: Arc<NotificationService>) -> Self {
        Self {
            storage,
            notifications,
        }
    }

    /// Create an account with the default category set and send a welcome notification
    pub async fn register(&self, req: RegisterRequest) -> Result<User> {
        let email = normalize_email(&req.email)?;
        validate_new_password(&req.password)?;
        let name = normalize_name(&req.name, "Name", 100)?;
        let currency = match req.currency.as_deref() {
            Some(c) if !c.trim().is_empty() => normalize_currency(c)?,
            _ => DEFAULT_CURRENCY.to_string(),
        };

        if self.storage.find_user_by_email(&email).await?.is_some() {
            return Err(FintrackError::conflict("Email is already registered"));
        }

        let password_hash = hash_password(&req.password)?;
        let user = self
            .storage
            .create_user(NewUser {
                email,
                password_hash,
                name,
                currency,
            })
            .await?;

        if let Err(e) = self.storage.create_default_categories(user.id).await {
            warn!("Failed to create default categories for user {}: {}", user.id, e);
        }
        self.notifications
            .notify_quietly(&user, NotificationEvent::Welcome)
            .await;

        info!("User {} registered", user.id);
        Ok(user)
    }

    /// Verify credentials and return the user
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let email = email.trim().to_lowercase();
        let Some(user) = self.storage.find_user_by_email(&email).await? else {
            // 同样计算一次哈希，避免通过响应时间区分账号是否存在
            let _ = hash_password(password);
            return Err(FintrackError::unauthorized(INVALID_CREDENTIALS));
        };

        if !verify_password(password, &user.password_hash)? {
            return Err(FintrackError::unauthorized(INVALID_CREDENTIALS));
        }
        Ok(user)
    }

    pub async fn get_user(&self, id: i64) -> Result<User> {
        self.storage
            .get_user(id)
            .await?
            .ok_or_else(|| FintrackError::not_found("User not found"))
    }

    pub async fn update_settings(&self, id: i64, req: SettingsRequest) -> Result<User> {
        let threshold = req
            .budget_alert_threshold
            .map(|t| {
                if (1..=100).contains(&t) {
                    Ok(t as u8)
                } else {
                    Err(FintrackError::validation(
                        "budget_alert_threshold must be between 1 and 100",
                    ))
                }
            })
            .transpose()?;

        let update = UserSettingsUpdate {
            name: req
                .name
                .as_deref()
                .map(|n| normalize_name(n, "Name", 100))
                .transpose()?,
            currency: req.currency.as_deref().map(normalize_currency).transpose()?,
            email_notifications: req.email_notifications,
            push_notifications: req.push_notifications,
            budget_alert_threshold: threshold,
        };

        self.storage.update_user_settings(id, update).await
    }

    /// Change password after checking the current one
    pub async fn change_password(
        &self,
        id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let user = self.get_user(id).await?;
        if !verify_password(current_password, &user.password_hash)? {
            return Err(FintrackError::validation("Current password is incorrect"));
        }
        validate_new_password(new_password)?;

        self.storage
            .update_password_hash(id, hash_password(new_password)?)
            .await?;
        info!("Password changed for user {}", id);
        Ok(())
    }

    /// Administrative reset without the current password (CLI only)
    pub async fn reset_password(&self, email: &str, new_password: &str) -> Result<User> {
        let email = normalize_email(email)?;
        validate_new_password(new_password)?;

        let user = self
            .storage
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| FintrackError::not_found(format!("No user with email {}", email)))?;

        self.storage
            .update_password_hash(user.id, hash_password(new_password)?)
            .await?;
        Ok(user)
    }
}
