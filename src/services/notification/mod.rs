//! Notification service
//!
//! Persists in-app notifications and fans them out to email and Web Push
//! according to the user's preferences. Delivery failures are logged and
//! never propagate to the caller.

mod email;
mod push;
pub mod templates;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::NotificationConfig;
use crate::errors::Result;
use crate::storage::{Notification, PushSubscription, SeaOrmStorage, User};
use crate::utils::validators::validate_push_endpoint;

pub use email::{EmailSender, HttpEmailSender, LogEmailSender, email_sender_from_config};
pub use push::{HttpPushSender, LogPushSender, PushOutcome, PushSender, push_sender_from_config};
pub use templates::{
    EmailMessage, NotificationEvent, PushPayload, RenderedNotification, TemplateContext, render,
};

/// 列表接口单次最多返回的通知数
pub const NOTIFICATION_LIST_LIMIT: u64 = 100;

pub struct NotificationService {
    storage: Arc<SeaOrmStorage>,
    email: Arc<dyn EmailSender>,
    push: Arc<dyn PushSender>,
    app_url: String,
}

impl NotificationService {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        email: Arc<dyn EmailSender>,
        push: Arc<dyn PushSender>,
        app_url: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            email,
            push,
            app_url: app_url.into(),
        }
    }

    pub fn from_config(storage: Arc<SeaOrmStorage>, config: &NotificationConfig) -> Self {
        Self::new(
            storage,
            email_sender_from_config(&config.email),
            push_sender_from_config(&config.push),
            config.app_url.clone(),
        )
    }

    /// Persist the in-app notification and deliver it on the enabled channels
    pub async fn notify(&self, user: &User, event: NotificationEvent) -> Result<Notification> {
        let rendered = render(
            &event,
            &TemplateContext {
                user_name: &user.name,
                currency: &user.currency,
                app_url: &self.app_url,
            },
        );

        let notification = self
            .storage
            .create_notification(user.id, rendered.kind, &rendered.title, &rendered.body)
            .await?;

        self.deliver(user, &rendered).await;
        Ok(notification)
    }

    /// Same as [`notify`](Self::notify) but only logs failures, for side effects
    /// of other operations
    pub async fn notify_quietly(&self, user: &User, event: NotificationEvent) {
        let kind = event.kind();
        if let Err(e) = self.notify(user, event).await {
            warn!(
                "Failed to create {} notification for user {}: {}",
                kind.as_ref(),
                user.id,
                e
            );
        }
    }

    async fn deliver(&self, user: &User, rendered: &RenderedNotification) {
        if user.email_notifications {
            if let Err(e) = self.email.send(&user.email, &rendered.email).await {
                warn!(
                    "Email delivery of {} to user {} failed: {}",
                    rendered.kind.as_ref(),
                    user.id,
                    e
                );
            }
        }

        if !user.push_notifications {
            return;
        }

        let subscriptions = match self.storage.list_push_subscriptions(user.id).await {
            Ok(subs) => subs,
            Err(e) => {
                warn!("Failed to load push subscriptions for user {}: {}", user.id, e);
                return;
            }
        };

        for subscription in subscriptions {
            match self.push.send(&subscription, &rendered.push).await {
                Ok(PushOutcome::Delivered) => {}
                Ok(PushOutcome::Gone) => {
                    debug!("Pruning expired push subscription {}", subscription.id);
                    if let Err(e) = self.storage.prune_push_subscription(subscription.id).await {
                        warn!("Failed to prune subscription {}: {}", subscription.id, e);
                    }
                }
                Err(e) => warn!(
                    "Push delivery to subscription {} failed: {}",
                    subscription.id, e
                ),
            }
        }
    }

    pub async fn list(&self, user_id: i64, unread_only: bool) -> Result<Vec<Notification>> {
        self.storage
            .list_notifications(user_id, unread_only, NOTIFICATION_LIST_LIMIT)
            .await
    }

    pub async fn unread_count(&self, user_id: i64) -> Result<u64> {
        self.storage.unread_notification_count(user_id).await
    }

    pub async fn mark_read(&self, user_id: i64, id: i64) -> Result<()> {
        self.storage.mark_notification_read(user_id, id).await
    }

    pub async fn mark_all_read(&self, user_id: i64) -> Result<u64> {
        self.storage.mark_all_notifications_read(user_id).await
    }

    pub async fn delete(&self, user_id: i64, id: i64) -> Result<()> {
        self.storage.delete_notification(user_id, id).await
    }

    pub async fn subscribe(
        &self,
        user_id: i64,
        endpoint: &str,
        p256dh: &str,
        auth: &str,
    ) -> Result<PushSubscription> {
        let endpoint = validate_push_endpoint(endpoint)?;
        let p256dh = p256dh.trim();
        let auth = auth.trim();
        if p256dh.is_empty() || auth.is_empty() {
            return Err(crate::errors::FintrackError::validation(
                "Subscription keys p256dh and auth are required",
            ));
        }

        self.storage
            .upsert_push_subscription(user_id, &endpoint, p256dh, auth)
            .await
    }

    pub async fn unsubscribe(&self, user_id: i64, endpoint: &str) -> Result<()> {
        self.storage
            .delete_push_subscription(user_id, endpoint.trim())
            .await
    }
}
