//! Web Push 投递
//!
//! 负载加密与 VAPID 签名由推送网关完成，这里只把订阅信息和负载交给网关。
//! 网关按上游推送服务的状态码回应，404/410 表示订阅已失效。

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use super::email::get_agent;
use super::templates::PushPayload;
use crate::config::PushConfig;
use crate::errors::{FintrackError, Result};
use crate::storage::models::PushSubscription;

/// Result of a single push attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Delivered,
    /// 订阅已失效，应删除
    Gone,
}

#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &PushPayload,
    ) -> Result<PushOutcome>;

    fn name(&self) -> &'static str;
}

pub struct HttpPushSender {
    gateway_url: String,
    api_key: String,
    ttl_secs: u64,
}

impl HttpPushSender {
    pub fn new(config: &PushConfig) -> Self {
        Self {
            gateway_url: config.gateway_url.clone(),
            api_key: config.api_key.clone(),
            ttl_secs: config.ttl_secs,
        }
    }

    fn send_sync(gateway_url: String, api_key: String, body: serde_json::Value) -> Result<PushOutcome> {
        let mut request = get_agent().post(&gateway_url);
        if !api_key.is_empty() {
            request = request.header("Authorization", &format!("Bearer {}", api_key));
        }

        match request.send_json(&body) {
            Ok(_) => Ok(PushOutcome::Delivered),
            Err(ureq::Error::StatusCode(404 | 410)) => Ok(PushOutcome::Gone),
            Err(ureq::Error::StatusCode(status)) => Err(FintrackError::notification(format!(
                "Push gateway returned HTTP {}",
                status
            ))),
            Err(e) => Err(FintrackError::notification(format!(
                "Push request failed: {}",
                e
            ))),
        }
    }
}

#[async_trait]
impl PushSender for HttpPushSender {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &PushPayload,
    ) -> Result<PushOutcome> {
        let body = json!({
            "subscription": {
                "endpoint": subscription.endpoint,
                "keys": {
                    "p256dh": subscription.p256dh,
                    "auth": subscription.auth,
                },
            },
            "payload": payload,
            "ttl": self.ttl_secs,
        });
        let gateway_url = self.gateway_url.clone();
        let api_key = self.api_key.clone();

        let outcome = tokio::task::spawn_blocking(move || Self::send_sync(gateway_url, api_key, body))
            .await
            .map_err(|e| FintrackError::internal(format!("Push task failed: {}", e)))??;

        debug!(
            "Push \"{}\" to subscription {}: {:?}",
            payload.tag, subscription.id, outcome
        );
        Ok(outcome)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

pub struct LogPushSender;

#[async_trait]
impl PushSender for LogPushSender {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &PushPayload,
    ) -> Result<PushOutcome> {
        info!(
            "Push delivery disabled, would send \"{}\" to subscription {}",
            payload.title, subscription.id
        );
        Ok(PushOutcome::Delivered)
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

pub fn push_sender_from_config(config: &PushConfig) -> std::sync::Arc<dyn PushSender> {
    if config.enabled && !config.gateway_url.is_empty() {
        std::sync::Arc::new(HttpPushSender::new(config))
    } else {
        std::sync::Arc::new(LogPushSender)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_selection() {
        let mut config = PushConfig::default();
        assert_eq!(push_sender_from_config(&config).name(), "log");

        config.enabled = true;
        config.gateway_url = "https://push.example.com/send".to_string();
        assert_eq!(push_sender_from_config(&config).name(), "http");
    }
}
