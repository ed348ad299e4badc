//! 邮件投递
//!
//! - `HttpEmailSender`：调用 HTTP 邮件 API（Resend / Postmark 风格的 JSON 接口）
//! - `LogEmailSender`：邮件未启用时只记录日志

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};
use ureq::Agent;

use super::templates::EmailMessage;
use crate::config::EmailConfig;
use crate::errors::{FintrackError, Result};

const HTTP_TIMEOUT_SECS: u64 = 10;

static HTTP_AGENT: OnceLock<Agent> = OnceLock::new();

pub(super) fn get_agent() -> &'static Agent {
    HTTP_AGENT.get_or_init(|| {
        Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(HTTP_TIMEOUT_SECS)))
            .build()
            .into()
    })
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, message: &EmailMessage) -> Result<()>;

    fn name(&self) -> &'static str;
}

pub struct HttpEmailSender {
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpEmailSender {
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            from: format!("{} <{}>", config.from_name, config.from_address),
        }
    }

    fn send_sync(api_url: String, api_key: String, body: serde_json::Value) -> Result<()> {
        let response = get_agent()
            .post(&api_url)
            .header("Authorization", &format!("Bearer {}", api_key))
            .send_json(&body);

        match response {
            Ok(_) => Ok(()),
            Err(ureq::Error::StatusCode(status)) => Err(FintrackError::notification(format!(
                "Email provider returned HTTP {}",
                status
            ))),
            Err(e) => Err(FintrackError::notification(format!(
                "Email request failed: {}",
                e
            ))),
        }
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, to: &str, message: &EmailMessage) -> Result<()> {
        let body = json!({
            "from": self.from,
            "to": [to],
            "subject": message.subject,
            "text": message.text,
            "html": message.html,
        });
        let api_url = self.api_url.clone();
        let api_key = self.api_key.clone();

        tokio::task::spawn_blocking(move || Self::send_sync(api_url, api_key, body))
            .await
            .map_err(|e| FintrackError::internal(format!("Email task failed: {}", e)))??;

        debug!("Email \"{}\" sent to {}", message.subject, to);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, to: &str, message: &EmailMessage) -> Result<()> {
        info!(
            "Email delivery disabled, would send \"{}\" to {}",
            message.subject, to
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// 根据配置选择实现
pub fn email_sender_from_config(config: &EmailConfig) -> std::sync::Arc<dyn EmailSender> {
    if config.enabled && !config.api_url.is_empty() {
        std::sync::Arc::new(HttpEmailSender::new(config))
    } else {
        std::sync::Arc::new(LogEmailSender)
    }
}
