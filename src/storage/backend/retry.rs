//! 写操作重试
//!
//! 只对瞬时错误（连接池耗尽、断线、死锁、SQLite BUSY/LOCKED）重试，
//! 约束冲突等业务错误立即返回。

use std::future::Future;
use std::time::Duration;

use sea_orm::DbErr;
use sea_orm::error::RuntimeErr;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::DatabaseConfig;

/// 数据库错误码：MySQL 死锁 / 锁超时，PostgreSQL 序列化失败 / 死锁，SQLite BUSY / LOCKED
const TRANSIENT_CODES: &[&str] = &["1213", "1205", "40001", "40P01", "5", "6"];

const TRANSIENT_MESSAGES: &[&str] = &[
    "deadlock",
    "lock wait timeout",
    "database is locked",
    "serialization failure",
];

/// 判断数据库错误是否为瞬时错误
pub fn is_transient(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => true,
        DbErr::Exec(runtime) | DbErr::Query(runtime) => is_transient_runtime(runtime),
        _ => false,
    }
}

fn is_transient_runtime(err: &RuntimeErr) -> bool {
    match err {
        RuntimeErr::SqlxError(sqlx_err) => {
            if let Some(code) = sqlx_err.as_database_error().and_then(|db| db.code()) {
                return TRANSIENT_CODES.contains(&code.as_ref());
            }
            message_is_transient(&sqlx_err.to_string())
        }
        RuntimeErr::Internal(msg) => message_is_transient(msg),
        #[allow(unreachable_patterns)]
        _ => false,
    }
}

fn message_is_transient(msg: &str) -> bool {
    let msg = msg.to_lowercase();
    TRANSIENT_MESSAGES.iter().any(|m| msg.contains(m))
}

/// 指数退避参数
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self {
            max_retries: config.retry_count,
            base_delay_ms: config.retry_base_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
        }
    }

    /// 第 `attempt` 次重试前的等待时间（毫秒），附带 0-25% 随机抖动
    pub fn delay_for(&self, attempt: u32) -> u64 {
        use rand::RngExt;

        let exp = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
        let capped = exp.min(self.max_delay_ms);
        capped.saturating_add(rand::rng().random_range(0..=capped / 4))
    }

    /// 执行操作，瞬时错误按退避策略重试
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, DbErr>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DbErr>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!("{} succeeded after {} retries", operation, attempt);
                    }
                    return Ok(value);
                }
                Err(e) if attempt < self.max_retries && is_transient(&e) => {
                    attempt += 1;
                    let delay = self.delay_for(attempt);
                    warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {} ms",
                        operation,
                        attempt,
                        self.max_retries + 1,
                        e,
                        delay
                    );
                    sleep(Duration::from_millis(delay)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::error::ConnAcquireErr;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay_ms: 5,
            max_delay_ms: 20,
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(is_transient(&DbErr::ConnectionAcquire(ConnAcquireErr::Timeout)));
        assert!(is_transient(&DbErr::Exec(RuntimeErr::Internal(
            "database is locked".to_string()
        ))));
        assert!(is_transient(&DbErr::Query(RuntimeErr::Internal(
            "Deadlock found when trying to get lock".to_string()
        ))));
        assert!(!is_transient(&DbErr::RecordNotFound("x".to_string())));
        assert!(!is_transient(&DbErr::Exec(RuntimeErr::Internal(
            "UNIQUE constraint failed".to_string()
        ))));
    }

    #[test]
    fn test_delay_grows_and_caps() {
        let policy = RetryPolicy::default();
        assert!((100..=125).contains(&policy.delay_for(1)));
        assert!((400..=500).contains(&policy.delay_for(3)));
        assert!((2000..=2500).contains(&policy.delay_for(12)));
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let calls = AtomicU32::new(0);
        let result = fast_policy(3)
            .run("insert", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(DbErr::ConnectionAcquire(ConnAcquireErr::Timeout))
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result = fast_policy(1)
            .run("insert", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(DbErr::ConnectionAcquire(ConnAcquireErr::Timeout)) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let calls = AtomicU32::new(0);
        let result = fast_policy(3)
            .run("insert", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(DbErr::RecordNotFound("gone".to_string())) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
