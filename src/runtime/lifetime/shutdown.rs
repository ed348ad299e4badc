use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::storage::SeaOrmStorage;

/// 关闭超时时间（秒）
const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// 等待 Ctrl+C 或 SIGTERM
pub async fn listen_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal as unix_signal};

        match unix_signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;

    info!("Shutdown signal received");
}

async fn ctrl_c() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(
            "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
            e
        );
    }
}

/// 关闭数据库连接池（带超时）
pub async fn close_storage(storage: Arc<SeaOrmStorage>) {
    match timeout(Duration::from_secs(SHUTDOWN_TIMEOUT_SECS), storage.close()).await {
        Ok(Ok(())) => info!("Database connections closed"),
        Ok(Err(e)) => error!("Failed to close database connections: {}", e),
        Err(_) => error!(
            "Closing database timed out after {} seconds",
            SHUTDOWN_TIMEOUT_SECS
        ),
    }
}
