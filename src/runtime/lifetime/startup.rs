use crate::config::get_config;
use crate::services::{
    BudgetService, CategoryService, GoalService, ImportService, NotificationService,
    TransactionService, UserService,
};
use crate::storage::{SeaOrmStorage, StorageFactory};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// 服务器运行所需的全部共享对象
///
/// 每个 service 以 `Arc` 持有，注册到 actix 的 `app_data` 中供 handler 提取。
#[derive(Clone)]
pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub notifications: Arc<NotificationService>,
    pub users: Arc<UserService>,
    pub categories: Arc<CategoryService>,
    pub budgets: Arc<BudgetService>,
    pub transactions: Arc<TransactionService>,
    pub goals: Arc<GoalService>,
    pub importer: Arc<ImportService>,
}

impl StartupContext {
    /// 在给定存储之上装配所有 service
    pub fn build(storage: Arc<SeaOrmStorage>) -> Self {
        let notifications = Arc::new(NotificationService::from_config(
            storage.clone(),
            &get_config().notifications,
        ));
        Self::with_notifications(storage, notifications)
    }

    /// 使用外部提供的通知服务装配（测试中注入记录型发送器）
    pub fn with_notifications(
        storage: Arc<SeaOrmStorage>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        let config = get_config();

        let users = Arc::new(UserService::new(storage.clone(), notifications.clone()));
        let categories = Arc::new(CategoryService::new(storage.clone()));
        let budgets = Arc::new(BudgetService::new(storage.clone(), notifications.clone()));
        let transactions = Arc::new(TransactionService::new(storage.clone(), budgets.clone()));
        let goals = Arc::new(GoalService::new(storage.clone(), notifications.clone()));
        let importer = Arc::new(ImportService::new(
            storage.clone(),
            budgets.clone(),
            notifications.clone(),
            config.import.max_rows,
        ));

        Self {
            storage,
            notifications,
            users,
            categories,
            budgets,
            transactions,
            goals,
            importer,
        }
    }
}

/// 准备服务器启动的上下文
/// 包括数据库连接、迁移以及各业务 service
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend().name());

    let context = StartupContext::build(storage);

    info!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );
    Ok(context)
}
