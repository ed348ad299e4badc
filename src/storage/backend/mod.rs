//! SeaORM storage backend
//!
//! This module provides database storage using SeaORM,
//! supporting SQLite, MySQL/MariaDB, and PostgreSQL.
//! Each submodule adds the queries of one aggregate to `SeaOrmStorage`.

mod budgets;
mod categories;
mod connection;
pub mod converters;
mod goals;
mod notifications;
pub mod retry;
mod transactions;
mod users;

use sea_orm::DatabaseConnection;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::errors::{FintrackError, Result};

pub use connection::{Backend, connect_generic, connect_sqlite, run_migrations};
pub use retry::RetryPolicy;
pub use categories::DEFAULT_CATEGORIES;
pub use transactions::{DuplicateKey, duplicate_key};

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend: Backend,
    retry: RetryPolicy,
}

impl SeaOrmStorage {
    /// 连接数据库并执行迁移
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        if config.database_url.trim().is_empty() {
            return Err(FintrackError::database_config("database_url is not set"));
        }

        let backend = Backend::from_url(&config.database_url)?;
        let db = match backend {
            Backend::Sqlite => connect_sqlite(&config.database_url).await?,
            _ => connect_generic(config, backend).await?,
        };

        run_migrations(&db).await?;

        info!("{} storage initialized", backend.name().to_uppercase());
        Ok(Self {
            db,
            backend,
            retry: RetryPolicy::from_config(config),
        })
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// 获取数据库连接
    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// 健康检查
    pub async fn ping(&self) -> Result<()> {
        self.db
            .ping()
            .await
            .map_err(|e| FintrackError::database_connection(e.to_string()))
    }

    /// 关闭连接池
    pub async fn close(&self) -> Result<()> {
        // 连接池在所有克隆间共享
        self.db
            .clone()
            .close()
            .await
            .map_err(|e| FintrackError::database_connection(e.to_string()))
    }
}
