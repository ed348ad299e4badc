use std::str::FromStr;
use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::errors::{FintrackError, Result};
use migration::{Migrator, MigratorTrait};

/// 支持的数据库类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    MySql,
    Postgres,
}

impl Backend {
    /// 从连接 URL 推断数据库类型
    pub fn from_url(database_url: &str) -> Result<Self> {
        if database_url.starts_with("sqlite:")
            || database_url.ends_with(".db")
            || database_url.ends_with(".sqlite")
        {
            Ok(Backend::Sqlite)
        } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
            Ok(Backend::MySql)
        } else if database_url.starts_with("postgres://")
            || database_url.starts_with("postgresql://")
        {
            Ok(Backend::Postgres)
        } else {
            Err(FintrackError::database_config(format!(
                "Cannot infer database type from URL: {}. Supported: sqlite://, mysql://, mariadb://, postgres://",
                database_url
            )))
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Backend::Sqlite => "sqlite",
            Backend::MySql => "mysql",
            Backend::Postgres => "postgres",
        }
    }
}

/// 连接 SQLite（WAL，文件不存在时自动创建）
pub async fn connect_sqlite(database_url: &str) -> Result<DatabaseConnection> {
    use sea_orm::SqlxSqliteConnector;
    use sea_orm::sqlx::SqlitePool;
    use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};

    // 允许直接传文件路径
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite://{}", database_url)
    };

    let opt = SqliteConnectOptions::from_str(&url)
        .map_err(|e| FintrackError::database_config(format!("Invalid SQLite URL: {}", e)))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5))
        .pragma("cache_size", "-16000")
        .pragma("temp_store", "memory");

    let pool = SqlitePool::connect_with(opt).await.map_err(|e| {
        FintrackError::database_connection(format!("Failed to connect to SQLite: {}", e))
    })?;

    Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
}

/// 连接 MySQL / PostgreSQL
pub async fn connect_generic(config: &DatabaseConfig, backend: Backend) -> Result<DatabaseConnection> {
    let pool_size = config.pool_size.max(1);
    let timeout = Duration::from_secs(config.timeout.max(1));

    let mut opt = ConnectOptions::new(config.database_url.clone());
    opt.max_connections(pool_size)
        .min_connections(pool_size.min(2))
        .connect_timeout(timeout)
        .acquire_timeout(timeout)
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(3600))
        .sqlx_logging(false);

    Database::connect(opt).await.map_err(|e| {
        FintrackError::database_connection(format!(
            "Failed to connect to {}: {}",
            backend.name().to_uppercase(),
            e
        ))
    })
}

/// 运行数据库迁移
pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    Migrator::up(db, None)
        .await
        .map_err(|e| FintrackError::database_operation(format!("Migration failed: {}", e)))?;

    info!("Database migrations completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_url() {
        assert_eq!(Backend::from_url("sqlite://data.db").unwrap(), Backend::Sqlite);
        assert_eq!(Backend::from_url("sqlite::memory:").unwrap(), Backend::Sqlite);
        assert_eq!(Backend::from_url("./fintrack.db").unwrap(), Backend::Sqlite);
        assert_eq!(
            Backend::from_url("mariadb://u:p@localhost/db").unwrap(),
            Backend::MySql
        );
        assert_eq!(
            Backend::from_url("postgresql://localhost/db").unwrap(),
            Backend::Postgres
        );
        assert!(Backend::from_url("redis://localhost").is_err());
    }
}
