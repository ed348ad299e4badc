use std::sync::Arc;

use crate::errors::Result;

pub mod backend;
pub mod models;

pub use backend::{DEFAULT_CATEGORIES, DuplicateKey, SeaOrmStorage, duplicate_key};
pub use models::*;

pub struct StorageFactory;

impl StorageFactory {
    /// 按全局配置创建存储（连接 + 迁移）
    pub async fn create() -> Result<Arc<SeaOrmStorage>> {
        let config = crate::config::get_config();
        let storage = SeaOrmStorage::connect(&config.database).await?;
        Ok(Arc::new(storage))
    }
}
