//! API 服务模块
//!
//! 该模块包含 `/api/v1` 下的所有端点：
//! - 认证（注册、登录、token 刷新）
//! - 用户设置
//! - 分类、交易、预算、储蓄目标 CRUD
//! - 文件导入与 CSV 导出
//! - 站内通知与推送订阅

pub mod auth;
mod budgets;
mod categories;
pub mod error_code;
mod goals;
pub mod health;
pub mod helpers;
mod import;
mod notifications;
pub mod routes;
mod settings;
mod transactions;
pub mod types;

// 重新导出类型
pub use types::*;

// 重新导出帮助函数
pub use helpers::{api_result, error_from_fintrack, error_response, json_config, query_config};

// 重新导出错误码
pub use error_code::ErrorCode;

pub use health::{AppStartTime, HealthService, health_routes};
pub use routes::api_v1_routes;
