//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};
use ts_rs::TS;

use super::types::TS_EXPORT_PATH;
use crate::errors::FintrackError;

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字，ts-rs 自动生成 TypeScript 类型。
/// 按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 2000-2099: 认证错误
/// - 3000-3099: 财务记录错误
/// - 4000-4099: 导入导出错误
/// - 5000-5099: 通知错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[ts(rename = "ErrorCode")]
#[ts(repr(enum))]
#[repr(i32)]
pub enum ErrorCode {
    // 成功
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,
    Conflict = 1009,
    InvalidDateFormat = 1012,
    ServiceUnavailable = 1030,

    // 认证错误 2000-2099
    AuthFailed = 2000,
    TokenExpired = 2001,
    TokenInvalid = 2002,
    RateLimitExceeded = 2004,
    RegistrationDisabled = 2005,

    // 财务记录错误 3000-3099
    ValidationFailed = 3000,
    RecordNotFound = 3001,
    DuplicateRecord = 3002,

    // 导入导出错误 4000-4099
    ImportFailed = 4000,
    ExportFailed = 4001,
    InvalidMultipartData = 4002,
    FileTooLarge = 4003,
    FileMissing = 4004,
    UnsupportedFormat = 4005,

    // 通知错误 5000-5099
    NotificationFailed = 5000,
    InvalidSubscription = 5001,
}

impl From<&FintrackError> for ErrorCode {
    fn from(err: &FintrackError) -> Self {
        match err {
            FintrackError::Validation(_) => ErrorCode::ValidationFailed,
            FintrackError::NotFound(_) => ErrorCode::RecordNotFound,
            FintrackError::Conflict(_) => ErrorCode::DuplicateRecord,
            FintrackError::Unauthorized(_) => ErrorCode::AuthFailed,
            FintrackError::InvalidToken(_) => ErrorCode::TokenInvalid,
            FintrackError::Forbidden(_) => ErrorCode::Forbidden,
            FintrackError::DateParse(_) => ErrorCode::InvalidDateFormat,
            FintrackError::ImportFormat(_) => ErrorCode::UnsupportedFormat,
            FintrackError::FileTooLarge(_) => ErrorCode::FileTooLarge,
            FintrackError::Notification(_) => ErrorCode::NotificationFailed,
            FintrackError::DatabaseConnection(_) => ErrorCode::ServiceUnavailable,
            FintrackError::DatabaseConfig(_)
            | FintrackError::DatabaseOperation(_)
            | FintrackError::FileOperation(_)
            | FintrackError::Serialization(_)
            | FintrackError::PasswordHash(_)
            | FintrackError::Internal(_) => ErrorCode::InternalServerError,
        }
    }
}
