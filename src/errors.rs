use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum FintrackError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Serialization(String),
    Validation(String),
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
    Forbidden(String),
    InvalidToken(String),
    DateParse(String),
    ImportFormat(String),
    FileTooLarge(String),
    Notification(String),
    PasswordHash(String),
    Internal(String),
}

impl FintrackError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            FintrackError::DatabaseConfig(_) => "E001",
            FintrackError::DatabaseConnection(_) => "E002",
            FintrackError::DatabaseOperation(_) => "E003",
            FintrackError::FileOperation(_) => "E004",
            FintrackError::Serialization(_) => "E005",
            FintrackError::Validation(_) => "E006",
            FintrackError::NotFound(_) => "E007",
            FintrackError::Conflict(_) => "E008",
            FintrackError::Unauthorized(_) => "E009",
            FintrackError::Forbidden(_) => "E010",
            FintrackError::InvalidToken(_) => "E011",
            FintrackError::DateParse(_) => "E012",
            FintrackError::ImportFormat(_) => "E013",
            FintrackError::FileTooLarge(_) => "E014",
            FintrackError::Notification(_) => "E015",
            FintrackError::PasswordHash(_) => "E016",
            FintrackError::Internal(_) => "E017",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            FintrackError::DatabaseConfig(_) => "Database Configuration Error",
            FintrackError::DatabaseConnection(_) => "Database Connection Error",
            FintrackError::DatabaseOperation(_) => "Database Operation Error",
            FintrackError::FileOperation(_) => "File Operation Error",
            FintrackError::Serialization(_) => "Serialization Error",
            FintrackError::Validation(_) => "Validation Error",
            FintrackError::NotFound(_) => "Resource Not Found",
            FintrackError::Conflict(_) => "Conflict",
            FintrackError::Unauthorized(_) => "Unauthorized",
            FintrackError::Forbidden(_) => "Forbidden",
            FintrackError::InvalidToken(_) => "Invalid Token",
            FintrackError::DateParse(_) => "Date Parse Error",
            FintrackError::ImportFormat(_) => "Import Format Error",
            FintrackError::FileTooLarge(_) => "File Too Large",
            FintrackError::Notification(_) => "Notification Delivery Error",
            FintrackError::PasswordHash(_) => "Password Hash Error",
            FintrackError::Internal(_) => "Internal Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            FintrackError::DatabaseConfig(msg)
            | FintrackError::DatabaseConnection(msg)
            | FintrackError::DatabaseOperation(msg)
            | FintrackError::FileOperation(msg)
            | FintrackError::Serialization(msg)
            | FintrackError::Validation(msg)
            | FintrackError::NotFound(msg)
            | FintrackError::Conflict(msg)
            | FintrackError::Unauthorized(msg)
            | FintrackError::Forbidden(msg)
            | FintrackError::InvalidToken(msg)
            | FintrackError::DateParse(msg)
            | FintrackError::ImportFormat(msg)
            | FintrackError::FileTooLarge(msg)
            | FintrackError::Notification(msg)
            | FintrackError::PasswordHash(msg)
            | FintrackError::Internal(msg) => msg,
        }
    }

    /// HTTP 状态码映射
    pub fn http_status(&self) -> StatusCode {
        match self {
            FintrackError::Validation(_)
            | FintrackError::DateParse(_)
            | FintrackError::ImportFormat(_) => StatusCode::BAD_REQUEST,
            FintrackError::Unauthorized(_) | FintrackError::InvalidToken(_) => {
                StatusCode::UNAUTHORIZED
            }
            FintrackError::Forbidden(_) => StatusCode::FORBIDDEN,
            FintrackError::NotFound(_) => StatusCode::NOT_FOUND,
            FintrackError::Conflict(_) => StatusCode::CONFLICT,
            FintrackError::FileTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            FintrackError::DatabaseConfig(_)
            | FintrackError::DatabaseConnection(_)
            | FintrackError::DatabaseOperation(_)
            | FintrackError::FileOperation(_)
            | FintrackError::Serialization(_)
            | FintrackError::Notification(_)
            | FintrackError::PasswordHash(_)
            | FintrackError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 客户端错误（4xx）可以把消息原样返回，服务端错误只返回通用提示
    pub fn is_client_error(&self) -> bool {
        self.http_status().is_client_error()
    }

    /// 格式化为彩色输出（用于 CLI 与启动失败）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for FintrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for FintrackError {}

// 便捷的构造函数
impl FintrackError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        FintrackError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        FintrackError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        FintrackError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        FintrackError::FileOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        FintrackError::Serialization(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        FintrackError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        FintrackError::NotFound(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        FintrackError::Conflict(msg.into())
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        FintrackError::Unauthorized(msg.into())
    }

    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        FintrackError::Forbidden(msg.into())
    }

    pub fn invalid_token<T: Into<String>>(msg: T) -> Self {
        FintrackError::InvalidToken(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        FintrackError::DateParse(msg.into())
    }

    pub fn import_format<T: Into<String>>(msg: T) -> Self {
        FintrackError::ImportFormat(msg.into())
    }

    pub fn file_too_large<T: Into<String>>(msg: T) -> Self {
        FintrackError::FileTooLarge(msg.into())
    }

    pub fn notification<T: Into<String>>(msg: T) -> Self {
        FintrackError::Notification(msg.into())
    }

    pub fn password_hash<T: Into<String>>(msg: T) -> Self {
        FintrackError::PasswordHash(msg.into())
    }

    pub fn internal<T: Into<String>>(msg: T) -> Self {
        FintrackError::Internal(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for FintrackError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(msg)) => {
                FintrackError::Conflict(format!("Duplicate record: {}", msg))
            }
            Some(sea_orm::SqlErr::ForeignKeyConstraintViolation(msg)) => {
                FintrackError::Validation(format!("Referenced record does not exist: {}", msg))
            }
            _ => FintrackError::DatabaseOperation(err.to_string()),
        }
    }
}

impl From<std::io::Error> for FintrackError {
    fn from(err: std::io::Error) -> Self {
        FintrackError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for FintrackError {
    fn from(err: serde_json::Error) -> Self {
        FintrackError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for FintrackError {
    fn from(err: chrono::ParseError) -> Self {
        FintrackError::DateParse(err.to_string())
    }
}

impl From<csv::Error> for FintrackError {
    fn from(err: csv::Error) -> Self {
        FintrackError::ImportFormat(format!("CSV error: {}", err))
    }
}

impl From<calamine::Error> for FintrackError {
    fn from(err: calamine::Error) -> Self {
        FintrackError::ImportFormat(format!("Spreadsheet error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, FintrackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_4xx() {
        assert_eq!(
            FintrackError::validation("bad").http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            FintrackError::not_found("x").http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            FintrackError::conflict("x").http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            FintrackError::file_too_large("x").http_status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert!(FintrackError::unauthorized("x").is_client_error());
    }

    #[test]
    fn test_server_errors_map_to_500() {
        let err = FintrackError::database_operation("boom");
        assert_eq!(err.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_display_uses_simple_format() {
        let err = FintrackError::validation("amount must be positive");
        assert_eq!(
            err.to_string(),
            "Validation Error: amount must be positive"
        );
        assert_eq!(err.code(), "E006");
    }

    #[test]
    fn test_db_custom_error_is_database_operation() {
        let err: FintrackError = sea_orm::DbErr::Custom("oops".to_string()).into();
        assert!(matches!(err, FintrackError::DatabaseOperation(_)));
    }
}
