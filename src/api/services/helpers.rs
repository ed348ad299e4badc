//! API 帮助函数

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, error::InternalError, web};
use serde::Serialize;
use tracing::{error, info};

use crate::errors::FintrackError;

use super::error_code::ErrorCode;
use super::types::{ApiResponse, PaginatedResponse, PaginationInfo};

/// 5xx 时返回给客户端的统一提示
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
    data: Option<T>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: code as i32,
            message: message.into(),
            data,
        })
}

/// 构建成功响应
pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(data))
}

/// 201 Created
pub fn created_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::CREATED, ErrorCode::Success, "Created", Some(data))
}

/// 构建分页响应
pub fn paginated_response<T: Serialize>(data: Vec<T>, pagination: PaginationInfo) -> HttpResponse {
    HttpResponse::Ok()
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(PaginatedResponse {
            code: ErrorCode::Success as i32,
            message: "OK".to_string(),
            data,
            pagination,
        })
}

/// 构建错误响应
pub fn error_response(status: StatusCode, error_code: ErrorCode, message: &str) -> HttpResponse {
    json_response::<()>(status, error_code, message, None)
}

/// 从 FintrackError 构建错误响应（自动映射 HTTP 状态码和 ErrorCode）
///
/// 服务端错误记录完整信息，但只向客户端返回通用提示。
pub fn error_from_fintrack(err: &FintrackError) -> HttpResponse {
    let status = err.http_status();
    let error_code = ErrorCode::from(err);

    if err.is_client_error() {
        info!("Request rejected ({}): {}", err.code(), err.message());
        error_response(status, error_code, err.message())
    } else {
        error!("{} {}: {}", err.code(), err.error_type(), err.message());
        error_response(status, error_code, INTERNAL_ERROR_MESSAGE)
    }
}

/// 统一 Result → HttpResponse 转换
///
/// 成功时返回 200 OK + JSON 数据，失败时自动映射 FintrackError。
pub fn api_result<T, E>(result: Result<T, E>) -> HttpResponse
where
    T: Serialize,
    E: Into<FintrackError>,
{
    match result {
        Ok(data) => success_response(data),
        Err(e) => error_from_fintrack(&e.into()),
    }
}

/// JSON 请求体解析失败时也返回统一信封
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req: &HttpRequest| {
        let message = format!("Invalid JSON body: {}", err);
        let response = error_response(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, &message);
        InternalError::from_response(err, response).into()
    })
}

/// 查询参数解析失败时返回统一信封
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req: &HttpRequest| {
        let message = format!("Invalid query parameters: {}", err);
        let response = error_response(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, &message);
        InternalError::from_response(err, response).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_success_response() {
        let response = success_response("success_data");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_created_response() {
        let response = created_response(1);
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_client_error_keeps_message() {
        let response = error_from_fintrack(&FintrackError::conflict("Email is already registered"));
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_internal_error_hides_details() {
        let response =
            error_from_fintrack(&FintrackError::database_operation("no such table: users"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], INTERNAL_ERROR_MESSAGE);
        assert_eq!(json["code"], ErrorCode::InternalServerError as i32);
        assert!(json["data"].is_null());
    }
}
