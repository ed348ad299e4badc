//! 文件导入端点
//!
//! multipart 表单字段：
//! - `file`：CSV / XLSX / XLS / ODS 文件（必填）
//! - `default_kind`：无类型列且金额为正时使用的类型
//! - `create_categories` / `skip_duplicates` / `dry_run`：布尔开关

use actix_multipart::{Field, Multipart};
use actix_web::{HttpResponse, web};
use futures_util::StreamExt;
use std::sync::Arc;
use tracing::{error, info};

use crate::api::middleware::AuthUser;
use crate::config::get_config;
use crate::errors::FintrackError;
use crate::services::import::coercion::parse_kind;
use crate::services::{ImportOptions, ImportService};

use super::error_code::ErrorCode;
use super::helpers::{api_result, error_from_fintrack, error_response};

/// 文本字段最多读取的字节数
const TEXT_FIELD_LIMIT: usize = 1024;

fn parse_flag(name: &str, value: &str) -> Result<bool, FintrackError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(FintrackError::validation(format!(
            "Invalid value '{}' for {}",
            other, name
        ))),
    }
}

/// 读取文本字段，超长部分截断
async fn read_text_field(field: &mut Field) -> Result<String, FintrackError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let bytes = chunk.map_err(|e| {
            FintrackError::validation(format!("Invalid multipart data: {}", e))
        })?;
        let room = TEXT_FIELD_LIMIT.saturating_sub(data.len());
        data.extend_from_slice(&bytes[..bytes.len().min(room)]);
    }
    Ok(String::from_utf8_lossy(&data).trim().to_string())
}

/// POST /import
pub async fn import_transactions(
    auth: AuthUser,
    mut payload: Multipart,
    importer: web::Data<Arc<ImportService>>,
) -> HttpResponse {
    let max_size = get_config().import.max_file_size_bytes();

    let mut file: Option<(Vec<u8>, Option<String>)> = None;
    let mut options = ImportOptions::default();

    while let Some(item) = payload.next().await {
        let mut field = match item {
            Ok(f) => f,
            Err(e) => {
                error!("Failed to parse multipart field: {}", e);
                return error_response(
                    actix_web::http::StatusCode::BAD_REQUEST,
                    ErrorCode::InvalidMultipartData,
                    &format!("Invalid multipart data: {}", e),
                );
            }
        };

        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .map(str::to_string);

                // 读取文件内容（带大小限制）
                let mut data = Vec::new();
                while let Some(chunk) = field.next().await {
                    match chunk {
                        Ok(bytes) => {
                            if data.len() + bytes.len() > max_size {
                                return error_from_fintrack(&FintrackError::file_too_large(
                                    format!(
                                        "File size exceeds maximum {} MB",
                                        get_config().import.max_file_size_mb
                                    ),
                                ));
                            }
                            data.extend_from_slice(&bytes);
                        }
                        Err(e) => {
                            error!("Failed to read file chunk: {}", e);
                            return error_response(
                                actix_web::http::StatusCode::BAD_REQUEST,
                                ErrorCode::InvalidMultipartData,
                                &format!("Failed to read file: {}", e),
                            );
                        }
                    }
                }
                file = Some((data, filename));
            }
            "default_kind" => {
                let value = match read_text_field(&mut field).await {
                    Ok(v) => v,
                    Err(e) => return error_from_fintrack(&e),
                };
                if value.is_empty() {
                    continue;
                }
                match parse_kind(&value) {
                    Some(kind) => options.default_kind = Some(kind),
                    None => {
                        return error_from_fintrack(&FintrackError::validation(format!(
                            "Invalid default_kind '{}'",
                            value
                        )));
                    }
                }
            }
            "create_categories" | "skip_duplicates" | "dry_run" => {
                let flag = match read_text_field(&mut field)
                    .await
                    .and_then(|v| parse_flag(&field_name, &v))
                {
                    Ok(flag) => flag,
                    Err(e) => return error_from_fintrack(&e),
                };
                match field_name.as_str() {
                    "create_categories" => options.create_categories = flag,
                    "skip_duplicates" => options.skip_duplicates = flag,
                    _ => options.dry_run = flag,
                }
            }
            _ => {
                // 忽略未知字段
            }
        }
    }

    let (data, filename) = match file {
        Some((data, filename)) if !data.is_empty() => (data, filename),
        _ => {
            return error_response(
                actix_web::http::StatusCode::BAD_REQUEST,
                ErrorCode::FileMissing,
                "No file provided",
            );
        }
    };

    info!(
        "Import request from user {}: file={:?}, size={} bytes, dry_run={}",
        auth.id,
        filename,
        data.len(),
        options.dry_run
    );

    api_result(importer.import(auth.id, data, filename, options).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("dry_run", "true").unwrap());
        assert!(parse_flag("dry_run", " YES ").unwrap());
        assert!(!parse_flag("dry_run", "0").unwrap());
        assert!(parse_flag("dry_run", "maybe").is_err());
    }
}
