use actix_web::{HttpResponse, Responder, web};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, trace};

use crate::storage::SeaOrmStorage;

use super::error_code::ErrorCode;
use super::types::{ApiResponse, HealthChecks, HealthDatabaseCheck, HealthResponse};

const PING_TIMEOUT: Duration = Duration::from_secs(5);

// 应用启动时间结构体
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

/// Health Service
///
/// 直接访问 storage 做连通性检查，不经过业务 service。
pub struct HealthService;

impl HealthService {
    async fn check_database(storage: &SeaOrmStorage) -> HealthDatabaseCheck {
        let backend = storage.backend().name().to_string();

        match tokio::time::timeout(PING_TIMEOUT, storage.ping()).await {
            Ok(Ok(())) => HealthDatabaseCheck {
                status: "healthy".to_string(),
                backend,
                error: None,
            },
            Ok(Err(e)) => {
                error!("Database health check failed: {}", e);
                HealthDatabaseCheck {
                    status: "unhealthy".to_string(),
                    backend,
                    error: Some(format!("database error: {}", e)),
                }
            }
            Err(_) => {
                error!("Database health check timeout");
                HealthDatabaseCheck {
                    status: "unhealthy".to_string(),
                    backend,
                    error: Some("timeout".to_string()),
                }
            }
        }
    }

    pub async fn health_check(
        storage: web::Data<Arc<SeaOrmStorage>>,
        app_start_time: web::Data<AppStartTime>,
    ) -> impl Responder {
        let start_time = Instant::now();
        trace!("Received health check request");

        let database = Self::check_database(&storage).await;
        let is_healthy = database.status == "healthy";

        let now = chrono::Utc::now();
        let uptime_seconds = (now - app_start_time.start_datetime).num_seconds().max(0) as u64;

        let health_data = HealthResponse {
            status: if is_healthy {
                "healthy".to_string()
            } else {
                "unhealthy".to_string()
            },
            timestamp: now.to_rfc3339(),
            uptime: uptime_seconds,
            checks: HealthChecks { database },
            response_time_ms: start_time.elapsed().as_millis() as u32,
        };

        let health_response = ApiResponse {
            code: if is_healthy {
                ErrorCode::Success as i32
            } else {
                ErrorCode::ServiceUnavailable as i32
            },
            message: if is_healthy {
                "OK".to_string()
            } else {
                "Service Unavailable".to_string()
            },
            data: Some(health_data),
        };

        let response_status = if is_healthy {
            actix_web::http::StatusCode::OK
        } else {
            actix_web::http::StatusCode::SERVICE_UNAVAILABLE
        };

        info!(
            "Health check completed in {:?}, status: {}, uptime: {}s",
            start_time.elapsed(),
            if is_healthy { "healthy" } else { "unhealthy" },
            uptime_seconds
        );

        HttpResponse::build(response_status).json(health_response)
    }

    // 就绪检查：数据库可用才返回 200
    pub async fn readiness_check(storage: web::Data<Arc<SeaOrmStorage>>) -> impl Responder {
        trace!("Received readiness check request");

        match tokio::time::timeout(PING_TIMEOUT, storage.ping()).await {
            Ok(Ok(())) => HttpResponse::Ok()
                .append_header(("Content-Type", "text/plain"))
                .body("OK"),
            _ => HttpResponse::ServiceUnavailable()
                .append_header(("Content-Type", "text/plain"))
                .body("Database unavailable"),
        }
    }

    // 活跃性检查，进程存活即可
    pub async fn liveness_check() -> impl Responder {
        trace!("Received liveness check request");

        HttpResponse::NoContent().finish()
    }
}

/// Health 路由配置
pub fn health_routes() -> actix_web::Scope {
    web::scope("/health")
        .route("", web::get().to(HealthService::health_check))
        .route("", web::head().to(HealthService::health_check))
        .route("/ready", web::get().to(HealthService::readiness_check))
        .route("/ready", web::head().to(HealthService::readiness_check))
        .route("/live", web::get().to(HealthService::liveness_check))
        .route("/live", web::head().to(HealthService::liveness_check))
}
