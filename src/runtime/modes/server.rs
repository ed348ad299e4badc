//! Server mode
//!
//! This module contains the HTTP server startup logic.
//! It configures and starts the HTTP server with all necessary routes.

use actix_cors::Cors;
use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::Result;
use tracing::warn;

use crate::api::middleware::{RequestIdMiddleware, UserAuth};
use crate::api::services::{
    AppStartTime, api_v1_routes, health_routes, json_config, query_config,
};
use crate::config::{CorsConfig, get_config};
use crate::runtime::lifetime;
use crate::runtime::lifetime::startup::StartupContext;

/// Validate CORS configuration at startup (runs once)
fn validate_cors_config(cors_config: &CorsConfig) {
    if !cors_config.enabled {
        return;
    }

    if cors_config.allowed_origins.is_empty() {
        warn!(
            "CORS enabled but allowed_origins is empty. \
            No cross-origin requests will be allowed. \
            Set allowed_origins explicitly or use '[\"*\"]' for any origin."
        );
    }

    let is_any_origin = cors_config.allowed_origins.iter().any(|o| o == "*");
    if is_any_origin && cors_config.allow_credentials {
        tracing::error!(
            "SECURITY WARNING: allow_any_origin + allow_credentials is a dangerous combination! \
            Disabling credentials."
        );
    }
}

/// Build CORS middleware from configuration
fn build_cors_middleware(cors_config: &CorsConfig) -> Cors {
    // 未启用时保持浏览器默认的同源策略
    if !cors_config.enabled {
        return Cors::default();
    }

    let is_any_origin = cors_config.allowed_origins.iter().any(|o| o == "*");

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_header(actix_web::http::header::CONTENT_TYPE)
        .allowed_header(actix_web::http::header::AUTHORIZATION)
        .allowed_header(actix_web::http::header::ACCEPT)
        .expose_headers(vec!["x-request-id", "content-disposition"])
        .max_age(cors_config.max_age as usize);

    if is_any_origin {
        cors = cors.allow_any_origin();
    } else {
        for origin in &cors_config.allowed_origins {
            cors = cors.allowed_origin(origin);
        }
    }

    // any_origin + credentials 会让 actix-cors 回显 Origin，禁止该组合
    if cors_config.allow_credentials && !is_any_origin {
        cors = cors.supports_credentials();
    }

    cors
}

/// Register every service as app data
///
/// Shared by the server and the integration tests so both see the same wiring.
pub fn configure_app(ctx: StartupContext, app_start_time: AppStartTime) -> impl Fn(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        let payload_limit = get_config().server.payload_limit_kb * 1024;

        cfg.app_data(web::Data::new(ctx.storage.clone()))
            .app_data(web::Data::new(ctx.notifications.clone()))
            .app_data(web::Data::new(ctx.users.clone()))
            .app_data(web::Data::new(ctx.categories.clone()))
            .app_data(web::Data::new(ctx.budgets.clone()))
            .app_data(web::Data::new(ctx.transactions.clone()))
            .app_data(web::Data::new(ctx.goals.clone()))
            .app_data(web::Data::new(ctx.importer.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .app_data(json_config().limit(payload_limit))
            .app_data(query_config())
            .app_data(web::PayloadConfig::new(payload_limit))
            .service(api_v1_routes().wrap(UserAuth))
            .service(health_routes());
    }
}

/// Run the HTTP server
///
/// This function:
/// 1. Records startup time
/// 2. Connects storage and builds services
/// 3. Configures and starts the HTTP server
/// 4. Listens for graceful shutdown signals
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server() -> Result<()> {
    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    let startup = lifetime::startup::prepare_server_startup()
        .await
        .map_err(|e| {
            tracing::error!("Server startup failed: {}", e);
            e
        })?;

    let config = get_config();
    let storage_for_shutdown = startup.storage.clone();

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    let cors_config = config.cors.clone();
    validate_cors_config(&cors_config);

    let server = HttpServer::new(move || {
        let cors = build_cors_middleware(&cors_config);

        App::new()
            .wrap(RequestIdMiddleware) // 为每个请求生成 request_id
            .wrap(cors)
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("Cache-Control", "no-cache, no-store, must-revalidate"))
                    .add(("X-Content-Type-Options", "nosniff")),
            )
            .configure(configure_app(startup.clone(), app_start_time.clone()))
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .client_disconnect_timeout(std::time::Duration::from_millis(1000))
    .workers(cpu_count);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    warn!("Starting server at http://{}", bind_address);
    let server = server.bind(bind_address)?.disable_signals().run();
    let handle = server.handle();

    tokio::select! {
        res = server => {
            res?;
        }
        _ = lifetime::shutdown::listen_for_shutdown() => {
            // 先停止接收请求，等在途请求完成后再关闭连接池
            handle.stop(true).await;
        }
    }

    lifetime::shutdown::close_storage(storage_for_shutdown).await;
    warn!("Graceful shutdown completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::{Method, header};
    use actix_web::test::{self, TestRequest};
    use actix_web::HttpResponse;

    fn cors_config(origins: &[&str], allow_credentials: bool) -> CorsConfig {
        CorsConfig {
            enabled: true,
            allowed_origins: origins.iter().map(|o| o.to_string()).collect(),
            max_age: 3600,
            allow_credentials,
        }
    }

    macro_rules! cors_app {
        ($config:expr) => {
            test::init_service(
                App::new()
                    .wrap(build_cors_middleware(&$config))
                    .route("/", web::get().to(|| async { HttpResponse::Ok().body("OK") })),
            )
            .await
        };
    }

    #[actix_rt::test]
    async fn test_allowed_origin_preflight() {
        let app = cors_app!(cors_config(&["https://app.example.com"], true));

        let req = TestRequest::default()
            .method(Method::OPTIONS)
            .uri("/")
            .insert_header((header::ORIGIN, "https://app.example.com"))
            .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "GET"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_success());
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://app.example.com"
        );
        assert_eq!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .unwrap(),
            "true"
        );
    }

    #[actix_rt::test]
    async fn test_unknown_origin_gets_no_allow_header() {
        let app = cors_app!(cors_config(&["https://app.example.com"], false));

        let req = TestRequest::get()
            .uri("/")
            .insert_header((header::ORIGIN, "https://evil.example.com"))
            .to_request();
        if let Ok(resp) = test::try_call_service(&app, req).await {
            assert!(
                resp.headers()
                    .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                    .is_none()
            );
        }
    }

    #[actix_rt::test]
    async fn test_any_origin_drops_credentials() {
        let app = cors_app!(cors_config(&["*"], true));

        let req = TestRequest::get()
            .uri("/")
            .insert_header((header::ORIGIN, "https://anywhere.example.com"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_success());
        assert!(resp.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
        assert!(
            !resp
                .headers()
                .contains_key(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
        );
    }

    #[actix_rt::test]
    async fn test_disabled_cors_still_serves_same_origin() {
        let mut config = cors_config(&[], false);
        config.enabled = false;
        let app = cors_app!(config);

        let resp = test::call_service(&app, TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
    }
}
