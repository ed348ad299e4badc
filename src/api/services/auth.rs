//! 认证相关端点：注册、登录、刷新 token、当前用户

use actix_governor::{Governor, GovernorConfigBuilder, KeyExtractor, SimpleKeyExtractionError};
use actix_web::dev::ServiceRequest;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::jwt::get_jwt_service;
use crate::api::middleware::AuthUser;
use crate::config::get_config;
use crate::errors::FintrackError;
use crate::services::{RegisterRequest, UserService};

use super::error_code::ErrorCode;
use super::helpers::{api_result, created_response, error_from_fintrack, error_response};
use super::types::{LoginCredentials, RefreshBody, RegisterBody, TokenResponse, UserResponse};

/// 基于连接 IP 的限流 key 提取器
///
/// 只使用 TCP peer address，不信任 X-Forwarded-For。
#[derive(Clone, Copy)]
pub struct PeerIpKeyExtractor;

impl KeyExtractor for PeerIpKeyExtractor {
    type Key = String;
    type KeyExtractionError = SimpleKeyExtractionError<&'static str>;

    fn extract(&self, req: &ServiceRequest) -> Result<Self::Key, Self::KeyExtractionError> {
        req.connection_info()
            .peer_addr()
            .map(str::to_string)
            .ok_or_else(|| SimpleKeyExtractionError::new("Unable to extract peer IP"))
    }
}

/// 创建登录限流器
///
/// 配置：每秒补充 1 个令牌，突发最多 5 次请求
/// 超限返回 HTTP 429 Too Many Requests
pub fn login_rate_limiter() -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let config = GovernorConfigBuilder::default()
        .seconds_per_request(1)
        .burst_size(5)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("Invalid rate limit config");

    debug!("Login rate limiter created: 1 req/s, burst 5");
    Governor::new(&config)
}

/// 为用户签发一对 token
fn issue_tokens(user_id: i64) -> Result<TokenResponse, FintrackError> {
    let jwt_service = get_jwt_service();
    let access_token = jwt_service
        .generate_access_token(user_id)
        .map_err(|e| FintrackError::internal(format!("Failed to generate access token: {}", e)))?;
    let refresh_token = jwt_service
        .generate_refresh_token(user_id)
        .map_err(|e| FintrackError::internal(format!("Failed to generate refresh token: {}", e)))?;

    Ok(TokenResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: jwt_service.access_token_seconds(),
    })
}

/// POST /auth/register
pub async fn register(
    body: web::Json<RegisterBody>,
    users: web::Data<Arc<UserService>>,
) -> HttpResponse {
    if !get_config().auth.allow_registration {
        warn!("Registration attempt while registration is disabled");
        return error_response(
            StatusCode::FORBIDDEN,
            ErrorCode::RegistrationDisabled,
            "Registration is disabled",
        );
    }

    let body = body.into_inner();
    match users
        .register(RegisterRequest {
            email: body.email,
            password: body.password,
            name: body.name,
            currency: body.currency,
        })
        .await
    {
        Ok(user) => created_response(UserResponse::from(user)),
        Err(e) => error_from_fintrack(&e),
    }
}

/// POST /auth/login
pub async fn login(
    body: web::Json<LoginCredentials>,
    users: web::Data<Arc<UserService>>,
) -> HttpResponse {
    let user = match users.authenticate(&body.email, &body.password).await {
        Ok(user) => user,
        Err(e) => return error_from_fintrack(&e),
    };

    info!("User {} logged in", user.id);
    api_result(issue_tokens(user.id))
}

/// POST /auth/refresh
///
/// 滑动过期：每次刷新都签发新的 access 与 refresh token。
pub async fn refresh_token(
    body: web::Json<RefreshBody>,
    users: web::Data<Arc<UserService>>,
) -> HttpResponse {
    let claims = match get_jwt_service().validate_refresh_token(&body.refresh_token) {
        Ok(claims) => claims,
        Err(e) => {
            warn!("Invalid refresh token: {}", e);
            return error_response(
                StatusCode::UNAUTHORIZED,
                ErrorCode::TokenInvalid,
                "Invalid refresh token",
            );
        }
    };

    let user_id = match claims.user_id() {
        Ok(id) => id,
        Err(_) => {
            return error_response(
                StatusCode::UNAUTHORIZED,
                ErrorCode::TokenInvalid,
                "Invalid refresh token",
            );
        }
    };

    // 用户被删除后旧 token 不再可用
    if let Err(e) = users.get_user(user_id).await {
        return match e {
            FintrackError::NotFound(_) => error_response(
                StatusCode::UNAUTHORIZED,
                ErrorCode::TokenInvalid,
                "Invalid refresh token",
            ),
            other => error_from_fintrack(&other),
        };
    }

    debug!("Token refreshed for user {}", user_id);
    api_result(issue_tokens(user_id))
}

/// GET /auth/me
pub async fn me(auth: AuthUser, users: web::Data<Arc<UserService>>) -> HttpResponse {
    api_result(users.get_user(auth.id).await.map(UserResponse::from))
}
