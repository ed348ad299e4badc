use actix_service::{Service, Transform};
use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
    body::EitherBody,
    dev::{Payload, ServiceRequest, ServiceResponse},
    error::InternalError,
    http::{Method, StatusCode, header::CONTENT_TYPE},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::{debug, info, trace};

use crate::api::jwt::get_jwt_service;
use crate::api::services::{ErrorCode, error_response};

/// 免认证的端点（相对 `/api/v1`）
const PUBLIC_ENDPOINTS: &[&str] = &["/auth/login", "/auth/register", "/auth/refresh"];

/// 已认证的用户，由 [`UserAuth`] 写入 request extensions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
}

impl FromRequest for AuthUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<AuthUser>().copied();
        ready(user.ok_or_else(|| {
            let response = error_response(
                StatusCode::UNAUTHORIZED,
                ErrorCode::Unauthorized,
                "Authentication required",
            );
            InternalError::from_response("missing authenticated user", response).into()
        }))
    }
}

/// Bearer access token authentication middleware
#[derive(Clone)]
pub struct UserAuth;

impl<S, B> Transform<S, ServiceRequest> for UserAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = UserAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(UserAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct UserAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> UserAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    /// Handle OPTIONS requests for CORS preflight
    fn handle_options_request(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
        req.into_response(
            HttpResponse::NoContent()
                .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
                .finish()
                .map_into_right_body(),
        )
    }

    /// Handle unauthorized requests
    fn handle_unauthorized(req: ServiceRequest, message: &str) -> ServiceResponse<EitherBody<B>> {
        info!("Authentication failed for {}: {}", req.path(), message);
        req.into_response(
            error_response(StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, message)
                .map_into_right_body(),
        )
    }

    /// 从 Authorization header 提取 Bearer token
    fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
        req.headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(|s| s.trim().to_string())
    }

    fn is_public_endpoint(req: &ServiceRequest) -> bool {
        let path = req.path().trim_end_matches('/');
        PUBLIC_ENDPOINTS.iter().any(|p| path.ends_with(p))
    }
}

impl<S, B> Service<ServiceRequest> for UserAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        Box::pin(async move {
            // Handle CORS preflight requests
            if req.method() == Method::OPTIONS {
                return Ok(Self::handle_options_request(req));
            }

            if Self::is_public_endpoint(&req) {
                trace!("Public endpoint {} - bypassing authentication", req.path());
                let response = srv.call(req).await?.map_into_left_body();
                return Ok(response);
            }

            let Some(token) = Self::extract_bearer_token(&req) else {
                return Ok(Self::handle_unauthorized(req, "Missing bearer token"));
            };

            let user_id = match get_jwt_service()
                .validate_access_token(&token)
                .and_then(|claims| claims.user_id())
            {
                Ok(id) => id,
                Err(e) => {
                    debug!("Access token validation failed: {}", e);
                    return Ok(Self::handle_unauthorized(req, "Invalid or expired token"));
                }
            };

            trace!("Authenticated user {}", user_id);
            req.extensions_mut().insert(AuthUser { id: user_id });
            let response = srv.call(req).await?.map_into_left_body();
            Ok(response)
        })
    }
}
