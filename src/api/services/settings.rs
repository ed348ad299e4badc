//! 用户设置端点

use actix_web::{HttpResponse, web};
use std::sync::Arc;

use crate::api::middleware::AuthUser;
use crate::services::{SettingsRequest, UserService};

use super::helpers::api_result;
use super::types::{ChangePasswordBody, MessageResponse, SettingsBody, UserResponse};

/// GET /settings
pub async fn get_settings(auth: AuthUser, users: web::Data<Arc<UserService>>) -> HttpResponse {
    api_result(users.get_user(auth.id).await.map(UserResponse::from))
}

/// PUT /settings（部分更新，缺省字段保持不变）
pub async fn update_settings(
    auth: AuthUser,
    body: web::Json<SettingsBody>,
    users: web::Data<Arc<UserService>>,
) -> HttpResponse {
    let body = body.into_inner();
    let result = users
        .update_settings(
            auth.id,
            SettingsRequest {
                name: body.name,
                currency: body.currency,
                email_notifications: body.email_notifications,
                push_notifications: body.push_notifications,
                budget_alert_threshold: body.budget_alert_threshold,
            },
        )
        .await;
    api_result(result.map(UserResponse::from))
}

/// PUT /settings/password
pub async fn change_password(
    auth: AuthUser,
    body: web::Json<ChangePasswordBody>,
    users: web::Data<Arc<UserService>>,
) -> HttpResponse {
    let result = users
        .change_password(auth.id, &body.current_password, &body.new_password)
        .await;
    api_result(result.map(|_| MessageResponse {
        message: "Password updated".to_string(),
    }))
}
