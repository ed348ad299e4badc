//! 站内通知与 Web Push 订阅端点

use actix_web::{HttpResponse, web};
use std::sync::Arc;
use tracing::info;

use crate::api::middleware::AuthUser;
use crate::services::{NotificationEvent, NotificationService, UserService};

use super::helpers::{api_result, created_response, error_from_fintrack};
use super::types::{
    MessageResponse, NotificationQuery, NotificationResponse, SubscriptionBody, UnreadCountResponse,
    UnsubscribeBody,
};

/// GET /notifications?unread_only=true
pub async fn list_notifications(
    auth: AuthUser,
    query: web::Query<NotificationQuery>,
    notifications: web::Data<Arc<NotificationService>>,
) -> HttpResponse {
    let result = notifications
        .list(auth.id, query.unread_only.unwrap_or(false))
        .await;
    api_result(result.map(|list| {
        list.into_iter()
            .map(NotificationResponse::from)
            .collect::<Vec<_>>()
    }))
}

/// GET /notifications/unread-count
pub async fn unread_count(
    auth: AuthUser,
    notifications: web::Data<Arc<NotificationService>>,
) -> HttpResponse {
    let result = notifications.unread_count(auth.id).await;
    api_result(result.map(|count| UnreadCountResponse { count }))
}

/// POST /notifications/{id}/read
pub async fn mark_read(
    auth: AuthUser,
    path: web::Path<i64>,
    notifications: web::Data<Arc<NotificationService>>,
) -> HttpResponse {
    let result = notifications.mark_read(auth.id, path.into_inner()).await;
    api_result(result.map(|_| MessageResponse {
        message: "Notification marked as read".to_string(),
    }))
}

/// POST /notifications/read-all
pub async fn mark_all_read(
    auth: AuthUser,
    notifications: web::Data<Arc<NotificationService>>,
) -> HttpResponse {
    let result = notifications.mark_all_read(auth.id).await;
    api_result(result.map(|count| MessageResponse {
        message: format!("{} notifications marked as read", count),
    }))
}

/// DELETE /notifications/{id}
pub async fn delete_notification(
    auth: AuthUser,
    path: web::Path<i64>,
    notifications: web::Data<Arc<NotificationService>>,
) -> HttpResponse {
    let id = path.into_inner();
    let result = notifications.delete(auth.id, id).await;
    api_result(result.map(|_| MessageResponse {
        message: format!("Notification {} deleted", id),
    }))
}

/// POST /notifications/subscriptions
///
/// 相同 endpoint 重复订阅时更新密钥。
pub async fn subscribe(
    auth: AuthUser,
    body: web::Json<SubscriptionBody>,
    notifications: web::Data<Arc<NotificationService>>,
) -> HttpResponse {
    match notifications
        .subscribe(auth.id, &body.endpoint, &body.keys.p256dh, &body.keys.auth)
        .await
    {
        Ok(subscription) => {
            info!(
                "Push subscription {} registered for user {}",
                subscription.id, auth.id
            );
            created_response(MessageResponse {
                message: "Subscribed".to_string(),
            })
        }
        Err(e) => error_from_fintrack(&e),
    }
}

/// DELETE /notifications/subscriptions
pub async fn unsubscribe(
    auth: AuthUser,
    body: web::Json<UnsubscribeBody>,
    notifications: web::Data<Arc<NotificationService>>,
) -> HttpResponse {
    let result = notifications.unsubscribe(auth.id, &body.endpoint).await;
    api_result(result.map(|_| MessageResponse {
        message: "Unsubscribed".to_string(),
    }))
}

/// POST /notifications/test
///
/// 通过所有已启用的渠道发送一条测试通知。
pub async fn send_test(
    auth: AuthUser,
    users: web::Data<Arc<UserService>>,
    notifications: web::Data<Arc<NotificationService>>,
) -> HttpResponse {
    let user = match users.get_user(auth.id).await {
        Ok(user) => user,
        Err(e) => return error_from_fintrack(&e),
    };

    let result = notifications.notify(&user, NotificationEvent::Test).await;
    api_result(result.map(NotificationResponse::from))
}
