//! API v1 路由配置

use actix_web::web;

use super::auth::{login, login_rate_limiter, me, refresh_token, register};
use super::budgets::{
    budget_progress, create_budget, delete_budget, get_budget, list_budgets, update_budget,
};
use super::categories::{
    create_category, delete_category, get_category, list_categories, update_category,
};
use super::goals::{contribute, create_goal, delete_goal, get_goal, list_goals, update_goal};
use super::import::import_transactions;
use super::notifications::{
    delete_notification, list_notifications, mark_all_read, mark_read, send_test, subscribe,
    unread_count, unsubscribe,
};
use super::settings::{change_password, get_settings, update_settings};
use super::transactions::{
    create_transaction, delete_transaction, export_transactions, get_transaction,
    list_transactions, transaction_summary, update_transaction,
};

/// 认证路由 `/auth`
///
/// 包含：
/// - POST /auth/register - 注册
/// - POST /auth/login - 登录（带限流）
/// - POST /auth/refresh - 刷新 token
/// - GET /auth/me - 当前用户
pub fn auth_routes() -> actix_web::Scope {
    web::scope("/auth")
        .route("/register", web::post().to(register))
        .route("/login", web::post().to(login).wrap(login_rate_limiter()))
        .route("/refresh", web::post().to(refresh_token))
        .route("/me", web::get().to(me))
}

/// 用户设置路由 `/settings`
pub fn settings_routes() -> actix_web::Scope {
    web::scope("/settings")
        .route("", web::get().to(get_settings))
        .route("", web::put().to(update_settings))
        .route("/password", web::put().to(change_password))
}

/// 分类路由 `/categories`
pub fn categories_routes() -> actix_web::Scope {
    web::scope("/categories")
        .route("", web::get().to(list_categories))
        .route("", web::post().to(create_category))
        .route("/{id}", web::get().to(get_category))
        .route("/{id}", web::put().to(update_category))
        .route("/{id}", web::delete().to(delete_category))
}

/// 交易路由 `/transactions`
pub fn transactions_routes() -> actix_web::Scope {
    web::scope("/transactions")
        .route("", web::get().to(list_transactions))
        .route("", web::post().to(create_transaction))
        // Summary/export (must be before /{id})
        .route("/summary", web::get().to(transaction_summary))
        .route("/export", web::get().to(export_transactions))
        .route("/{id}", web::get().to(get_transaction))
        .route("/{id}", web::put().to(update_transaction))
        .route("/{id}", web::delete().to(delete_transaction))
}

/// 预算路由 `/budgets`
pub fn budgets_routes() -> actix_web::Scope {
    web::scope("/budgets")
        .route("", web::get().to(list_budgets))
        .route("", web::post().to(create_budget))
        .route("/{id}/progress", web::get().to(budget_progress))
        .route("/{id}", web::get().to(get_budget))
        .route("/{id}", web::put().to(update_budget))
        .route("/{id}", web::delete().to(delete_budget))
}

/// 储蓄目标路由 `/goals`
pub fn goals_routes() -> actix_web::Scope {
    web::scope("/goals")
        .route("", web::get().to(list_goals))
        .route("", web::post().to(create_goal))
        .route("/{id}/contribute", web::post().to(contribute))
        .route("/{id}", web::get().to(get_goal))
        .route("/{id}", web::put().to(update_goal))
        .route("/{id}", web::delete().to(delete_goal))
}

/// 通知路由 `/notifications`
pub fn notifications_routes() -> actix_web::Scope {
    web::scope("/notifications")
        .route("", web::get().to(list_notifications))
        // Fixed paths (must be before /{id})
        .route("/unread-count", web::get().to(unread_count))
        .route("/read-all", web::post().to(mark_all_read))
        .route("/subscriptions", web::post().to(subscribe))
        .route("/subscriptions", web::delete().to(unsubscribe))
        .route("/test", web::post().to(send_test))
        .route("/{id}/read", web::post().to(mark_read))
        .route("/{id}", web::delete().to(delete_notification))
}

/// API v1 路由
///
/// 组合所有子模块路由，认证中间件由调用方包裹。
pub fn api_v1_routes() -> actix_web::Scope {
    web::scope("/api/v1")
        .service(auth_routes())
        .service(settings_routes())
        .service(categories_routes())
        .service(transactions_routes())
        .service(budgets_routes())
        .service(goals_routes())
        .service(notifications_routes())
        .route("/import", web::post().to(import_transactions))
}
