//! 预算端点
//!
//! 所有读取接口都附带当前周期的进度，周期边界由预算的起始日推算。

use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;

use crate::api::middleware::AuthUser;
use crate::errors::Result;
use crate::services::{BudgetRequest, BudgetService, UserService};
use crate::storage::Budget;

use super::helpers::{api_result, created_response, error_from_fintrack};
use super::types::{
    BudgetBody, BudgetProgressResponse, BudgetResponse, MessageResponse, ProgressQuery,
};

fn to_request(body: BudgetBody) -> BudgetRequest {
    BudgetRequest {
        name: body.name,
        amount: body.amount,
        period: body.period,
        start_date: body.start_date,
        category_id: body.category_id,
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// 为单个预算附加指定日期所在周期的进度
async fn with_progress(
    users: &UserService,
    budgets: &BudgetService,
    user_id: i64,
    budget: Budget,
    on: NaiveDate,
) -> Result<BudgetResponse> {
    let user = users.get_user(user_id).await?;
    let progress = budgets.progress(&user, &budget, on).await?;
    Ok(BudgetResponse::new(budget, progress))
}

/// GET /budgets
pub async fn list_budgets(
    auth: AuthUser,
    users: web::Data<Arc<UserService>>,
    budgets: web::Data<Arc<BudgetService>>,
) -> HttpResponse {
    let user = match users.get_user(auth.id).await {
        Ok(user) => user,
        Err(e) => return error_from_fintrack(&e),
    };

    let result = budgets.list_with_progress(&user, today()).await;
    api_result(result.map(|list| {
        list.into_iter()
            .map(|(budget, progress)| BudgetResponse::new(budget, progress))
            .collect::<Vec<_>>()
    }))
}

/// GET /budgets/{id}
pub async fn get_budget(
    auth: AuthUser,
    path: web::Path<i64>,
    users: web::Data<Arc<UserService>>,
    budgets: web::Data<Arc<BudgetService>>,
) -> HttpResponse {
    let budget = match budgets.get(auth.id, path.into_inner()).await {
        Ok(budget) => budget,
        Err(e) => return error_from_fintrack(&e),
    };
    api_result(with_progress(&users, &budgets, auth.id, budget, today()).await)
}

/// POST /budgets
pub async fn create_budget(
    auth: AuthUser,
    body: web::Json<BudgetBody>,
    users: web::Data<Arc<UserService>>,
    budgets: web::Data<Arc<BudgetService>>,
) -> HttpResponse {
    let budget = match budgets.create(auth.id, to_request(body.into_inner())).await {
        Ok(budget) => budget,
        Err(e) => return error_from_fintrack(&e),
    };

    match with_progress(&users, &budgets, auth.id, budget, today()).await {
        Ok(response) => created_response(response),
        Err(e) => error_from_fintrack(&e),
    }
}

/// PUT /budgets/{id}
pub async fn update_budget(
    auth: AuthUser,
    path: web::Path<i64>,
    body: web::Json<BudgetBody>,
    users: web::Data<Arc<UserService>>,
    budgets: web::Data<Arc<BudgetService>>,
) -> HttpResponse {
    let budget = match budgets
        .update(auth.id, path.into_inner(), to_request(body.into_inner()))
        .await
    {
        Ok(budget) => budget,
        Err(e) => return error_from_fintrack(&e),
    };
    api_result(with_progress(&users, &budgets, auth.id, budget, today()).await)
}

/// DELETE /budgets/{id}
pub async fn delete_budget(
    auth: AuthUser,
    path: web::Path<i64>,
    budgets: web::Data<Arc<BudgetService>>,
) -> HttpResponse {
    let id = path.into_inner();
    let result = budgets.delete(auth.id, id).await;
    api_result(result.map(|_| MessageResponse {
        message: format!("Budget {} deleted", id),
    }))
}

/// GET /budgets/{id}/progress?date=YYYY-MM-DD
///
/// 不带 date 时使用今天。
pub async fn budget_progress(
    auth: AuthUser,
    path: web::Path<i64>,
    query: web::Query<ProgressQuery>,
    users: web::Data<Arc<UserService>>,
    budgets: web::Data<Arc<BudgetService>>,
) -> HttpResponse {
    let on = query.date.unwrap_or_else(today);

    let user = match users.get_user(auth.id).await {
        Ok(user) => user,
        Err(e) => return error_from_fintrack(&e),
    };
    let budget = match budgets.get(auth.id, path.into_inner()).await {
        Ok(budget) => budget,
        Err(e) => return error_from_fintrack(&e),
    };

    let result = budgets.progress(&user, &budget, on).await;
    api_result(result.map(BudgetProgressResponse::from))
}
