//! 储蓄目标端点

use actix_web::{HttpResponse, web};
use std::sync::Arc;

use crate::api::middleware::AuthUser;
use crate::services::{GoalRequest, GoalService};

use super::helpers::{api_result, created_response, error_from_fintrack};
use super::types::{ContributeBody, GoalBody, GoalResponse, MessageResponse};

fn to_request(body: GoalBody) -> GoalRequest {
    GoalRequest {
        name: body.name,
        target_amount: body.target_amount,
        current_amount: body.current_amount,
        deadline: body.deadline,
    }
}

/// GET /goals
pub async fn list_goals(auth: AuthUser, goals: web::Data<Arc<GoalService>>) -> HttpResponse {
    let result = goals.list(auth.id).await;
    api_result(result.map(|list| list.into_iter().map(GoalResponse::from).collect::<Vec<_>>()))
}

/// GET /goals/{id}
pub async fn get_goal(
    auth: AuthUser,
    path: web::Path<i64>,
    goals: web::Data<Arc<GoalService>>,
) -> HttpResponse {
    api_result(goals.get(auth.id, path.into_inner()).await.map(GoalResponse::from))
}

/// POST /goals
pub async fn create_goal(
    auth: AuthUser,
    body: web::Json<GoalBody>,
    goals: web::Data<Arc<GoalService>>,
) -> HttpResponse {
    match goals.create(auth.id, to_request(body.into_inner())).await {
        Ok(goal) => created_response(GoalResponse::from(goal)),
        Err(e) => error_from_fintrack(&e),
    }
}

/// PUT /goals/{id}
pub async fn update_goal(
    auth: AuthUser,
    path: web::Path<i64>,
    body: web::Json<GoalBody>,
    goals: web::Data<Arc<GoalService>>,
) -> HttpResponse {
    let result = goals
        .update(auth.id, path.into_inner(), to_request(body.into_inner()))
        .await;
    api_result(result.map(GoalResponse::from))
}

/// DELETE /goals/{id}
pub async fn delete_goal(
    auth: AuthUser,
    path: web::Path<i64>,
    goals: web::Data<Arc<GoalService>>,
) -> HttpResponse {
    let id = path.into_inner();
    let result = goals.delete(auth.id, id).await;
    api_result(result.map(|_| MessageResponse {
        message: format!("Goal {} deleted", id),
    }))
}

/// POST /goals/{id}/contribute
///
/// 首次达到目标金额时发送 GoalReached 通知。
pub async fn contribute(
    auth: AuthUser,
    path: web::Path<i64>,
    body: web::Json<ContributeBody>,
    goals: web::Data<Arc<GoalService>>,
) -> HttpResponse {
    let result = goals
        .contribute(auth.id, path.into_inner(), body.amount)
        .await;
    api_result(result.map(GoalResponse::from))
}
