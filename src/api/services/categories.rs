//! 分类 CRUD 端点

use actix_web::{HttpResponse, web};
use std::sync::Arc;

use crate::api::middleware::AuthUser;
use crate::services::{CategoryRequest, CategoryService};

use super::helpers::{api_result, created_response, error_from_fintrack};
use super::types::{CategoryBody, CategoryQuery, CategoryResponse, MessageResponse};

fn to_request(body: CategoryBody) -> CategoryRequest {
    CategoryRequest {
        name: body.name,
        kind: body.kind,
        color: body.color,
        icon: body.icon,
    }
}

/// GET /categories?kind=
pub async fn list_categories(
    auth: AuthUser,
    query: web::Query<CategoryQuery>,
    categories: web::Data<Arc<CategoryService>>,
) -> HttpResponse {
    let result = categories.list(auth.id, query.kind).await;
    api_result(result.map(|list| {
        list.into_iter()
            .map(CategoryResponse::from)
            .collect::<Vec<_>>()
    }))
}

/// GET /categories/{id}
pub async fn get_category(
    auth: AuthUser,
    path: web::Path<i64>,
    categories: web::Data<Arc<CategoryService>>,
) -> HttpResponse {
    let result = categories.get(auth.id, path.into_inner()).await;
    api_result(result.map(CategoryResponse::from))
}

/// POST /categories
pub async fn create_category(
    auth: AuthUser,
    body: web::Json<CategoryBody>,
    categories: web::Data<Arc<CategoryService>>,
) -> HttpResponse {
    match categories.create(auth.id, to_request(body.into_inner())).await {
        Ok(category) => created_response(CategoryResponse::from(category)),
        Err(e) => error_from_fintrack(&e),
    }
}

/// PUT /categories/{id}
pub async fn update_category(
    auth: AuthUser,
    path: web::Path<i64>,
    body: web::Json<CategoryBody>,
    categories: web::Data<Arc<CategoryService>>,
) -> HttpResponse {
    let result = categories
        .update(auth.id, path.into_inner(), to_request(body.into_inner()))
        .await;
    api_result(result.map(CategoryResponse::from))
}

/// DELETE /categories/{id}
///
/// 关联的交易和预算不会被删除，只是解除分类。
pub async fn delete_category(
    auth: AuthUser,
    path: web::Path<i64>,
    categories: web::Data<Arc<CategoryService>>,
) -> HttpResponse {
    let id = path.into_inner();
    let result = categories.delete(auth.id, id).await;
    api_result(result.map(|_| MessageResponse {
        message: format!("Category {} deleted", id),
    }))
}
