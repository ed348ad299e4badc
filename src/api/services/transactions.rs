//! 交易记录端点：列表、CRUD、汇总与 CSV 导出

use actix_web::{HttpResponse, web};
use std::sync::Arc;
use tracing::info;

use crate::api::middleware::AuthUser;
use crate::services::{TransactionRequest, TransactionService, clamp_pagination};
use crate::storage::TransactionFilter;
use crate::utils::csv_handler::{generate_export_filename, transactions_to_csv};

use super::helpers::{api_result, created_response, error_from_fintrack, paginated_response};
use super::types::{
    DateRangeQuery, MessageResponse, PaginationInfo, SummaryResponse, TransactionBody,
    TransactionQuery, TransactionResponse,
};

fn to_request(body: TransactionBody) -> TransactionRequest {
    TransactionRequest {
        kind: body.kind,
        amount: body.amount,
        date: body.date,
        description: body.description,
        category_id: body.category_id,
    }
}

fn to_filter(query: &TransactionQuery) -> TransactionFilter {
    TransactionFilter {
        from: query.from,
        to: query.to,
        kind: query.kind,
        category_id: query.category_id,
        search: query.search.clone(),
    }
}

/// GET /transactions
///
/// 支持按日期范围、类型、分类、描述关键字过滤，按日期倒序分页返回。
pub async fn list_transactions(
    auth: AuthUser,
    query: web::Query<TransactionQuery>,
    transactions: web::Data<Arc<TransactionService>>,
) -> HttpResponse {
    let (page, page_size) = clamp_pagination(query.page, query.page_size);
    let filter = to_filter(&query);

    match transactions.list(auth.id, &filter, page, page_size).await {
        Ok((items, total)) => paginated_response(
            items.into_iter().map(TransactionResponse::from).collect(),
            PaginationInfo::new(page, page_size, total),
        ),
        Err(e) => error_from_fintrack(&e),
    }
}

/// GET /transactions/{id}
pub async fn get_transaction(
    auth: AuthUser,
    path: web::Path<i64>,
    transactions: web::Data<Arc<TransactionService>>,
) -> HttpResponse {
    let result = transactions.get(auth.id, path.into_inner()).await;
    api_result(result.map(TransactionResponse::from))
}

/// POST /transactions
pub async fn create_transaction(
    auth: AuthUser,
    body: web::Json<TransactionBody>,
    transactions: web::Data<Arc<TransactionService>>,
) -> HttpResponse {
    match transactions
        .create(auth.id, to_request(body.into_inner()))
        .await
    {
        Ok(tx) => created_response(TransactionResponse::from(tx)),
        Err(e) => error_from_fintrack(&e),
    }
}

/// PUT /transactions/{id}
pub async fn update_transaction(
    auth: AuthUser,
    path: web::Path<i64>,
    body: web::Json<TransactionBody>,
    transactions: web::Data<Arc<TransactionService>>,
) -> HttpResponse {
    let result = transactions
        .update(auth.id, path.into_inner(), to_request(body.into_inner()))
        .await;
    api_result(result.map(TransactionResponse::from))
}

/// DELETE /transactions/{id}
pub async fn delete_transaction(
    auth: AuthUser,
    path: web::Path<i64>,
    transactions: web::Data<Arc<TransactionService>>,
) -> HttpResponse {
    let id = path.into_inner();
    let result = transactions.delete(auth.id, id).await;
    api_result(result.map(|_| MessageResponse {
        message: format!("Transaction {} deleted", id),
    }))
}

/// GET /transactions/summary?from=&to=
pub async fn transaction_summary(
    auth: AuthUser,
    query: web::Query<DateRangeQuery>,
    transactions: web::Data<Arc<TransactionService>>,
) -> HttpResponse {
    let result = transactions.summary(auth.id, query.from, query.to).await;
    api_result(result.map(SummaryResponse::from))
}

/// GET /transactions/export
///
/// 使用与列表相同的过滤参数（分页参数被忽略），导出格式可直接重新导入。
pub async fn export_transactions(
    auth: AuthUser,
    query: web::Query<TransactionQuery>,
    transactions: web::Data<Arc<TransactionService>>,
) -> HttpResponse {
    let filter = to_filter(&query);

    let rows = match transactions.export_rows(auth.id, &filter).await {
        Ok(rows) => rows,
        Err(e) => return error_from_fintrack(&e),
    };

    let body = match transactions_to_csv(&rows) {
        Ok(body) => body,
        Err(e) => return error_from_fintrack(&e),
    };

    let filename = generate_export_filename();
    info!(
        "Exported {} transactions for user {} to {}",
        rows.len(),
        auth.id,
        filename
    );

    HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(body)
}
