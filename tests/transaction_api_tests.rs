//! 交易、分类、汇总与导出集成测试

mod common;

use actix_web::test::{self, TestRequest};
use serde_json::{Value, json};

use common::{bearer, register_and_login, send, setup};

async fn category_id<S, B>(app: &S, token: &str, name: &str) -> i64
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse<B>,
            Error = actix_web::Error,
        >,
    B: actix_web::body::MessageBody,
{
    let (_, body) = send(app, TestRequest::get().uri("/api/v1/categories"), token).await;
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == name)
        .and_then(|c| c["id"].as_i64())
        .unwrap_or_else(|| panic!("category {} not found", name))
}

#[actix_rt::test]
async fn test_create_and_get_transaction() {
    let env = setup().await;
    let app = test_app!(env);
    let token = register_and_login(&app, "tx1@example.com").await;
    let food = category_id(&app, &token, "Food").await;

    let (status, body) = send(
        &app,
        TestRequest::post().uri("/api/v1/transactions").set_json(json!({
            "kind": "expense",
            "amount": "12.5",
            "date": "2024-03-05",
            "description": "  Lunch  ",
            "category_id": food
        })),
        &token,
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(body["data"]["amount"], "12.50");
    assert_eq!(body["data"]["description"], "Lunch");
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        TestRequest::get().uri(&format!("/api/v1/transactions/{}", id)),
        &token,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["category_id"], food);
    assert_eq!(body["data"]["kind"], "expense");
}

#[actix_rt::test]
async fn test_amount_validation() {
    let env = setup().await;
    let app = test_app!(env);
    let token = register_and_login(&app, "tx2@example.com").await;

    for amount in [json!("-5.00"), json!(0), json!("0.004"), json!("abc")] {
        let (status, _) = send(
            &app,
            TestRequest::post().uri("/api/v1/transactions").set_json(json!({
                "kind": "expense",
                "amount": amount,
                "date": "2024-03-05"
            })),
            &token,
        )
        .await;
        assert_eq!(status, 400, "amount {} accepted", amount);
    }

    // 数字形式的金额同样可以
    let (status, body) = send(
        &app,
        TestRequest::post().uri("/api/v1/transactions").set_json(json!({
            "kind": "income",
            "amount": 1500,
            "date": "2024-03-01"
        })),
        &token,
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(body["data"]["amount"], "1500.00");
}

#[actix_rt::test]
async fn test_category_kind_must_match() {
    let env = setup().await;
    let app = test_app!(env);
    let token = register_and_login(&app, "tx3@example.com").await;
    let salary = category_id(&app, &token, "Salary").await;

    let (status, body) = send(
        &app,
        TestRequest::post().uri("/api/v1/transactions").set_json(json!({
            "kind": "expense",
            "amount": "10",
            "date": "2024-03-05",
            "category_id": salary
        })),
        &token,
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], 3000);
}

#[actix_rt::test]
async fn test_users_are_isolated() {
    let env = setup().await;
    let app = test_app!(env);
    let alice = register_and_login(&app, "alice@example.com").await;
    let bob = register_and_login(&app, "bob@example.com").await;

    let (_, body) = send(
        &app,
        TestRequest::post().uri("/api/v1/transactions").set_json(json!({
            "kind": "expense",
            "amount": "10",
            "date": "2024-03-05"
        })),
        &alice,
    )
    .await;
    let id = body["data"]["id"].as_i64().unwrap();
    let uri = format!("/api/v1/transactions/{}", id);

    let (status, _) = send(&app, TestRequest::get().uri(&uri), &bob).await;
    assert_eq!(status, 404);
    let (status, _) = send(&app, TestRequest::delete().uri(&uri), &bob).await;
    assert_eq!(status, 404);

    // 也不能引用别人的分类
    let alice_food = category_id(&app, &alice, "Food").await;
    let (status, _) = send(
        &app,
        TestRequest::post().uri("/api/v1/transactions").set_json(json!({
            "kind": "expense",
            "amount": "10",
            "date": "2024-03-05",
            "category_id": alice_food
        })),
        &bob,
    )
    .await;
    assert_eq!(status, 404);

    let (_, body) = send(&app, TestRequest::get().uri("/api/v1/transactions"), &bob).await;
    assert_eq!(body["pagination"]["total"], 0);
}

#[actix_rt::test]
async fn test_list_filters_and_pagination() {
    let env = setup().await;
    let app = test_app!(env);
    let token = register_and_login(&app, "tx4@example.com").await;

    for day in 1..=25 {
        let kind = if day % 5 == 0 { "income" } else { "expense" };
        let description = if day == 7 { "Coffee beans" } else { "Groceries" };
        send(
            &app,
            TestRequest::post().uri("/api/v1/transactions").set_json(json!({
                "kind": kind,
                "amount": format!("{}.00", day),
                "date": format!("2024-01-{:02}", day),
                "description": description
            })),
            &token,
        )
        .await;
    }

    let (status, body) = send(
        &app,
        TestRequest::get().uri("/api/v1/transactions?page=2&page_size=10"),
        &token,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["pagination"]["total"], 25);
    assert_eq!(body["pagination"]["total_pages"], 3);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 10);
    // 按日期倒序
    assert_eq!(data[0]["date"], "2024-01-15");

    let (_, body) = send(
        &app,
        TestRequest::get().uri("/api/v1/transactions?kind=income"),
        &token,
    )
    .await;
    assert_eq!(body["pagination"]["total"], 5);

    let (_, body) = send(
        &app,
        TestRequest::get().uri("/api/v1/transactions?from=2024-01-10&to=2024-01-12"),
        &token,
    )
    .await;
    assert_eq!(body["pagination"]["total"], 3);

    let (_, body) = send(
        &app,
        TestRequest::get().uri("/api/v1/transactions?search=COFFEE"),
        &token,
    )
    .await;
    assert_eq!(body["pagination"]["total"], 1);

    let (status, _) = send(
        &app,
        TestRequest::get().uri("/api/v1/transactions?from=2024-02-01&to=2024-01-01"),
        &token,
    )
    .await;
    assert_eq!(status, 400);

    // page_size 超过上限时被截断
    let (_, body) = send(
        &app,
        TestRequest::get().uri("/api/v1/transactions?page_size=1000"),
        &token,
    )
    .await;
    assert_eq!(body["pagination"]["page_size"], 100);

    let (status, body) = send(
        &app,
        TestRequest::get().uri("/api/v1/transactions?page=18446744073709551615&page_size=100"),
        &token,
    )
    .await;
    assert_eq!(status, 200);
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["pagination"]["page"], 1_000_000);
}

#[actix_rt::test]
async fn test_search_treats_wildcards_literally() {
    let env = setup().await;
    let app = test_app!(env);
    let token = register_and_login(&app, "tx-search@example.com").await;

    for description in ["Coffee beans", "Spring sale 50% off", "Book"] {
        let (status, _) = send(
            &app,
            TestRequest::post().uri("/api/v1/transactions").set_json(json!({
                "kind": "expense",
                "amount": "3.00",
                "date": "2024-04-01",
                "description": description
            })),
            &token,
        )
        .await;
        assert_eq!(status, 201);
    }

    let search = |term: &str| TestRequest::get().uri(&format!("/api/v1/transactions?search={}", term));

    let (_, body) = send(&app, search("_"), &token).await;
    assert_eq!(body["pagination"]["total"], 0);

    // "%" 需要 URL 编码
    let (_, body) = send(&app, search("%25"), &token).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["description"], "Spring sale 50% off");

    let (_, body) = send(&app, search("50%25%20off"), &token).await;
    assert_eq!(body["pagination"]["total"], 1);

    let (_, body) = send(&app, search("b__k"), &token).await;
    assert_eq!(body["pagination"]["total"], 0);
}

#[actix_rt::test]
async fn test_update_and_delete() {
    let env = setup().await;
    let app = test_app!(env);
    let token = register_and_login(&app, "tx5@example.com").await;

    let (_, body) = send(
        &app,
        TestRequest::post().uri("/api/v1/transactions").set_json(json!({
            "kind": "expense",
            "amount": "10",
            "date": "2024-03-05"
        })),
        &token,
    )
    .await;
    let uri = format!("/api/v1/transactions/{}", body["data"]["id"]);

    let (status, body) = send(
        &app,
        TestRequest::put().uri(&uri).set_json(json!({
            "kind": "income",
            "amount": "99.99",
            "date": "2024-03-06",
            "description": "Refund"
        })),
        &token,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["kind"], "income");
    assert_eq!(body["data"]["amount"], "99.99");

    let (status, _) = send(&app, TestRequest::delete().uri(&uri), &token).await;
    assert_eq!(status, 200);
    let (status, _) = send(&app, TestRequest::get().uri(&uri), &token).await;
    assert_eq!(status, 404);
}

#[actix_rt::test]
async fn test_summary_groups_by_category_and_month() {
    let env = setup().await;
    let app = test_app!(env);
    let token = register_and_login(&app, "tx6@example.com").await;
    let food = category_id(&app, &token, "Food").await;

    for (kind, amount, date, category) in [
        ("income", "1000.00", "2024-01-01", None),
        ("expense", "100.25", "2024-01-10", Some(food)),
        ("expense", "50.25", "2024-02-10", Some(food)),
        ("expense", "20.00", "2024-02-11", None),
    ] {
        send(
            &app,
            TestRequest::post().uri("/api/v1/transactions").set_json(json!({
                "kind": kind,
                "amount": amount,
                "date": date,
                "category_id": category
            })),
            &token,
        )
        .await;
    }

    let (status, body) = send(
        &app,
        TestRequest::get().uri("/api/v1/transactions/summary"),
        &token,
    )
    .await;
    assert_eq!(status, 200);
    let data = &body["data"];
    assert_eq!(data["income"], "1000.00");
    assert_eq!(data["expense"], "170.50");
    assert_eq!(data["net"], "829.50");
    assert_eq!(data["count"], 4);

    let by_month = data["by_month"].as_array().unwrap();
    assert_eq!(by_month.len(), 2);
    assert_eq!(by_month[0]["month"], "2024-01");
    assert_eq!(by_month[1]["expense"], "70.25");

    let by_category = data["by_category"].as_array().unwrap();
    let food_total = by_category.iter().find(|c| c["name"] == "Food").unwrap();
    assert_eq!(food_total["total"], "150.50");
    assert_eq!(food_total["count"], 2);
    assert!(by_category.iter().any(|c| c["name"] == "Uncategorized"));

    let (_, body) = send(
        &app,
        TestRequest::get().uri("/api/v1/transactions/summary?from=2024-02-01"),
        &token,
    )
    .await;
    let income: f64 = body["data"]["income"].as_str().unwrap().parse().unwrap();
    assert_eq!(income, 0.0);
    assert_eq!(body["data"]["count"], 2);
}

#[actix_rt::test]
async fn test_export_csv() {
    let env = setup().await;
    let app = test_app!(env);
    let token = register_and_login(&app, "tx7@example.com").await;
    let food = category_id(&app, &token, "Food").await;

    for (amount, date) in [("3.50", "2024-01-02"), ("7.00", "2024-01-01")] {
        send(
            &app,
            TestRequest::post().uri("/api/v1/transactions").set_json(json!({
                "kind": "expense",
                "amount": amount,
                "date": date,
                "description": "Snack, large",
                "category_id": food
            })),
            &token,
        )
        .await;
    }

    let req = TestRequest::get()
        .uri("/api/v1/transactions/export")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let disposition = resp
        .headers()
        .get("Content-Disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("transactions_export_"));

    let body = test::read_body(resp).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "date,kind,amount,category,description");
    assert_eq!(lines[1], "2024-01-01,expense,7.00,Food,\"Snack, large\"");
    assert_eq!(lines.len(), 3);
}

#[actix_rt::test]
async fn test_category_crud_and_delete_detaches() {
    let env = setup().await;
    let app = test_app!(env);
    let token = register_and_login(&app, "tx8@example.com").await;

    let (status, body) = send(
        &app,
        TestRequest::post().uri("/api/v1/categories").set_json(json!({
            "name": "Pets",
            "kind": "expense",
            "color": "#AABBCC"
        })),
        &token,
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(body["data"]["color"], "#aabbcc");
    let pets = body["data"]["id"].as_i64().unwrap();

    // 同类型下名称唯一（不区分大小写）
    let (status, _) = send(
        &app,
        TestRequest::post()
            .uri("/api/v1/categories")
            .set_json(json!({ "name": "pets", "kind": "expense" })),
        &token,
    )
    .await;
    assert_eq!(status, 409);

    let (_, body) = send(
        &app,
        TestRequest::post().uri("/api/v1/transactions").set_json(json!({
            "kind": "expense",
            "amount": "30",
            "date": "2024-03-05",
            "category_id": pets
        })),
        &token,
    )
    .await;
    let tx_id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        TestRequest::delete().uri(&format!("/api/v1/categories/{}", pets)),
        &token,
    )
    .await;
    assert_eq!(status, 200);

    let (status, body) = send(
        &app,
        TestRequest::get().uri(&format!("/api/v1/transactions/{}", tx_id)),
        &token,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["category_id"], Value::Null);

    let (_, body) = send(
        &app,
        TestRequest::get().uri("/api/v1/categories?kind=income"),
        &token,
    )
    .await;
    assert!(
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .all(|c| c["kind"] == "income")
    );
}
