//! 预算进度与提醒集成测试

mod common;

use actix_web::test::TestRequest;
use chrono::{Datelike, Months, NaiveDate, Utc};
use serde_json::{Value, json};

use common::{register_and_login, send, setup};

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap()
}

async fn spend<S, B>(app: &S, token: &str, amount: &str, date: NaiveDate)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse<B>,
            Error = actix_web::Error,
        >,
    B: actix_web::body::MessageBody,
{
    let (status, _) = send(
        app,
        TestRequest::post().uri("/api/v1/transactions").set_json(json!({
            "kind": "expense",
            "amount": amount,
            "date": date.to_string(),
            "description": "spend"
        })),
        token,
    )
    .await;
    assert_eq!(status, 201);
}

async fn alert_kinds<S, B>(app: &S, token: &str) -> Vec<String>
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse<B>,
            Error = actix_web::Error,
        >,
    B: actix_web::body::MessageBody,
{
    let (_, body) = send(app, TestRequest::get().uri("/api/v1/notifications"), token).await;
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|n| n["kind"].as_str())
        .filter(|k| k.starts_with("budget_"))
        .map(str::to_string)
        .collect()
}

#[actix_rt::test]
async fn test_budget_progress_and_alerts() {
    let env = setup().await;
    let app = test_app!(env);
    let token = register_and_login(&app, "budget1@example.com").await;

    let (status, body) = send(
        &app,
        TestRequest::post().uri("/api/v1/budgets").set_json(json!({
            "name": "Monthly spending",
            "amount": "100",
            "period": "monthly",
            "start_date": month_start(today()).to_string()
        })),
        &token,
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(body["data"]["progress"]["spent"], "0.00");
    assert_eq!(body["data"]["progress"]["status"], "on_track");
    let id = body["data"]["id"].as_i64().unwrap();
    let progress_uri = format!("/api/v1/budgets/{}/progress", id);

    spend(&app, &token, "50", today()).await;
    assert!(alert_kinds(&app, &token).await.is_empty());

    spend(&app, &token, "35", today()).await;
    let (_, body) = send(&app, TestRequest::get().uri(&progress_uri), &token).await;
    assert_eq!(body["data"]["spent"], "85.00");
    assert_eq!(body["data"]["remaining"], "15.00");
    assert_eq!(body["data"]["status"], "warning");
    assert_eq!(alert_kinds(&app, &token).await, vec!["budget_warning"]);

    // 同一周期内同级别提醒只发一次
    spend(&app, &token, "5", today()).await;
    assert_eq!(alert_kinds(&app, &token).await.len(), 1);

    spend(&app, &token, "20", today()).await;
    let (_, body) = send(&app, TestRequest::get().uri(&progress_uri), &token).await;
    assert_eq!(body["data"]["status"], "exceeded");
    assert_eq!(body["data"]["remaining"], "-10.00");
    let kinds = alert_kinds(&app, &token).await;
    assert_eq!(kinds.len(), 2);
    assert!(kinds.contains(&"budget_exceeded".to_string()));

    let (_, body) = send(&app, TestRequest::get().uri("/api/v1/notifications"), &token).await;
    let exceeded = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["kind"] == "budget_exceeded")
        .unwrap();
    assert_eq!(exceeded["title"], "Budget \"Monthly spending\" exceeded");

    spend(&app, &token, "1", today()).await;
    assert_eq!(alert_kinds(&app, &token).await.len(), 2);

    // 提醒也会发送邮件
    assert!(
        env.emails()
            .iter()
            .any(|(_, m)| m.subject.contains("Monthly spending"))
    );
}

#[actix_rt::test]
async fn test_backdated_expense_in_closed_period_is_silent() {
    let env = setup().await;
    let app = test_app!(env);
    let token = register_and_login(&app, "budget2@example.com").await;

    let this_month = month_start(today());
    let last_month = this_month.checked_sub_months(Months::new(1)).unwrap();

    send(
        &app,
        TestRequest::post().uri("/api/v1/budgets").set_json(json!({
            "name": "Tight",
            "amount": "10",
            "period": "monthly",
            "start_date": last_month.to_string()
        })),
        &token,
    )
    .await;

    spend(&app, &token, "500", last_month).await;
    assert!(alert_kinds(&app, &token).await.is_empty());

    let (_, body) = send(&app, TestRequest::get().uri("/api/v1/budgets"), &token).await;
    let budget = &body["data"][0];
    assert_eq!(budget["progress"]["spent"], "0.00");
    assert_eq!(budget["progress"]["period_start"], this_month.to_string());

    // 指定日期查看上一个周期
    let uri = format!(
        "/api/v1/budgets/{}/progress?date={}",
        budget["id"], last_month
    );
    let (status, body) = send(&app, TestRequest::get().uri(&uri), &token).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["spent"], "500.00");
    assert_eq!(body["data"]["status"], "exceeded");
    assert_eq!(body["data"]["period_end"], this_month.to_string());
}

#[actix_rt::test]
async fn test_category_budget_only_counts_its_category() {
    let env = setup().await;
    let app = test_app!(env);
    let token = register_and_login(&app, "budget3@example.com").await;

    let (_, body) = send(&app, TestRequest::get().uri("/api/v1/categories"), &token).await;
    let categories = body["data"].as_array().unwrap().clone();
    let id_of = |name: &str| -> i64 {
        categories
            .iter()
            .find(|c| c["name"] == name)
            .and_then(|c| c["id"].as_i64())
            .unwrap()
    };
    let food = id_of("Food");
    let transport = id_of("Transport");

    let (status, body) = send(
        &app,
        TestRequest::post().uri("/api/v1/budgets").set_json(json!({
            "name": "Food",
            "amount": "200",
            "period": "weekly",
            "start_date": today().to_string(),
            "category_id": food
        })),
        &token,
    )
    .await;
    assert_eq!(status, 201);
    let uri = format!("/api/v1/budgets/{}", body["data"]["id"]);

    for (category, amount) in [(food, "40"), (transport, "300"), (food, "10")] {
        send(
            &app,
            TestRequest::post().uri("/api/v1/transactions").set_json(json!({
                "kind": "expense",
                "amount": amount,
                "date": today().to_string(),
                "category_id": category
            })),
            &token,
        )
        .await;
    }

    let (_, body) = send(&app, TestRequest::get().uri(&uri), &token).await;
    assert_eq!(body["data"]["progress"]["spent"], "50.00");
    let percent: f64 = body["data"]["progress"]["percent"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(percent, 25.0);
}

#[actix_rt::test]
async fn test_budget_validation() {
    let env = setup().await;
    let app = test_app!(env);
    let token = register_and_login(&app, "budget4@example.com").await;

    let (_, body) = send(
        &app,
        TestRequest::get().uri("/api/v1/categories?kind=income"),
        &token,
    )
    .await;
    let salary = body["data"][0]["id"].as_i64().unwrap();

    let base = json!({
        "name": "Budget",
        "amount": "100",
        "period": "monthly",
        "start_date": "2024-01-01"
    });

    let mut income_budget = base.clone();
    income_budget["category_id"] = json!(salary);
    let mut zero_amount = base.clone();
    zero_amount["amount"] = json!("0");
    let mut blank_name = base.clone();
    blank_name["name"] = json!("   ");
    let mut bad_period = base.clone();
    bad_period["period"] = json!("daily");

    for payload in [income_budget, zero_amount, blank_name, bad_period] {
        let (status, _) = send(
            &app,
            TestRequest::post().uri("/api/v1/budgets").set_json(payload.clone()),
            &token,
        )
        .await;
        assert_eq!(status, 400, "payload accepted: {}", payload);
    }

    let (status, _) = send(
        &app,
        TestRequest::get().uri("/api/v1/budgets/9999"),
        &token,
    )
    .await;
    assert_eq!(status, 404);
}

#[actix_rt::test]
async fn test_update_and_delete_budget() {
    let env = setup().await;
    let app = test_app!(env);
    let token = register_and_login(&app, "budget5@example.com").await;

    let (_, body) = send(
        &app,
        TestRequest::post().uri("/api/v1/budgets").set_json(json!({
            "name": "Fun",
            "amount": "50",
            "period": "monthly",
            "start_date": "2024-01-01"
        })),
        &token,
    )
    .await;
    let uri = format!("/api/v1/budgets/{}", body["data"]["id"]);

    let (status, body) = send(
        &app,
        TestRequest::put().uri(&uri).set_json(json!({
            "name": "More fun",
            "amount": "75.5",
            "period": "yearly",
            "start_date": "2024-01-01"
        })),
        &token,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["name"], "More fun");
    assert_eq!(body["data"]["amount"], "75.50");
    assert_eq!(body["data"]["period"], "yearly");

    let (status, _) = send(&app, TestRequest::delete().uri(&uri), &token).await;
    assert_eq!(status, 200);
    let (_, body) = send(&app, TestRequest::get().uri("/api/v1/budgets"), &token).await;
    assert_eq!(body["data"], Value::Array(vec![]));
}
