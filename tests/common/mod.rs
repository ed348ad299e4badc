//! 集成测试公共设施
//!
//! 每个测试使用独立的临时 SQLite 数据库，通知发送器替换为记录型实现。

#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::test::{self, TestRequest};
use async_trait::async_trait;
use serde_json::{Value, json};
use tempfile::TempDir;

use fintrack::config::{DatabaseConfig, init_config};
use fintrack::errors::Result;
use fintrack::runtime::lifetime::startup::StartupContext;
use fintrack::services::NotificationService;
use fintrack::services::notification::{
    EmailMessage, EmailSender, PushOutcome, PushPayload, PushSender,
};
use fintrack::storage::{PushSubscription, SeaOrmStorage};

static INIT: Once = Once::new();

pub fn init_test_config() {
    INIT.call_once(|| {
        init_config();
    });
}

/// 记录所有发送的邮件
#[derive(Default)]
pub struct RecordingEmail {
    pub sent: Mutex<Vec<(String, EmailMessage)>>,
}

#[async_trait]
impl EmailSender for RecordingEmail {
    async fn send(&self, to: &str, message: &EmailMessage) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), message.clone()));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// 记录所有推送；endpoint 包含 "gone" 时模拟订阅失效
#[derive(Default)]
pub struct RecordingPush {
    pub sent: Mutex<Vec<(String, PushPayload)>>,
}

#[async_trait]
impl PushSender for RecordingPush {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &PushPayload,
    ) -> Result<PushOutcome> {
        if subscription.endpoint.contains("gone") {
            return Ok(PushOutcome::Gone);
        }
        self.sent
            .lock()
            .unwrap()
            .push((subscription.endpoint.clone(), payload.clone()));
        Ok(PushOutcome::Delivered)
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

pub struct TestEnv {
    pub ctx: StartupContext,
    pub email: Arc<RecordingEmail>,
    pub push: Arc<RecordingPush>,
    _dir: TempDir,
}

impl TestEnv {
    pub fn storage(&self) -> Arc<SeaOrmStorage> {
        self.ctx.storage.clone()
    }

    pub fn emails(&self) -> Vec<(String, EmailMessage)> {
        self.email.sent.lock().unwrap().clone()
    }

    pub fn pushes(&self) -> Vec<(String, PushPayload)> {
        self.push.sent.lock().unwrap().clone()
    }
}

/// 创建独立的测试环境（临时数据库 + 全部 service）
pub async fn setup() -> TestEnv {
    init_test_config();

    let dir = TempDir::new().expect("创建临时目录失败");
    let db_path = dir.path().join("fintrack_test.db");
    let config = DatabaseConfig {
        database_url: format!("sqlite://{}?mode=rwc", db_path.display()),
        ..Default::default()
    };

    let storage = Arc::new(
        SeaOrmStorage::connect(&config)
            .await
            .expect("创建存储失败"),
    );

    let email = Arc::new(RecordingEmail::default());
    let push = Arc::new(RecordingPush::default());
    let notifications = Arc::new(NotificationService::new(
        storage.clone(),
        email.clone(),
        push.clone(),
        "http://localhost:5173",
    ));

    TestEnv {
        ctx: StartupContext::with_notifications(storage, notifications),
        email,
        push,
        _dir: dir,
    }
}

/// 以完整的中间件栈初始化测试 App
#[macro_export]
macro_rules! test_app {
    ($env:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(fintrack::api::middleware::RequestIdMiddleware)
                .configure(fintrack::runtime::modes::configure_app(
                    $env.ctx.clone(),
                    fintrack::api::services::AppStartTime {
                        start_datetime: chrono::Utc::now(),
                    },
                )),
        )
        .await
    };
}

/// 登录限流器按连接 IP 取 key，测试请求需要显式设置
pub fn peer() -> std::net::SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

/// 注册并登录，返回 access token
pub async fn register_and_login<S, B>(app: &S, email: &str) -> String
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({
            "email": email,
            "password": "correct horse",
            "name": "Test User"
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 201, "register failed");

    let req = TestRequest::post()
        .uri("/api/v1/auth/login")
        .peer_addr(peer())
        .set_json(json!({ "email": email, "password": "correct horse" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(app, req).await;
    body["data"]["access_token"]
        .as_str()
        .expect("missing access token")
        .to_string()
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

/// 发送带认证的 JSON 请求，返回状态码与响应体
pub async fn send<S, B>(app: &S, req: TestRequest, token: &str) -> (u16, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req.insert_header(bearer(token)).to_request()).await;
    let status = resp.status().as_u16();
    let bytes = test::read_body(resp).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}
