#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use account_backend::{
    AppState, app_router,
    cache::MemoryStore,
    config::{CacheType, Config, UserStoreType},
    database::{MemoryUserRepository, UserRepository},
    models::{NewUser, Role, User, predefined_roles},
    services::{SmsError, SmsSender},
};
use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

pub const PASSWORD: &str = "password1";

/// 记录下发内容而不真正发送
#[derive(Default)]
pub struct CapturingSender {
    sent: Mutex<Vec<(String, String)>>,
}

impl CapturingSender {
    pub fn last_code(&self, phone: &str) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        sent.iter()
            .rev()
            .find(|(p, _)| p == phone)
            .map(|(_, content)| content.chars().filter(char::is_ascii_digit).take(6).collect())
    }
}

#[async_trait]
impl SmsSender for CapturingSender {
    async fn send(&self, phone: &str, content: &str) -> Result<(), SmsError> {
        self.sent
            .lock()
            .unwrap()
            .push((phone.to_string(), content.to_string()));
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub users: Arc<MemoryUserRepository>,
    pub kv: Arc<MemoryStore>,
    pub sms: Arc<CapturingSender>,
}

pub fn test_config() -> Config {
    Config {
        user_store: UserStoreType::Memory,
        cache_type: CacheType::Memory,
        jwt_secret: "integration-test-secret".into(),
        ..Config::default()
    }
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(test_config(), Vec::new())
}

/// `extra_roles` 追加在预定义角色之后
pub fn spawn_app_with(config: Config, extra_roles: Vec<Role>) -> TestApp {
    let mut roles = predefined_roles();
    roles.extend(extra_roles);

    let users = Arc::new(MemoryUserRepository::with_roles(roles));
    let kv = Arc::new(MemoryStore::new());
    let sms = Arc::new(CapturingSender::default());

    let state = AppState::new(config, users.clone(), kv.clone(), sms.clone()).unwrap();
    TestApp {
        router: app_router(state),
        users,
        kv,
        sms,
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    pub async fn seed_user(&self, username: &str, role_id: u64) -> User {
        let new_user = NewUser::new(
            username.into(),
            format!("{username}@example.com"),
            username.into(),
            PASSWORD,
            role_id,
        )
        .await
        .unwrap();
        self.users.create(new_user).await.unwrap()
    }

    pub async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await
    }

    pub async fn token_for(&self, username: &str, role_id: u64) -> (User, String) {
        let user = self.seed_user(username, role_id).await;
        let (status, body) = self.login(username, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let token = body["resp_data"]["access_token"].as_str().unwrap().to_string();
        (user, token)
    }
}
