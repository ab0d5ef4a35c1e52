//! Shared helpers for API tests
//!
//! Builds the full router over in-memory stores, a recording upload stub and
//! a manual clock, then drives it with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use teamtask_api::app::{build_router, AppState};
use teamtask_api::config::Config;
use teamtask_shared::clock::ManualClock;
use teamtask_shared::store::Stores;
use teamtask_shared::upload::StubUploader;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";
pub const PASSWORD: &str = "correct-horse-battery";

/// Test context holding the router and its collaborators
pub struct TestContext {
    pub app: Router,
    pub clock: Arc<ManualClock>,
    pub uploader: Arc<StubUploader>,
}

/// A registered account as seen by the client
pub struct Account {
    pub id: String,
    pub token: String,
    pub team_code: String,
}

/// Decoded response
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
}

fn test_config(overrides: &[(&'static str, &'static str)]) -> Config {
    let mut env: HashMap<&'static str, &'static str> = HashMap::from([
        ("DATABASE_URL", "postgresql://unused/teamtask"),
        ("JWT_SECRET", TEST_SECRET),
        ("CLOUDINARY_CLOUD_NAME", "demo"),
        ("CLOUDINARY_API_KEY", "key"),
        ("CLOUDINARY_API_SECRET", "secret"),
    ]);
    env.extend(overrides.iter().copied());

    Config::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap()
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_env(&[])
    }

    /// Builds a context with extra environment entries layered on the defaults
    pub fn with_env(overrides: &[(&'static str, &'static str)]) -> Self {
        let clock = Arc::new(ManualClock::new(start_time()));
        let uploader = Arc::new(StubUploader::new());
        let state = AppState::new(
            test_config(overrides),
            Stores::in_memory(),
            uploader.clone(),
            clock.clone(),
        );

        Self {
            app: build_router(state),
            clock,
            uploader,
        }
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Sends a request and decodes the JSON body (`Value::Null` when empty)
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("non-JSON body ({status}): {}", String::from_utf8_lossy(&bytes))
            })
        };

        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Option<Value>) -> TestResponse {
        self.request(Method::PUT, uri, Some(token), body).await
    }

    async fn register(&self, body: Value) -> Account {
        let res = self.post("/auth/register", None, body).await;
        assert_eq!(res.status, StatusCode::CREATED, "register failed: {}", res.body);

        Account {
            id: res.body["user"]["id"].as_str().unwrap().to_string(),
            token: res.body["token"].as_str().unwrap().to_string(),
            team_code: res.body["user"]["team_code"].as_str().unwrap().to_string(),
        }
    }

    pub async fn register_manager(&self, name: &str, email: &str) -> Account {
        self.register(json!({
            "name": name,
            "email": email,
            "password": PASSWORD,
            "role": "manager",
        }))
        .await
    }

    pub async fn register_member(&self, name: &str, email: &str, team_code: &str) -> Account {
        self.register(json!({
            "name": name,
            "email": email,
            "password": PASSWORD,
            "role": "member",
            "team_code": team_code,
        }))
        .await
    }

    /// Assigns a task and returns its ID
    pub async fn assign(&self, manager: &Account, member: &Account, title: &str) -> String {
        let res = self
            .post(
                "/tasks/assign",
                Some(&manager.token),
                json!({ "assigned_to_id": member.id, "title": title }),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "assign failed: {}", res.body);

        res.body["id"].as_str().unwrap().to_string()
    }
}
