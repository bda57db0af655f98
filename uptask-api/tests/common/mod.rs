#![allow(dead_code)]

/// Common test utilities for integration tests
///
/// Every test gets a fresh router over an in-memory store, with outgoing
/// mail captured by a recording mailer.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use uptask_api::{
    app::{build_router, AppState},
    config::Config,
};
use uptask_shared::{
    mail::{
        dispatcher::{MailDispatcher, RetryPolicy},
        recording::RecordingMailer,
    },
    repo::{memory::MemoryStore, Repositories},
};

pub const FRONTEND_URL: &str = "http://localhost:5173";

/// Test context containing the router and its backing resources
pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub repos: Repositories,
    pub mailer: Arc<RecordingMailer>,
    shutdown: CancellationToken,
}

impl TestContext {
    pub fn new() -> Self {
        let config = Config::from_lookup(|key| match key {
            "FRONTEND_URL" => Some(FRONTEND_URL.to_string()),
            "STORAGE" => Some("memory".to_string()),
            _ => None,
        })
        .expect("test config");

        let store = Arc::new(MemoryStore::new());
        let repos = Repositories::from_store(store.clone());
        let mailer = Arc::new(RecordingMailer::new());
        let shutdown = CancellationToken::new();
        let (mail, _handle) =
            MailDispatcher::spawn(mailer.clone(), RetryPolicy::default(), shutdown.clone());

        let app = build_router(AppState::new(repos.clone(), mail, config));

        Self {
            app,
            store,
            repos,
            mailer,
            shutdown,
        }
    }

    /// Sends a request and returns the status and parsed JSON body
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("non-JSON body: {}", String::from_utf8_lossy(&bytes))
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }

    /// Creates a project through the API and returns its id
    pub async fn create_project(&self, name: &str) -> String {
        let (status, body) = self
            .post(
                "/api/projects",
                serde_json::json!({
                    "projectName": name,
                    "clientName": "C1",
                    "description": "D1",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["_id"].as_str().unwrap().to_string()
    }

    /// Creates a task through the API and returns its id
    pub async fn create_task(&self, project_id: &str, name: &str) -> String {
        let (status, body) = self
            .post(
                &format!("/api/projects/{}/tasks", project_id),
                serde_json::json!({ "name": name, "description": "desc" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["_id"].as_str().unwrap().to_string()
    }

    /// Waits for the `nth` email (1-based) sent to `to` and returns its code
    pub async fn code_from_email(&self, to: &str, nth: usize) -> String {
        let mailer = self.mailer.clone();
        let address = to.to_string();
        wait_for(
            || {
                let mailer = mailer.clone();
                let address = address.clone();
                async move { mailer.sent_to(&address).await.len() >= nth }
            },
            5,
        )
        .await
        .expect("email not delivered");

        let emails = self.mailer.sent_to(to).await;
        extract_code(&emails[nth - 1].text).expect("email without code")
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Pulls the 6-digit code out of an email body
pub fn extract_code(text: &str) -> Option<String> {
    text.lines()
        .find_map(|line| line.trim().strip_prefix("Código: "))
        .map(|code| code.trim().to_string())
}

/// Helper to wait for condition with timeout
pub async fn wait_for<F, Fut>(condition: F, timeout_secs: u64) -> anyhow::Result<()>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_secs(timeout_secs);

    loop {
        if condition().await {
            return Ok(());
        }

        if start.elapsed() > timeout {
            anyhow::bail!("Condition not met within {} seconds", timeout_secs);
        }

        tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
    }
}
