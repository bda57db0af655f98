/// HTTP client for the UpTask API

use crate::{
    error::{api_error, ClientError, ClientResult},
    types::{
        EmailForm, Health, LoginForm, Message, NewPasswordForm, Project, ProjectDetail,
        ProjectFormData, RegistrationForm, StatusFormData, Task, TaskDetail, TaskFormData,
        TaskStatus, TokenForm,
    },
};
use reqwest::{Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use uuid::Uuid;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client bound to one server
#[derive(Debug, Clone)]
pub struct UpTaskClient {
    http: Client,
    base_url: String,
}

impl UpTaskClient {
    /// Creates a client for `base_url` (e.g. `http://localhost:4000`)
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let http = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Self::with_http(http, base_url)
    }

    /// Creates a client reusing an existing [`reqwest::Client`]
    pub fn with_http(http: Client, base_url: &str) -> ClientResult<Self> {
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::BaseUrl(base_url.to_string()));
        }

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn health(&self) -> ClientResult<Health> {
        self.send(self.request(Method::GET, "/health")).await
    }

    // Auth

    pub async fn create_account(&self, form: &RegistrationForm) -> ClientResult<Message> {
        self.post("/api/auth/create-account", form).await
    }

    pub async fn confirm_account(&self, token: &str) -> ClientResult<Message> {
        self.post("/api/auth/confirm-account", &TokenForm { token })
            .await
    }

    pub async fn login(&self, form: &LoginForm) -> ClientResult<Message> {
        self.post("/api/auth/login", form).await
    }

    pub async fn request_confirmation_code(&self, email: &str) -> ClientResult<Message> {
        self.post("/api/auth/request-code", &EmailForm { email })
            .await
    }

    pub async fn forgot_password(&self, email: &str) -> ClientResult<Message> {
        self.post("/api/auth/forgot-password", &EmailForm { email })
            .await
    }

    /// Checks a reset code without consuming it
    pub async fn validate_token(&self, token: &str) -> ClientResult<Message> {
        self.post("/api/auth/new-password", &TokenForm { token })
            .await
    }

    pub async fn update_password_with_token(
        &self,
        token: &str,
        form: &NewPasswordForm,
    ) -> ClientResult<Message> {
        self.post(&format!("/api/auth/update-password/{token}"), form)
            .await
    }

    // Projects

    pub async fn create_project(&self, form: &ProjectFormData) -> ClientResult<Project> {
        self.post("/api/projects", form).await
    }

    pub async fn get_projects(&self) -> ClientResult<Vec<Project>> {
        self.send(self.request(Method::GET, "/api/projects")).await
    }

    pub async fn get_project(&self, id: Uuid) -> ClientResult<ProjectDetail> {
        self.send(self.request(Method::GET, &format!("/api/projects/{id}")))
            .await
    }

    pub async fn update_project(&self, id: Uuid, form: &ProjectFormData) -> ClientResult<Message> {
        self.send(
            self.request(Method::PUT, &format!("/api/projects/{id}"))
                .json(form),
        )
        .await
    }

    pub async fn delete_project(&self, id: Uuid) -> ClientResult<Message> {
        self.send(self.request(Method::DELETE, &format!("/api/projects/{id}")))
            .await
    }

    // Tasks

    pub async fn create_task(&self, project_id: Uuid, form: &TaskFormData) -> ClientResult<Task> {
        self.post(&format!("/api/projects/{project_id}/tasks"), form)
            .await
    }

    pub async fn get_tasks(&self, project_id: Uuid) -> ClientResult<Vec<TaskDetail>> {
        self.send(self.request(Method::GET, &format!("/api/projects/{project_id}/tasks")))
            .await
    }

    pub async fn get_task(&self, project_id: Uuid, task_id: Uuid) -> ClientResult<Task> {
        self.send(self.request(Method::GET, &task_path(project_id, task_id)))
            .await
    }

    pub async fn update_task(
        &self,
        project_id: Uuid,
        task_id: Uuid,
        form: &TaskFormData,
    ) -> ClientResult<String> {
        self.send(
            self.request(Method::PUT, &task_path(project_id, task_id))
                .json(form),
        )
        .await
    }

    pub async fn delete_task(&self, project_id: Uuid, task_id: Uuid) -> ClientResult<String> {
        self.send(self.request(Method::DELETE, &task_path(project_id, task_id)))
            .await
    }

    pub async fn update_status(
        &self,
        project_id: Uuid,
        task_id: Uuid,
        status: TaskStatus,
    ) -> ClientResult<String> {
        let path = format!("{}/status", task_path(project_id, task_id));
        self.post(&path, &StatusFormData { status }).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().path().to_string();
        let body = response.bytes().await?;

        if !status.is_success() {
            tracing::debug!(%status, path = %url, "UpTask API returned an error");
            return Err(api_error(status, &body));
        }

        serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!(error = %e, path = %url, "Response did not match the expected schema");
            ClientError::Schema(e.to_string())
        })
    }
}

fn task_path(project_id: Uuid, task_id: Uuid) -> String {
    format!("/api/projects/{project_id}/tasks/{task_id}")
}
