use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::auth::auth_header;
use crate::config::AppConfig;
use crate::model::task::{CreateTaskData, StatusUpdate, Task, TaskStatus, UpdateTaskData};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("session rejected by the server; run `taskdesk login`")]
    Unauthorized,

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// Remote operations on tasks. The UI only talks to this trait.
pub trait TaskApi {
    fn get_tasks(&self) -> Result<Vec<Task>, ApiError>;
    fn get_task_by_id(&self, id: i64) -> Result<Task, ApiError>;
    fn create_task(&self, data: &CreateTaskData) -> Result<Task, ApiError>;
    fn update_task(&self, id: i64, data: &UpdateTaskData) -> Result<Task, ApiError>;
    fn delete_task(&self, id: i64) -> Result<(), ApiError>;
    fn update_task_status(&self, id: i64, status: TaskStatus) -> Result<Task, ApiError>;
}

#[derive(Debug, Clone, Copy)]
enum Action {
    ListTasks,
    GetTask,
    CreateTask,
    UpdateTask,
    DeleteTask,
    UpdateStatus,
    Login,
}

impl Action {
    fn describe(&self) -> &'static str {
        match self {
            Action::ListTasks => "fetch tasks",
            Action::GetTask => "fetch task",
            Action::CreateTask => "create task",
            Action::UpdateTask => "update task",
            Action::DeleteTask => "delete task",
            Action::UpdateStatus => "update status",
            Action::Login => "log in",
        }
    }

    /// Whether the server's `detail` message is surfaced instead of the generic one.
    fn surfaces_detail(&self) -> bool {
        matches!(
            self,
            Action::CreateTask | Action::UpdateTask | Action::UpdateStatus | Action::Login
        )
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

pub struct HttpTaskService {
    client: Client,
    base_url: String,
    login_path: String,
    token: Option<String>,
}

impl HttpTaskService {
    pub fn new(config: &AppConfig, token: Option<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(HttpTaskService {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            login_path: config.login_path.clone(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method.clone(), self.url(path))
            .header(CONTENT_TYPE, "application/json");
        if method == reqwest::Method::GET {
            builder = builder.header(CACHE_CONTROL, "no-store");
        }
        if let Some(token) = &self.token {
            let (name, value) = auth_header(token);
            builder = builder.header(name, value);
        }
        builder
    }

    fn send(&self, action: Action, builder: RequestBuilder) -> Result<Response, ApiError> {
        tracing::debug!(action = action.describe(), "sending request");
        let response = builder.send().map_err(|e| {
            tracing::error!(action = action.describe(), error = %e, "transport failure");
            ApiError::Transport(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let err = error_from_response(action, status, response);
        tracing::error!(
            action = action.describe(),
            status = status.as_u16(),
            error = %err,
            "request failed"
        );
        Err(err)
    }

    fn decode<T: DeserializeOwned>(action: Action, response: Response) -> Result<T, ApiError> {
        response.json::<T>().map_err(|e| {
            tracing::error!(action = action.describe(), error = %e, "could not decode response");
            ApiError::Decode(e.to_string())
        })
    }

    /// OAuth2 password flow against the login endpoint. Returns the access token.
    pub fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let builder = self
            .client
            .post(self.url(&self.login_path))
            .form(&[("username", username), ("password", password)]);
        let response = self.send(Action::Login, builder)?;
        let body: TokenResponse = Self::decode(Action::Login, response)?;
        tracing::info!(username, "logged in");
        Ok(body.access_token)
    }
}

fn error_from_response(action: Action, status: StatusCode, response: Response) -> ApiError {
    if status == StatusCode::UNAUTHORIZED && !matches!(action, Action::Login) {
        return ApiError::Unauthorized;
    }

    let fallback = format!("Failed to {}: {}", action.describe(), status.as_u16());
    let message = if action.surfaces_detail() {
        response
            .json::<serde_json::Value>()
            .ok()
            .and_then(|body| body.get("detail").and_then(|d| d.as_str()).map(str::to_string))
            .unwrap_or(fallback)
    } else {
        fallback
    };

    ApiError::Status { status: status.as_u16(), message }
}

impl TaskApi for HttpTaskService {
    fn get_tasks(&self) -> Result<Vec<Task>, ApiError> {
        let builder = self.request(reqwest::Method::GET, "/api/tasks");
        let response = self.send(Action::ListTasks, builder)?;
        Self::decode(Action::ListTasks, response)
    }

    fn get_task_by_id(&self, id: i64) -> Result<Task, ApiError> {
        let path = format!("/api/tasks/{id}");
        let response = self.send(Action::GetTask, self.request(reqwest::Method::GET, &path))?;
        Self::decode(Action::GetTask, response)
    }

    fn create_task(&self, data: &CreateTaskData) -> Result<Task, ApiError> {
        let builder = self.request(reqwest::Method::POST, "/api/tasks").json(data);
        let response = self.send(Action::CreateTask, builder)?;
        Self::decode(Action::CreateTask, response)
    }

    fn update_task(&self, id: i64, data: &UpdateTaskData) -> Result<Task, ApiError> {
        let path = format!("/api/tasks/{id}");
        let builder = self.request(reqwest::Method::PUT, &path).json(data);
        let response = self.send(Action::UpdateTask, builder)?;
        Self::decode(Action::UpdateTask, response)
    }

    fn delete_task(&self, id: i64) -> Result<(), ApiError> {
        let path = format!("/api/tasks/{id}");
        self.send(Action::DeleteTask, self.request(reqwest::Method::DELETE, &path))?;
        Ok(())
    }

    fn update_task_status(&self, id: i64, status: TaskStatus) -> Result<Task, ApiError> {
        let path = format!("/api/tasks/{id}/status");
        let builder = self
            .request(reqwest::Method::PATCH, &path)
            .json(&StatusUpdate { status });
        let response = self.send(Action::UpdateStatus, builder)?;
        Self::decode(Action::UpdateStatus, response)
    }
}
