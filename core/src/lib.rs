pub mod model;
pub mod schema;
pub mod auth;
pub mod client;
pub mod config;
pub mod input;
pub mod time;
pub mod service;

pub use model::task::{Task, Priority, TaskStatus, CreateTaskData, UpdateTaskData, StatusUpdate};
pub use schema::{
    validate_create, validate_status, validate_update, Field, TaskForm, ValidationErrors,
};
pub use auth::{AuthError, Session, TokenSource, TokenStore, is_auth_expired};
pub use client::{ApiError, HttpTaskService, TaskApi};
pub use config::{AppConfig, ConfigError};
pub use input::{parse_args, expand_key, form_from_args, ParsedInput};
pub use time::parse_due_date;
pub use service::task_service::{TaskService, ServiceError, SortStrategy, TaskFilter, sort_tasks};
