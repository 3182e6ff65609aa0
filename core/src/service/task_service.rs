use std::cmp::Reverse;

use thiserror::Error;

use crate::client::{ApiError, TaskApi};
use crate::model::task::{Priority, Task, TaskStatus};
use crate::schema::{validate_create, validate_update, TaskForm, ValidationErrors};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ServiceError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ServiceError::Api(ApiError::Unauthorized))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortStrategy {
    Server,
    Priority,
    DueDate,
    Created,
}

impl Default for SortStrategy {
    fn default() -> Self {
        SortStrategy::Server
    }
}

impl SortStrategy {
    pub const ALL: [SortStrategy; 4] = [
        SortStrategy::Server,
        SortStrategy::Priority,
        SortStrategy::DueDate,
        SortStrategy::Created,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SortStrategy::Server => "server",
            SortStrategy::Priority => "priority",
            SortStrategy::DueDate => "due",
            SortStrategy::Created => "created",
        }
    }

    pub fn next(&self) -> SortStrategy {
        let pos = Self::ALL.iter().position(|s| s == self).unwrap_or(0);
        Self::ALL[(pos + 1) % Self::ALL.len()]
    }
}

/// Client-side narrowing of the fetched list. `None` matches everything.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.status.map_or(true, |s| task.status == s)
            && self.priority.map_or(true, |p| task.priority == p)
    }

    pub fn is_active(&self) -> bool {
        self.status.is_some() || self.priority.is_some()
    }
}

pub struct TaskService<A: TaskApi> {
    api: A,
}

impl<A: TaskApi> TaskService<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn load_tasks(
        &self,
        filter: TaskFilter,
        strategy: SortStrategy,
    ) -> Result<Vec<Task>, ServiceError> {
        let mut tasks: Vec<Task> = self
            .api
            .get_tasks()?
            .into_iter()
            .filter(|t| filter.matches(t))
            .collect();
        sort_tasks(&mut tasks, strategy);
        Ok(tasks)
    }

    pub fn get(&self, id: i64) -> Result<Task, ServiceError> {
        Ok(self.api.get_task_by_id(id)?)
    }

    pub fn create_from_form(&self, form: &TaskForm) -> Result<Task, ServiceError> {
        let data = validate_create(form)?;
        Ok(self.api.create_task(&data)?)
    }

    pub fn update_from_form(&self, id: i64, form: &TaskForm) -> Result<Task, ServiceError> {
        let data = validate_update(form)?;
        Ok(self.api.update_task(id, &data)?)
    }

    pub fn change_status(&self, id: i64, status: TaskStatus) -> Result<Task, ServiceError> {
        Ok(self.api.update_task_status(id, status)?)
    }

    pub fn delete(&self, id: i64) -> Result<(), ServiceError> {
        Ok(self.api.delete_task(id)?)
    }
}

/// Stable, so equal keys keep the server's order.
pub fn sort_tasks(tasks: &mut [Task], strategy: SortStrategy) {
    match strategy {
        SortStrategy::Server => {}
        SortStrategy::Priority => tasks.sort_by_key(|t| Reverse(t.priority.rank())),
        // undated tasks go last
        SortStrategy::DueDate => tasks.sort_by_key(|t| (t.due().is_none(), t.due())),
        // ISO timestamps order lexically
        SortStrategy::Created => tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
}
