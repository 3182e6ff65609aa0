//! Client-side validation of task forms.
//!
//! A [`TaskForm`] holds the raw text a user typed. The `validate_*` functions
//! turn it into a request body or report every field that failed.

use std::fmt;

use thiserror::Error;

use crate::model::task::{CreateTaskData, Priority, Task, TaskStatus, UpdateTaskData};
use crate::time::parse_due_date;

pub const TITLE_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Description,
    Priority,
    Status,
    DueDate,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Title,
        Field::Description,
        Field::Priority,
        Field::Status,
        Field::DueDate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Description => "description",
            Field::Priority => "priority",
            Field::Status => "status",
            Field::DueDate => "due_date",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Default)]
#[error("{}", summary(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    fn push(&mut self, field: Field, message: impl Into<String>) {
        self.errors.push(FieldError { field, message: message.into() });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// First message reported for `field`, if any.
    pub fn for_field(&self, field: Field) -> Option<&str> {
        self.errors.iter().find(|e| e.field == field).map(|e| e.message.as_str())
    }

    fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// Raw form state shared by the create and edit screens.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub due_date: String,
}

impl Default for TaskForm {
    fn default() -> Self {
        TaskForm {
            title: String::new(),
            description: String::new(),
            priority: Priority::Medium,
            status: TaskStatus::Pending,
            due_date: String::new(),
        }
    }
}

impl TaskForm {
    pub fn from_task(task: &Task) -> Self {
        TaskForm {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            priority: task.priority,
            status: task.status,
            due_date: task
                .due()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .or_else(|| task.due_date.clone())
                .unwrap_or_default(),
        }
    }
}

fn check_title(title: &str, errors: &mut ValidationErrors) {
    let len = title.chars().count();
    if len == 0 {
        errors.push(Field::Title, "Title is required");
    } else if len > TITLE_MAX_CHARS {
        errors.push(Field::Title, format!("Title must be at most {} characters", TITLE_MAX_CHARS));
    }
}

fn check_description(description: &str, errors: &mut ValidationErrors) -> Option<String> {
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        errors.push(
            Field::Description,
            format!("Description must be at most {} characters", DESCRIPTION_MAX_CHARS),
        );
    }
    non_empty(description)
}

fn check_due_date(due: &str, errors: &mut ValidationErrors) -> Option<String> {
    let due = due.trim();
    if due.is_empty() {
        return None;
    }
    match parse_due_date(due) {
        Ok(date) => Some(date.format("%Y-%m-%d").to_string()),
        Err(e) => {
            errors.push(Field::DueDate, e.to_string());
            None
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

pub fn validate_create(form: &TaskForm) -> Result<CreateTaskData, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_title(&form.title, &mut errors);
    let description = check_description(&form.description, &mut errors);
    let due_date = check_due_date(&form.due_date, &mut errors);

    errors.into_result(CreateTaskData {
        title: form.title.clone(),
        description,
        priority: Some(form.priority),
        status: Some(form.status),
        due_date,
    })
}

pub fn validate_update(form: &TaskForm) -> Result<UpdateTaskData, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_title(&form.title, &mut errors);
    let description = check_description(&form.description, &mut errors);
    let due_date = check_due_date(&form.due_date, &mut errors);

    errors.into_result(UpdateTaskData {
        title: Some(form.title.clone()),
        description,
        priority: Some(form.priority),
        status: Some(form.status),
        due_date,
    })
}

pub fn validate_status(input: &str) -> Result<TaskStatus, ValidationErrors> {
    input.parse::<TaskStatus>().map_err(|e| {
        let mut errors = ValidationErrors::default();
        errors.push(Field::Status, e.to_string());
        errors
    })
}
