use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Urgent => "Urgent",
        }
    }

    /// Higher is more pressing. Used for client-side ordering only.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
            Priority::Urgent => 3,
        }
    }

    pub fn next(&self) -> Priority {
        cycle(&Self::ALL, self, 1)
    }

    pub fn previous(&self) -> Priority {
        cycle(&Self::ALL, self, Self::ALL.len() - 1)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "l" | "low" => Ok(Priority::Low),
            "m" | "med" | "medium" => Ok(Priority::Medium),
            "h" | "high" => Ok(Priority::High),
            "u" | "urgent" => Ok(Priority::Urgent),
            other => Err(anyhow!("Unknown priority: '{}'", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
            TaskStatus::Cancelled => "Cancelled",
        }
    }

    pub fn next(&self) -> TaskStatus {
        cycle(&Self::ALL, self, 1)
    }

    pub fn previous(&self) -> TaskStatus {
        cycle(&Self::ALL, self, Self::ALL.len() - 1)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TaskStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "p" | "pending" | "todo" => Ok(TaskStatus::Pending),
            "i" | "in_progress" | "progress" | "doing" => Ok(TaskStatus::InProgress),
            "c" | "completed" | "done" => Ok(TaskStatus::Completed),
            "x" | "cancelled" | "canceled" => Ok(TaskStatus::Cancelled),
            _ => Err(anyhow!("Unknown status: '{}'", s.trim())),
        }
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: &T, step: usize) -> T {
    let pos = all.iter().position(|v| v == current).unwrap_or(0);
    all[(pos + step) % all.len()]
}

/// A task as returned by the API. The server owns every field.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Task {
    pub fn created_display(&self) -> String {
        format_timestamp(&self.created_at)
    }

    pub fn due_display(&self) -> Option<String> {
        self.due_date.as_deref().map(format_date)
    }

    /// Parsed due date, when the server sent something date-like.
    pub fn due(&self) -> Option<NaiveDate> {
        self.due_date.as_deref().and_then(parse_date_prefix)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct CreateTaskData {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct UpdateTaskData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct StatusUpdate {
    pub status: TaskStatus,
}

fn parse_date_prefix(value: &str) -> Option<NaiveDate> {
    let head = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// `dd/mm/YYYY HH:MM` in local time; unparseable input comes back verbatim.
pub fn format_timestamp(value: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return dt.with_timezone(&Local).format("%d/%m/%Y %H:%M").to_string();
    }
    // Naive timestamps are taken as already local.
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, pattern) {
            return dt.format("%d/%m/%Y %H:%M").to_string();
        }
    }
    value.to_string()
}

/// `dd/mm/YYYY`; unparseable input comes back verbatim.
pub fn format_date(value: &str) -> String {
    parse_date_prefix(value)
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_json() -> &'static str {
        r#"{
            "id": 7,
            "title": "Write report",
            "description": null,
            "status": "IN_PROGRESS",
            "priority": "URGENT",
            "due_date": "2025-03-10",
            "created_at": "2025-03-01T09:30:00",
            "updated_at": "2025-03-02T10:00:00"
        }"#
    }

    #[test]
    fn test_task_deserializes_wire_names() {
        let task: Task = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(task.id, 7);
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.priority, Priority::Urgent);
        assert_eq!(task.description, None);
        assert_eq!(task.due(), NaiveDate::from_ymd_opt(2025, 3, 10));
    }

    #[test]
    fn test_task_without_optional_fields() {
        let json = r#"{"id":1,"title":"t","status":"PENDING","priority":"LOW",
            "created_at":"x","updated_at":"y"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.due_date, None);
        assert_eq!(task.due_display(), None);
        assert_eq!(task.created_display(), "x");
    }

    #[test]
    fn test_create_data_omits_absent_fields() {
        let data = CreateTaskData {
            title: "Buy milk".to_string(),
            priority: Some(Priority::High),
            ..Default::default()
        };
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value, serde_json::json!({"title": "Buy milk", "priority": "HIGH"}));
    }

    #[test]
    fn test_status_update_body() {
        let body = serde_json::to_string(&StatusUpdate { status: TaskStatus::Cancelled }).unwrap();
        assert_eq!(body, r#"{"status":"CANCELLED"}"#);
    }

    #[test]
    fn test_parse_enums_from_aliases() {
        assert_eq!("in progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("IN_PROGRESS".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("done".parse::<TaskStatus>().unwrap(), TaskStatus::Completed);
        assert_eq!("u".parse::<Priority>().unwrap(), Priority::Urgent);
        assert_eq!("Medium".parse::<Priority>().unwrap(), Priority::Medium);
        assert!("later".parse::<TaskStatus>().is_err());
        assert!("critical".parse::<Priority>().is_err());
    }

    #[test]
    fn test_cycle_wraps_around() {
        assert_eq!(TaskStatus::Cancelled.next(), TaskStatus::Pending);
        assert_eq!(TaskStatus::Pending.previous(), TaskStatus::Cancelled);
        assert_eq!(Priority::Urgent.next(), Priority::Low);
        assert_eq!(Priority::Low.previous(), Priority::Urgent);
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_date("2025-12-31"), "31/12/2025");
        assert_eq!(format_date("2025-12-31T00:00:00"), "31/12/2025");
        assert_eq!(format_date("soon"), "soon");
        assert_eq!(format_timestamp("2025-01-02T03:04:05.123456"), "02/01/2025 03:04");
    }
}
