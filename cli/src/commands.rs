use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use taskdesk_core::{
    form_from_args, validate_status, AppConfig, HttpTaskService, SortStrategy, Task, TaskApi,
    TaskFilter, TaskForm, TaskService, TokenStore,
};

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Priority")]
    priority: &'static str,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Title")]
    title: String,
}

pub fn render_tasks(tasks: &[Task]) -> String {
    let rows = tasks.iter().map(|t| TaskRow {
        id: t.id,
        status: t.status.label(),
        priority: t.priority.label(),
        due: t.due_display().unwrap_or_else(|| "-".to_string()),
        title: t.title.clone(),
    });
    let mut table = Table::new(rows);
    table.with(Style::modern());
    table.to_string()
}

pub fn render_task(task: &Task) -> String {
    let mut out = vec![
        format!("#{} {}", task.id, task.title),
        format!("  Status:   {}", task.status),
        format!("  Priority: {}", task.priority),
        format!("  Created:  {}", task.created_display()),
    ];
    if let Some(due) = task.due_display() {
        out.push(format!("  Due:      {}", due));
    }
    if let Some(desc) = &task.description {
        out.push(String::new());
        out.push(format!("  {}", desc));
    }
    out.join("\n")
}

/// Protected-route guard for one-shot commands.
pub fn authed_service(
    config: &AppConfig,
    store: &TokenStore,
) -> Result<TaskService<HttpTaskService>> {
    let session = store.require_session()?;
    let api = HttpTaskService::new(config, Some(session.token))
        .context("failed to build HTTP client")?;
    Ok(TaskService::new(api))
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub fn login(
    config: &AppConfig,
    store: &TokenStore,
    username: &str,
    password: Option<String>,
) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt_line("Password: ")?,
    };
    if password.is_empty() {
        bail!("password is required");
    }

    let api = HttpTaskService::new(config, None)?;
    let token = api.login(username, &password)?;
    store.store_auth_token(&token)?;
    println!("Logged in as {}.", username);
    Ok(())
}

pub fn logout(store: &TokenStore) -> Result<()> {
    store.clear_auth_token()?;
    println!("{}", logout_message(store.env_override_active()));
    Ok(())
}

fn logout_message(env_override: bool) -> String {
    if env_override {
        format!(
            "Stored token removed, but {} is still set; unset it to log out.",
            taskdesk_core::auth::TOKEN_ENV
        )
    } else {
        "Logged out.".to_string()
    }
}

pub fn whoami(store: &TokenStore) -> Result<()> {
    let session = store.require_session()?;
    println!("Logged in (token from {}).", session.source.as_str());
    if let Some(sub) = &session.subject {
        println!("  User:    {}", sub);
    }
    match session.expires_at {
        Some(exp) => println!(
            "  Expires: {}",
            exp.with_timezone(&chrono::Local).format("%d/%m/%Y %H:%M")
        ),
        None => println!("  Expires: never"),
    }
    Ok(())
}

pub fn list<A: TaskApi>(
    service: &TaskService<A>,
    filter: TaskFilter,
    sort: SortStrategy,
) -> Result<()> {
    let tasks = service.load_tasks(filter, sort)?;
    if tasks.is_empty() {
        println!("No tasks found.");
    } else {
        println!("{}", render_tasks(&tasks));
    }
    Ok(())
}

pub fn show<A: TaskApi>(service: &TaskService<A>, id: i64) -> Result<()> {
    let task = service.get(id)?;
    println!("{}", render_task(&task));
    Ok(())
}

pub fn add<A: TaskApi>(service: &TaskService<A>, args: &[String]) -> Result<()> {
    let form = form_from_args(args, TaskForm::default())?;
    let created = service.create_from_form(&form)?;
    println!("Task created: {} (ID: {})", created.title, created.id);
    Ok(())
}

/// Starts from the current task, like the edit modal's pre-fill.
pub fn edit<A: TaskApi>(service: &TaskService<A>, id: i64, args: &[String]) -> Result<()> {
    let current = service.get(id)?;
    let form = form_from_args(args, TaskForm::from_task(&current))?;
    let updated = service.update_from_form(id, &form)?;
    println!("Task updated: {} (ID: {})", updated.title, updated.id);
    Ok(())
}

pub fn set_status<A: TaskApi>(service: &TaskService<A>, id: i64, status: &str) -> Result<()> {
    let status = validate_status(status)?;
    let updated = service.change_status(id, status)?;
    println!("Task {} is now {}.", updated.id, updated.status);
    Ok(())
}

pub fn delete<A: TaskApi>(service: &TaskService<A>, id: i64, yes: bool) -> Result<()> {
    if !yes {
        let task = service.get(id)?;
        let answer = prompt_line(&format!("Delete task #{} \"{}\"? [y/N] ", task.id, task.title))?;
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Kept.");
            return Ok(());
        }
    }
    service.delete(id)?;
    println!("Task {} deleted.", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdesk_core::{Priority, TaskStatus};

    fn task() -> Task {
        Task {
            id: 42,
            title: "Renew passport".to_string(),
            description: Some("bring photos".to_string()),
            status: TaskStatus::InProgress,
            priority: Priority::Urgent,
            due_date: Some("2025-09-30".to_string()),
            created_at: "2025-09-01T08:00:00".to_string(),
            updated_at: "2025-09-01T08:00:00".to_string(),
        }
    }

    #[test]
    fn table_has_headers_and_labels() {
        let out = render_tasks(&[task()]);
        let needles = [
            "ID", "Status", "Priority", "Due", "Title", "42", "In Progress", "Urgent", "30/09/2025",
            "Renew passport",
        ];
        for needle in needles {
            assert!(out.contains(needle), "missing {needle} in\n{out}");
        }
    }

    #[test]
    fn logout_warns_about_env_token() {
        assert_eq!(logout_message(false), "Logged out.");
        let msg = logout_message(true);
        assert!(msg.contains("TASKDESK_TOKEN is still set"), "{msg}");
    }

    #[test]
    fn detail_includes_optional_fields() {
        let out = render_task(&task());
        assert!(out.starts_with("#42 Renew passport"));
        assert!(out.contains("Due:      30/09/2025"));
        assert!(out.contains("Created:  01/09/2025 08:00"));
        assert!(out.ends_with("  bring photos"));
    }
}
