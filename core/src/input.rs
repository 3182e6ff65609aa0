use std::collections::HashMap;
use anyhow::{anyhow, Context, Result};

use crate::model::task::{Priority, TaskStatus};
use crate::schema::TaskForm;

pub const KNOWN_KEYS: [&str; 4] = ["description", "priority", "status", "due"];

#[derive(Debug, PartialEq)]
pub struct ParsedInput {
    pub name: String,
    pub metadata: HashMap<String, String>,
}

/// Split `key:value` words from the free words that make up the title.
/// Only alphabetic keys count, so `10:30` stays part of the title.
pub fn parse_args(args: &[String]) -> ParsedInput {
    let mut name_parts = Vec::new();
    let mut metadata = HashMap::new();

    for arg in args {
        if let Some((key, value)) = arg.split_once(':') {
            if !key.is_empty() && key.chars().all(|c| c.is_ascii_alphabetic()) {
                metadata.insert(key.to_lowercase(), value.to_string());
                continue;
            }
        }
        name_parts.push(arg.as_str());
    }

    ParsedInput {
        name: name_parts.join(" "),
        metadata,
    }
}

pub fn expand_key(key: &str, candidates: &[&str]) -> Result<String> {
    if candidates.contains(&key) {
        return Ok(key.to_string());
    }

    let matches: Vec<&str> = candidates
        .iter()
        .filter(|&&c| c.starts_with(key))
        .cloned()
        .collect();

    match matches.len() {
        1 => Ok(matches[0].to_string()),
        0 => Err(anyhow!("Unknown key: '{}'", key)),
        _ => Err(anyhow!("Ambiguous key: '{}' matches {:?}", key, matches)),
    }
}

/// Apply quick-entry words onto `base`. Free words replace the title when present.
pub fn form_from_args(args: &[String], base: TaskForm) -> Result<TaskForm> {
    let parsed = parse_args(args);
    let mut form = base;

    if !parsed.name.is_empty() {
        form.title = parsed.name;
    }

    // Sorted so error reporting is deterministic.
    let mut pairs: Vec<(String, String)> = parsed.metadata.into_iter().collect();
    pairs.sort();

    for (key, value) in pairs {
        match expand_key(&key, &KNOWN_KEYS)?.as_str() {
            "description" => form.description = value.replace('_', " "),
            "priority" => {
                form.priority = value.parse::<Priority>().context("invalid priority")?;
            }
            "status" => {
                form.status = value.parse::<TaskStatus>().context("invalid status")?;
            }
            "due" => form.due_date = value,
            _ => {}
        }
    }

    Ok(form)
}
