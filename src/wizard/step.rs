//! Setup steps and their extraction from a model answer.

use std::fmt;

use serde_json::Value;
use tracing::{debug, warn};

use crate::ai::parser::extract_json_array;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Command,
    FileCreate,
    FileEdit,
}

impl Operation {
    /// Unrecognized labels are treated as shell commands.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "file_create" => Operation::FileCreate,
            "file_edit" => Operation::FileEdit,
            _ => Operation::Command,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Command => "command",
            Operation::FileCreate => "file_create",
            Operation::FileEdit => "file_edit",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupStep {
    pub description: String,
    pub operation: Operation,
    /// Shell command, or the text written by a file operation.
    pub content: String,
    /// Target of a file operation.
    pub path: Option<String>,
    pub requires_sudo: bool,
}

impl SetupStep {
    pub fn command(description: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            operation: Operation::Command,
            content: content.into(),
            path: None,
            requires_sudo: false,
        }
    }

    /// Harmless step used whenever nothing better can be produced.
    pub fn fallback() -> Self {
        Self::command("List files in current directory", "ls -la")
    }
}

fn str_field<'a>(object: &'a serde_json::Map<String, Value>, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str)
}

/// Build a step from one JSON element, or drop it.
fn validate_step(value: &Value) -> Option<SetupStep> {
    let object = value.as_object()?;
    let operation = object.get("operation")?;
    let content = str_field(object, "content")?;
    if content.trim().is_empty() {
        return None;
    }

    let description = str_field(object, "description")
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(content);

    Some(SetupStep {
        description: description.to_string(),
        operation: Operation::from_label(operation.as_str().unwrap_or_default()),
        content: content.to_string(),
        path: str_field(object, "path")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string),
        requires_sudo: object
            .get("requires_sudo")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

/// Turn a model answer into runnable steps. Never returns an empty list.
///
/// A JSON array is validated element by element. Text that is not JSON
/// at all becomes a single command step with the answer as its content.
pub fn parse_steps(response: &str) -> Vec<SetupStep> {
    let candidate = extract_json_array(response).unwrap_or(response);

    let steps = match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Array(items)) => {
            let steps: Vec<SetupStep> = items.iter().filter_map(validate_step).collect();
            if steps.len() < items.len() {
                debug!("Dropped {} invalid setup steps", items.len() - steps.len());
            }
            steps
        }
        Ok(other) => {
            warn!("Setup response is JSON but not an array: {}", other);
            Vec::new()
        }
        Err(e) => {
            debug!("Setup response is not JSON ({}), using it as a command", e);
            let content = candidate.trim().trim_matches('`').trim();
            if content.is_empty() {
                Vec::new()
            } else {
                vec![SetupStep::command("Execute the following command", content)]
            }
        }
    };

    if steps.is_empty() {
        vec![SetupStep::fallback()]
    } else {
        steps
    }
}
