//! Workspace tool executors.
//!
//! These are the tool calls an agent can make against the virtual workspace.
//! Mutating tools (`write_file`, `edit_file`) are gated behind review; the
//! read-only ones run freely. `todo_write` is routed through review too but
//! the policy always approves it.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::workspace::{EditError, EditPattern, StoreError, Workspace};

pub const WRITE_FILE: &str = "write_file";
pub const EDIT_FILE: &str = "edit_file";
pub const TODO_WRITE: &str = "todo_write";
pub const READ_FILE: &str = "read_file";
pub const LS: &str = "ls";

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Deserialize)]
struct WriteArgs {
    path: String,
    content: String,
}

#[derive(Deserialize)]
struct EditArgs {
    path: String,
    find: String,
    replace: String,
    #[serde(default)]
    flags: String,
}

#[derive(Deserialize)]
struct TodoArgs {
    item: String,
}

#[derive(Deserialize)]
struct ReadArgs {
    path: String,
}

fn parse_args<T: DeserializeOwned>(tool: &str, raw: Option<&str>) -> Result<T, ToolError> {
    let value: Value = match raw {
        Some(raw) if !raw.trim().is_empty() => {
            serde_json::from_str(raw).map_err(|e| ToolError::InvalidArguments {
                tool: tool.to_string(),
                reason: e.to_string(),
            })?
        }
        _ => Value::Object(Default::default()),
    };
    serde_json::from_value(value).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

/// Run a tool call against `workspace` and return its text result.
///
/// `arguments` is the raw JSON payload from the agent.
pub fn execute(
    workspace: &mut Workspace,
    tool_name: &str,
    arguments: Option<&str>,
) -> Result<String, ToolError> {
    match tool_name {
        WRITE_FILE => {
            let args: WriteArgs = parse_args(tool_name, arguments)?;
            workspace.put(&args.path, &args.content)?;
            Ok(format!(
                "Wrote {} ({} chars)",
                args.path,
                args.content.chars().count()
            ))
        }
        EDIT_FILE => {
            let args: EditArgs = parse_args(tool_name, arguments)?;
            let pattern = EditPattern::new(&args.find, &args.flags)?;
            workspace.edit(&args.path, &pattern, &args.replace)?;
            Ok(format!("Edited {}", args.path))
        }
        TODO_WRITE => {
            let args: TodoArgs = parse_args(tool_name, arguments)?;
            workspace.append_todo(&args.item);
            Ok(format!("Added todo: {}", args.item))
        }
        READ_FILE => {
            let args: ReadArgs = parse_args(tool_name, arguments)?;
            Ok(workspace
                .get(&args.path)
                .map(|entry| entry.content.clone())
                .unwrap_or_else(|| "(not found)".to_string()))
        }
        LS => {
            let paths: Vec<&str> = workspace.paths().collect();
            if paths.is_empty() {
                Ok("(no files in workspace)".to_string())
            } else {
                Ok(paths.join("\n"))
            }
        }
        other => Err(ToolError::UnknownTool(other.to_string())),
    }
}
