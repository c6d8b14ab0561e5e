//! Per-request analysis and human-readable rendering.
//!
//! Analysis always previews against the workspace as it is *now*, not as it
//! was when the agent made the request, since earlier approvals in the same
//! batch may already have changed it.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::diff;
use crate::orchestrator::PendingRequest;
use crate::tools::{EDIT_FILE, TODO_WRITE, WRITE_FILE};
use crate::workspace::{EditPattern, Workspace, DEFAULT_FLAGS, TODO_PATH};

use super::profile::ReviewerProfile;

/// Broad category of a gated tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Write,
    Edit,
    Todo,
    Other,
}

impl ToolKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            WRITE_FILE => ToolKind::Write,
            EDIT_FILE => ToolKind::Edit,
            TODO_WRITE => ToolKind::Todo,
            _ => ToolKind::Other,
        }
    }
}

/// Everything a reviewer (or the policy engine) needs to decide a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterruptionAnalysis {
    pub tool_name: String,
    #[serde(skip)]
    pub kind: ToolKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Unified diff preview, `(no changes)`, or a `Diff unavailable` placeholder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_delta: Option<i64>,
    pub summary: String,
    /// Parsed arguments plus parse / regex errors and pattern details.
    pub metadata: Map<String, Value>,
}

/// Parse the raw arguments payload.
///
/// Malformed payloads yield an empty map and an error message; they are
/// never raised.
fn parse_arguments(raw: Option<&str>) -> (Map<String, Value>, Option<String>) {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => return (Map::new(), None),
    };

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => (map, None),
        Ok(_) => (
            Map::new(),
            Some("arguments must be a JSON object".to_string()),
        ),
        Err(e) => (Map::new(), Some(e.to_string())),
    }
}

fn string_arg<'a>(args: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

/// Analyze one pending request against the current workspace content.
///
/// A missing workspace is treated as empty.
pub fn analyze(request: &PendingRequest, workspace: Option<&Workspace>) -> InterruptionAnalysis {
    let (args, parse_error) = parse_arguments(request.arguments.as_deref());
    let kind = ToolKind::from_name(&request.tool_name);
    let current_of = |path: &str| workspace.map(|ws| ws.content(path)).unwrap_or("");

    let mut metadata = Map::new();
    if let Some(err) = parse_error {
        metadata.insert("parseError".to_string(), json!(err));
    }

    let mut path = None;
    let mut preview = None;
    let mut byte_delta = None;
    let summary;

    match kind {
        ToolKind::Write => {
            path = string_arg(&args, "path").map(str::to_string);
            let content = string_arg(&args, "content").unwrap_or("");
            metadata.insert("bytes".to_string(), json!(content.len()));

            let current = path.as_deref().map(current_of).unwrap_or("");
            let delta = content.len() as i64 - current.len() as i64;
            byte_delta = Some(delta);
            preview = path.as_deref().map(|p| diff::preview(p, current, content));
            summary = match &path {
                Some(p) => format!("{} → {} ({})", WRITE_FILE, p, format_delta(delta)),
                None => format!("{} → (missing path)", WRITE_FILE),
            };
        }
        ToolKind::Edit => {
            path = string_arg(&args, "path").map(str::to_string);
            let find = string_arg(&args, "find").unwrap_or("");
            let flags = string_arg(&args, "flags")
                .filter(|f| !f.is_empty())
                .unwrap_or(DEFAULT_FLAGS);
            let replacement = string_arg(&args, "replace").unwrap_or("");

            let current = path.as_deref().map(current_of).unwrap_or("");
            let next = match EditPattern::new(find, flags) {
                Ok(pattern) => {
                    metadata.insert("matchCount".to_string(), json!(pattern.match_count(current)));
                    pattern.apply(current, replacement)
                }
                Err(e) => {
                    metadata.insert("regexError".to_string(), json!(e.to_string()));
                    current.to_string()
                }
            };
            metadata.insert("pattern".to_string(), json!(find));
            metadata.insert("flags".to_string(), json!(flags));

            let delta = next.len() as i64 - current.len() as i64;
            byte_delta = Some(delta);
            preview = path.as_deref().map(|p| diff::preview(p, current, &next));
            summary = match &path {
                Some(p) => format!("{} → {} ({})", EDIT_FILE, p, format_delta(delta)),
                None => format!("{} → (missing path)", EDIT_FILE),
            };
        }
        ToolKind::Todo => {
            path = Some(TODO_PATH.to_string());
            summary = match string_arg(&args, "item") {
                Some(item) => format!("{} → {}", TODO_WRITE, item),
                None => format!("{} → (no todo item provided)", TODO_WRITE),
            };
        }
        ToolKind::Other => {
            summary = format!("Approval requested for tool \"{}\".", request.tool_name);
        }
    }

    metadata.insert("arguments".to_string(), Value::Object(args));

    InterruptionAnalysis {
        tool_name: request.tool_name.clone(),
        kind,
        call_id: request.call_id.clone(),
        path,
        diff: preview,
        byte_delta,
        summary,
        metadata,
    }
}

/// Signed byte delta, e.g. `+12`, `-3`, `+0`.
pub fn format_delta(delta: i64) -> String {
    if delta >= 0 {
        format!("+{delta}")
    } else {
        delta.to_string()
    }
}

/// Render the approval prompt shown to the operator.
pub fn render(analysis: &InterruptionAnalysis, profile: &ReviewerProfile) -> String {
    let mut lines = vec![
        "=== Tool approval required ===".to_string(),
        format!("Reviewer: {} ({})", profile.name, profile.id),
        format!("Tool: {}", analysis.tool_name),
    ];
    if let Some(call_id) = &analysis.call_id {
        lines.push(format!("Call ID: {call_id}"));
    }
    if let Some(path) = &analysis.path {
        lines.push(format!("Target: {path}"));
    }
    lines.push(format!("Summary: {}", analysis.summary));
    if let Some(delta) = analysis.byte_delta {
        lines.push(format!("Byte delta: {}", format_delta(delta)));
    }
    if let Some(diff) = &analysis.diff {
        lines.push("--- Proposed diff ---".to_string());
        lines.push(diff.clone());
    }
    lines.join("\n")
}
