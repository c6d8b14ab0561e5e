//! Scripted execution surface.
//!
//! Replays a recorded agent run: each script line is one batch of tool calls
//! that the agent paused on. Approved calls run against the surface's own
//! workspace; denied calls are only recorded.
//!
//! # Script Format
//!
//! ```text
//! [{"name":"write_file","callId":"c1","arguments":{"path":"a.md","content":"hi"}}]
//! [{"name":"edit_file","arguments":"{\"path\":\"a.md\",\"find\":\"hi\",\"replace\":\"yo\"}"}]
//! ```
//!
//! `arguments` may be a JSON object or the raw string the agent produced.
//! Blank lines and lines starting with `#` are skipped.

use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::surface::{ExecutionSurface, PendingRequest, SurfaceError};
use crate::approval::ApprovalDecision;
use crate::tools;
use crate::workspace::Workspace;

const REPLAY_ACTOR: &str = "replay";

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Failed to read script: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid script line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScriptedCall {
    #[serde(alias = "toolName")]
    name: String,
    #[serde(default)]
    call_id: Option<String>,
    #[serde(default)]
    arguments: Option<Value>,
}

impl From<ScriptedCall> for PendingRequest {
    fn from(call: ScriptedCall) -> Self {
        let arguments = match call.arguments {
            None | Some(Value::Null) => None,
            Some(Value::String(raw)) => Some(raw),
            Some(other) => Some(other.to_string()),
        };
        PendingRequest {
            tool_name: call.name,
            call_id: call.call_id,
            arguments,
        }
    }
}

/// Parse a JSONL script into batches of pending requests.
pub fn parse_script(text: &str) -> Result<Vec<Vec<PendingRequest>>, ScriptError> {
    let mut batches = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let calls: Vec<ScriptedCall> =
            serde_json::from_str(trimmed).map_err(|source| ScriptError::Line {
                line: index + 1,
                source,
            })?;
        if !calls.is_empty() {
            batches.push(calls.into_iter().map(PendingRequest::from).collect());
        }
    }
    Ok(batches)
}

/// Read and parse a script file.
pub fn load_script(path: &Path) -> Result<Vec<Vec<PendingRequest>>, ScriptError> {
    parse_script(&fs::read_to_string(path)?)
}

/// A tool call that ran, with its text result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedCall {
    pub request: PendingRequest,
    pub output: String,
}

pub struct ReplaySurface {
    workspace: Workspace,
    current: Vec<PendingRequest>,
    upcoming: VecDeque<Vec<PendingRequest>>,
    actor: Option<String>,
    executed: Vec<ExecutedCall>,
    denied: Vec<(PendingRequest, String)>,
    sticky: HashMap<(String, String), bool>,
}

impl ReplaySurface {
    pub fn new(workspace: Workspace, batches: Vec<Vec<PendingRequest>>) -> Self {
        let mut upcoming: VecDeque<_> = batches.into();
        let current = upcoming.pop_front().unwrap_or_default();
        Self {
            workspace,
            current,
            upcoming,
            actor: Some(REPLAY_ACTOR.to_string()),
            executed: Vec::new(),
            denied: Vec::new(),
            sticky: HashMap::new(),
        }
    }

    /// Drop the resumable actor, as if the agent process had gone away.
    pub fn without_actor(mut self) -> Self {
        self.actor = None;
        self
    }

    pub fn into_workspace(self) -> Workspace {
        self.workspace
    }

    pub fn executed(&self) -> &[ExecutedCall] {
        &self.executed
    }

    pub fn denied(&self) -> &[(PendingRequest, String)] {
        &self.denied
    }

    /// Standing approvals (`true`) and denials, keyed by tool name and path.
    pub fn sticky_decisions(&self) -> &HashMap<(String, String), bool> {
        &self.sticky
    }
}

/// Target path named in a raw argument payload, if any.
fn target_path(request: &PendingRequest) -> Option<String> {
    let args: Value = serde_json::from_str(request.arguments.as_deref()?).ok()?;
    args.get("path")
        .and_then(Value::as_str)
        .filter(|path| !path.is_empty())
        .map(str::to_string)
}

impl ExecutionSurface for ReplaySurface {
    fn pending_requests(&self) -> Vec<PendingRequest> {
        self.current.clone()
    }

    fn workspace(&self) -> Option<&Workspace> {
        Some(&self.workspace)
    }

    fn apply_decision(
        &mut self,
        request: &PendingRequest,
        decision: &ApprovalDecision,
    ) -> Result<(), SurfaceError> {
        if !self.current.contains(request) {
            return Err(SurfaceError::NotPending(request.tool_name.clone()));
        }
        if decision.always {
            if let Some(path) = target_path(request) {
                self.sticky
                    .insert((request.tool_name.clone(), path), decision.approve);
            }
        }

        if !decision.approve {
            log::debug!("Replay: denied {}", request.tool_name);
            self.denied.push((request.clone(), decision.reason.clone()));
            return Ok(());
        }

        let output = match tools::execute(
            &mut self.workspace,
            &request.tool_name,
            request.arguments.as_deref(),
        ) {
            Ok(output) => output,
            Err(e) => {
                log::warn!("Replay: {} failed: {}", request.tool_name, e);
                format!("Error: {e}")
            }
        };
        self.executed.push(ExecutedCall {
            request: request.clone(),
            output,
        });
        Ok(())
    }

    fn paused_actor(&self) -> Option<String> {
        self.actor.clone()
    }

    async fn resume(&mut self, actor: &str) -> Result<(), SurfaceError> {
        if self.actor.as_deref() != Some(actor) {
            return Err(SurfaceError::Failed(format!("Unknown actor: {actor}")));
        }
        tokio::task::yield_now().await;
        self.current = self.upcoming.pop_front().unwrap_or_default();
        Ok(())
    }

    /// Summary of the run, once every batch has been handled.
    fn final_output(&self) -> Option<String> {
        if !self.current.is_empty() || !self.upcoming.is_empty() {
            return None;
        }
        let mut lines = vec![format!(
            "Replay finished: {} executed, {} denied",
            self.executed.len(),
            self.denied.len()
        )];
        lines.extend(
            self.executed
                .iter()
                .map(|call| format!("  {}: {}", call.request.tool_name, call.output)),
        );
        Some(lines.join("\n"))
    }
}
