//! Execution-surface capability.
//!
//! The resume loop never talks to an agent framework directly. Anything that
//! can pause on tool calls, accept approve/deny decisions, and resume
//! implements [`ExecutionSurface`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::approval::ApprovalDecision;
use crate::workspace::Workspace;

/// A paused tool call awaiting sign-off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequest {
    /// Tool name (e.g., "write_file", "edit_file", "todo_write").
    pub tool_name: String,
    /// Agent-assigned call identifier, when the surface has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    /// Raw JSON arguments payload, unparsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

#[derive(Error, Debug)]
pub enum SurfaceError {
    #[error("Request is not pending: {0}")]
    NotPending(String),

    #[error("Execution surface failed: {0}")]
    Failed(String),
}

/// A paused execution that the resume loop can drive.
///
/// Implementations own their workspace; the loop only reads it to build
/// diff previews.
#[allow(async_fn_in_trait)]
pub trait ExecutionSurface {
    /// Tool calls currently waiting for a decision, in the order reported.
    fn pending_requests(&self) -> Vec<PendingRequest>;

    /// The workspace the pending calls will mutate, if the surface has one.
    fn workspace(&self) -> Option<&Workspace>;

    /// Apply one decision to the paused state. `decision.always` asks the
    /// surface to remember it for identical future calls.
    fn apply_decision(
        &mut self,
        request: &PendingRequest,
        decision: &ApprovalDecision,
    ) -> Result<(), SurfaceError>;

    /// The actor that should be resumed, or `None` if there is nothing left
    /// to resume.
    fn paused_actor(&self) -> Option<String>;

    /// Continue execution. Afterwards, [`pending_requests`](Self::pending_requests)
    /// reports the next batch, or nothing once the run has finished.
    async fn resume(&mut self, actor: &str) -> Result<(), SurfaceError>;

    /// The run's final result, once nothing is pending. `None` while batches
    /// remain or when the surface produces no result text.
    fn final_output(&self) -> Option<String>;
}
