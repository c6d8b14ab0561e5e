//! Approval policy engine.
//!
//! Decides one pending request against one reviewer profile. Rules are
//! evaluated in priority order and the first match wins:
//!
//! 1. `todo_write` requests are approved (never reviewed)
//! 2. Requests without a target path are denied
//! 3. Paths matching a deny pattern are denied, sticky
//! 4. Paths matching no allow pattern are denied
//! 5. Everything else is approved

use serde::{Deserialize, Serialize};

use super::analysis::{InterruptionAnalysis, ToolKind};
use super::glob::matches_any;
use super::profile::ReviewerProfile;

/// Outcome of reviewing one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalDecision {
    pub approve: bool,
    /// Remember this decision as a standing rule for identical requests.
    pub always: bool,
    pub reason: String,
}

impl ApprovalDecision {
    pub fn approve(reason: impl Into<String>) -> Self {
        Self {
            approve: true,
            always: false,
            reason: reason.into(),
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            approve: false,
            always: false,
            reason: reason.into(),
        }
    }

    pub fn sticky(mut self) -> Self {
        self.always = true;
        self
    }
}

/// Decide `analysis` under `profile`.
pub fn evaluate(analysis: &InterruptionAnalysis, profile: &ReviewerProfile) -> ApprovalDecision {
    if analysis.kind == ToolKind::Todo {
        return ApprovalDecision::approve("todo_write operations are auto-approved by policy.");
    }

    let path = match analysis.path.as_deref() {
        Some(path) if !path.is_empty() => path,
        _ => return ApprovalDecision::deny("Tool call missing target path."),
    };

    if matches_any(path, &profile.deny) {
        return ApprovalDecision::deny(format!(
            "Path {} is denied for reviewer {}.",
            path, profile.name
        ))
        .sticky();
    }

    if !matches_any(path, &profile.allow) {
        return ApprovalDecision::deny(format!(
            "Path {} is outside the allowlist for reviewer {}.",
            path, profile.name
        ));
    }

    ApprovalDecision::approve(format!(
        "Path {} is approved for reviewer {}.",
        path, profile.name
    ))
}
