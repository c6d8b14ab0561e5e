//! Standing (sticky) decisions remembered during one loop invocation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::analysis::InterruptionAnalysis;
use super::policy::ApprovalDecision;

/// How the resume loop treats decisions flagged `always`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StickyMode {
    /// Evaluate every request afresh. Sticky flags are only recorded and
    /// forwarded to the execution surface.
    #[default]
    RecordOnly,
    /// Reuse an earlier sticky decision for the same tool and path without
    /// re-evaluating the policy.
    Reuse,
}

/// Sticky decisions keyed by tool name and target path.
///
/// Requests without a target path are never remembered.
#[derive(Debug, Clone, Default)]
pub struct StandingDecisions {
    decisions: HashMap<(String, String), ApprovalDecision>,
}

impl StandingDecisions {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(analysis: &InterruptionAnalysis) -> Option<(String, String)> {
        analysis
            .path
            .as_ref()
            .map(|path| (analysis.tool_name.clone(), path.clone()))
    }

    /// Remember `decision` if it is sticky.
    pub fn record(&mut self, analysis: &InterruptionAnalysis, decision: &ApprovalDecision) {
        if !decision.always {
            return;
        }
        if let Some(key) = Self::key(analysis) {
            self.decisions.insert(key, decision.clone());
        }
    }

    /// Standing decision for an identical earlier request, if any.
    pub fn lookup(&self, analysis: &InterruptionAnalysis) -> Option<&ApprovalDecision> {
        Self::key(analysis).and_then(|key| self.decisions.get(&key))
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}
