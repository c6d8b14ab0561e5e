//! Tool approval logic.
//!
//! Decides whether a pending agent tool call may proceed, based on:
//! - The tool kind (`todo_write` is never gated)
//! - The reviewer's deny and allow path patterns
//! - Standing decisions, when sticky reuse is enabled
//!
//! The pieces are pure and synchronous; the resume loop wires them together
//! with the audit log and the execution surface.

mod analysis;
mod context;
mod glob;
mod policy;
mod profile;

pub use analysis::{analyze, format_delta, render, InterruptionAnalysis, ToolKind};
pub use context::{StandingDecisions, StickyMode};
pub use glob::{matches_any, matches_pattern, normalize_path};
pub use policy::{evaluate, ApprovalDecision};
pub use profile::{
    parse_pattern_list, profile_from_document, ReviewerProfile, ReviewerSettings,
    DEFAULT_LOG_PATH, DEFAULT_REVIEWER_ID, DEFAULT_REVIEWER_NAME, ENV_APPROVAL_ALLOW,
    ENV_APPROVAL_CONFIG, ENV_APPROVAL_DENY, ENV_APPROVAL_LOG, ENV_APPROVER_ID, ENV_APPROVER_NAME,
};
