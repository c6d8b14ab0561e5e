//! # gatekeep-core
//!
//! Human review gate for file mutations proposed by an AI agent.
//!
//! The agent works against an in-memory [`Workspace`]. When it pauses on a
//! tool call, the [`ResumeLoop`] analyzes the call, renders a diff preview,
//! decides it under a [`ReviewerProfile`], appends the decision to a JSONL
//! audit log, and resumes the agent.
//!
//! ## Key Concepts
//!
//! - **Workspace**: path → content map plus an operation log
//! - **Interruption**: a paused tool call awaiting approve/deny
//! - **Reviewer profile**: identity, allow/deny globs, audit log location
//! - **Execution surface**: anything that can pause, take decisions and resume

pub mod approval;
pub mod diff;
pub mod logging;
pub mod orchestrator;
pub mod persistence;
pub mod tools;
pub mod workspace;

// Re-export commonly used types
pub use approval::{ApprovalDecision, InterruptionAnalysis, ReviewerProfile, ReviewerSettings};
pub use orchestrator::{ExecutionSurface, LoopOutcome, PendingRequest, ReplaySurface, ResumeLoop};
pub use workspace::Workspace;
