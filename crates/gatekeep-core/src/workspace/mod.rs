//! Virtual workspace: file store, operation log, and snapshots.
//!
//! # Overview
//!
//! The workspace is the only place agent tool calls mutate. Every write or
//! edit computes a [`DiffSummary`](crate::diff::DiffSummary) against the
//! previous content and appends an [`OperationLogEntry`], giving reviewers and
//! auditors a complete record of what changed and when.
//!
//! - [`Workspace`] - the store itself
//! - [`EditPattern`] - compiled regex substitution for edits
//! - [`snapshot`] - JSON serialization for long review pauses

pub mod pattern;
pub mod snapshot;
pub mod store;

pub use pattern::{EditError, EditPattern, DEFAULT_FLAGS};
pub use snapshot::{deserialize, serialize, SnapshotError};
pub use store::{FileEntry, OperationLogEntry, StoreError, Workspace, TODO_PATH};
