//! Portable JSON snapshots of a [`Workspace`].
//!
//! Lets a paused review survive a process restart. The format is:
//!
//! ```json
//! {
//!   "vfs": [{ "path": "notes/a.md", "content": "hello\n", "updatedAt": "2026-01-01T00:00:00Z" }],
//!   "ops": [{ "kind": "write", "path": "notes/a.md", "bytes": 6, "ts": "...", "diff": { ... } }]
//! }
//! ```
//!
//! Files are written sorted by path; the op log keeps its original order and
//! is loaded as data, never recomputed from file content. Loading is all or
//! nothing: any invalid field rejects the whole snapshot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::store::{FileEntry, OperationLogEntry, Workspace};

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to parse workspace snapshot JSON: {0}")]
    Malformed(String),

    #[error("Workspace snapshot JSON did not match the expected schema: {0}")]
    Schema(String),

    #[error("Invalid snapshot field {field}: {reason}")]
    Invalid { field: String, reason: String },

    #[error("Snapshot IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for SnapshotError {
    fn from(e: serde_json::Error) -> Self {
        match e.classify() {
            serde_json::error::Category::Data => SnapshotError::Schema(e.to_string()),
            _ => SnapshotError::Malformed(e.to_string()),
        }
    }
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    vfs: Vec<&'a FileEntry>,
    ops: &'a [OperationLogEntry],
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SnapshotDocument {
    vfs: Vec<FileEntry>,
    ops: Vec<OperationLogEntry>,
}

/// Serialize the workspace to snapshot JSON.
pub fn serialize(workspace: &Workspace) -> Result<String, SnapshotError> {
    let snapshot = SnapshotRef {
        vfs: workspace.entries().collect(),
        ops: workspace.operations(),
    };
    Ok(serde_json::to_string(&snapshot)?)
}

/// Parse and validate snapshot JSON into a fresh workspace.
///
/// # Errors
///
/// - `Malformed` - not JSON
/// - `Schema` - wrong shape, unknown op kind, negative counts, bad timestamps
/// - `Invalid` - empty paths, duplicate paths, inconsistent byte delta
pub fn deserialize(json: &str) -> Result<Workspace, SnapshotError> {
    let document: SnapshotDocument = serde_json::from_str(json)?;

    let mut files = BTreeMap::new();
    for (index, entry) in document.vfs.into_iter().enumerate() {
        require_non_empty(&format!("vfs[{index}].path"), &entry.path)?;
        if files.contains_key(&entry.path) {
            return Err(invalid(
                &format!("vfs[{index}].path"),
                format!("duplicate path {}", entry.path),
            ));
        }
        files.insert(entry.path.clone(), entry);
    }

    for (index, op) in document.ops.iter().enumerate() {
        validate_op(index, op)?;
    }

    Ok(Workspace::from_parts(files, document.ops))
}

fn validate_op(index: usize, op: &OperationLogEntry) -> Result<(), SnapshotError> {
    match op {
        OperationLogEntry::Write { path, diff, .. } | OperationLogEntry::Edit { path, diff, .. } => {
            require_non_empty(&format!("ops[{index}].path"), path)?;
            if !diff.is_consistent() {
                return Err(invalid(
                    &format!("ops[{index}].diff.deltaBytes"),
                    format!(
                        "{} does not equal {} - {}",
                        diff.delta_bytes, diff.after_bytes, diff.before_bytes
                    ),
                ));
            }
            Ok(())
        }
        OperationLogEntry::Todo { .. } => Ok(()),
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), SnapshotError> {
    if value.is_empty() {
        return Err(invalid(field, "must not be empty".to_string()));
    }
    Ok(())
}

fn invalid(field: &str, reason: String) -> SnapshotError {
    SnapshotError::Invalid {
        field: field.to_string(),
        reason,
    }
}
