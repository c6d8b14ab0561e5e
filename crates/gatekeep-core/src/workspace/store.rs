//! Path-keyed content store with an append-only operation log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::pattern::EditPattern;
use crate::diff::{self, DiffSummary};

/// Reserved path that `append_todo` writes to.
pub const TODO_PATH: &str = "todo.md";

// ============================================================================
// TYPES
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Workspace path must not be empty")]
    EmptyPath,
}

/// A single file in the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub path: String,
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

/// One accepted mutation, recorded in insertion order and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OperationLogEntry {
    /// Whole-file overwrite.
    Write {
        path: String,
        /// UTF-8 length of the new content.
        bytes: u64,
        ts: DateTime<Utc>,
        diff: DiffSummary,
    },
    /// Regex substitution.
    Edit {
        path: String,
        ts: DateTime<Utc>,
        diff: DiffSummary,
    },
    /// Checklist item appended to [`TODO_PATH`]. No diff is kept.
    Todo { item: String, ts: DateTime<Utc> },
}

impl OperationLogEntry {
    pub fn kind(&self) -> &'static str {
        match self {
            OperationLogEntry::Write { .. } => "write",
            OperationLogEntry::Edit { .. } => "edit",
            OperationLogEntry::Todo { .. } => "todo",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            OperationLogEntry::Write { ts, .. }
            | OperationLogEntry::Edit { ts, .. }
            | OperationLogEntry::Todo { ts, .. } => *ts,
        }
    }

    /// Target path. Todo entries always target [`TODO_PATH`].
    pub fn path(&self) -> &str {
        match self {
            OperationLogEntry::Write { path, .. } | OperationLogEntry::Edit { path, .. } => path,
            OperationLogEntry::Todo { .. } => TODO_PATH,
        }
    }

    pub fn diff(&self) -> Option<&DiffSummary> {
        match self {
            OperationLogEntry::Write { diff, .. } | OperationLogEntry::Edit { diff, .. } => {
                Some(diff)
            }
            OperationLogEntry::Todo { .. } => None,
        }
    }
}

// ============================================================================
// STORE
// ============================================================================

/// In-memory workspace: files keyed by path plus the operation log.
///
/// Every mutation takes `&mut self`, so computing the diff and appending the
/// log entry happen as one unit and log order always matches mutation order.
/// Files are never deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workspace {
    files: BTreeMap<String, FileEntry>,
    ops: Vec<OperationLogEntry>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from already-validated parts.
    pub(crate) fn from_parts(files: BTreeMap<String, FileEntry>, ops: Vec<OperationLogEntry>) -> Self {
        Self { files, ops }
    }

    pub fn get(&self, path: &str) -> Option<&FileEntry> {
        self.files.get(path)
    }

    /// Current content of `path`, or `""` when the path has never been written.
    pub fn content(&self, path: &str) -> &str {
        self.files.get(path).map(|f| f.content.as_str()).unwrap_or("")
    }

    /// Entries sorted by path.
    pub fn entries(&self) -> impl Iterator<Item = &FileEntry> {
        self.files.values()
    }

    /// Paths sorted lexicographically.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn operations(&self) -> &[OperationLogEntry] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Overwrite `path` with `content` and log a `Write`.
    ///
    /// An empty path is rejected before anything is stored or logged.
    pub fn put(&mut self, path: &str, content: &str) -> Result<&OperationLogEntry, StoreError> {
        require_path(path)?;
        let ts = Utc::now();
        let diff = diff::summarize(path, self.content(path), content);
        self.store(path, content.to_string(), ts);
        Ok(self.push(OperationLogEntry::Write {
            path: path.to_string(),
            bytes: content.len() as u64,
            ts,
            diff,
        }))
    }

    /// Apply `pattern` to the current content of `path` and log an `Edit`.
    ///
    /// A missing path edits the empty string, so a pattern that matches
    /// nothing still creates the file.
    pub fn edit(
        &mut self,
        path: &str,
        pattern: &EditPattern,
        replacement: &str,
    ) -> Result<&OperationLogEntry, StoreError> {
        require_path(path)?;
        let ts = Utc::now();
        let current = self.content(path);
        let next = pattern.apply(current, replacement);
        let diff = diff::summarize(path, current, &next);
        self.store(path, next, ts);
        Ok(self.push(OperationLogEntry::Edit {
            path: path.to_string(),
            ts,
            diff,
        }))
    }

    /// Append `- [ ] <text>` to [`TODO_PATH`] and log a `Todo`.
    pub fn append_todo(&mut self, text: &str) -> &OperationLogEntry {
        let ts = Utc::now();
        let next = format!("{}- [ ] {}\n", self.content(TODO_PATH), text);
        self.store(TODO_PATH, next, ts);
        self.push(OperationLogEntry::Todo {
            item: text.to_string(),
            ts,
        })
    }

    fn store(&mut self, path: &str, content: String, updated_at: DateTime<Utc>) {
        self.files.insert(
            path.to_string(),
            FileEntry {
                path: path.to_string(),
                content,
                updated_at,
            },
        );
    }

    fn push(&mut self, entry: OperationLogEntry) -> &OperationLogEntry {
        log::debug!("workspace {} {}", entry.kind(), entry.path());
        self.ops.push(entry);
        &self.ops[self.ops.len() - 1]
    }
}

fn require_path(path: &str) -> Result<(), StoreError> {
    if path.is_empty() {
        return Err(StoreError::EmptyPath);
    }
    Ok(())
}
