//! Decision audit log.
//!
//! # Overview
//!
//! Every resolved interruption produces one [`DecisionRecord`], appended as a
//! single JSON line to the reviewer's log file. Records are never rewritten
//! or deleted.
//!
//! # File Format
//!
//! ```text
//! {"runId":"…","reviewerId":"local-reviewer","reviewerName":"Local Reviewer","approved":true,"always":false,"reason":"…","timestamp":"2026-02-04T10:15:30.123Z","toolName":"write_file","path":"notes/a.md","byteDelta":6,"diffPreview":"--- a/notes/a.md\n…","metadata":{…}}
//! ```
//!
//! Diff previews longer than [`MAX_DIFF_PREVIEW_CHARS`] characters are cut
//! and suffixed with `…`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use thiserror::Error;

use crate::approval::{ApprovalDecision, InterruptionAnalysis, ReviewerProfile};

/// Longest diff preview kept in a record, in characters.
pub const MAX_DIFF_PREVIEW_CHARS: usize = 8192;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Audit log IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Audit log JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One persisted approval decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRecord {
    /// Resume-loop invocation this decision belongs to.
    #[serde(default)]
    pub run_id: String,
    pub reviewer_id: String,
    pub reviewer_name: String,
    pub approved: bool,
    pub always: bool,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
    pub tool_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_delta: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_preview: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl DecisionRecord {
    pub fn new(
        run_id: &str,
        profile: &ReviewerProfile,
        analysis: &InterruptionAnalysis,
        decision: &ApprovalDecision,
    ) -> Self {
        Self {
            run_id: run_id.to_string(),
            reviewer_id: profile.id.clone(),
            reviewer_name: profile.name.clone(),
            approved: decision.approve,
            always: decision.always,
            reason: decision.reason.clone(),
            timestamp: Utc::now(),
            tool_name: analysis.tool_name.clone(),
            call_id: analysis.call_id.clone(),
            path: analysis.path.clone(),
            byte_delta: analysis.byte_delta,
            diff_preview: analysis.diff.as_deref().map(truncate_preview),
            metadata: analysis.metadata.clone(),
        }
    }
}

/// Cut `preview` to [`MAX_DIFF_PREVIEW_CHARS`] characters, marking the cut.
pub fn truncate_preview(preview: &str) -> String {
    match preview.char_indices().nth(MAX_DIFF_PREVIEW_CHARS) {
        Some((byte_index, _)) => format!("{}…", &preview[..byte_index]),
        None => preview.to_string(),
    }
}

/// Append one record to the log at `path`, creating parent directories.
pub fn append_decision(path: &Path, record: &DecisionRecord) -> Result<(), AuditError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let line = serde_json::to_string(record)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")?;
    file.flush()?;

    Ok(())
}

/// Load all records from the log at `path`.
///
/// Returns an empty list if the file doesn't exist. Blank lines are skipped.
pub fn read_audit_log(path: &Path) -> Result<Vec<DecisionRecord>, AuditError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(fs::File::open(path)?);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }

    Ok(records)
}
