//! Line-level diff engine.
//!
//! # Overview
//!
//! Computes an edit script between two text blobs using a longest-common-
//! subsequence table, then renders it as unified-diff text:
//!
//! ```text
//! --- a/notes/today.md
//! +++ b/notes/today.md
//! @@ -2,1 +2,1 @@
//! -hello
//! +world
//! ```
//!
//! Hunks carry no context lines. A hunk is any maximal run of removals and
//! additions; the next unchanged line closes it.
//!
//! # Key Operations
//!
//! - [`split_lines`] - Break text into lines (a final newline adds no line)
//! - [`edit_script`] - Build the ordered add/remove/context operations
//! - [`unified_diff`] - Render operations as patch text
//! - [`summarize`] - Patch plus line and byte counts ([`DiffSummary`])
//! - [`preview`] - Patch text for human review, never fails
//!
//! # Cost
//!
//! `O(n·m)` time and memory in the number of lines. Previews are bounded by
//! [`MAX_PREVIEW_CELLS`]; store mutations are not.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest LCS table (in cells) a review preview will build.
pub const MAX_PREVIEW_CELLS: usize = 4_000_000;

/// Preview text used when before and after are identical.
pub const NO_CHANGES: &str = "(no changes)";

/// Marks the side of a preview hunk whose last line lacks a newline.
pub const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

/// Preview text when only `\r\n` / `\n` line endings differ.
pub const LINE_ENDINGS_ONLY: &str = "(line endings changed)";

// ============================================================================
// TYPES
// ============================================================================

/// What a single edit-script step does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOpKind {
    /// Line present on both sides.
    Context,
    /// Line only in the "after" text.
    Add,
    /// Line only in the "before" text.
    Remove,
}

/// One step of an edit script.
///
/// `old_line` / `new_line` are 1-based positions in the before/after text at
/// the moment the step is emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffOp<'a> {
    pub kind: DiffOpKind,
    pub line: &'a str,
    pub old_line: usize,
    pub new_line: usize,
}

/// Computed diff between two versions of a file.
///
/// `patch` is empty iff before and after are identical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    /// Unified diff text (empty when nothing changed).
    pub patch: String,
    pub added_lines: usize,
    pub removed_lines: usize,
    /// UTF-8 byte length of the before text.
    pub before_bytes: u64,
    /// UTF-8 byte length of the after text.
    pub after_bytes: u64,
    /// Always `after_bytes - before_bytes`.
    pub delta_bytes: i64,
}

impl DiffSummary {
    /// Whether the byte delta agrees with the byte counts.
    pub fn is_consistent(&self) -> bool {
        self.after_bytes as i128 - self.before_bytes as i128 == self.delta_bytes as i128
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiffError {
    #[error("inputs too large to diff ({before_lines} x {after_lines} lines)")]
    TooLarge {
        before_lines: usize,
        after_lines: usize,
    },
}

// ============================================================================
// EDIT SCRIPT
// ============================================================================

/// Split text into lines on `\n` or `\r\n`.
///
/// The empty string has no lines, and the empty segment produced by a final
/// newline is dropped, so `"a\n"` and `"a"` both yield `["a"]`.
pub fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut lines: Vec<&str> = text.split('\n').collect();
    let last = lines.len() - 1;
    for line in &mut lines[..last] {
        let current: &str = *line;
        if let Some(stripped) = current.strip_suffix('\r') {
            *line = stripped;
        }
    }
    if lines.last() == Some(&"") {
        lines.pop();
    }
    lines
}

/// Build the edit script turning `before` into `after`.
///
/// The table is filled from the end so `table[i][j]` is the LCS length of
/// `before[i..]` and `after[j..]`. The forward walk emits context for equal
/// lines, otherwise a removal when skipping the before line keeps at least as
/// long a common subsequence as skipping the after line (removals win ties),
/// otherwise an addition. Unmatched tails are flushed removals first.
pub fn edit_script<'a>(before: &[&'a str], after: &[&'a str]) -> Vec<DiffOp<'a>> {
    let n = before.len();
    let m = after.len();
    let width = m + 1;
    let mut table = vec![0u32; (n + 1) * width];

    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i * width + j] = if before[i] == after[j] {
                table[(i + 1) * width + j + 1] + 1
            } else {
                table[(i + 1) * width + j].max(table[i * width + j + 1])
            };
        }
    }

    let mut ops = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (0, 0);

    while i < n && j < m {
        if before[i] == after[j] {
            ops.push(op(DiffOpKind::Context, before[i], i, j));
            i += 1;
            j += 1;
        } else if table[(i + 1) * width + j] >= table[i * width + j + 1] {
            ops.push(op(DiffOpKind::Remove, before[i], i, j));
            i += 1;
        } else {
            ops.push(op(DiffOpKind::Add, after[j], i, j));
            j += 1;
        }
    }
    while i < n {
        ops.push(op(DiffOpKind::Remove, before[i], i, j));
        i += 1;
    }
    while j < m {
        ops.push(op(DiffOpKind::Add, after[j], i, j));
        j += 1;
    }

    ops
}

fn op(kind: DiffOpKind, line: &str, i: usize, j: usize) -> DiffOp<'_> {
    DiffOp {
        kind,
        line,
        old_line: i + 1,
        new_line: j + 1,
    }
}

// ============================================================================
// RENDERING
// ============================================================================

struct Hunk {
    old_start: usize,
    new_start: usize,
    old_count: usize,
    new_count: usize,
    lines: Vec<String>,
}

impl Hunk {
    fn flush_into(self, out: &mut Vec<String>) {
        out.push(format!(
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_count, self.new_start, self.new_count
        ));
        out.extend(self.lines);
    }
}

/// Render an edit script as unified-diff text for `path`.
///
/// Returns an empty string when the script holds no additions or removals.
/// Callers treat the empty string as "no patch", not as a failure.
pub fn unified_diff(path: &str, ops: &[DiffOp<'_>]) -> String {
    let mut out = vec![format!("--- a/{path}"), format!("+++ b/{path}")];
    let mut hunk: Option<Hunk> = None;
    let mut has_changes = false;

    for op in ops {
        if op.kind == DiffOpKind::Context {
            if let Some(done) = hunk.take() {
                done.flush_into(&mut out);
            }
            continue;
        }

        has_changes = true;
        let current = hunk.get_or_insert_with(|| Hunk {
            old_start: op.old_line,
            new_start: op.new_line,
            old_count: 0,
            new_count: 0,
            lines: Vec::new(),
        });

        match op.kind {
            DiffOpKind::Remove => {
                current.old_count += 1;
                current.lines.push(format!("-{}", op.line));
            }
            DiffOpKind::Add => {
                current.new_count += 1;
                current.lines.push(format!("+{}", op.line));
            }
            DiffOpKind::Context => {}
        }
    }

    if let Some(done) = hunk {
        done.flush_into(&mut out);
    }

    if !has_changes {
        return String::new();
    }
    out.join("\n")
}

/// Diff two versions of `path` and summarize the change.
pub fn summarize(path: &str, before: &str, after: &str) -> DiffSummary {
    let before_lines = split_lines(before);
    let after_lines = split_lines(after);
    summarize_lines(path, before, after, &before_lines, &after_lines)
}

fn summarize_lines(
    path: &str,
    before: &str,
    after: &str,
    before_lines: &[&str],
    after_lines: &[&str],
) -> DiffSummary {
    let ops = edit_script(before_lines, after_lines);
    let added_lines = ops.iter().filter(|o| o.kind == DiffOpKind::Add).count();
    let removed_lines = ops.iter().filter(|o| o.kind == DiffOpKind::Remove).count();
    let before_bytes = before.len() as u64;
    let after_bytes = after.len() as u64;

    DiffSummary {
        patch: unified_diff(path, &ops),
        added_lines,
        removed_lines,
        before_bytes,
        after_bytes,
        delta_bytes: after.len() as i64 - before.len() as i64,
    }
}

/// Like [`summarize`], but refuses inputs whose LCS table would exceed
/// [`MAX_PREVIEW_CELLS`].
pub fn try_summarize(path: &str, before: &str, after: &str) -> Result<DiffSummary, DiffError> {
    let before_lines = split_lines(before);
    let after_lines = split_lines(after);
    let cells = (before_lines.len() + 1).saturating_mul(after_lines.len() + 1);
    if cells > MAX_PREVIEW_CELLS {
        return Err(DiffError::TooLarge {
            before_lines: before_lines.len(),
            after_lines: after_lines.len(),
        });
    }
    Ok(summarize_lines(path, before, after, &before_lines, &after_lines))
}

/// Patch text for a reviewer.
///
/// Yields [`NO_CHANGES`] when nothing changed and a `Diff unavailable: ...`
/// placeholder when the diff cannot be computed. Changes the line diff can't
/// see (a final newline, line endings) are still called out, so the preview
/// never says "no changes" while the byte counts differ.
pub fn preview(path: &str, before: &str, after: &str) -> String {
    if before == after {
        return NO_CHANGES.to_string();
    }
    match try_summarize(path, before, after) {
        Ok(summary) if summary.patch.is_empty() => final_newline_patch(path, before, after)
            .unwrap_or_else(|| LINE_ENDINGS_ONLY.to_string()),
        Ok(summary) => summary.patch,
        Err(e) => {
            log::warn!("Diff preview for {} degraded: {}", path, e);
            format!("Diff unavailable: {e}")
        }
    }
}

/// Hunk for texts whose lines are equal but only one ends with a newline.
fn final_newline_patch(path: &str, before: &str, after: &str) -> Option<String> {
    let before_terminated = before.ends_with('\n');
    if before_terminated == after.ends_with('\n') {
        return None;
    }
    let lines = split_lines(before);
    let last = lines.last()?;
    let n = lines.len();

    let mut out = vec![
        format!("--- a/{path}"),
        format!("+++ b/{path}"),
        format!("@@ -{n},1 +{n},1 @@"),
        format!("-{last}"),
    ];
    if !before_terminated {
        out.push(NO_NEWLINE_MARKER.to_string());
    }
    out.push(format!("+{last}"));
    if before_terminated {
        out.push(NO_NEWLINE_MARKER.to_string());
    }
    Some(out.join("\n"))
}
