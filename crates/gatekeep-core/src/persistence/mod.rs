//! Persistence layer for decisions and workspace snapshots.
//!
//! # Overview
//!
//! - **Audit log** - one JSON line per approval decision, append-only
//! - **Snapshots** - whole-workspace JSON files for long review pauses
//!
//! # File Locations
//!
//! ```text
//! <reviewer logPath>          # default: .agent-approvals.jsonl
//! <snapshot path>             # chosen by the caller
//! <snapshot path>.tmp         # transient, during atomic save
//! ```
//!
//! # Design Principles
//!
//! ## Append-Only Audit
//!
//! Decision records are only ever appended. Parent directories are created
//! on demand so a fresh log path just works.
//!
//! ## Atomic Snapshots
//!
//! Snapshot saves use write-then-rename:
//!
//! 1. Write to `file.json.tmp`
//! 2. Rename to `file.json` (atomic on Unix)

pub mod audit;
pub mod snapshots;

pub use audit::{
    append_decision, read_audit_log, truncate_preview, AuditError, DecisionRecord,
    MAX_DIFF_PREVIEW_CHARS,
};
pub use snapshots::{load_snapshot, save_snapshot};
