//! Review transcript logging.
//!
//! A plain-text, append-only record of what the operator was shown and what
//! was decided, with one timestamped entry per event. Separate from the JSON
//! audit log, which is the machine-readable record.

use chrono::Utc;
use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::Path,
    sync::{Arc, Mutex},
};

/// Thread-safe handle to an append-only transcript file.
pub type TranscriptHandle = Arc<Mutex<Option<File>>>;

/// Current UTC time as ISO 8601 with milliseconds (e.g. 2026-02-04T10:15:30.123Z).
fn utc_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// A handle that discards everything written to it.
pub fn disabled() -> TranscriptHandle {
    Arc::new(Mutex::new(None))
}

/// Write a timestamped entry to the transcript (if present).
pub fn log_line(handle: &TranscriptHandle, direction: &str, data: &str) {
    if let Ok(mut guard) = handle.lock() {
        if let Some(ref mut file) = *guard {
            let ts = utc_timestamp();
            let _ = writeln!(file, "[{}] {}: {}", ts, direction, data);
            let _ = file.flush();
        }
    }
}

/// Open (or create) a transcript at `{dir}/{id}.log` and return a shared handle.
///
/// Any failure yields a disabled handle rather than an error.
pub fn open_transcript(dir: Option<&Path>, id: &str) -> TranscriptHandle {
    let file = dir.and_then(|dir| {
        std::fs::create_dir_all(dir).ok()?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(format!("{}.log", id)))
            .ok()
    });
    if file.is_none() && dir.is_some() {
        log::warn!("Review transcript disabled: could not open {}.log", id);
    }
    Arc::new(Mutex::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn utc_timestamp_format() {
        let ts = utc_timestamp();
        // Should be ISO 8601 format: YYYY-MM-DDTHH:MM:SS.mmmZ
        assert!(ts.ends_with('Z'));
        assert_eq!(ts.len(), 24);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], "T");
        assert_eq!(&ts[19..20], ".");
    }

    #[test]
    fn open_transcript_creates_file() {
        let dir = tempdir().unwrap();
        let handle = open_transcript(Some(dir.path()), "run");
        assert!(handle.lock().unwrap().is_some());
        assert!(dir.path().join("run.log").exists());
    }

    #[test]
    fn open_transcript_without_dir_is_disabled() {
        let handle = open_transcript(None, "run");
        assert!(handle.lock().unwrap().is_none());
    }

    #[test]
    fn log_line_writes_to_file() {
        let dir = tempdir().unwrap();
        let handle = open_transcript(Some(dir.path()), "run");
        log_line(&handle, "DECISION", "approved notes/a.md");

        let mut contents = String::new();
        File::open(dir.path().join("run.log"))
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert!(contents.contains("DECISION: approved notes/a.md"));
        assert!(contents.starts_with('['));
    }

    #[test]
    fn log_line_handles_disabled_handle() {
        // Should not panic
        log_line(&disabled(), "REVIEW", "ignored");
    }
}
