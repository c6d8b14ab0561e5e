//! Workspace snapshot files.
//!
//! Used to park a workspace on disk while a review is pending and pick it up
//! again later, possibly in another process.

use std::fs;
use std::path::Path;

use crate::workspace::{self, SnapshotError, Workspace};

/// Save a workspace snapshot to `path`.
///
/// # Atomic Write
///
/// Writes `<path>.tmp` first, then renames it over `path`, so a crash
/// mid-write never leaves a truncated snapshot behind.
pub fn save_snapshot(path: &Path, workspace: &Workspace) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = workspace::serialize(workspace)?;
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = Path::new(&temp_name);

    fs::write(temp_path, json)?;
    fs::rename(temp_path, path)?;

    Ok(())
}

/// Load and validate a workspace snapshot from `path`.
///
/// # Errors
///
/// Fails if the file can't be read or any field is invalid. A failed load
/// never yields a partially populated workspace.
pub fn load_snapshot(path: &Path) -> Result<Workspace, SnapshotError> {
    let contents = fs::read_to_string(path)?;
    workspace::deserialize(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshots/ws.json");

        let mut ws = Workspace::new();
        ws.put("notes/a.md", "hello\n").unwrap();
        ws.append_todo("review");

        save_snapshot(&path, &ws).unwrap();
        assert!(!dir.path().join("snapshots/ws.json.tmp").exists());
        assert_eq!(load_snapshot(&path).unwrap(), ws);
    }

    #[test]
    fn save_overwrites_previous_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ws.json");

        let mut ws = Workspace::new();
        save_snapshot(&path, &ws).unwrap();
        ws.put("a", "1").unwrap();
        save_snapshot(&path, &ws).unwrap();

        assert_eq!(load_snapshot(&path).unwrap().len(), 1);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load_snapshot(&dir.path().join("missing.json")),
            Err(SnapshotError::Io(_))
        ));
    }

    #[test]
    fn corrupt_file_fails_closed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ws.json");
        fs::write(&path, r#"{"vfs":[{"path":"a"}],"ops":[]}"#).unwrap();
        assert!(matches!(load_snapshot(&path), Err(SnapshotError::Schema(_))));
    }
}
