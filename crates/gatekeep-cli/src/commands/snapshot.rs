//! Snapshot command
//!
//! Usage: gatekeep snapshot <FILE> [--ops]

use clap::Args;
use gatekeep_core::persistence::load_snapshot;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    /// Snapshot file to validate
    pub file: PathBuf,

    /// Also list the operation log
    #[arg(long)]
    pub ops: bool,
}

pub fn execute(args: SnapshotArgs) -> Result<(), Box<dyn std::error::Error>> {
    let workspace = load_snapshot(&args.file)?;

    println!(
        "{}: {} files, {} operations",
        args.file.display(),
        workspace.len(),
        workspace.operations().len()
    );
    for entry in workspace.entries() {
        println!(
            "  {}  {} bytes  {}",
            entry.path,
            entry.content.len(),
            entry.updated_at.to_rfc3339()
        );
    }

    if args.ops {
        for op in workspace.operations() {
            let delta = op
                .diff()
                .map(|d| format!(" ({:+})", d.delta_bytes))
                .unwrap_or_default();
            println!("  [{}] {} {}{}", op.timestamp().to_rfc3339(), op.kind(), op.path(), delta);
        }
    }
    Ok(())
}
