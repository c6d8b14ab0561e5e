//! Diff command
//!
//! Usage: gatekeep diff <BEFORE> <AFTER> [--path <NAME>]

use clap::Args;
use gatekeep_core::approval::format_delta;
use gatekeep_core::diff;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// File with the current content (missing file means empty)
    pub before: PathBuf,

    /// File with the proposed content
    pub after: PathBuf,

    /// Path shown in the diff headers (default: AFTER)
    #[arg(long)]
    pub path: Option<String>,
}

pub fn execute(args: DiffArgs) -> Result<(), Box<dyn std::error::Error>> {
    let before = if args.before.exists() {
        std::fs::read_to_string(&args.before)?
    } else {
        String::new()
    };
    let after = std::fs::read_to_string(&args.after)?;
    let path = args
        .path
        .unwrap_or_else(|| args.after.to_string_lossy().into_owned());

    let summary = diff::try_summarize(&path, &before, &after)?;
    if summary.patch.is_empty() {
        println!("{}", diff::NO_CHANGES);
    } else {
        print!("{}", summary.patch);
        if !summary.patch.ends_with('\n') {
            println!();
        }
    }
    println!(
        "{} added, {} removed, {} bytes",
        summary.added_lines,
        summary.removed_lines,
        format_delta(summary.delta_bytes)
    );
    Ok(())
}
