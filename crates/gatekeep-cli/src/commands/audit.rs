//! Audit command
//!
//! Usage: gatekeep audit [--log <FILE>] [--run <ID>] [--diffs]

use clap::Args;
use gatekeep_core::persistence::read_audit_log;

use super::ReviewerArgs;

#[derive(Debug, Args)]
pub struct AuditArgs {
    #[command(flatten)]
    pub reviewer: ReviewerArgs,

    /// Only show decisions from this run
    #[arg(long)]
    pub run: Option<String>,

    /// Include stored diff previews
    #[arg(long)]
    pub diffs: bool,
}

pub fn execute(args: AuditArgs) -> Result<(), Box<dyn std::error::Error>> {
    let path = args.reviewer.profile().log_path;
    if !path.exists() {
        println!("No decisions recorded at {}", path.display());
        return Ok(());
    }

    let records = read_audit_log(&path)?;
    let mut shown = 0;
    for record in records
        .iter()
        .filter(|r| args.run.as_deref().map_or(true, |run| r.run_id == run))
    {
        shown += 1;
        println!(
            "{} {:<7} {} {} by {}: {}",
            record.timestamp.to_rfc3339(),
            if record.approved { "APPROVE" } else { "DENY" },
            record.tool_name,
            record.path.as_deref().unwrap_or("-"),
            record.reviewer_id,
            record.reason
        );
        if args.diffs {
            if let Some(preview) = &record.diff_preview {
                println!("{}", preview);
            }
        }
    }
    println!("{} decision(s)", shown);
    Ok(())
}
