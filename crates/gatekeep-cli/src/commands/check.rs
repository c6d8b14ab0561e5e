//! Check command
//!
//! Usage: gatekeep check <PATH>... [--config <FILE>] [--log <FILE>]

use clap::Args;
use gatekeep_core::approval::{analyze, evaluate};
use gatekeep_core::orchestrator::PendingRequest;
use gatekeep_core::tools::WRITE_FILE;

use super::ReviewerArgs;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Workspace paths to check as write targets
    #[arg(required = true)]
    pub paths: Vec<String>,

    #[command(flatten)]
    pub reviewer: ReviewerArgs,
}

pub fn execute(args: CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    let profile = args.reviewer.profile();
    println!("Reviewer: {} ({})", profile.name, profile.id);

    for path in &args.paths {
        let request = PendingRequest {
            tool_name: WRITE_FILE.to_string(),
            call_id: None,
            arguments: Some(serde_json::json!({ "path": path, "content": "" }).to_string()),
        };
        let decision = evaluate(&analyze(&request, None), &profile);
        println!(
            "{:<7} {}{}  {}",
            if decision.approve { "APPROVE" } else { "DENY" },
            path,
            if decision.always { " (always)" } else { "" },
            decision.reason
        );
    }
    Ok(())
}
