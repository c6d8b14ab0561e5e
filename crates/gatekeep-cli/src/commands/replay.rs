//! Replay command
//!
//! Usage: gatekeep replay <SCRIPT> [--snapshot <FILE>] [--save <FILE>]
//!        [--transcript <DIR>] [--reuse-sticky] [--orphan] [--timeout-secs <N>]

use clap::Args;
use gatekeep_core::approval::StickyMode;
use gatekeep_core::logging;
use gatekeep_core::orchestrator::{load_script, LoopOutcome, ReplaySurface, ResumeLoop};
use gatekeep_core::persistence::{load_snapshot, save_snapshot};
use gatekeep_core::workspace::Workspace;
use std::path::PathBuf;
use std::time::Duration;

use super::ReviewerArgs;

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// JSONL script, one batch of tool calls per line
    pub script: PathBuf,

    /// Start from this workspace snapshot instead of an empty workspace
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Save the resulting workspace here
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Directory for the review transcript
    #[arg(long)]
    pub transcript: Option<PathBuf>,

    /// Reuse sticky decisions instead of re-evaluating identical requests
    #[arg(long)]
    pub reuse_sticky: bool,

    /// Simulate an agent that cannot be resumed after the first batch
    #[arg(long)]
    pub orphan: bool,

    /// Give up if the run takes longer than this
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[command(flatten)]
    pub reviewer: ReviewerArgs,
}

pub fn execute(args: ReplayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let batches = load_script(&args.script)?;
    log::info!(
        "Replaying {} batch(es) from {}",
        batches.len(),
        args.script.display()
    );
    let workspace = match &args.snapshot {
        Some(path) => load_snapshot(path)?,
        None => Workspace::new(),
    };

    let mut surface = ReplaySurface::new(workspace, batches);
    if args.orphan {
        surface = surface.without_actor();
    }

    let sticky_mode = if args.reuse_sticky {
        StickyMode::Reuse
    } else {
        StickyMode::RecordOnly
    };
    let review_loop = ResumeLoop::new(args.reviewer.profile()).with_sticky_mode(sticky_mode);
    println!(
        "Reviewer: {} ({})",
        review_loop.profile().name,
        review_loop.profile().id
    );
    let transcript = logging::open_transcript(args.transcript.as_deref(), review_loop.run_id());
    let review_loop = review_loop.with_transcript(transcript);

    let runtime = tokio::runtime::Runtime::new()?;
    let outcome = runtime.block_on(async {
        match args.timeout_secs {
            Some(secs) => {
                review_loop
                    .run_with_timeout(&mut surface, Duration::from_secs(secs))
                    .await
            }
            None => review_loop.run(&mut surface).await,
        }
    })?;

    let report = outcome.report();
    println!("Run: {}", report.run_id);
    for resolved in &report.resolved {
        println!(
            "{:<7} {}  {}",
            if resolved.decision.approve { "APPROVE" } else { "DENY" },
            resolved.analysis.summary,
            resolved.decision.reason
        );
    }
    if report.audit_failures > 0 {
        println!("Audit failures: {}", report.audit_failures);
    }

    if let Some(summary) = outcome.output() {
        println!("{}", summary);
    }

    if let Some(path) = &args.save {
        save_snapshot(path, &surface.into_workspace())?;
        println!("Workspace saved to {}", path.display());
    }

    match outcome {
        LoopOutcome::Completed { .. } => Ok(()),
        LoopOutcome::Aborted { reason, .. } => Err(format!("Run aborted: {}", reason).into()),
    }
}
