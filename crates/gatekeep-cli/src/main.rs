//! gatekeep CLI
//!
//! Operator tooling for the agent review gate.

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "gatekeep")]
#[command(about = "gatekeep - human review gate for agent file mutations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Decide write requests for paths under the resolved reviewer profile
    Check(commands::check::CheckArgs),
    /// Print the unified diff between two files
    Diff(commands::diff::DiffArgs),
    /// Run the review loop over a scripted agent run
    Replay(commands::replay::ReplayArgs),
    /// Validate and list a workspace snapshot
    Snapshot(commands::snapshot::SnapshotArgs),
    /// Print recorded approval decisions
    Audit(commands::audit::AuditArgs),
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check(args) => commands::check::execute(args),
        Commands::Diff(args) => commands::diff::execute(args),
        Commands::Replay(args) => commands::replay::execute(args),
        Commands::Snapshot(args) => commands::snapshot::execute(args),
        Commands::Audit(args) => commands::audit::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
