pub mod audit;
pub mod check;
pub mod diff;
pub mod replay;
pub mod snapshot;

use clap::Args;
use gatekeep_core::approval::{ReviewerProfile, ReviewerSettings};
use std::path::PathBuf;

/// Reviewer options shared by commands that resolve a profile.
///
/// Flags override the `AGENT_APPROVAL_*` environment.
#[derive(Debug, Args)]
pub struct ReviewerArgs {
    /// JSON reviewer config (overrides AGENT_APPROVAL_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Audit log path (overrides AGENT_APPROVAL_LOG)
    #[arg(long)]
    pub log: Option<PathBuf>,
}

impl ReviewerArgs {
    pub fn settings(&self) -> ReviewerSettings {
        let mut settings = ReviewerSettings::from_env();
        if let Some(config) = &self.config {
            settings.config_path = Some(config.clone());
        }
        if let Some(log) = &self.log {
            settings.log_path = Some(log.clone());
        }
        settings
    }

    pub fn profile(&self) -> ReviewerProfile {
        self.settings().resolve()
    }
}
