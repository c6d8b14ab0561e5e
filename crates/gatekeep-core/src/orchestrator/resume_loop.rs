//! Interruption resume loop.
//!
//! # State Machine
//!
//! ```text
//!            pending ≥ 1                batch done
//! Running ─────────────▶ AwaitingApprovals ─────────▶ Resuming
//!    │                          ▲                       │  │  │
//!    │ nothing pending          └────── pending ≥ 1 ────┘  │  │ no actor
//!    ▼                                                     │  ▼
//! Completed ◀───────────────── nothing pending ────────────┘ Aborted
//! ```
//!
//! Within a batch every request is handled strictly in order:
//! analyze → render → decide → persist → apply. Nothing in that sequence
//! awaits, so the only suspension point is `resume`, and an outer timeout can
//! never cut a decision in half.
//!
//! # Audit Durability
//!
//! Persisting a decision is best-effort. A failed append is logged at error
//! level and counted in the report, and the decision is still applied.

use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use super::surface::{ExecutionSurface, PendingRequest, SurfaceError};
use crate::approval::{
    analyze, evaluate, render, ApprovalDecision, InterruptionAnalysis, ReviewerProfile,
    StandingDecisions, StickyMode,
};
use crate::logging::{self, TranscriptHandle};
use crate::persistence::{append_decision, DecisionRecord};

/// Where the loop is in its review-then-continue cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    AwaitingApprovals,
    Resuming,
    Completed,
    Aborted,
}

impl LoopState {
    pub fn is_terminal(self) -> bool {
        matches!(self, LoopState::Completed | LoopState::Aborted)
    }

    pub fn can_transition_to(self, next: LoopState) -> bool {
        use LoopState::*;
        matches!(
            (self, next),
            (Running, AwaitingApprovals)
                | (Running, Completed)
                | (AwaitingApprovals, Resuming)
                | (Resuming, AwaitingApprovals)
                | (Resuming, Completed)
                | (Resuming, Aborted)
        )
    }
}

#[derive(Error, Debug)]
pub enum LoopError {
    #[error("Failed to apply decision for {tool_name}: {source}")]
    Apply {
        tool_name: String,
        #[source]
        source: SurfaceError,
    },

    #[error("Failed to resume actor {actor}: {source}")]
    Resume {
        actor: String,
        #[source]
        source: SurfaceError,
    },

    #[error("Review loop timed out after {0:?}")]
    TimedOut(Duration),
}

/// One request as it was resolved.
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    pub request: PendingRequest,
    pub analysis: InterruptionAnalysis,
    pub decision: ApprovalDecision,
    /// Whether the audit record was written.
    pub persisted: bool,
    /// Whether a standing decision was reused instead of evaluating policy.
    pub reused: bool,
}

/// What happened during one loop invocation.
#[derive(Debug, Clone)]
pub struct LoopReport {
    pub run_id: String,
    pub batches: usize,
    pub resolved: Vec<ResolvedRequest>,
    pub audit_failures: usize,
    /// Every state visited, starting with `Running`.
    pub states: Vec<LoopState>,
}

impl LoopReport {
    pub fn approved(&self) -> usize {
        self.resolved.iter().filter(|r| r.decision.approve).count()
    }

    pub fn denied(&self) -> usize {
        self.resolved.len() - self.approved()
    }
}

/// Terminal result of a loop invocation. Aborted is never success.
#[derive(Debug, Clone)]
pub enum LoopOutcome {
    /// The surface has nothing left pending. `output` is its final result,
    /// if it produces one.
    Completed {
        report: LoopReport,
        output: Option<String>,
    },
    Aborted { report: LoopReport, reason: String },
}

impl LoopOutcome {
    pub fn report(&self) -> &LoopReport {
        match self {
            LoopOutcome::Completed { report, .. } | LoopOutcome::Aborted { report, .. } => report,
        }
    }

    /// Final result reported by the surface, when the run completed.
    pub fn output(&self) -> Option<&str> {
        match self {
            LoopOutcome::Completed { output, .. } => output.as_deref(),
            LoopOutcome::Aborted { .. } => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, LoopOutcome::Completed { .. })
    }
}

/// Drives an [`ExecutionSurface`] through review cycles until it finishes.
///
/// The reviewer profile is fixed at construction and cannot change while
/// the loop runs.
pub struct ResumeLoop {
    profile: ReviewerProfile,
    sticky_mode: StickyMode,
    standing: StandingDecisions,
    transcript: TranscriptHandle,
    state: LoopState,
    report: LoopReport,
}

impl ResumeLoop {
    pub fn new(profile: ReviewerProfile) -> Self {
        Self {
            profile,
            sticky_mode: StickyMode::default(),
            standing: StandingDecisions::new(),
            transcript: logging::disabled(),
            state: LoopState::Running,
            report: LoopReport {
                run_id: Uuid::new_v4().to_string(),
                batches: 0,
                resolved: Vec::new(),
                audit_failures: 0,
                states: vec![LoopState::Running],
            },
        }
    }

    pub fn with_sticky_mode(mut self, mode: StickyMode) -> Self {
        self.sticky_mode = mode;
        self
    }

    pub fn with_transcript(mut self, transcript: TranscriptHandle) -> Self {
        self.transcript = transcript;
        self
    }

    pub fn run_id(&self) -> &str {
        &self.report.run_id
    }

    pub fn profile(&self) -> &ReviewerProfile {
        &self.profile
    }

    fn transition(&mut self, next: LoopState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid loop transition {:?} -> {:?}",
            self.state,
            next
        );
        log::debug!("review loop {}: {:?} -> {:?}", self.report.run_id, self.state, next);
        self.state = next;
        self.report.states.push(next);
        if next.is_terminal() {
            logging::log_line(&self.transcript, "END", &format!("{:?}", next));
        }
    }

    /// Run until the surface completes or no actor can be resumed.
    pub async fn run<S: ExecutionSurface>(mut self, surface: &mut S) -> Result<LoopOutcome, LoopError> {
        loop {
            let batch = surface.pending_requests();
            if batch.is_empty() {
                self.transition(LoopState::Completed);
                log::info!(
                    "Review loop {} completed: {} approved, {} denied",
                    self.report.run_id,
                    self.report.approved(),
                    self.report.denied()
                );
                if !self.standing.is_empty() {
                    log::debug!(
                        "Review loop {} held {} standing decision(s)",
                        self.report.run_id,
                        self.standing.len()
                    );
                }
                return Ok(LoopOutcome::Completed {
                    output: surface.final_output(),
                    report: self.report,
                });
            }

            self.transition(LoopState::AwaitingApprovals);
            self.report.batches += 1;
            for request in batch {
                self.resolve(surface, request)?;
            }

            self.transition(LoopState::Resuming);
            let actor = match surface.paused_actor() {
                Some(actor) => actor,
                None => {
                    self.transition(LoopState::Aborted);
                    let reason = "No resumable actor after approvals".to_string();
                    log::warn!("Review loop {} aborted: {}", self.report.run_id, reason);
                    logging::log_line(&self.transcript, "ABORTED", &reason);
                    return Ok(LoopOutcome::Aborted {
                        report: self.report,
                        reason,
                    });
                }
            };

            if let Err(source) = surface.resume(&actor).await {
                return Err(LoopError::Resume { actor, source });
            }
        }
    }

    /// Like [`run`](Self::run), bounded by `limit`. Expiry can only interrupt
    /// a `resume`, never a decision in progress.
    pub async fn run_with_timeout<S: ExecutionSurface>(
        self,
        surface: &mut S,
        limit: Duration,
    ) -> Result<LoopOutcome, LoopError> {
        tokio::time::timeout(limit, self.run(surface))
            .await
            .map_err(|_| LoopError::TimedOut(limit))?
    }

    fn resolve<S: ExecutionSurface>(
        &mut self,
        surface: &mut S,
        request: PendingRequest,
    ) -> Result<(), LoopError> {
        let analysis = analyze(&request, surface.workspace());
        let prompt = render(&analysis, &self.profile);
        log::info!("{}", prompt);
        logging::log_line(&self.transcript, "REVIEW", &prompt);

        let (decision, reused) = self.decide(&analysis);

        let record = DecisionRecord::new(&self.report.run_id, &self.profile, &analysis, &decision);
        let persisted = match append_decision(&self.profile.log_path, &record) {
            Ok(()) => true,
            Err(e) => {
                self.report.audit_failures += 1;
                log::error!(
                    "Failed to persist approval decision to {}: {}",
                    self.profile.log_path.display(),
                    e
                );
                false
            }
        };

        logging::log_line(
            &self.transcript,
            "DECISION",
            &format!(
                "{} {}{}: {}",
                if decision.approve { "approve" } else { "deny" },
                analysis.tool_name,
                if decision.always { " (always)" } else { "" },
                decision.reason
            ),
        );

        surface
            .apply_decision(&request, &decision)
            .map_err(|source| LoopError::Apply {
                tool_name: request.tool_name.clone(),
                source,
            })?;

        self.report.resolved.push(ResolvedRequest {
            request,
            analysis,
            decision,
            persisted,
            reused,
        });
        Ok(())
    }

    fn decide(&mut self, analysis: &InterruptionAnalysis) -> (ApprovalDecision, bool) {
        if self.sticky_mode == StickyMode::Reuse {
            if let Some(standing) = self.standing.lookup(analysis) {
                let decision = ApprovalDecision {
                    reason: format!("Standing decision: {}", standing.reason),
                    ..standing.clone()
                };
                return (decision, true);
            }
        }

        let decision = evaluate(analysis, &self.profile);
        self.standing.record(analysis, &decision);
        (decision, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::read_audit_log;
    use crate::tools;
    use crate::workspace::Workspace;
    use std::collections::VecDeque;
    use std::path::Path;
    use tempfile::tempdir;

    /// Minimal surface: executes approved calls on its own workspace.
    struct FakeSurface {
        workspace: Workspace,
        current: Vec<PendingRequest>,
        upcoming: VecDeque<Vec<PendingRequest>>,
        actor: Option<String>,
        applied: Vec<(String, bool, bool)>,
        resumes: usize,
        fail_apply: bool,
        slow_resume: bool,
    }

    impl FakeSurface {
        fn new(mut batches: Vec<Vec<PendingRequest>>) -> Self {
            let current = if batches.is_empty() {
                Vec::new()
            } else {
                batches.remove(0)
            };
            Self {
                workspace: Workspace::new(),
                current,
                upcoming: batches.into(),
                actor: Some("writer".to_string()),
                applied: Vec::new(),
                resumes: 0,
                fail_apply: false,
                slow_resume: false,
            }
        }
    }

    impl ExecutionSurface for FakeSurface {
        fn pending_requests(&self) -> Vec<PendingRequest> {
            self.current.clone()
        }

        fn workspace(&self) -> Option<&Workspace> {
            Some(&self.workspace)
        }

        fn apply_decision(
            &mut self,
            request: &PendingRequest,
            decision: &ApprovalDecision,
        ) -> Result<(), SurfaceError> {
            if self.fail_apply {
                return Err(SurfaceError::Failed("paused state is gone".to_string()));
            }
            if decision.approve {
                let _ = tools::execute(
                    &mut self.workspace,
                    &request.tool_name,
                    request.arguments.as_deref(),
                );
            }
            self.applied
                .push((request.tool_name.clone(), decision.approve, decision.always));
            Ok(())
        }

        fn paused_actor(&self) -> Option<String> {
            self.actor.clone()
        }

        async fn resume(&mut self, _actor: &str) -> Result<(), SurfaceError> {
            if self.slow_resume {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            self.resumes += 1;
            self.current = self.upcoming.pop_front().unwrap_or_default();
            Ok(())
        }

        fn final_output(&self) -> Option<String> {
            if self.current.is_empty() && self.upcoming.is_empty() {
                Some(format!("{} call(s) applied", self.applied.len()))
            } else {
                None
            }
        }
    }

    fn write(path: &str, content: &str) -> PendingRequest {
        PendingRequest {
            tool_name: "write_file".to_string(),
            call_id: Some(format!("call-{path}")),
            arguments: Some(serde_json::json!({ "path": path, "content": content }).to_string()),
        }
    }

    fn edit(path: &str, find: &str, replace: &str) -> PendingRequest {
        PendingRequest {
            tool_name: "edit_file".to_string(),
            call_id: None,
            arguments: Some(
                serde_json::json!({ "path": path, "find": find, "replace": replace }).to_string(),
            ),
        }
    }

    fn profile(log: &Path) -> ReviewerProfile {
        ReviewerProfile {
            allow: vec!["notes/**".to_string()],
            deny: vec!["notes/secret.md".to_string()],
            log_path: log.to_path_buf(),
            ..ReviewerProfile::default()
        }
    }

    mod transitions {
        use super::*;

        #[test]
        fn allowed_transitions() {
            assert!(LoopState::Running.can_transition_to(LoopState::AwaitingApprovals));
            assert!(LoopState::Resuming.can_transition_to(LoopState::AwaitingApprovals));
            assert!(LoopState::Resuming.can_transition_to(LoopState::Aborted));
            assert!(!LoopState::AwaitingApprovals.can_transition_to(LoopState::Completed));
            assert!(!LoopState::Completed.can_transition_to(LoopState::Running));
        }

        #[test]
        fn terminal_states() {
            assert!(LoopState::Completed.is_terminal());
            assert!(LoopState::Aborted.is_terminal());
            assert!(!LoopState::Resuming.is_terminal());
        }
    }

    mod run {
        use super::*;

        #[tokio::test]
        async fn nothing_pending_completes_immediately() {
            let dir = tempdir().unwrap();
            let mut surface = FakeSurface::new(Vec::new());
            let outcome = ResumeLoop::new(profile(&dir.path().join("a.jsonl")))
                .run(&mut surface)
                .await
                .unwrap();

            assert!(outcome.is_completed());
            assert_eq!(
                outcome.report().states,
                vec![LoopState::Running, LoopState::Completed]
            );
            assert_eq!(surface.resumes, 0);
        }

        #[tokio::test]
        async fn completed_outcome_carries_final_output() {
            let dir = tempdir().unwrap();
            let mut surface = FakeSurface::new(vec![
                vec![write("notes/a.md", "1")],
                vec![write("notes/b.md", "2")],
            ]);

            let outcome = ResumeLoop::new(profile(&dir.path().join("a.jsonl")))
                .run(&mut surface)
                .await
                .unwrap();

            assert_eq!(outcome.output(), Some("2 call(s) applied"));
        }

        #[tokio::test]
        async fn decides_persists_and_applies_each_request() {
            let dir = tempdir().unwrap();
            let log = dir.path().join("audit/approvals.jsonl");
            let mut surface = FakeSurface::new(vec![vec![
                write("notes/secret.md", "x"),
                write("notes/a.md", "hello\n"),
                write("other/x.md", "y"),
            ]]);

            let outcome = ResumeLoop::new(profile(&log)).run(&mut surface).await.unwrap();
            let report = outcome.report();

            assert!(outcome.is_completed());
            assert_eq!(report.batches, 1);
            assert_eq!(report.approved(), 1);
            assert_eq!(report.denied(), 2);
            assert_eq!(
                surface.applied,
                vec![
                    ("write_file".to_string(), false, true),
                    ("write_file".to_string(), true, false),
                    ("write_file".to_string(), false, false),
                ]
            );
            assert_eq!(surface.workspace.content("notes/a.md"), "hello\n");
            assert!(surface.workspace.get("notes/secret.md").is_none());

            let records = read_audit_log(&log).unwrap();
            assert_eq!(records.len(), 3);
            assert!(records.iter().all(|r| r.run_id == report.run_id));
            assert_eq!(records[0].path.as_deref(), Some("notes/secret.md"));
            assert!(records[0].always);
        }

        #[tokio::test]
        async fn later_requests_preview_against_earlier_approvals() {
            let dir = tempdir().unwrap();
            let mut surface = FakeSurface::new(vec![vec![
                write("notes/a.md", "hello\n"),
                edit("notes/a.md", "hello", "world"),
            ]]);

            let outcome = ResumeLoop::new(profile(&dir.path().join("a.jsonl")))
                .run(&mut surface)
                .await
                .unwrap();

            let edit_preview = outcome.report().resolved[1].analysis.diff.clone().unwrap();
            assert!(edit_preview.contains("-hello"));
            assert!(edit_preview.contains("+world"));
            assert_eq!(surface.workspace.content("notes/a.md"), "world\n");
        }

        #[tokio::test]
        async fn resumes_through_multiple_batches() {
            let dir = tempdir().unwrap();
            let mut surface = FakeSurface::new(vec![
                vec![write("notes/a.md", "1")],
                vec![write("notes/b.md", "2")],
            ]);

            let outcome = ResumeLoop::new(profile(&dir.path().join("a.jsonl")))
                .run(&mut surface)
                .await
                .unwrap();

            assert_eq!(outcome.report().batches, 2);
            assert_eq!(surface.resumes, 2);
            assert_eq!(
                outcome.report().states,
                vec![
                    LoopState::Running,
                    LoopState::AwaitingApprovals,
                    LoopState::Resuming,
                    LoopState::AwaitingApprovals,
                    LoopState::Resuming,
                    LoopState::Completed,
                ]
            );
        }

        #[tokio::test]
        async fn missing_actor_aborts_distinctly() {
            let dir = tempdir().unwrap();
            let mut surface = FakeSurface::new(vec![vec![write("notes/a.md", "1")]]);
            surface.actor = None;

            let outcome = ResumeLoop::new(profile(&dir.path().join("a.jsonl")))
                .run(&mut surface)
                .await
                .unwrap();

            match outcome {
                LoopOutcome::Aborted { ref report, ref reason } => {
                    assert!(outcome.output().is_none());
                    assert_eq!(report.states.last(), Some(&LoopState::Aborted));
                    assert_eq!(report.resolved.len(), 1);
                    assert!(reason.contains("No resumable actor"));
                }
                LoopOutcome::Completed { .. } => panic!("Expected Aborted outcome"),
            }
        }
    }

    mod durability {
        use super::*;

        #[tokio::test]
        async fn audit_failure_does_not_block_application() {
            let dir = tempdir().unwrap();
            let blocker = dir.path().join("not-a-dir");
            std::fs::write(&blocker, "").unwrap();
            let mut surface = FakeSurface::new(vec![vec![write("notes/a.md", "hi")]]);

            let outcome = ResumeLoop::new(profile(&blocker.join("approvals.jsonl")))
                .run(&mut surface)
                .await
                .unwrap();

            assert_eq!(outcome.report().audit_failures, 1);
            assert!(!outcome.report().resolved[0].persisted);
            assert_eq!(surface.applied.len(), 1);
            assert_eq!(surface.workspace.content("notes/a.md"), "hi");
        }

        #[tokio::test]
        async fn record_exists_even_when_application_fails() {
            let dir = tempdir().unwrap();
            let log = dir.path().join("a.jsonl");
            let mut surface = FakeSurface::new(vec![vec![write("notes/a.md", "hi")]]);
            surface.fail_apply = true;

            let err = ResumeLoop::new(profile(&log))
                .run(&mut surface)
                .await
                .unwrap_err();

            assert!(matches!(err, LoopError::Apply { .. }));
            assert_eq!(read_audit_log(&log).unwrap().len(), 1);
        }

        #[tokio::test]
        async fn timeout_interrupts_only_at_resume() {
            let dir = tempdir().unwrap();
            let log = dir.path().join("a.jsonl");
            let mut surface = FakeSurface::new(vec![
                vec![write("notes/a.md", "1"), write("notes/b.md", "2")],
                vec![write("notes/c.md", "3")],
            ]);
            surface.slow_resume = true;

            let err = ResumeLoop::new(profile(&log))
                .run_with_timeout(&mut surface, Duration::from_millis(50))
                .await
                .unwrap_err();

            assert!(matches!(err, LoopError::TimedOut(_)));
            assert_eq!(surface.applied.len(), 2);
            assert_eq!(read_audit_log(&log).unwrap().len(), 2);
        }
    }

    mod sticky {
        use super::*;

        fn repeated_secret_writes() -> FakeSurface {
            FakeSurface::new(vec![
                vec![write("notes/secret.md", "1")],
                vec![write("notes/secret.md", "2")],
            ])
        }

        #[tokio::test]
        async fn record_only_evaluates_every_request() {
            let dir = tempdir().unwrap();
            let mut surface = repeated_secret_writes();
            let outcome = ResumeLoop::new(profile(&dir.path().join("a.jsonl")))
                .run(&mut surface)
                .await
                .unwrap();

            assert!(outcome.report().resolved.iter().all(|r| !r.reused));
            assert!(outcome.report().resolved.iter().all(|r| r.decision.always));
        }

        #[tokio::test]
        async fn reuse_mode_short_circuits_identical_requests() {
            let dir = tempdir().unwrap();
            let log = dir.path().join("a.jsonl");
            let mut surface = repeated_secret_writes();
            let outcome = ResumeLoop::new(profile(&log))
                .with_sticky_mode(StickyMode::Reuse)
                .run(&mut surface)
                .await
                .unwrap();

            let resolved = &outcome.report().resolved;
            assert!(!resolved[0].reused);
            assert!(resolved[1].reused);
            assert!(!resolved[1].decision.approve);
            assert!(resolved[1].decision.reason.starts_with("Standing decision: "));
            assert_eq!(read_audit_log(&log).unwrap().len(), 2);
        }
    }

    #[tokio::test]
    async fn transcript_receives_prompts_and_decisions() {
        let dir = tempdir().unwrap();
        let mut surface = FakeSurface::new(vec![vec![write("notes/a.md", "hi")]]);
        let review_loop = ResumeLoop::new(profile(&dir.path().join("a.jsonl")));
        let transcript = logging::open_transcript(Some(dir.path()), review_loop.run_id());
        let run_id = review_loop.run_id().to_string();

        review_loop
            .with_transcript(transcript)
            .run(&mut surface)
            .await
            .unwrap();

        let text = std::fs::read_to_string(dir.path().join(format!("{run_id}.log"))).unwrap();
        assert!(text.contains("REVIEW: === Tool approval required ==="));
        assert!(text.contains("DECISION: approve write_file: Path notes/a.md is approved"));
        assert!(text.trim_end().ends_with("END: Completed"));
    }
}
