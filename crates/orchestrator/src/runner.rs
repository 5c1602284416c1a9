//! Runs one event end to end: parse, plan, execute, and snapshot on failure.

use github::Tracker;
use serde_json::Value;
use std::path::{Path, PathBuf};
use sync_core::{PrMapping, PullRequestEvent, SyncConfig};
use tracing::{error, info, warn};
use vcs::BranchExporter;

use crate::diff_provider::{DiffProvider, StaticDiff};
use crate::error::{format_error_chain, OrchestratorError, Result};
use crate::planner::{self, Plan};
use crate::snapshot::SnapshotRecorder;
use crate::step::{Step, StepContext};

/// Progress hooks for whoever drives a run.
pub trait SyncObserver: Send {
    /// Called right before `step` runs.
    fn on_step(&mut self, _step: &dyn Step) {}

    /// Called once when the run fails, after the snapshot attempt.
    fn on_error(&mut self, _snapshot: Option<&Path>, _error: &OrchestratorError) {}
}

impl SyncObserver for () {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Success {
        executed: Vec<String>,
    },
    Failed {
        executed: Vec<String>,
        error: String,
        snapshot: Option<PathBuf>,
    },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Labels of the Steps that were started, including a failing one.
    pub fn executed(&self) -> &[String] {
        match self {
            Self::Success { executed } | Self::Failed { executed, .. } => executed,
        }
    }
}

pub struct SyncRunner<'a> {
    config: &'a SyncConfig,
    tracker: &'a dyn Tracker,
    exporter: &'a dyn BranchExporter,
    recorder: SnapshotRecorder,
}

impl<'a> SyncRunner<'a> {
    pub fn new(
        config: &'a SyncConfig,
        tracker: &'a dyn Tracker,
        exporter: &'a dyn BranchExporter,
    ) -> Self {
        Self {
            config,
            tracker,
            exporter,
            recorder: SnapshotRecorder::new(config.snapshot_dir.clone()),
        }
    }

    pub fn with_recorder(mut self, recorder: SnapshotRecorder) -> Self {
        self.recorder = recorder;
        self
    }

    /// Plan `payload` against `mapping` without executing anything.
    pub async fn plan(
        &self,
        payload: &Value,
        mapping: &PrMapping,
        diffs: &dyn DiffProvider,
    ) -> Result<Plan> {
        let (plan, _) = self.prepare(payload, mapping, diffs, true).await?;
        Ok(plan)
    }

    /// Handle one event.
    ///
    /// `mapping` is updated in place by Steps whose external effect succeeded,
    /// and keeps those updates even when a later Step fails. The snapshot of a
    /// failed run holds the mapping as it was before planning.
    pub async fn run(
        &self,
        mapping: &mut PrMapping,
        payload: &Value,
        diffs: &dyn DiffProvider,
        dry_run: bool,
        observer: &mut dyn SyncObserver,
    ) -> RunOutcome {
        let (plan, pr_diff) = match self.prepare(payload, mapping, diffs, dry_run).await {
            Ok(prepared) => prepared,
            Err(e) => {
                let initial = mapping.clone();
                return self
                    .fail(payload, &initial, diffs, Vec::new(), e, observer)
                    .await;
            }
        };

        // A diff already fetched for planning is reused for the snapshot.
        let cached;
        let snapshot_diffs: &dyn DiffProvider = match pr_diff {
            Some(d) => {
                cached = StaticDiff(d);
                &cached
            }
            None => diffs,
        };

        self.run_plan(&plan, mapping, payload, snapshot_diffs, dry_run, observer)
            .await
    }

    /// Execute an already built plan for the event `payload`.
    ///
    /// `diffs` is only consulted to fill the snapshot of a failed run.
    pub async fn run_plan(
        &self,
        plan: &Plan,
        mapping: &mut PrMapping,
        payload: &Value,
        diffs: &dyn DiffProvider,
        dry_run: bool,
        observer: &mut dyn SyncObserver,
    ) -> RunOutcome {
        let initial = mapping.clone();
        let mut executed = Vec::new();

        match self
            .execute(plan, mapping, dry_run, observer, &mut executed)
            .await
        {
            Ok(()) => {
                info!(steps = executed.len(), dry_run, "Sync completed");
                RunOutcome::Success { executed }
            }
            Err(e) => {
                self.fail(payload, &initial, diffs, executed, e, observer)
                    .await
            }
        }
    }

    async fn prepare(
        &self,
        payload: &Value,
        mapping: &PrMapping,
        diffs: &dyn DiffProvider,
        dry_run: bool,
    ) -> Result<(Plan, Option<String>)> {
        let event = PullRequestEvent::from_value(payload)?;
        info!(
            pr = event.pull_request.number,
            action = event.action.as_str(),
            dry_run,
            "Handling pull request event"
        );

        let pr_diff = if planner::needs_diff(&event) {
            Some(diffs.diff(&event.pull_request).await?)
        } else {
            None
        };

        let plan = planner::plan(
            self.config,
            &event,
            mapping,
            pr_diff.as_deref().unwrap_or_default(),
        );
        info!(steps = ?plan.labels(), "Planned");
        Ok((plan, pr_diff))
    }

    async fn execute(
        &self,
        plan: &Plan,
        mapping: &mut PrMapping,
        dry_run: bool,
        observer: &mut dyn SyncObserver,
        executed: &mut Vec<String>,
    ) -> Result<()> {
        for step in plan.steps() {
            let label = step.label();
            observer.on_step(step.as_ref());
            executed.push(label.clone());
            info!(step = %label, "Running step");

            let mut ctx = StepContext {
                config: self.config,
                tracker: self.tracker,
                exporter: self.exporter,
                mapping: &mut *mapping,
                dry_run,
            };
            step.run(&mut ctx)
                .await
                .map_err(|e| OrchestratorError::step_failed(label.clone(), e))?;

            if let Some(output) = step.provides().into_iter().find(|o| !o.is_resolved()) {
                return Err(OrchestratorError::MissingOutput {
                    step: label,
                    value: output.name(),
                });
            }
        }

        Ok(())
    }

    async fn fail(
        &self,
        payload: &Value,
        initial: &PrMapping,
        diffs: &dyn DiffProvider,
        executed: Vec<String>,
        err: OrchestratorError,
        observer: &mut dyn SyncObserver,
    ) -> RunOutcome {
        let chain = format_error_chain(&err);
        error!(
            error = %chain.trim_end(),
            invariant_violation = err.is_invariant_violation(),
            "Sync failed"
        );

        let pr_diff = self.best_effort_diff(payload, diffs).await;
        let snapshot = match self.recorder.record(payload, initial, &chain, &pr_diff).await {
            Ok(dir) => Some(dir),
            Err(e) => {
                error!(error = %e, "Failed to record error snapshot");
                None
            }
        };

        observer.on_error(snapshot.as_deref(), &err);

        RunOutcome::Failed {
            executed,
            error: chain,
            snapshot,
        }
    }

    async fn best_effort_diff(&self, payload: &Value, diffs: &dyn DiffProvider) -> String {
        let Ok(event) = PullRequestEvent::from_value(payload) else {
            return String::new();
        };
        match diffs.diff(&event.pull_request).await {
            Ok(d) => d,
            Err(e) => {
                warn!(error = %e, "Could not fetch diff for snapshot");
                String::new()
            }
        }
    }
}
