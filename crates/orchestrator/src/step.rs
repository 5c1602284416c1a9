//! The unit of externally visible work the planner schedules.

use async_trait::async_trait;
use github::Tracker;
use sync_core::{PrMapping, SyncConfig};
use vcs::BranchExporter;

use crate::deferred::Output;
use crate::error::Result;

/// Everything a Step may touch while it runs.
pub struct StepContext<'a> {
    pub config: &'a SyncConfig,
    pub tracker: &'a dyn Tracker,
    pub exporter: &'a dyn BranchExporter,
    /// Only Steps whose external call succeeded may mutate the mapping.
    pub mapping: &'a mut PrMapping,
    /// Suppress every network and git mutation.
    pub dry_run: bool,
}

/// A named action executed after planning, in plan order.
///
/// A Step reads the [`Deferred`](crate::Deferred) values of earlier Steps only
/// inside [`Step::run`], and resolves each value it [`provides`](Step::provides)
/// exactly once before returning.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;

    /// Name plus the parameters that distinguish otherwise identical Steps.
    fn label(&self) -> String {
        self.name().to_string()
    }

    /// Values this Step resolves when it runs.
    fn provides(&self) -> Vec<&dyn Output> {
        Vec::new()
    }

    async fn run(&self, ctx: &mut StepContext<'_>) -> Result<()>;
}

impl std::fmt::Debug for dyn Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}
