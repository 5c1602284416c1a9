use async_trait::async_trait;
use sync_core::Commit;

use crate::deferred::{Deferred, Output};
use crate::error::Result;
use crate::step::{Step, StepContext};

/// Transplants fetched commits onto the export branch and pushes it.
pub struct UpstreamStep {
    source_pr: String,
    commits: Deferred<Vec<Commit>>,
    branch: Deferred<String>,
}

impl UpstreamStep {
    pub fn new(source_pr: impl Into<String>, commits: Deferred<Vec<Commit>>) -> Self {
        Self {
            source_pr: source_pr.into(),
            commits,
            branch: Deferred::new("branch"),
        }
    }

    pub fn branch(&self) -> Deferred<String> {
        self.branch.clone()
    }
}

#[async_trait]
impl Step for UpstreamStep {
    fn name(&self) -> &'static str {
        "UpstreamStep"
    }

    fn provides(&self) -> Vec<&dyn Output> {
        vec![&self.branch as &dyn Output]
    }

    async fn run(&self, ctx: &mut StepContext<'_>) -> Result<()> {
        let commits = self.commits.get()?;
        let branch = ctx
            .exporter
            .export(&self.source_pr, commits, ctx.dry_run)
            .await?;
        self.branch.resolve(branch)
    }
}
