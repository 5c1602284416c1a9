use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::step::{Step, StepContext};

use super::DO_NOT_MERGE_LABEL;

/// Merges the upstream PR and forgets the mapping entry.
pub struct MergeUpstreamStep {
    source_pr: String,
    upstream: u64,
}

impl MergeUpstreamStep {
    pub fn new(source_pr: impl Into<String>, upstream: u64) -> Self {
        Self {
            source_pr: source_pr.into(),
            upstream,
        }
    }
}

#[async_trait]
impl Step for MergeUpstreamStep {
    fn name(&self) -> &'static str {
        "MergeUpstreamStep"
    }

    async fn run(&self, ctx: &mut StepContext<'_>) -> Result<()> {
        if !ctx.dry_run {
            ctx.tracker
                .remove_label(self.upstream, DO_NOT_MERGE_LABEL)
                .await?;
            ctx.tracker.merge_pull_request(self.upstream).await?;
        }

        ctx.mapping.remove(&self.source_pr);
        info!(
            pr = %self.source_pr,
            upstream = self.upstream,
            "Mapping entry removed after merge"
        );
        Ok(())
    }
}
