use async_trait::async_trait;
use github::PrState;

use crate::error::Result;
use crate::step::{Step, StepContext};

/// Forces an upstream PR open or closed.
pub struct ChangeUpstreamStep {
    upstream: u64,
    state: PrState,
}

impl ChangeUpstreamStep {
    pub fn new(upstream: u64, state: PrState) -> Self {
        Self { upstream, state }
    }
}

#[async_trait]
impl Step for ChangeUpstreamStep {
    fn name(&self) -> &'static str {
        "ChangeUpstreamStep"
    }

    fn label(&self) -> String {
        format!("{}({})", self.name(), self.state)
    }

    async fn run(&self, ctx: &mut StepContext<'_>) -> Result<()> {
        if ctx.dry_run {
            return Ok(());
        }

        ctx.tracker
            .set_pull_request_state(self.upstream, self.state)
            .await?;
        Ok(())
    }
}
