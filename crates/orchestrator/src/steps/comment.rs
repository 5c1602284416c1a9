use async_trait::async_trait;

use crate::deferred::Deferred;
use crate::error::Result;
use crate::step::{Step, StepContext};

/// Where a comment finds the upstream PR link.
#[derive(Debug, Clone)]
pub enum UrlSource {
    /// Known at planning time, from the mapping.
    Known(String),
    /// Produced by a Step planned earlier.
    Deferred(Deferred<String>),
}

/// Links the source PR to its upstream counterpart.
pub struct CommentStep {
    source_pr: u64,
    upstream_url: UrlSource,
}

impl CommentStep {
    pub fn new(source_pr: u64, upstream_url: UrlSource) -> Self {
        Self {
            source_pr,
            upstream_url,
        }
    }

    pub fn message(upstream_url: &str) -> String {
        format!(
            "Completed upstream sync of web-platform-test changes at {}.",
            upstream_url
        )
    }
}

#[async_trait]
impl Step for CommentStep {
    fn name(&self) -> &'static str {
        "CommentStep"
    }

    async fn run(&self, ctx: &mut StepContext<'_>) -> Result<()> {
        let url = match &self.upstream_url {
            UrlSource::Known(url) => url.as_str(),
            UrlSource::Deferred(url) => url.get()?.as_str(),
        };
        if ctx.dry_run {
            return Ok(());
        }

        ctx.tracker
            .comment_on_source_pr(self.source_pr, &Self::message(url))
            .await?;
        Ok(())
    }
}
