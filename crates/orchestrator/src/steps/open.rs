use async_trait::async_trait;
use github::CreatePrRequest;
use tracing::info;

use crate::deferred::{Deferred, Output};
use crate::error::Result;
use crate::step::{Step, StepContext};

use super::{DO_NOT_MERGE_LABEL, DRY_RUN_PR_URL, EXPORT_LABEL};

const UPSTREAM_BASE: &str = "master";

/// Opens the upstream PR for a pushed export branch and records the mapping.
pub struct OpenUpstreamStep {
    source_pr: String,
    title: String,
    body: String,
    branch: Deferred<String>,
    pr_url: Deferred<String>,
}

impl OpenUpstreamStep {
    pub fn new(
        source_pr: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        branch: Deferred<String>,
    ) -> Self {
        Self {
            source_pr: source_pr.into(),
            title: title.into(),
            body: body.into(),
            branch,
            pr_url: Deferred::new("pr_url"),
        }
    }

    pub fn pr_url(&self) -> Deferred<String> {
        self.pr_url.clone()
    }
}

#[async_trait]
impl Step for OpenUpstreamStep {
    fn name(&self) -> &'static str {
        "OpenUpstreamStep"
    }

    fn provides(&self) -> Vec<&dyn Output> {
        vec![&self.pr_url as &dyn Output]
    }

    async fn run(&self, ctx: &mut StepContext<'_>) -> Result<()> {
        let branch = self.branch.get()?;
        if ctx.dry_run {
            return self.pr_url.resolve(DRY_RUN_PR_URL.to_string());
        }

        let request = CreatePrRequest::new(&self.title, ctx.config.pr_head(branch), UPSTREAM_BASE)
            .with_body(&self.body);
        let created = ctx.tracker.create_pull_request(&request).await?;

        ctx.mapping.insert(self.source_pr.clone(), created.number);
        info!(
            pr = %self.source_pr,
            upstream = created.number,
            "Mapping entry recorded"
        );

        ctx.tracker
            .add_labels(created.number, &[EXPORT_LABEL, DO_NOT_MERGE_LABEL])
            .await?;

        self.pr_url.resolve(created.html_url)
    }
}
