use async_trait::async_trait;
use github::Tracker;
use sync_core::Commit;
use tracing::{debug, info};

use crate::deferred::{Deferred, Output};
use crate::error::Result;
use crate::step::{Step, StepContext};

/// Collects the commits of a pull request that touch the upstreamable path.
pub struct FetchUpstreamableStep {
    commits_url: String,
    commits: Deferred<Vec<Commit>>,
}

impl FetchUpstreamableStep {
    pub fn new(commits_url: impl Into<String>) -> Self {
        Self {
            commits_url: commits_url.into(),
            commits: Deferred::new("commits"),
        }
    }

    pub fn commits(&self) -> Deferred<Vec<Commit>> {
        self.commits.clone()
    }
}

#[async_trait]
impl Step for FetchUpstreamableStep {
    fn name(&self) -> &'static str {
        "FetchUpstreamableStep"
    }

    fn provides(&self) -> Vec<&dyn Output> {
        vec![&self.commits as &dyn Output]
    }

    async fn run(&self, ctx: &mut StepContext<'_>) -> Result<()> {
        let commits = if ctx.dry_run {
            Vec::new()
        } else {
            fetch_upstreamable_commits(
                ctx.tracker,
                &self.commits_url,
                &ctx.config.upstreamable_path,
            )
            .await?
        };

        self.commits.resolve(commits)
    }
}

/// Commits behind `commits_url` with at least one file under `prefix`, in
/// their original order, each carrying its full raw diff.
pub async fn fetch_upstreamable_commits(
    tracker: &dyn Tracker,
    commits_url: &str,
    prefix: &str,
) -> Result<Vec<Commit>> {
    let listed = tracker.list_pr_commits(commits_url).await?;
    let mut upstreamable = Vec::new();

    for entry in &listed {
        let detail = tracker.get_commit(&entry.url).await?;
        if !detail.touches_prefix(prefix) {
            debug!(sha = %entry.sha, "Commit has no upstreamable files");
            continue;
        }

        let diff = tracker.get_diff(&entry.diff_url()).await?;
        upstreamable.push(Commit::new(
            &entry.commit.author.name,
            &entry.commit.author.email,
            entry.commit.message.clone(),
            diff,
        ));
    }

    info!(
        total = listed.len(),
        upstreamable = upstreamable.len(),
        "Selected upstreamable commits"
    );
    Ok(upstreamable)
}
