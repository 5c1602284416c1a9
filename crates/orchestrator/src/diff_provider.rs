use async_trait::async_trait;
use github::Tracker;
use sync_core::PullRequest;

use crate::error::{OrchestratorError, Result};

/// Supplies the full diff of the pull request an event is about.
#[async_trait]
pub trait DiffProvider: Send + Sync {
    async fn diff(&self, pull_request: &PullRequest) -> Result<String>;
}

/// A diff known up front: read from a file, a snapshot, or a test fixture.
#[derive(Debug, Clone)]
pub struct StaticDiff(pub String);

#[async_trait]
impl DiffProvider for StaticDiff {
    async fn diff(&self, _pull_request: &PullRequest) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Downloads the diff from the pull request's `diff_url`.
pub struct TrackerDiff<'a> {
    tracker: &'a dyn Tracker,
}

impl<'a> TrackerDiff<'a> {
    pub fn new(tracker: &'a dyn Tracker) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl DiffProvider for TrackerDiff<'_> {
    async fn diff(&self, pull_request: &PullRequest) -> Result<String> {
        let url = pull_request
            .diff_url
            .as_deref()
            .ok_or(OrchestratorError::MissingDiffUrl(pull_request.number))?;
        Ok(self.tracker.get_diff(url).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pull_request() -> PullRequest {
        PullRequest {
            number: 3,
            title: String::new(),
            body: None,
            merged: false,
            commits_url: String::new(),
            diff_url: None,
        }
    }

    #[tokio::test]
    async fn test_static_diff() {
        let provider = StaticDiff("diff --git a/x b/x\n".to_string());
        assert_eq!(
            provider.diff(&pull_request()).await.unwrap(),
            "diff --git a/x b/x\n"
        );
    }
}
