use async_trait::async_trait;

use crate::error::Result;
use crate::types::{CommitDetail, CreatePrRequest, CreatedPullRequest, PrCommit, PrState};

/// Calls the synchronizer makes against the issue tracker.
///
/// Pull request, label and merge operations target the upstream repository;
/// comments target the source repository. Any non-2xx answer is an error.
#[async_trait]
pub trait Tracker: Send + Sync {
    /// All commits of a pull request, following pagination.
    async fn list_pr_commits(&self, commits_url: &str) -> Result<Vec<PrCommit>>;

    async fn get_commit(&self, url: &str) -> Result<CommitDetail>;

    /// Raw text served at `url` (commit or pull request `.diff`).
    async fn get_diff(&self, url: &str) -> Result<String>;

    async fn create_pull_request(&self, request: &CreatePrRequest) -> Result<CreatedPullRequest>;

    async fn set_pull_request_state(&self, number: u64, state: PrState) -> Result<()>;

    async fn add_labels(&self, number: u64, labels: &[&str]) -> Result<()>;

    async fn remove_label(&self, number: u64, label: &str) -> Result<()>;

    async fn merge_pull_request(&self, number: u64) -> Result<()>;

    async fn comment_on_source_pr(&self, number: u64, body: &str) -> Result<()>;
}
