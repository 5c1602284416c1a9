pub mod client;
pub mod error;
pub mod tracker;
pub mod types;

pub use client::GitHubClient;
pub use error::{GitHubError, Result};
pub use tracker::Tracker;
pub use types::{
    CommitAuthor, CommitDetail, CommitFile, CreatePrRequest, CreatedPullRequest, PrCommit,
    PrCommitData, PrState, RepoConfig,
};
