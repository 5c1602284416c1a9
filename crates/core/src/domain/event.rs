use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestAction {
    Opened,
    Synchronize,
    Closed,
    /// Any action the synchronizer does not react to (labeled, edited, ...).
    #[serde(other)]
    Other,
}

impl PullRequestAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullRequestAction::Opened => "opened",
            PullRequestAction::Synchronize => "synchronize",
            PullRequestAction::Closed => "closed",
            PullRequestAction::Other => "other",
        }
    }
}

/// The subset of a webhook `pull_request` object the synchronizer reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub merged: bool,
    pub commits_url: String,
    #[serde(default)]
    pub diff_url: Option<String>,
}

impl PullRequest {
    /// The pull request number as used for mapping keys and branch names.
    pub fn key(&self) -> String {
        self.number.to_string()
    }

    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestEvent {
    pub action: PullRequestAction,
    pub pull_request: PullRequest,
}

impl PullRequestEvent {
    pub fn from_value(payload: &serde_json::Value) -> Result<Self> {
        Ok(Self::deserialize(payload)?)
    }
}
