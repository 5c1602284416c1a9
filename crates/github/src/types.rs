use serde::{Deserialize, Serialize};

// =============================================================================
// Pull Request
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    Open,
    Closed,
}

impl PrState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrState::Open => "open",
            PrState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for PrState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePrRequest {
    pub title: String,
    pub body: String,
    pub head: String,
    pub base: String,
    pub maintainer_can_modify: bool,
}

impl CreatePrRequest {
    pub fn new(title: impl Into<String>, head: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: String::new(),
            head: head.into(),
            base: base.into(),
            maintainer_can_modify: false,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

/// The fields of a freshly created pull request the synchronizer keeps.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedPullRequest {
    pub number: u64,
    pub html_url: String,
}

// =============================================================================
// Commits
// =============================================================================

/// Entry of a pull request's commit listing.
#[derive(Debug, Clone, Deserialize)]
pub struct PrCommit {
    pub sha: String,
    /// API URL of the full commit, including its file list.
    pub url: String,
    pub html_url: String,
    pub commit: PrCommitData,
}

impl PrCommit {
    /// Web URL serving the raw diff of this commit.
    pub fn diff_url(&self) -> String {
        format!("{}.diff", self.html_url)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrCommitData {
    pub author: CommitAuthor,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    #[serde(default)]
    pub files: Vec<CommitFile>,
}

impl CommitDetail {
    pub fn touches_prefix(&self, prefix: &str) -> bool {
        self.files.iter().any(|f| f.filename.starts_with(prefix))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitFile {
    pub filename: String,
}

// =============================================================================
// Repositories
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoConfig {
    pub owner: String,
    pub repo: String,
}

impl RepoConfig {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// API route of this repository, e.g. `/repos/owner/repo`.
    pub fn route(&self) -> String {
        format!("/repos/{}/{}", self.owner, self.repo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_route() {
        let config = RepoConfig::new("w3c", "web-platform-tests");
        assert_eq!(config.route(), "/repos/w3c/web-platform-tests");
    }

    #[test]
    fn test_create_pr_request_body() {
        let req = CreatePrRequest::new("Title", "servo-wpt-sync:servo_export_1", "master")
            .with_body("Reviewed in elsewhere.");
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["title"], "Title");
        assert_eq!(json["head"], "servo-wpt-sync:servo_export_1");
        assert_eq!(json["base"], "master");
        assert_eq!(json["body"], "Reviewed in elsewhere.");
        assert_eq!(json["maintainer_can_modify"], false);
    }

    #[test]
    fn test_pr_state_serialization() {
        assert_eq!(serde_json::to_string(&PrState::Open).unwrap(), "\"open\"");
        assert_eq!(PrState::Closed.to_string(), "closed");
    }

    #[test]
    fn test_commit_detail_touches_prefix() {
        let detail: CommitDetail = serde_json::from_value(serde_json::json!({
            "sha": "abc",
            "files": [
                { "filename": "components/script/lib.rs" },
                { "filename": "tests/wpt/web-platform-tests/dom/a.html" }
            ]
        }))
        .unwrap();
        assert!(detail.touches_prefix("tests/wpt/web-platform-tests/"));
        assert!(!detail.touches_prefix("tests/wpt/mozilla/"));
    }

    #[test]
    fn test_pr_commit_diff_url() {
        let commit: PrCommit = serde_json::from_value(serde_json::json!({
            "sha": "abc",
            "url": "https://api.github.com/repos/servo/servo/commits/abc",
            "html_url": "https://github.com/servo/servo/commit/abc",
            "commit": {
                "author": { "name": "Jane", "email": "jane@example.com", "date": "2017-01-01T00:00:00Z" },
                "message": "Fix"
            }
        }))
        .unwrap();
        assert_eq!(commit.diff_url(), "https://github.com/servo/servo/commit/abc.diff");
    }
}
