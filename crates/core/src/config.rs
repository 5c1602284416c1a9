use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::diff;
use crate::error::{CoreError, Result};
use crate::DEFAULT_UPSTREAMABLE_PATH;

const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Everything the synchronizer needs to talk to both repositories.
#[derive(Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// API token of the export account.
    #[serde(default)]
    pub token: String,
    /// Login of the export account; branches are pushed to its fork.
    pub username: String,
    /// Organization owning the upstream test-suite repository.
    pub upstream_org: String,
    /// Organization owning the source repository.
    pub source_org: String,
    #[serde(default = "default_upstream_repo")]
    pub upstream_repo: String,
    #[serde(default = "default_source_repo")]
    pub source_repo: String,
    /// Working clone of the upstream repository.
    pub wpt_path: PathBuf,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_git_host")]
    pub git_host: String,
    /// Where failure snapshots are written.
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,
    #[serde(default = "default_upstreamable_path")]
    pub upstreamable_path: String,
}

fn default_upstream_repo() -> String {
    "web-platform-tests".to_string()
}

fn default_source_repo() -> String {
    "servo".to_string()
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_git_host() -> String {
    "github.com".to_string()
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_upstreamable_path() -> String {
    DEFAULT_UPSTREAMABLE_PATH.to_string()
}

impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("token", &"<redacted>")
            .field("username", &self.username)
            .field("upstream_org", &self.upstream_org)
            .field("source_org", &self.source_org)
            .field("upstream_repo", &self.upstream_repo)
            .field("source_repo", &self.source_repo)
            .field("wpt_path", &self.wpt_path)
            .field("api_base", &self.api_base)
            .field("git_host", &self.git_host)
            .field("snapshot_dir", &self.snapshot_dir)
            .field("upstreamable_path", &self.upstreamable_path)
            .finish()
    }
}

impl SyncConfig {
    pub fn new(
        token: impl Into<String>,
        username: impl Into<String>,
        upstream_org: impl Into<String>,
        source_org: impl Into<String>,
        wpt_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            token: token.into(),
            username: username.into(),
            upstream_org: upstream_org.into(),
            source_org: source_org.into(),
            upstream_repo: default_upstream_repo(),
            source_repo: default_source_repo(),
            wpt_path: wpt_path.into(),
            api_base: default_api_base(),
            git_host: default_git_host(),
            snapshot_dir: default_snapshot_dir(),
            upstreamable_path: default_upstreamable_path(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = dir.into();
        self
    }

    /// Read a config file. `.toml` files are parsed as TOML, anything else as JSON.
    ///
    /// An empty `token` is filled from `GITHUB_TOKEN`.
    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;

        let mut config: SyncConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content)?,
            _ => serde_json::from_str(&content)?,
        };

        if config.token.is_empty() {
            if let Ok(token) = std::env::var(TOKEN_ENV) {
                debug!("Using token from {}", TOKEN_ENV);
                config.token = token;
            }
        }

        debug!(path = %path.display(), "Config loaded");
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            ("token", &self.token),
            ("username", &self.username),
            ("upstream_org", &self.upstream_org),
            ("source_org", &self.source_org),
            ("upstream_repo", &self.upstream_repo),
            ("source_repo", &self.source_repo),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CoreError::Config(format!("{} must not be empty", field)));
            }
        }

        if !self.upstreamable_path.ends_with('/') {
            return Err(CoreError::Config(format!(
                "upstreamable_path must end with '/': {}",
                self.upstreamable_path
            )));
        }

        Ok(())
    }

    /// `head` value for a pull request opened from the export account's branch.
    pub fn pr_head(&self, branch: &str) -> String {
        if self.username != self.upstream_org {
            format!("{}:{}", self.username, branch)
        } else {
            branch.to_string()
        }
    }

    /// Credentialed remote the export branch is force-pushed to.
    pub fn push_url(&self) -> String {
        format!(
            "https://{user}:{token}@{host}/{user}/{repo}.git",
            user = self.username,
            token = self.token,
            host = self.git_host,
            repo = self.upstream_repo,
        )
    }

    pub fn upstream_pr_html_url(&self, number: u64) -> String {
        format!(
            "https://{}/{}/{}/pull/{}",
            self.git_host, self.upstream_org, self.upstream_repo, number
        )
    }

    pub fn source_pr_html_url(&self, number: &str) -> String {
        format!(
            "https://{}/{}/{}/pull/{}",
            self.git_host, self.source_org, self.source_repo, number
        )
    }

    pub fn strip_count(&self) -> usize {
        diff::strip_count(&self.upstreamable_path)
    }
}
