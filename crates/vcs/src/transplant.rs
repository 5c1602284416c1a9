//! Replays the upstreamable part of source commits onto the upstream clone.

use async_trait::async_trait;
use std::path::PathBuf;
use sync_core::{diff, export_branch_name, Commit, SyncConfig};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::git::GitRepo;
use crate::guard::ExportBranchGuard;

const PATCH_FILE: &str = "tmp.patch";

/// Publishes a source pull request's commits as a branch of the upstream repository.
#[async_trait]
pub trait BranchExporter: Send + Sync {
    /// Returns the name of the pushed branch. With `dry_run` nothing is
    /// touched and only the name is computed.
    async fn export(&self, source_pr: &str, commits: &[Commit], dry_run: bool) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub default_branch: String,
    pub remote: String,
    /// Where the export branch is force-pushed; usually carries credentials.
    pub push_url: String,
    pub upstreamable_path: String,
}

impl ExportSettings {
    pub fn new(push_url: impl Into<String>, upstreamable_path: impl Into<String>) -> Self {
        Self {
            default_branch: "master".to_string(),
            remote: "origin".to_string(),
            push_url: push_url.into(),
            upstreamable_path: upstreamable_path.into(),
        }
    }

    fn strip_count(&self) -> String {
        diff::strip_count(&self.upstreamable_path).to_string()
    }
}

pub struct GitExporter {
    repo: GitRepo,
    settings: ExportSettings,
}

impl GitExporter {
    pub fn new(repo: GitRepo, settings: ExportSettings) -> Self {
        Self { repo, settings }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        let repo = GitRepo::new(&config.wpt_path).with_secret(&config.token);
        let settings = ExportSettings::new(config.push_url(), &config.upstreamable_path);
        Self::new(repo, settings)
    }

    pub fn repo(&self) -> &GitRepo {
        &self.repo
    }

    fn patch_path(&self) -> PathBuf {
        self.repo.path().join(PATCH_FILE)
    }

    /// Discard local history and move the default branch to the remote tip.
    async fn sync_default_branch(&self) -> Result<()> {
        let default_branch = self.settings.default_branch.as_str();
        let remote_tip = format!("{}/{}", self.settings.remote, default_branch);

        self.repo.run_git(&["checkout", default_branch]).await?;
        self.repo
            .run_git(&["fetch", &self.settings.remote, default_branch, "--depth", "1"])
            .await?;
        self.repo.run_git(&["reset", "--hard", &remote_tip]).await?;
        Ok(())
    }

    async fn apply_commit(&self, commit: &Commit) -> Result<bool> {
        let filtered = diff::filter_to_prefix(&commit.diff, &self.settings.upstreamable_path);
        if filtered.trim().is_empty() {
            warn!(
                subject = %commit.message.lines().next().unwrap_or_default(),
                "Commit has no upstreamable hunks, skipping"
            );
            return Ok(false);
        }

        debug!(paths = ?diff::touched_paths(&filtered), "Applying filtered patch");
        let patch_path = self.patch_path();
        tokio::fs::write(&patch_path, filtered).await?;

        let strip = self.settings.strip_count();
        self.repo
            .run_git(&["apply", PATCH_FILE, "-p", &strip])
            .await?;

        // Must be gone before staging so the next commit never picks it up.
        tokio::fs::remove_file(&patch_path).await?;

        self.repo.run_git(&["add", "--all"]).await?;
        self.repo
            .run_git(&[
                "commit",
                "--message",
                &commit.message,
                "--author",
                &commit.author,
            ])
            .await?;

        Ok(true)
    }

    async fn build_and_push(&self, branch: &str, commits: &[Commit]) -> Result<()> {
        self.sync_default_branch().await?;

        if self.repo.branch_exists(branch).await? {
            warn!(branch = %branch, "Replacing leftover export branch");
        }
        self.repo.run_git(&["checkout", "-B", branch]).await?;

        let mut applied = 0;
        for commit in commits {
            if self.apply_commit(commit).await? {
                applied += 1;
            }
        }
        debug!(applied, total = commits.len(), "Commits transplanted");

        self.repo
            .run_git(&["push", "-f", &self.settings.push_url, branch])
            .await?;

        Ok(())
    }
}

#[async_trait]
impl BranchExporter for GitExporter {
    async fn export(&self, source_pr: &str, commits: &[Commit], dry_run: bool) -> Result<String> {
        let branch = export_branch_name(source_pr);
        if dry_run {
            debug!(branch = %branch, "Dry run, skipping export");
            return Ok(branch);
        }

        info!(
            pr = %source_pr,
            branch = %branch,
            commits = commits.len(),
            "Exporting commits upstream"
        );

        let guard = ExportBranchGuard::acquire(
            self.repo.clone(),
            &branch,
            &self.settings.default_branch,
            self.patch_path(),
        );
        let result = self.build_and_push(&branch, commits).await;
        guard.release().await;

        result?;
        info!(branch = %branch, "Export branch pushed");
        Ok(branch)
    }
}
