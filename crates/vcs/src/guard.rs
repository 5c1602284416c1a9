//! Scoped ownership of the export branch in the upstream working clone.
//!
//! The clone is shared across invocations and must always be left on its
//! default branch with no export branch behind, whatever happened while the
//! branch was being built.

use std::path::PathBuf;
use tracing::{debug, warn};

use crate::git::GitRepo;

/// Guard for an export branch checked out in the working clone.
///
/// Call [`ExportBranchGuard::release`] on every normal exit path. If the guard
/// is dropped unreleased (panic, cancelled future), `Drop` performs the same
/// cleanup synchronously. Cleanup errors are logged and discarded so they
/// never replace the error that caused the exit.
pub struct ExportBranchGuard {
    repo: GitRepo,
    branch: String,
    default_branch: String,
    scratch_file: PathBuf,
    released: bool,
}

impl ExportBranchGuard {
    pub fn acquire(
        repo: GitRepo,
        branch: impl Into<String>,
        default_branch: impl Into<String>,
        scratch_file: impl Into<PathBuf>,
    ) -> Self {
        let branch = branch.into();
        debug!(branch = %branch, "Export branch guard acquired");

        Self {
            repo,
            branch,
            default_branch: default_branch.into(),
            scratch_file: scratch_file.into(),
            released: false,
        }
    }

    /// Return the clone to the default branch and delete the export branch.
    pub async fn release(mut self) {
        self.released = true;

        if let Err(e) = tokio::fs::remove_file(&self.scratch_file).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(error = %e, "Failed to remove scratch patch");
            }
        }
        if let Err(e) = self
            .repo
            .run_git(&["checkout", "--force", &self.default_branch])
            .await
        {
            warn!(error = %e, "Failed to return to default branch");
        }
        if let Err(e) = self.repo.run_git(&["branch", "-D", &self.branch]).await {
            debug!(error = %e, "Export branch not deleted");
        }

        debug!(branch = %self.branch, "Export branch guard released");
    }

    fn release_blocking(&self) {
        let _ = std::fs::remove_file(&self.scratch_file);
        let _ = self
            .repo
            .run_git_blocking(&["checkout", "--force", &self.default_branch]);
        let _ = self.repo.run_git_blocking(&["branch", "-D", &self.branch]);
    }
}

impl Drop for ExportBranchGuard {
    fn drop(&mut self) {
        if !self.released {
            warn!(
                branch = %self.branch,
                "Export branch guard dropped without release - cleaning up"
            );
            self.release_blocking();
        }
    }
}
