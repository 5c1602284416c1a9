pub mod error;
pub mod git;
pub mod guard;
pub mod transplant;

pub use error::{Result, VcsError};
pub use git::GitRepo;
pub use guard::ExportBranchGuard;
pub use transplant::{BranchExporter, ExportSettings, GitExporter};
