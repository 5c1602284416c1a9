//! The concrete Steps the planner can schedule.

mod change;
mod comment;
mod fetch;
mod merge;
mod open;
mod upstream;

pub use change::ChangeUpstreamStep;
pub use comment::{CommentStep, UrlSource};
pub use fetch::{fetch_upstreamable_commits, FetchUpstreamableStep};
pub use merge::MergeUpstreamStep;
pub use open::OpenUpstreamStep;
pub use upstream::UpstreamStep;

/// Label marking upstream PRs created by the synchronizer.
pub const EXPORT_LABEL: &str = "servo-export";

/// Label blocking a merge upstream until the source PR has merged.
pub const DO_NOT_MERGE_LABEL: &str = "do not merge yet";

/// URL a dry-run PR creation yields in place of a real one.
pub const DRY_RUN_PR_URL: &str = "http://test.url";
