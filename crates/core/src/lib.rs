pub mod config;
pub mod diff;
pub mod domain;
pub mod error;

pub use config::SyncConfig;
pub use domain::commit::Commit;
pub use domain::event::{PullRequest, PullRequestAction, PullRequestEvent};
pub use domain::mapping::PrMapping;
pub use domain::export_branch_name;
pub use error::{CoreError, Result};

/// Marker that opts a pull request out of synchronization when present in its body.
pub const NO_SYNC_SIGNAL: &str = "[no-wpt-sync]";

/// Directory of the source repository mirrored into the upstream test suite.
pub const DEFAULT_UPSTREAMABLE_PATH: &str = "tests/wpt/web-platform-tests/";
