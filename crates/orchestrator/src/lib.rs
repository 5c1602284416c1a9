//! Plans and executes the synchronization of one pull request event.
//!
//! [`planner::plan`] turns an event plus the current [`PrMapping`](sync_core::PrMapping)
//! into an ordered [`Plan`] of [`Step`]s; [`SyncRunner`] executes the plan and
//! writes an error snapshot when a Step fails.

pub mod deferred;
pub mod diff_provider;
pub mod error;
pub mod planner;
pub mod runner;
pub mod snapshot;
pub mod step;
pub mod steps;

pub use deferred::{Deferred, Output};
pub use diff_provider::{DiffProvider, StaticDiff, TrackerDiff};
pub use error::{format_error_chain, OrchestratorError, Result};
pub use planner::{needs_diff, plan, Plan};
pub use runner::{RunOutcome, SyncObserver, SyncRunner};
pub use snapshot::{Snapshot, SnapshotRecorder};
pub use step::{Step, StepContext};
