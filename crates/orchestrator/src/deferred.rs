//! Write-once cells that carry a Step's result to Steps planned after it.
//!
//! The planner hands out a [`Deferred`] before the producing Step has run;
//! the consumer holds a clone and reads it from inside its own `run`. Because
//! Steps execute strictly in plan order, a consumer placed after its producer
//! always finds the value set.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::error::{OrchestratorError, Result};

pub struct Deferred<T> {
    name: &'static str,
    cell: Arc<OnceLock<T>>,
}

impl<T> Deferred<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            cell: Arc::new(OnceLock::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Set the value. Fails if it was already set.
    pub fn resolve(&self, value: T) -> Result<()> {
        self.cell
            .set(value)
            .map_err(|_| OrchestratorError::AlreadyResolved(self.name))
    }

    /// Read the value. Fails if the producer has not run yet.
    pub fn get(&self) -> Result<&T> {
        self.cell
            .get()
            .ok_or(OrchestratorError::UnresolvedValue(self.name))
    }

    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("name", &self.name)
            .field("value", &self.cell.get())
            .finish()
    }
}

/// Type-erased view of a [`Deferred`], used to check a Step's outputs.
pub trait Output: Send + Sync {
    fn name(&self) -> &'static str;
    fn is_resolved(&self) -> bool;
}

impl<T: Send + Sync> Output for Deferred<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_resolved(&self) -> bool {
        Deferred::is_resolved(self)
    }
}
