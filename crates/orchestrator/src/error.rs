use github::GitHubError;
use sync_core::CoreError;
use thiserror::Error;
use vcs::VcsError;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Deferred value '{0}' read before it was resolved")]
    UnresolvedValue(&'static str),

    #[error("Deferred value '{0}' resolved more than once")]
    AlreadyResolved(&'static str),

    #[error("Step {step} returned without resolving '{value}'")]
    MissingOutput { step: String, value: &'static str },

    #[error("Step {step} failed")]
    StepFailed {
        step: String,
        #[source]
        source: Box<OrchestratorError>,
    },

    #[error("Pull request #{0} has no diff_url")]
    MissingDiffUrl(u64),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("GitHub error: {0}")]
    GitHub(#[from] GitHubError),

    #[error("VCS error: {0}")]
    Vcs(#[from] VcsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OrchestratorError {
    pub fn step_failed(step: impl Into<String>, source: OrchestratorError) -> Self {
        Self::StepFailed {
            step: step.into(),
            source: Box::new(source),
        }
    }

    /// Whether this error is a broken planning invariant rather than an
    /// external failure.
    pub fn is_invariant_violation(&self) -> bool {
        match self {
            Self::UnresolvedValue(_) | Self::AlreadyResolved(_) | Self::MissingOutput { .. } => {
                true
            }
            Self::StepFailed { source, .. } => source.is_invariant_violation(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Render an error with its whole `source()` chain, one cause per line.
pub fn format_error_chain(err: &dyn std::error::Error) -> String {
    let mut text = format!("{}\n", err);
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(&format!("Caused by: {}\n", cause));
        source = cause.source();
    }
    text
}
