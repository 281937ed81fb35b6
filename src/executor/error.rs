//! Typed execution errors

use thiserror::Error;

/// Errors raised while executing one task
#[derive(Debug, Error)]
pub enum ExecError {
    /// No team registered under the task's team label. Never retried:
    /// re-running cannot make a missing team appear.
    #[error("no team registered for label '{team}'")]
    TeamNotFound { team: String },

    /// The team's processing raised
    #[error("team '{team}' failed: {message}")]
    Team { team: String, message: String },

    /// Anything else that escaped the pipeline
    #[error("{0}")]
    Other(String),
}

impl ExecError {
    /// Whether a retry could plausibly change the outcome
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ExecError::TeamNotFound { .. })
    }
}
