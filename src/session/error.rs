// src/session/error.rs

use thiserror::Error;

use crate::session::controller::SessionState;

/// Recoverable failures reported by the session controller.
/// None of them mutate the attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No active quiz matches the code.
    #[error("no active quiz matches code '{0}'")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    /// Operation needs a different lifecycle state.
    #[error("operation not allowed while session is {0:?}")]
    NotActive(SessionState),

    /// Data-access collaborator failed.
    #[error("quiz store unavailable: {0}")]
    Unavailable(String),
}

impl SessionError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        SessionError::InvalidInput(msg.into())
    }
}
