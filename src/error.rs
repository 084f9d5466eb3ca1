use std::time::Duration;

use thiserror::Error;

/// Errors surfaced to the caller of `FlagEvaluationClient::evaluate`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Failures of a single outbound evaluation. These never reach the caller;
/// the client resolves them to a fallback value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("Evaluation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed evaluator response: {0}")]
    MalformedResponse(String),

    #[error("Flag not known to evaluator: {0}")]
    FlagNotFound(String),

    #[error("Evaluator panicked: {0}")]
    Panicked(String),

    #[error("Evaluation cancelled")]
    Cancelled,
}

impl EvaluationError {
    /// Short, stable label for failure records and log fields.
    pub fn cause(&self) -> &'static str {
        match self {
            EvaluationError::Timeout(_) => "timeout",
            EvaluationError::Transport(_) => "transport",
            EvaluationError::MalformedResponse(_) => "malformed_response",
            EvaluationError::FlagNotFound(_) => "flag_not_found",
            EvaluationError::Panicked(_) => "panicked",
            EvaluationError::Cancelled => "cancelled",
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} missing, it is required")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}
