//! Scoring error types.

use thiserror::Error;

/// Errors that can occur while scoring a node for a pod.
///
/// Every per-call variant is terminal for that (pod, node) pair: it is
/// reported to the caller and never replaced by a default score.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("label \"{0}\" is not specified")]
    MissingLabel(String),

    #[error("expected a non-negative float value for label \"{label}\", got \"{value}\"")]
    InvalidNumericValue { label: String, value: String },

    #[error("node \"{0}\" not found in forecast targets")]
    UnknownNode(String),

    #[error("error getting metrics for node \"{node}\": {message}")]
    Transport { node: String, message: String },

    #[error("malformed metrics response for node \"{node}\": {message}")]
    MalformedResponse { node: String, message: String },

    #[error("scoring of node \"{0}\" was cancelled")]
    Cancelled(String),

    #[error("invalid scoring parameters: {0}")]
    InvalidParameters(String),

    #[error("invalid forecast target for node \"{node}\": {message}")]
    InvalidTarget { node: String, message: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

impl ScoringError {
    /// Short stable name, used as a metric label and API error code
    pub fn kind(&self) -> &'static str {
        match self {
            ScoringError::MissingLabel(_) => "missing_label",
            ScoringError::InvalidNumericValue { .. } => "invalid_numeric_value",
            ScoringError::UnknownNode(_) => "unknown_node",
            ScoringError::Transport { .. } => "transport",
            ScoringError::MalformedResponse { .. } => "malformed_response",
            ScoringError::Cancelled(_) => "cancelled",
            ScoringError::InvalidParameters(_) => "invalid_parameters",
            ScoringError::InvalidTarget { .. } => "invalid_target",
            ScoringError::HttpClient(_) => "http_client",
        }
    }

    /// True when the failure came from the node's metrics endpoint
    pub fn is_forecast_failure(&self) -> bool {
        matches!(
            self,
            ScoringError::Transport { .. } | ScoringError::MalformedResponse { .. }
        )
    }
}

pub type ScoringResult<T> = Result<T, ScoringError>;
