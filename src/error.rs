//! Error types for the MindImprint engine

use thiserror::Error;

/// Errors that can occur around the scoring core.
///
/// The scoring computation itself is total and never fails; errors only arise
/// at the parse and encode boundaries or in external collaborators.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Failed to parse session telemetry: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
