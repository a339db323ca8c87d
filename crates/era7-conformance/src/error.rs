//! Error types for conformance profile handling

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConformanceError>;

/// Errors raised while loading or constructing profiles
///
/// Validating a message never produces these: content problems become
/// issues on the outcome, not errors.
#[derive(Error, Debug)]
pub enum ConformanceError {
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Invalid cardinality: {0}")]
    InvalidCardinality(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Profile serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
