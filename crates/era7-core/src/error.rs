//! Error types for HL7 message processing

use thiserror::Error;

/// Result type alias for era7 operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the era7 library
#[derive(Error, Debug)]
pub enum Error {
    #[error("Empty message")]
    EmptyMessage,

    #[error("Missing header: {0}")]
    MissingHeader(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Invalid encoding characters: {0}")]
    InvalidEncodingCharacters(String),

    #[error("Invalid segment id '{id}': {reason}")]
    InvalidSegmentId { id: String, reason: String },

    #[error("Message too large: {size} bytes exceeds configured maximum of {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("Encoding mismatch: {0}")]
    EncodingMismatch(String),

    #[error("Unclosed escape sequence starting at offset {offset}")]
    UnclosedEscape { offset: usize },

    #[error("Unknown escape sequence: {token}")]
    UnknownEscape { token: String },

    #[error("Invalid MLLP frame: {0}")]
    InvalidFrame(String),

    #[error("Streaming parser fed after finish()")]
    AfterFinish,

    #[error("Wrong message type: expected {expected}, found {found}")]
    WrongMessageType { expected: String, found: String },

    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported version: {0}")]
    UnsupportedVersion(String),
}

impl Error {
    /// Create a malformed-message error
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Error::MalformedMessage(msg.into())
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Error::Validation(msg.into())
    }

    pub fn invalid_segment_id<S: Into<String>, R: Into<String>>(id: S, reason: R) -> Self {
        Error::InvalidSegmentId {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by [`crate::builder::MessageBuilder::build`]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
    #[error("message has no MSH segment")]
    NoMsh,

    #[error("message has no segments")]
    EmptyMessage,
}
