//! Core data structures and types for HL7 v2.x message processing
//!
//! This crate provides the foundational pieces used throughout era7:
//! - The message tree (Message, Segment, Field, Repetition, Component,
//!   SubComponent) with raw-preserving, lazily split leaves
//! - Delimiters and the escape codec
//! - Batch/file envelope structures
//! - A fluent message builder
//! - Typed read-only message facades (ADT, ORU, ORM, ACK, QRY, QBP)
//! - Shared diagnostic and error types

pub mod batch;
pub mod builder;
pub mod delimiters;
pub mod diagnostics;
pub mod error;
pub mod escape;
pub mod facades;
pub mod field;
mod intern;
pub mod message;
pub mod segment;
pub mod types;
pub mod version;

pub use batch::{Batch, BatchHeader, BatchTrailer, File, FileHeader, FileTrailer};
pub use builder::{MessageBuilder, SegmentBuilder};
pub use delimiters::Delimiters;
pub use diagnostics::{Diagnostic, Location, Severity};
pub use error::{BuildError, Error, Result};
pub use escape::EscapeCodec;
pub use facades::{
    build_ack, AckCode, AckMessage, AdtMessage, FacadeValidation, OrmMessage, OruMessage,
    QbpMessage, QryMessage,
};
pub use field::{Component, Field, Repetition, SubComponent};
pub use message::Message;
pub use segment::Segment;
pub use version::Version;
