//! # era7 - HL7 v2.x message processing for Rust
//!
//! era7 parses, validates, builds, and frames HL7 v2.x healthcare
//! messages:
//!
//! - **ER7 codec**: a recoverable parser and faithful serializer for
//!   the pipe-delimited wire format, including escape sequences,
//!   repetitions, non-standard delimiters, and character sets
//! - **Tree model**: message → segments → fields → repetitions →
//!   components → subcomponents, round-trippable byte for byte
//! - **Streaming**: an incremental parser fed by arbitrary byte chunks
//! - **Conformance**: profile- and rule-driven validation with
//!   structured diagnostics
//! - **MLLP**: byte-accurate framing, a stream deframer, and a
//!   tokio-util codec
//! - **Inspection**: summaries, tree rendering, search, and diff
//!
//! ## Quick start
//!
//! ```rust
//! use era7::parse_message;
//!
//! let hl7 = "MSH|^~\\&|HIS|WARD|LAB|CENTRAL|20240315||ADT^A01|12345|P|2.5\rPID|1||67890^^^MRN||DOE^JOHN^A||19800101|M";
//!
//! let message = parse_message(hl7).unwrap();
//! assert_eq!(message.message_type(), Some(("ADT", "A01")));
//!
//! let pid = message.first_segment("PID").unwrap();
//! assert_eq!(pid.field(5).component(0).value(), "DOE");
//!
//! // Serialization reproduces the wire text
//! assert_eq!(message.encode(), hl7);
//! ```

pub use era7_conformance as conformance;
pub use era7_core as core;
pub use era7_inspect as inspect;
pub use era7_mllp as mllp;
pub use era7_parser as parser;

// Re-export commonly used types
pub use era7_core::{
    builder::MessageBuilder,
    delimiters::Delimiters,
    diagnostics::{Diagnostic, Location, Severity},
    error::{Error, Result},
    escape::EscapeCodec,
    facades::{AckMessage, AdtMessage, OrmMessage, OruMessage, QbpMessage, QryMessage},
    field::{Component, Field, Repetition, SubComponent},
    message::Message,
    segment::Segment,
    version::Version,
};
pub use era7_parser::{parse_message, parse_message_with_options, ParserOptions};
