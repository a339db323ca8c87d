//! HL7 message structure

use crate::delimiters::Delimiters;
use crate::error::{Error, Result};
use crate::field::Field;
use crate::segment::Segment;
use crate::version::Version;

/// An HL7 message: an ordered sequence of segments starting with MSH
///
/// The message carries the delimiter tuple it was parsed (or built)
/// with, so serializing reproduces the original encoding characters
/// even when they are non-standard. Once constructed a message is
/// treated as immutable and may be shared across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    segments: Vec<Segment>,
    delimiters: Delimiters,
}

impl Message {
    /// Create an empty message with default delimiters
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
            delimiters: Delimiters::STANDARD,
        }
    }

    /// Create an empty message with custom delimiters
    pub fn with_delimiters(delimiters: Delimiters) -> Self {
        Self {
            segments: Vec::new(),
            delimiters,
        }
    }

    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    pub fn add_segment(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    /// All segments with the given id, in message order
    pub fn segments_by_id<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Segment> {
        self.segments.iter().filter(move |s| s.id() == id)
    }

    /// First segment with the given id
    pub fn first_segment(&self, id: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id() == id)
    }

    /// Number of segments with the given id
    pub fn count_segments(&self, id: &str) -> usize {
        self.segments_by_id(id).count()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// The MSH segment, when the message starts with one
    pub fn msh(&self) -> Option<&Segment> {
        self.segments.first().filter(|s| s.id() == "MSH")
    }

    fn msh_value(&self, field: usize) -> Option<&str> {
        self.msh().map(|msh| msh.field_value(field)).filter(|v| !v.is_empty())
    }

    /// Message type and trigger event from MSH-9 (e.g. ("ADT", "A01"))
    pub fn message_type(&self) -> Option<(&str, &str)> {
        let field = self.msh().map(|msh| msh.field(9))?;
        let rep = field.repetition(0);
        let msg_type = rep.component(0).value();
        if msg_type.is_empty() {
            return None;
        }
        Some((msg_type, rep.component(1).value()))
    }

    /// The raw MSH-9 text, e.g. "ADT^A01"
    pub fn message_type_raw(&self) -> Option<&str> {
        self.msh().map(|msh| msh.field(9).raw()).filter(|v| !v.is_empty())
    }

    /// Sending application from MSH-3
    pub fn sending_application(&self) -> Option<&str> {
        self.msh_value(3)
    }

    /// Sending facility from MSH-4
    pub fn sending_facility(&self) -> Option<&str> {
        self.msh_value(4)
    }

    /// Receiving application from MSH-5
    pub fn receiving_application(&self) -> Option<&str> {
        self.msh_value(5)
    }

    /// Receiving facility from MSH-6
    pub fn receiving_facility(&self) -> Option<&str> {
        self.msh_value(6)
    }

    /// Message date/time from MSH-7
    pub fn message_datetime(&self) -> Option<&str> {
        self.msh_value(7)
    }

    /// Message control id from MSH-10
    pub fn control_id(&self) -> Option<&str> {
        self.msh_value(10)
    }

    /// Processing id from MSH-11
    pub fn processing_id(&self) -> Option<&str> {
        self.msh_value(11)
    }

    /// HL7 version from MSH-12
    pub fn version(&self) -> Option<Version> {
        self.msh_value(12).and_then(Version::parse)
    }

    /// Declared character sets from the repeating MSH-18 field
    pub fn character_sets(&self) -> Vec<&str> {
        match self.msh() {
            Some(msh) => {
                let field = msh.field(18);
                if field.is_empty() {
                    Vec::new()
                } else {
                    field.repetitions().iter().map(|r| r.value()).collect()
                }
            }
            None => Vec::new(),
        }
    }

    pub fn is_acknowledgment(&self) -> bool {
        matches!(self.message_type(), Some(("ACK", _)))
    }

    /// Validate the structural invariants
    ///
    /// Checks: at least one segment, MSH first, every id well-formed,
    /// delimiters distinct, and MSH-1/MSH-2 consistent with the
    /// delimiter tuple.
    pub fn validate(&self) -> Result<()> {
        if self.segments.is_empty() {
            return Err(Error::EmptyMessage);
        }

        let first = &self.segments[0];
        if first.id() != "MSH" {
            return Err(Error::MissingHeader(format!(
                "first segment is {}, expected MSH",
                first.id()
            )));
        }

        for segment in &self.segments {
            segment.validate_id()?;
        }

        self.delimiters.validate()?;

        if first.has_field(1) && first.field(1).raw() != self.delimiters.field_sep().to_string() {
            return Err(Error::validation(
                "MSH-1 does not match the message field separator",
            ));
        }
        if first.has_field(2) && first.field(2).raw() != self.delimiters.encoding_characters() {
            return Err(Error::validation(
                "MSH-2 does not match the message encoding characters",
            ));
        }

        Ok(())
    }

    /// Serialize to ER7 text with CR segment terminators
    pub fn encode(&self) -> String {
        self.encode_with_terminator("\r")
    }

    /// Serialize with a custom segment terminator
    pub fn encode_with_terminator(&self, terminator: &str) -> String {
        self.segments
            .iter()
            .map(|s| s.encode(&self.delimiters))
            .collect::<Vec<_>>()
            .join(terminator)
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper shared by the parser and builders: materialize the two
/// delimiter-derived MSH fields. Both are atomic, since their text is
/// made of the delimiter characters themselves and must never be split.
pub fn msh_prefix_fields(delimiters: &Delimiters) -> (Field, Field) {
    (
        Field::atomic(delimiters.field_sep().to_string(), *delimiters),
        Field::atomic(delimiters.encoding_characters(), *delimiters),
    )
}
