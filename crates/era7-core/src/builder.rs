//! Fluent message construction
//!
//! [`MessageBuilder`] assembles a message header by name and further
//! segments by position, escaping every supplied value on store so the
//! finished tree never contains an unescaped delimiter. `build` is
//! copy-on-finalize: it borrows the builder, so one prefix builder can
//! stamp out several messages that differ only in the segments added
//! afterwards.
//!
//! ```
//! use era7_core::builder::MessageBuilder;
//!
//! let message = MessageBuilder::new()
//!     .sending_application("HIS")
//!     .sending_facility("WARD1")
//!     .receiving_application("LAB")
//!     .receiving_facility("CENTRAL")
//!     .datetime("20240101120000")
//!     .message_type("ADT", "A01")
//!     .control_id("MSG0001")
//!     .processing_id("P")
//!     .version_str("2.5")
//!     .segment("PID")
//!     .field(1, "1")
//!     .field_components(5, &["Smith", "John"])
//!     .finish()
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(message.control_id(), Some("MSG0001"));
//! ```

use crate::delimiters::Delimiters;
use crate::error::{BuildError, Result};
use crate::field::{Component, Field, Repetition, SubComponent};
use crate::message::{msh_prefix_fields, Message};
use crate::segment::Segment;
use crate::types::format_timestamp;
use crate::version::Version;
use chrono::Local;

/// Fluent builder for HL7 messages
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    delimiters: Delimiters,
    msh: Option<Segment>,
    segments: Vec<Segment>,
}

impl MessageBuilder {
    /// Start a builder with the standard delimiters
    pub fn new() -> Self {
        Self::with_delimiters(Delimiters::STANDARD)
    }

    /// Start a builder with custom delimiters
    pub fn with_delimiters(delimiters: Delimiters) -> Self {
        Self {
            delimiters,
            msh: None,
            segments: Vec::new(),
        }
    }

    fn msh_mut(&mut self) -> &mut Segment {
        let delimiters = self.delimiters;
        self.msh.get_or_insert_with(|| {
            let mut msh = Segment::new("MSH");
            let (f1, f2) = msh_prefix_fields(&delimiters);
            msh.add_field(f1);
            msh.add_field(f2);
            msh
        })
    }

    fn set_msh(mut self, index: usize, field: Field) -> Self {
        // MSH-1 and MSH-2 derive from the delimiter tuple; requests to
        // overwrite them are ignored to keep the header consistent.
        if index >= 3 {
            let delims = self.delimiters;
            let msh = self.msh_mut();
            let _ = msh.set_field(index, field, delims);
        } else {
            self.msh_mut();
        }
        self
    }

    /// Set MSH-3, the sending application
    pub fn sending_application(self, value: &str) -> Self {
        let field = Field::from_value(value, self.delimiters);
        self.set_msh(3, field)
    }

    /// Set MSH-4, the sending facility
    pub fn sending_facility(self, value: &str) -> Self {
        let field = Field::from_value(value, self.delimiters);
        self.set_msh(4, field)
    }

    /// Set MSH-5, the receiving application
    pub fn receiving_application(self, value: &str) -> Self {
        let field = Field::from_value(value, self.delimiters);
        self.set_msh(5, field)
    }

    /// Set MSH-6, the receiving facility
    pub fn receiving_facility(self, value: &str) -> Self {
        let field = Field::from_value(value, self.delimiters);
        self.set_msh(6, field)
    }

    /// Set MSH-7, the message date/time, from a preformatted value
    pub fn datetime(self, value: &str) -> Self {
        let field = Field::from_value(value, self.delimiters);
        self.set_msh(7, field)
    }

    /// Set MSH-7 to the current local time
    pub fn datetime_now(self) -> Self {
        let now = format_timestamp(&Local::now().naive_local());
        let field = Field::from_value(&now, self.delimiters);
        self.set_msh(7, field)
    }

    /// Set MSH-9 from message type and trigger event (e.g. "ADT", "A01")
    pub fn message_type(self, message_type: &str, trigger_event: &str) -> Self {
        let delims = self.delimiters;
        let rep = Repetition::from_components(vec![
            Component::from_value(message_type, &delims),
            Component::from_value(trigger_event, &delims),
        ]);
        self.set_msh(9, Field::from_repetitions(vec![rep], delims))
    }

    /// Set the optional third MSH-9 component (message structure)
    pub fn message_structure(mut self, structure: &str) -> Self {
        let delims = self.delimiters;
        let existing = self.msh_mut().field(9);
        let rep = existing.repetition(0);
        let mut components: Vec<Component> = rep.components().to_vec();
        while components.len() < 2 {
            components.push(Component::from_raw("", &delims));
        }
        components.truncate(2);
        components.push(Component::from_value(structure, &delims));
        let field = Field::from_repetitions(vec![Repetition::from_components(components)], delims);
        self.set_msh(9, field)
    }

    /// Set MSH-10, the message control id
    pub fn control_id(self, value: &str) -> Self {
        let field = Field::from_value(value, self.delimiters);
        self.set_msh(10, field)
    }

    /// Set MSH-11, the processing id
    pub fn processing_id(self, value: &str) -> Self {
        let field = Field::from_value(value, self.delimiters);
        self.set_msh(11, field)
    }

    /// Set MSH-12 from a [`Version`]
    pub fn version(self, version: Version) -> Self {
        let field = Field::from_value(version.as_str(), self.delimiters);
        self.set_msh(12, field)
    }

    /// Set MSH-12 from a version string
    pub fn version_str(self, version: &str) -> Self {
        let field = Field::from_value(version, self.delimiters);
        self.set_msh(12, field)
    }

    /// Set an arbitrary MSH field by position (3 or higher)
    pub fn msh_field(self, index: usize, value: &str) -> Self {
        let field = Field::from_value(value, self.delimiters);
        self.set_msh(index, field)
    }

    /// Open a builder for a new segment
    pub fn segment(self, id: &str) -> SegmentBuilder {
        SegmentBuilder {
            segment: Segment::new(id),
            parent: self,
        }
    }

    /// Append a pre-built segment
    pub fn add_segment(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    /// Finalize into a validated message, leaving the builder reusable
    pub fn build(&self) -> Result<Message> {
        let msh = match &self.msh {
            Some(msh) => msh.clone(),
            None if self.segments.is_empty() => return Err(BuildError::EmptyMessage.into()),
            None => return Err(BuildError::NoMsh.into()),
        };

        let mut message = Message::with_delimiters(self.delimiters);
        message.add_segment(msh);
        for segment in &self.segments {
            message.add_segment(segment.clone());
        }
        message.validate()?;
        Ok(message)
    }
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for one segment, spawned from [`MessageBuilder::segment`]
#[derive(Debug)]
pub struct SegmentBuilder {
    parent: MessageBuilder,
    segment: Segment,
}

impl SegmentBuilder {
    fn delimiters(&self) -> Delimiters {
        self.parent.delimiters
    }

    fn set(mut self, index: usize, field: Field) -> Self {
        let delims = self.delimiters();
        let _ = self.segment.set_field(index, field, delims);
        self
    }

    /// Set a field to a single decoded value
    pub fn field(self, index: usize, value: &str) -> Self {
        let field = Field::from_value(value, self.delimiters());
        self.set(index, field)
    }

    /// Set a field to already-escaped raw wire text
    pub fn field_raw(self, index: usize, raw: &str) -> Self {
        let field = Field::from_raw(raw, self.delimiters());
        self.set(index, field)
    }

    /// Set a field from decoded component values
    pub fn field_components(self, index: usize, components: &[&str]) -> Self {
        let delims = self.delimiters();
        let rep = Repetition::from_components(
            components.iter().map(|c| Component::from_value(c, &delims)).collect(),
        );
        self.set(index, Field::from_repetitions(vec![rep], delims))
    }

    /// Set a field from decoded repetition values
    pub fn field_repetitions(self, index: usize, repetitions: &[&str]) -> Self {
        let delims = self.delimiters();
        let reps = repetitions
            .iter()
            .map(|r| Repetition::from_value(r, &delims))
            .collect();
        self.set(index, Field::from_repetitions(reps, delims))
    }

    /// Set a field from components that each carry subcomponent values
    pub fn field_subcomponents(self, index: usize, components: &[&[&str]]) -> Self {
        let delims = self.delimiters();
        let comps = components
            .iter()
            .map(|subs| {
                Component::from_subcomponents(
                    subs.iter().map(|s| SubComponent::from_value(s, &delims)).collect(),
                )
            })
            .collect();
        let rep = Repetition::from_components(comps);
        self.set(index, Field::from_repetitions(vec![rep], delims))
    }

    /// Close this segment and return to the message builder
    pub fn finish(mut self) -> MessageBuilder {
        self.parent.segments.push(self.segment);
        self.parent
    }

    /// Close this segment and open the next one
    pub fn segment(self, id: &str) -> SegmentBuilder {
        self.finish().segment(id)
    }

    /// Close this segment and finalize the message
    pub fn build(self) -> Result<Message> {
        self.finish().build()
    }
}
