//! Batch and file envelope structures
//!
//! A batch is a run of messages between a BHS (Batch Header) and a BTS
//! (Batch Trailer); a file wraps batches or loose messages between FHS
//! and FTS. The envelope segments carry metadata only; the enclosed
//! messages are ordinary [`Message`] values.
//!
//! ```text
//! FHS|^~\&|SENDER|FACILITY|RECEIVER|DEST|20251120120000|||F001
//! BHS|^~\&|SENDER|FACILITY|RECEIVER|DEST|20251120120000|||B001
//! MSH|^~\&|...  (messages)
//! BTS|2
//! FTS|1
//! ```

use crate::delimiters::Delimiters;
use crate::field::Field;
use crate::message::Message;
use crate::segment::Segment;
use crate::types::format_timestamp;
use chrono::NaiveDateTime;

/// Metadata common to BHS and FHS
///
/// Field positions 3-11 are identical for the two header segments; only
/// the segment id differs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvelopeHeader {
    /// Position 3: sending application
    pub sending_application: Option<String>,
    /// Position 4: sending facility
    pub sending_facility: Option<String>,
    /// Position 5: receiving application
    pub receiving_application: Option<String>,
    /// Position 6: receiving facility
    pub receiving_facility: Option<String>,
    /// Position 7: creation date/time
    pub creation_datetime: Option<NaiveDateTime>,
    /// Position 8: security
    pub security: Option<String>,
    /// Position 9: name/id/type
    pub name_id: Option<String>,
    /// Position 10: comment
    pub comment: Option<String>,
    /// Position 11: control id
    pub control_id: Option<String>,
}

impl EnvelopeHeader {
    fn to_segment(&self, id: &str, delimiters: &Delimiters) -> Segment {
        let d = *delimiters;
        let mut seg = Segment::new(id);
        seg.add_field(Field::atomic(d.field_sep().to_string(), d));
        seg.add_field(Field::atomic(d.encoding_characters(), d));

        let opt = |v: &Option<String>| Field::from_raw(v.as_deref().unwrap_or(""), d);
        seg.add_field(opt(&self.sending_application));
        seg.add_field(opt(&self.sending_facility));
        seg.add_field(opt(&self.receiving_application));
        seg.add_field(opt(&self.receiving_facility));
        let datetime = self
            .creation_datetime
            .map(|dt| format_timestamp(&dt))
            .unwrap_or_default();
        seg.add_field(Field::from_raw(datetime, d));
        seg.add_field(opt(&self.security));
        seg.add_field(opt(&self.name_id));
        seg.add_field(opt(&self.comment));
        seg.add_field(opt(&self.control_id));
        seg
    }

    fn from_segment(segment: &Segment) -> Self {
        let value = |idx: usize| {
            let v = segment.field_value(idx);
            if v.is_empty() {
                None
            } else {
                Some(v.to_string())
            }
        };
        Self {
            sending_application: value(3),
            sending_facility: value(4),
            receiving_application: value(5),
            receiving_facility: value(6),
            creation_datetime: value(7).and_then(|v| crate::types::parse_timestamp(&v)),
            security: value(8),
            name_id: value(9),
            comment: value(10),
            control_id: value(11),
        }
    }
}

/// Batch Header Segment (BHS)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchHeader(pub EnvelopeHeader);

impl BatchHeader {
    pub fn to_segment(&self, delimiters: &Delimiters) -> Segment {
        self.0.to_segment("BHS", delimiters)
    }

    pub fn from_segment(segment: &Segment) -> Self {
        Self(EnvelopeHeader::from_segment(segment))
    }
}

/// Batch Trailer Segment (BTS): declared message count plus comment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchTrailer {
    pub message_count: Option<usize>,
    pub comment: Option<String>,
}

impl BatchTrailer {
    pub fn to_segment(&self, delimiters: &Delimiters) -> Segment {
        let d = *delimiters;
        let mut seg = Segment::new("BTS");
        let count = self.message_count.map(|c| c.to_string()).unwrap_or_default();
        seg.add_field(Field::from_raw(count, d));
        if let Some(comment) = &self.comment {
            seg.add_field(Field::from_value(comment, d));
        }
        seg
    }

    pub fn from_segment(segment: &Segment) -> Self {
        let comment = segment.field_value(2);
        Self {
            message_count: segment.field_value(1).parse().ok(),
            comment: if comment.is_empty() {
                None
            } else {
                Some(comment.to_string())
            },
        }
    }
}

/// File Header Segment (FHS)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileHeader(pub EnvelopeHeader);

impl FileHeader {
    pub fn to_segment(&self, delimiters: &Delimiters) -> Segment {
        self.0.to_segment("FHS", delimiters)
    }

    pub fn from_segment(segment: &Segment) -> Self {
        Self(EnvelopeHeader::from_segment(segment))
    }
}

/// File Trailer Segment (FTS): declared batch count plus comment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTrailer {
    pub batch_count: Option<usize>,
    pub comment: Option<String>,
}

impl FileTrailer {
    pub fn to_segment(&self, delimiters: &Delimiters) -> Segment {
        let d = *delimiters;
        let mut seg = Segment::new("FTS");
        let count = self.batch_count.map(|c| c.to_string()).unwrap_or_default();
        seg.add_field(Field::from_raw(count, d));
        if let Some(comment) = &self.comment {
            seg.add_field(Field::from_value(comment, d));
        }
        seg
    }

    pub fn from_segment(segment: &Segment) -> Self {
        let comment = segment.field_value(2);
        Self {
            batch_count: segment.field_value(1).parse().ok(),
            comment: if comment.is_empty() {
                None
            } else {
                Some(comment.to_string())
            },
        }
    }
}

/// A batch: BHS, messages, BTS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub header: BatchHeader,
    pub messages: Vec<Message>,
    pub trailer: BatchTrailer,
}

impl Batch {
    /// Whether the BTS count agrees with the actual message count
    pub fn count_consistent(&self) -> bool {
        match self.trailer.message_count {
            Some(declared) => declared == self.messages.len(),
            None => true,
        }
    }

    /// Serialize the whole batch to ER7 with CR terminators
    pub fn encode(&self, delimiters: &Delimiters) -> String {
        let mut lines = vec![self.header.to_segment(delimiters).encode(delimiters)];
        for message in &self.messages {
            lines.push(message.encode());
        }
        lines.push(self.trailer.to_segment(delimiters).encode(delimiters));
        lines.join("\r")
    }
}

/// A file: FHS, batches and/or loose messages, FTS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub header: FileHeader,
    pub batches: Vec<Batch>,
    /// Messages that appear directly under FHS without a BHS wrapper
    pub messages: Vec<Message>,
    pub trailer: FileTrailer,
}

impl File {
    pub fn count_consistent(&self) -> bool {
        match self.trailer.batch_count {
            Some(declared) => declared == self.batches.len(),
            None => true,
        }
    }

    pub fn encode(&self, delimiters: &Delimiters) -> String {
        let mut lines = vec![self.header.to_segment(delimiters).encode(delimiters)];
        for batch in &self.batches {
            lines.push(batch.encode(delimiters));
        }
        for message in &self.messages {
            lines.push(message.encode());
        }
        lines.push(self.trailer.to_segment(delimiters).encode(delimiters));
        lines.join("\r")
    }
}
