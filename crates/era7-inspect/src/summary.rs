//! Message summaries

use era7_core::message::Message;
use std::collections::BTreeMap;
use std::fmt;

/// A compact snapshot of a message: header fields plus segment counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSummary {
    pub message_type: Option<String>,
    pub trigger_event: Option<String>,
    pub control_id: Option<String>,
    pub version: Option<String>,
    pub sending_application: Option<String>,
    pub sending_facility: Option<String>,
    pub receiving_application: Option<String>,
    pub receiving_facility: Option<String>,
    pub segment_count: usize,
    /// Occurrences per segment id, sorted by id
    pub segments: BTreeMap<String, usize>,
}

impl MessageSummary {
    pub fn of(message: &Message) -> Self {
        let mut segments: BTreeMap<String, usize> = BTreeMap::new();
        for segment in message.segments() {
            *segments.entry(segment.id().to_string()).or_insert(0) += 1;
        }

        let (message_type, trigger_event) = match message.message_type() {
            Some((code, trigger)) => (Some(code.to_string()), Some(trigger.to_string())),
            None => (None, None),
        };

        Self {
            message_type,
            trigger_event,
            control_id: message.control_id().map(str::to_string),
            version: message.version().map(|v| v.as_str().to_string()),
            sending_application: message.sending_application().map(str::to_string),
            sending_facility: message.sending_facility().map(str::to_string),
            receiving_application: message.receiving_application().map(str::to_string),
            receiving_facility: message.receiving_facility().map(str::to_string),
            segment_count: message.segment_count(),
            segments,
        }
    }
}

impl fmt::Display for MessageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}^{} control_id={} version={} segments={}",
            self.message_type.as_deref().unwrap_or("?"),
            self.trigger_event.as_deref().unwrap_or("?"),
            self.control_id.as_deref().unwrap_or("?"),
            self.version.as_deref().unwrap_or("?"),
            self.segment_count
        )?;
        for (id, count) in &self.segments {
            write!(f, " {}x{}", id, count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use era7_parser::parse_message;

    #[test]
    fn test_summary() {
        let message = parse_message(
            "MSH|^~\\&|LAB|FAC|HIS|WARD|20240101||ORU^R01|R1|P|2.5\rPID|1||777\rOBX|1|NM|A||1\rOBX|2|NM|B||2",
        )
        .unwrap();
        let summary = MessageSummary::of(&message);

        assert_eq!(summary.message_type.as_deref(), Some("ORU"));
        assert_eq!(summary.trigger_event.as_deref(), Some("R01"));
        assert_eq!(summary.control_id.as_deref(), Some("R1"));
        assert_eq!(summary.version.as_deref(), Some("2.5"));
        assert_eq!(summary.sending_application.as_deref(), Some("LAB"));
        assert_eq!(summary.segment_count, 4);
        assert_eq!(summary.segments["OBX"], 2);
        assert_eq!(summary.segments["MSH"], 1);

        let line = summary.to_string();
        assert!(line.contains("ORU^R01"));
        assert!(line.contains("OBXx2"));
    }
}
