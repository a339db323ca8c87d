//! QRY (original-mode query) message view

use super::{expect_message_type, require_segments, FacadeValidation};
use crate::error::Result;
use crate::message::Message;
use crate::segment::Segment;

/// Read-only view over a QRY message
#[derive(Debug, Clone, Copy)]
pub struct QryMessage<'a> {
    message: &'a Message,
}

impl<'a> QryMessage<'a> {
    pub fn new(message: &'a Message) -> Result<Self> {
        expect_message_type(message, "QRY")?;
        Ok(Self { message })
    }

    pub fn message(&self) -> &'a Message {
        self.message
    }

    /// The QRD (query definition) segment
    pub fn qrd(&self) -> Option<&'a Segment> {
        self.message.first_segment("QRD")
    }

    /// Query date/time from QRD-1
    pub fn query_datetime(&self) -> Option<&'a str> {
        self.qrd().map(|q| q.field_value(1)).filter(|v| !v.is_empty())
    }

    /// Query id from QRD-4
    pub fn query_id(&self) -> Option<&'a str> {
        self.qrd().map(|q| q.field_value(4)).filter(|v| !v.is_empty())
    }

    /// Subjects from the repeating QRD-8 (who subject filter)
    pub fn who_subject_filter(&self) -> Vec<&'a str> {
        match self.qrd() {
            Some(qrd) => qrd
                .field(8)
                .repetitions()
                .iter()
                .map(|r| r.value())
                .filter(|v| !v.is_empty())
                .collect(),
            None => Vec::new(),
        }
    }

    /// What-subject code from QRD-9
    pub fn what_subject_filter(&self) -> Option<&'a str> {
        self.qrd()
            .map(|q| q.field(9).component(0).value())
            .filter(|v| !v.is_empty())
    }

    pub fn validate_detailed(&self) -> FacadeValidation {
        let mut failures = Vec::new();
        require_segments(self.message, &["QRD"], &mut failures);
        if self.message.count_segments("QRD") > 0 && self.query_id().is_none() {
            failures.push("QRD-4 (query id) is empty".to_string());
        }
        FacadeValidation::from_failures(failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::MessageBuilder;

    #[test]
    fn test_query_accessors() {
        let message = MessageBuilder::new()
            .message_type("QRY", "A19")
            .datetime("20240101")
            .control_id("Q1")
            .processing_id("P")
            .version_str("2.5")
            .segment("QRD")
            .field(1, "20240101120000")
            .field(2, "R")
            .field(3, "I")
            .field(4, "QUERY01")
            .field_repetitions(8, &["12345", "67890"])
            .field(9, "DEM")
            .finish()
            .build()
            .unwrap();

        let qry = QryMessage::new(&message).unwrap();
        assert_eq!(qry.query_id(), Some("QUERY01"));
        assert_eq!(qry.query_datetime(), Some("20240101120000"));
        assert_eq!(qry.who_subject_filter(), vec!["12345", "67890"]);
        assert_eq!(qry.what_subject_filter(), Some("DEM"));
        assert!(qry.validate_detailed().is_valid);
    }

    #[test]
    fn test_missing_qrd() {
        let message = MessageBuilder::new()
            .message_type("QRY", "A19")
            .datetime("20240101")
            .control_id("Q1")
            .processing_id("P")
            .version_str("2.5")
            .build()
            .unwrap();

        let result = QryMessage::new(&message).unwrap().validate_detailed();
        assert!(!result.is_valid);
    }
}
