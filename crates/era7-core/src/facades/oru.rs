//! ORU (observation result) message view

use super::{expect_message_type, require_segments, FacadeValidation};
use crate::error::Result;
use crate::message::Message;
use crate::segment::Segment;

/// Read-only view over an ORU message
#[derive(Debug, Clone, Copy)]
pub struct OruMessage<'a> {
    message: &'a Message,
}

impl<'a> OruMessage<'a> {
    pub fn new(message: &'a Message) -> Result<Self> {
        expect_message_type(message, "ORU")?;
        Ok(Self { message })
    }

    pub fn message(&self) -> &'a Message {
        self.message
    }

    pub fn pid(&self) -> Option<&'a Segment> {
        self.message.first_segment("PID")
    }

    /// All observation request (OBR) segments in order
    pub fn observation_requests(&self) -> Vec<&'a Segment> {
        self.message.segments_by_id("OBR").collect()
    }

    /// All observation (OBX) segments in order
    pub fn observations(&self) -> Vec<&'a Segment> {
        self.message.segments_by_id("OBX").collect()
    }

    pub fn observation_count(&self) -> usize {
        self.message.count_segments("OBX")
    }

    /// Observation identifier (OBX-3) and value (OBX-5) pairs
    pub fn results(&self) -> Vec<(&'a str, &'a str)> {
        self.observations()
            .iter()
            .map(|obx| (obx.field(3).component(0).value(), obx.field_value(5)))
            .collect()
    }

    pub fn validate_detailed(&self) -> FacadeValidation {
        let mut failures = Vec::new();
        require_segments(self.message, &["PID", "OBR"], &mut failures);
        if self.observation_count() == 0 {
            failures.push("ORU carries no OBX observation segments".to_string());
        }
        FacadeValidation::from_failures(failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::MessageBuilder;

    fn oru_message() -> Message {
        MessageBuilder::new()
            .datetime("20240101120000")
            .message_type("ORU", "R01")
            .control_id("R1")
            .processing_id("P")
            .version_str("2.5")
            .segment("PID")
            .field(3, "12345")
            .segment("OBR")
            .field(1, "1")
            .field(4, "CBC")
            .segment("OBX")
            .field(1, "1")
            .field(2, "NM")
            .field_components(3, &["WBC", "Leukocytes"])
            .field(5, "7.5")
            .segment("OBX")
            .field(1, "2")
            .field(2, "NM")
            .field_components(3, &["RBC", "Erythrocytes"])
            .field(5, "4.2")
            .finish()
            .build()
            .unwrap()
    }

    #[test]
    fn test_results() {
        let message = oru_message();
        let oru = OruMessage::new(&message).unwrap();

        assert_eq!(oru.observation_count(), 2);
        assert_eq!(oru.results(), vec![("WBC", "7.5"), ("RBC", "4.2")]);
        assert_eq!(oru.observation_requests().len(), 1);
    }

    #[test]
    fn test_validate_detailed() {
        let message = oru_message();
        assert!(OruMessage::new(&message).unwrap().validate_detailed().is_valid);

        let no_obx = MessageBuilder::new()
            .message_type("ORU", "R01")
            .datetime("20240101")
            .control_id("1")
            .processing_id("P")
            .version_str("2.5")
            .segment("PID")
            .field(3, "1")
            .segment("OBR")
            .field(1, "1")
            .finish()
            .build()
            .unwrap();
        let result = OruMessage::new(&no_obx).unwrap().validate_detailed();
        assert!(!result.is_valid);
        assert!(result.failures.iter().any(|f| f.contains("OBX")));
    }
}
