//! ACK (acknowledgment) message view and construction

use super::{expect_message_type, require_segments, FacadeValidation};
use crate::builder::MessageBuilder;
use crate::error::Result;
use crate::message::Message;
use crate::segment::Segment;

/// MSA-1 acknowledgment codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckCode {
    /// AA - application accept
    ApplicationAccept,
    /// AE - application error
    ApplicationError,
    /// AR - application reject
    ApplicationReject,
    /// CA - commit accept (enhanced mode)
    CommitAccept,
    /// CE - commit error (enhanced mode)
    CommitError,
    /// CR - commit reject (enhanced mode)
    CommitReject,
}

impl AckCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AckCode::ApplicationAccept => "AA",
            AckCode::ApplicationError => "AE",
            AckCode::ApplicationReject => "AR",
            AckCode::CommitAccept => "CA",
            AckCode::CommitError => "CE",
            AckCode::CommitReject => "CR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AA" => Some(AckCode::ApplicationAccept),
            "AE" => Some(AckCode::ApplicationError),
            "AR" => Some(AckCode::ApplicationReject),
            "CA" => Some(AckCode::CommitAccept),
            "CE" => Some(AckCode::CommitError),
            "CR" => Some(AckCode::CommitReject),
            _ => None,
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, AckCode::ApplicationAccept | AckCode::CommitAccept)
    }
}

/// Read-only view over an ACK message
#[derive(Debug, Clone, Copy)]
pub struct AckMessage<'a> {
    message: &'a Message,
}

impl<'a> AckMessage<'a> {
    pub fn new(message: &'a Message) -> Result<Self> {
        expect_message_type(message, "ACK")?;
        Ok(Self { message })
    }

    pub fn message(&self) -> &'a Message {
        self.message
    }

    pub fn msa(&self) -> Option<&'a Segment> {
        self.message.first_segment("MSA")
    }

    /// Acknowledgment code from MSA-1
    pub fn ack_code(&self) -> Option<AckCode> {
        self.msa().and_then(|msa| AckCode::parse(msa.field_value(1)))
    }

    /// Control id of the message being acknowledged, from MSA-2
    pub fn acked_control_id(&self) -> Option<&'a str> {
        self.msa()
            .map(|msa| msa.field_value(2))
            .filter(|v| !v.is_empty())
    }

    /// Optional text message from MSA-3
    pub fn text_message(&self) -> Option<&'a str> {
        self.msa()
            .map(|msa| msa.field_value(3))
            .filter(|v| !v.is_empty())
    }

    pub fn is_positive(&self) -> bool {
        self.ack_code().map(|c| c.is_positive()).unwrap_or(false)
    }

    pub fn validate_detailed(&self) -> FacadeValidation {
        let mut failures = Vec::new();
        require_segments(self.message, &["MSA"], &mut failures);
        if self.message.count_segments("MSA") > 0 && self.ack_code().is_none() {
            failures.push("MSA-1 does not carry a valid acknowledgment code".to_string());
        }
        FacadeValidation::from_failures(failures)
    }
}

/// Build an acknowledgment for a received message
///
/// Swaps the sender/receiver pairs, echoes the trigger event, and
/// derives the ACK control id from the original one.
pub fn build_ack(original: &Message, code: AckCode, text: Option<&str>) -> Result<Message> {
    let original_control_id = original.control_id().unwrap_or("");
    let trigger = original.message_type().map(|(_, t)| t).unwrap_or("");

    let mut builder = MessageBuilder::with_delimiters(*original.delimiters())
        .sending_application(original.receiving_application().unwrap_or(""))
        .sending_facility(original.receiving_facility().unwrap_or(""))
        .receiving_application(original.sending_application().unwrap_or(""))
        .receiving_facility(original.sending_facility().unwrap_or(""))
        .datetime_now()
        .message_type("ACK", trigger)
        .control_id(&format!("ACK{}", original_control_id))
        .processing_id(original.processing_id().unwrap_or("P"));

    if let Some(version) = original.version() {
        builder = builder.version(version);
    }

    let mut segment = builder.segment("MSA").field(1, code.as_str()).field(2, original_control_id);
    if let Some(text) = text {
        segment = segment.field(3, text);
    }
    segment.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn original() -> Message {
        MessageBuilder::new()
            .sending_application("HIS")
            .sending_facility("WARD1")
            .receiving_application("LAB")
            .receiving_facility("CENTRAL")
            .datetime("20240101120000")
            .message_type("ADT", "A01")
            .control_id("MSG42")
            .processing_id("P")
            .version_str("2.5")
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_ack_swaps_endpoints() {
        let ack = build_ack(&original(), AckCode::ApplicationAccept, None).unwrap();

        assert_eq!(ack.sending_application(), Some("LAB"));
        assert_eq!(ack.receiving_application(), Some("HIS"));
        assert_eq!(ack.message_type(), Some(("ACK", "A01")));
        assert_eq!(ack.control_id(), Some("ACKMSG42"));

        let view = AckMessage::new(&ack).unwrap();
        assert_eq!(view.ack_code(), Some(AckCode::ApplicationAccept));
        assert_eq!(view.acked_control_id(), Some("MSG42"));
        assert!(view.is_positive());
        assert!(view.validate_detailed().is_valid);
    }

    #[test]
    fn test_build_nack_with_text() {
        let ack = build_ack(
            &original(),
            AckCode::ApplicationError,
            Some("unknown patient"),
        )
        .unwrap();

        let view = AckMessage::new(&ack).unwrap();
        assert_eq!(view.ack_code(), Some(AckCode::ApplicationError));
        assert_eq!(view.text_message(), Some("unknown patient"));
        assert!(!view.is_positive());
    }

    #[test]
    fn test_ack_code_roundtrip() {
        for code in [
            AckCode::ApplicationAccept,
            AckCode::ApplicationError,
            AckCode::ApplicationReject,
            AckCode::CommitAccept,
            AckCode::CommitError,
            AckCode::CommitReject,
        ] {
            assert_eq!(AckCode::parse(code.as_str()), Some(code));
        }
        assert_eq!(AckCode::parse("XX"), None);
    }
}
