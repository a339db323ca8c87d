//! QBP (query by parameter) message view

use super::{expect_message_type, require_segments, FacadeValidation};
use crate::error::Result;
use crate::message::Message;
use crate::segment::Segment;

/// Read-only view over a QBP message
#[derive(Debug, Clone, Copy)]
pub struct QbpMessage<'a> {
    message: &'a Message,
}

impl<'a> QbpMessage<'a> {
    pub fn new(message: &'a Message) -> Result<Self> {
        expect_message_type(message, "QBP")?;
        Ok(Self { message })
    }

    pub fn message(&self) -> &'a Message {
        self.message
    }

    /// The QPD (query parameter definition) segment
    pub fn qpd(&self) -> Option<&'a Segment> {
        self.message.first_segment("QPD")
    }

    /// The RCP (response control parameter) segment
    pub fn rcp(&self) -> Option<&'a Segment> {
        self.message.first_segment("RCP")
    }

    /// Message query name from QPD-1
    pub fn message_query_name(&self) -> Option<&'a str> {
        self.qpd()
            .map(|q| q.field(1).component(0).value())
            .filter(|v| !v.is_empty())
    }

    /// Query tag from QPD-2
    pub fn query_tag(&self) -> Option<&'a str> {
        self.qpd().map(|q| q.field_value(2)).filter(|v| !v.is_empty())
    }

    /// Query priority from RCP-1
    pub fn query_priority(&self) -> Option<&'a str> {
        self.rcp().map(|r| r.field_value(1)).filter(|v| !v.is_empty())
    }

    /// Quantity limit from RCP-2
    pub fn quantity_limited_request(&self) -> Option<&'a str> {
        self.rcp()
            .map(|r| r.field(2).component(0).value())
            .filter(|v| !v.is_empty())
    }

    pub fn validate_detailed(&self) -> FacadeValidation {
        let mut failures = Vec::new();
        require_segments(self.message, &["QPD", "RCP"], &mut failures);
        if self.message.count_segments("QPD") > 0 && self.message_query_name().is_none() {
            failures.push("QPD-1 (message query name) is empty".to_string());
        }
        FacadeValidation::from_failures(failures)
    }
}
