//! ORM (order) message view

use super::{expect_message_type, require_segments, FacadeValidation};
use crate::error::Result;
use crate::message::Message;
use crate::segment::Segment;

/// Read-only view over an ORM message
#[derive(Debug, Clone, Copy)]
pub struct OrmMessage<'a> {
    message: &'a Message,
}

impl<'a> OrmMessage<'a> {
    pub fn new(message: &'a Message) -> Result<Self> {
        expect_message_type(message, "ORM")?;
        Ok(Self { message })
    }

    pub fn message(&self) -> &'a Message {
        self.message
    }

    pub fn pid(&self) -> Option<&'a Segment> {
        self.message.first_segment("PID")
    }

    /// All common order (ORC) segments in order
    pub fn orders(&self) -> Vec<&'a Segment> {
        self.message.segments_by_id("ORC").collect()
    }

    /// Order control code from the first ORC-1
    pub fn order_control(&self) -> Option<&'a str> {
        self.message
            .first_segment("ORC")
            .map(|orc| orc.field_value(1))
            .filter(|v| !v.is_empty())
    }

    /// Placer order number from the first ORC-2
    pub fn placer_order_number(&self) -> Option<&'a str> {
        self.message
            .first_segment("ORC")
            .map(|orc| orc.field(2).component(0).value())
            .filter(|v| !v.is_empty())
    }

    pub fn validate_detailed(&self) -> FacadeValidation {
        let mut failures = Vec::new();
        require_segments(self.message, &["PID", "ORC"], &mut failures);
        if self.order_control().is_none() && self.message.count_segments("ORC") > 0 {
            failures.push("ORC-1 (order control) is empty".to_string());
        }
        FacadeValidation::from_failures(failures)
    }
}
