//! ADT (admit/discharge/transfer) message view

use super::{expect_message_type, require_segments, FacadeValidation};
use crate::error::Result;
use crate::message::Message;
use crate::segment::Segment;

/// Read-only view over an ADT message
#[derive(Debug, Clone, Copy)]
pub struct AdtMessage<'a> {
    message: &'a Message,
}

impl<'a> AdtMessage<'a> {
    /// Wrap a message, failing unless MSH-9 carries "ADT"
    pub fn new(message: &'a Message) -> Result<Self> {
        expect_message_type(message, "ADT")?;
        Ok(Self { message })
    }

    pub fn message(&self) -> &'a Message {
        self.message
    }

    /// The trigger event from MSH-9 (e.g. "A01")
    pub fn trigger_event(&self) -> Option<&'a str> {
        self.message.message_type().map(|(_, trigger)| trigger)
    }

    /// The EVN (event type) segment
    pub fn evn(&self) -> Option<&'a Segment> {
        self.message.first_segment("EVN")
    }

    /// The PID (patient identification) segment
    pub fn pid(&self) -> Option<&'a Segment> {
        self.message.first_segment("PID")
    }

    /// The PV1 (patient visit) segment
    pub fn pv1(&self) -> Option<&'a Segment> {
        self.message.first_segment("PV1")
    }

    /// Primary patient identifier from PID-3
    pub fn patient_id(&self) -> Option<&'a str> {
        self.pid()
            .map(|pid| pid.field(3).component(0).value())
            .filter(|v| !v.is_empty())
    }

    /// Patient family and given name from PID-5
    pub fn patient_name(&self) -> Option<(&'a str, &'a str)> {
        let pid = self.pid()?;
        let field = pid.field(5);
        let family = field.component(0).value();
        if family.is_empty() {
            return None;
        }
        Some((family, field.component(1).value()))
    }

    /// Patient class from PV1-2 ("I", "O", "E", ...)
    pub fn patient_class(&self) -> Option<&'a str> {
        self.pv1()
            .map(|pv1| pv1.field_value(2))
            .filter(|v| !v.is_empty())
    }

    /// Check the minimum structural requirements of an ADT message
    pub fn validate_detailed(&self) -> FacadeValidation {
        let mut failures = Vec::new();
        require_segments(self.message, &["EVN", "PID"], &mut failures);
        if self.message.message_datetime().is_none() {
            failures.push("MSH-7 (message date/time) is empty".to_string());
        }
        if self.patient_id().is_none() {
            failures.push("PID-3 (patient identifier) is empty".to_string());
        }
        FacadeValidation::from_failures(failures)
    }
}
