//! Typed read-only views over common message families
//!
//! A facade borrows a parsed [`Message`] and exposes the segments and
//! fields its family cares about. Construction checks the MSH-9
//! message type code and fails with [`Error::WrongMessageType`] when it
//! does not match; the underlying tree is never mutated.

mod ack;
mod adt;
mod orm;
mod oru;
mod qbp;
mod qry;

pub use ack::{build_ack, AckCode, AckMessage};
pub use adt::AdtMessage;
pub use orm::OrmMessage;
pub use oru::OruMessage;
pub use qbp::QbpMessage;
pub use qry::QryMessage;

use crate::error::{Error, Result};
use crate::message::Message;

/// Outcome of a facade's structural self-check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacadeValidation {
    pub is_valid: bool,
    pub failures: Vec<String>,
}

impl FacadeValidation {
    fn from_failures(failures: Vec<String>) -> Self {
        Self {
            is_valid: failures.is_empty(),
            failures,
        }
    }
}

/// Check MSH-9 against the family's expected code
pub(crate) fn expect_message_type(message: &Message, expected: &str) -> Result<()> {
    match message.message_type() {
        Some((code, _)) if code == expected => Ok(()),
        Some((code, _)) => Err(Error::WrongMessageType {
            expected: expected.to_string(),
            found: code.to_string(),
        }),
        None => Err(Error::WrongMessageType {
            expected: expected.to_string(),
            found: "(no MSH-9)".to_string(),
        }),
    }
}

/// Collect the failures for a list of required segments
pub(crate) fn require_segments(message: &Message, ids: &[&str], failures: &mut Vec<String>) {
    for id in ids {
        if message.count_segments(id) == 0 {
            failures.push(format!("required segment {} is missing", id));
        }
    }
}
