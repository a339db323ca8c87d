//! Conformance validation for HL7 v2.x messages
//!
//! Two entry styles:
//! - **Profiles**: a declarative [`ConformanceProfile`] (expected
//!   message type, segment cardinalities, field constraints) checked by
//!   [`ConformanceEngine::validate_profile`].
//! - **Rules**: an ad-hoc list of [`Rule`]s checked by
//!   [`ConformanceEngine::validate_rules`].
//!
//! Both produce a [`ValidationOutcome`]: `is_valid` plus issues in
//! source order. The engine never errors on message content.
//!
//! ```
//! use era7_conformance::{ConformanceEngine, profiles};
//! use era7_core::builder::MessageBuilder;
//!
//! let message = MessageBuilder::new()
//!     .datetime("20240101120000")
//!     .message_type("ADT", "A01")
//!     .control_id("M1")
//!     .processing_id("P")
//!     .version_str("2.5")
//!     .segment("PID").field(3, "12345")
//!     .finish()
//!     .build()
//!     .unwrap();
//!
//! let outcome = ConformanceEngine::new().validate_profile(&message, &profiles::adt_a01());
//! assert!(!outcome.is_valid); // EVN and PV1 are missing
//! ```

pub mod datatype;
pub mod engine;
pub mod error;
pub mod profile;
pub mod profiles;
pub mod rules;

pub use datatype::{validate_value, DataTypeKind, DataTypeValidation};
pub use engine::{ConformanceEngine, ValidationOptions, ValidationOutcome};
pub use error::{ConformanceError, Result};
pub use profile::{
    Cardinality, ConformanceProfile, FieldDefinition, Optionality, SegmentDefinition,
    SegmentRequirement,
};
pub use rules::{codes, Rule};
