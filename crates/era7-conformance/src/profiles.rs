//! Built-in minimal conformance profiles
//!
//! Small, deliberately conservative profiles for the most common
//! message types. They check the segments and header fields everyone
//! agrees on; site-specific constraints belong in user profiles loaded
//! with [`ConformanceProfile::from_json`].

use crate::datatype::DataTypeKind;
use crate::profile::{
    Cardinality, ConformanceProfile, FieldDefinition, Optionality, SegmentDefinition,
    SegmentRequirement,
};

fn msh_requirement() -> SegmentRequirement {
    SegmentRequirement::new("MSH", Cardinality::one()).with_definition(
        SegmentDefinition::new("MSH", "Message Header")
            .with_field(
                FieldDefinition::new(7, "Date/Time of Message", Optionality::Required)
                    .with_datatype(DataTypeKind::TS),
            )
            .with_field(
                FieldDefinition::new(9, "Message Type", Optionality::Required)
                    .with_datatype(DataTypeKind::MSG),
            )
            .with_field(
                FieldDefinition::new(10, "Message Control ID", Optionality::Required)
                    .with_max_length(199),
            )
            .with_field(
                FieldDefinition::new(11, "Processing ID", Optionality::Required)
                    .with_datatype(DataTypeKind::PT),
            )
            .with_field(
                FieldDefinition::new(12, "Version ID", Optionality::Required)
                    .with_max_length(60),
            ),
    )
}

/// ADT^A01 (admit/visit notification)
pub fn adt_a01() -> ConformanceProfile {
    ConformanceProfile::new("era7-adt-a01", "2.5", "ADT", "A01")
        .with_description("Minimal ADT^A01 admit message profile")
        .with_requirement(msh_requirement())
        .with_requirement(
            SegmentRequirement::new("EVN", Cardinality::one()).with_definition(
                SegmentDefinition::new("EVN", "Event Type").with_field(
                    FieldDefinition::new(2, "Recorded Date/Time", Optionality::Required)
                        .with_datatype(DataTypeKind::TS),
                ),
            ),
        )
        .with_requirement(
            SegmentRequirement::new("PID", Cardinality::one()).with_definition(
                SegmentDefinition::new("PID", "Patient Identification")
                    .with_field(
                        FieldDefinition::new(3, "Patient Identifier List", Optionality::Required)
                            .with_datatype(DataTypeKind::CX)
                            .with_repetitions(Cardinality::one_or_more()),
                    )
                    .with_field(
                        FieldDefinition::new(5, "Patient Name", Optionality::Required)
                            .with_datatype(DataTypeKind::XPN),
                    )
                    .with_field(
                        FieldDefinition::new(7, "Date/Time of Birth", Optionality::Optional)
                            .with_datatype(DataTypeKind::TS),
                    )
                    .with_field(
                        FieldDefinition::new(8, "Administrative Sex", Optionality::Optional)
                            .with_datatype(DataTypeKind::IS),
                    ),
            ),
        )
        .with_requirement(SegmentRequirement::new("PV1", Cardinality::one()))
        .with_requirement(SegmentRequirement::new("NK1", Cardinality::zero_or_more()))
        .with_requirement(SegmentRequirement::new("AL1", Cardinality::zero_or_more()))
        .with_requirement(SegmentRequirement::new("DG1", Cardinality::zero_or_more()))
        .with_requirement(SegmentRequirement::new("OBX", Cardinality::zero_or_more()))
}

/// ORU^R01 (unsolicited observation result)
pub fn oru_r01() -> ConformanceProfile {
    ConformanceProfile::new("era7-oru-r01", "2.5", "ORU", "R01")
        .with_description("Minimal ORU^R01 observation result profile")
        .with_requirement(msh_requirement())
        .with_requirement(
            SegmentRequirement::new("PID", Cardinality::one()).with_definition(
                SegmentDefinition::new("PID", "Patient Identification").with_field(
                    FieldDefinition::new(3, "Patient Identifier List", Optionality::Required)
                        .with_datatype(DataTypeKind::CX)
                        .with_repetitions(Cardinality::one_or_more()),
                ),
            ),
        )
        .with_requirement(
            SegmentRequirement::new("OBR", Cardinality::one_or_more()).with_definition(
                SegmentDefinition::new("OBR", "Observation Request").with_field(
                    FieldDefinition::new(4, "Universal Service Identifier", Optionality::Required)
                        .with_datatype(DataTypeKind::CE),
                ),
            ),
        )
        .with_requirement(
            SegmentRequirement::new("OBX", Cardinality::one_or_more()).with_definition(
                SegmentDefinition::new("OBX", "Observation/Result")
                    .with_field(
                        FieldDefinition::new(2, "Value Type", Optionality::Required)
                            .with_datatype(DataTypeKind::ID),
                    )
                    .with_field(
                        FieldDefinition::new(3, "Observation Identifier", Optionality::Required)
                            .with_datatype(DataTypeKind::CE),
                    ),
            ),
        )
        .with_requirement(SegmentRequirement::new("NTE", Cardinality::zero_or_more()))
}

/// ACK (general acknowledgment, any trigger)
pub fn ack(trigger_event: &str) -> ConformanceProfile {
    ConformanceProfile::new("era7-ack", "2.5", "ACK", trigger_event)
        .with_description("General acknowledgment profile")
        .with_requirement(msh_requirement())
        .with_requirement(
            SegmentRequirement::new("MSA", Cardinality::one()).with_definition(
                SegmentDefinition::new("MSA", "Message Acknowledgment")
                    .with_field(
                        FieldDefinition::new(1, "Acknowledgment Code", Optionality::Required)
                            .with_datatype(DataTypeKind::ID)
                            .with_max_length(2),
                    )
                    .with_field(
                        FieldDefinition::new(2, "Message Control ID", Optionality::Required)
                            .with_max_length(199),
                    ),
            ),
        )
        .with_requirement(SegmentRequirement::new("ERR", Cardinality::zero_or_more()))
}
