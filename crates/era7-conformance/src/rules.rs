//! Rule-driven validation
//!
//! A [`Rule`] is a pure check over a whole message producing zero or
//! more diagnostics. Rules compose into lists consumed by the engine;
//! adding a rule can only add issues, never remove them.

use crate::datatype::{validate_value, DataTypeKind, DataTypeValidation};
use crate::error::Result;
use crate::profile::Cardinality;
use era7_core::diagnostics::{Diagnostic, Location};
use era7_core::message::Message;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Diagnostic codes emitted by rules and the engine
pub mod codes {
    pub const MSG_TYPE_MISMATCH: &str = "MSG_TYPE_MISMATCH";
    pub const REQUIRED_SEGMENT: &str = "REQUIRED_SEGMENT";
    pub const SEGMENT_CARDINALITY: &str = "SEGMENT_CARDINALITY";
    pub const REQUIRED_FIELD_MISSING: &str = "REQUIRED_FIELD_MISSING";
    pub const NOT_USED_FIELD_PRESENT: &str = "NOT_USED_FIELD_PRESENT";
    pub const BACKWARD_FIELD_PRESENT: &str = "BACKWARD_FIELD_PRESENT";
    pub const FIELD_LENGTH_EXCEEDED: &str = "FIELD_LENGTH_EXCEEDED";
    pub const FIELD_REPETITIONS: &str = "FIELD_REPETITIONS";
    pub const DATA_TYPE_MISMATCH: &str = "DATA_TYPE_MISMATCH";
    pub const DATA_TYPE_SUSPICIOUS: &str = "DATA_TYPE_SUSPICIOUS";
    pub const VALUE_NOT_ALLOWED: &str = "VALUE_NOT_ALLOWED";
    pub const PATTERN_MISMATCH: &str = "PATTERN_MISMATCH";
}

type CustomCheck = Arc<dyn Fn(&Message) -> Vec<Diagnostic> + Send + Sync>;

/// A single validation rule
#[derive(Clone)]
pub enum Rule {
    /// At least `min_count` occurrences of the segment
    RequiredSegment { segment_id: String, min_count: usize },
    /// Field must be non-empty in every occurrence of the segment
    RequiredField {
        segment_id: String,
        field: usize,
        name: String,
    },
    /// Raw field length must not exceed `max` codepoints
    FieldLength {
        segment_id: String,
        field: usize,
        max: usize,
    },
    /// Raw value must conform to the data type syntax
    DataType {
        segment_id: String,
        field: usize,
        datatype: DataTypeKind,
    },
    /// Raw value must be one of the allowed values
    ValueSet {
        segment_id: String,
        field: usize,
        allowed: Vec<String>,
    },
    /// Raw value must match the regular expression
    Pattern {
        segment_id: String,
        field: usize,
        pattern: Regex,
    },
    /// Segment occurrence count must satisfy the cardinality
    SegmentCardinality {
        segment_id: String,
        cardinality: Cardinality,
    },
    /// User-supplied check
    Custom { name: String, check: CustomCheck },
}

impl Rule {
    pub fn required_segment(segment_id: &str, min_count: usize) -> Self {
        Rule::RequiredSegment {
            segment_id: segment_id.to_string(),
            min_count,
        }
    }

    pub fn required_field(segment_id: &str, field: usize, name: &str) -> Self {
        Rule::RequiredField {
            segment_id: segment_id.to_string(),
            field,
            name: name.to_string(),
        }
    }

    pub fn field_length(segment_id: &str, field: usize, max: usize) -> Self {
        Rule::FieldLength {
            segment_id: segment_id.to_string(),
            field,
            max,
        }
    }

    pub fn data_type(segment_id: &str, field: usize, datatype: DataTypeKind) -> Self {
        Rule::DataType {
            segment_id: segment_id.to_string(),
            field,
            datatype,
        }
    }

    pub fn value_set<S: Into<String>>(
        segment_id: &str,
        field: usize,
        allowed: impl IntoIterator<Item = S>,
    ) -> Self {
        Rule::ValueSet {
            segment_id: segment_id.to_string(),
            field,
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Compile `pattern` and build a pattern rule
    pub fn pattern(segment_id: &str, field: usize, pattern: &str) -> Result<Self> {
        Ok(Rule::Pattern {
            segment_id: segment_id.to_string(),
            field,
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn segment_cardinality(segment_id: &str, cardinality: Cardinality) -> Self {
        Rule::SegmentCardinality {
            segment_id: segment_id.to_string(),
            cardinality,
        }
    }

    pub fn custom<F>(name: &str, check: F) -> Self
    where
        F: Fn(&Message) -> Vec<Diagnostic> + Send + Sync + 'static,
    {
        Rule::Custom {
            name: name.to_string(),
            check: Arc::new(check),
        }
    }

    /// Run the rule, producing issues in message order
    pub fn apply(&self, message: &Message) -> Vec<Diagnostic> {
        match self {
            Rule::RequiredSegment {
                segment_id,
                min_count,
            } => {
                let count = message.count_segments(segment_id);
                if count < *min_count {
                    vec![Diagnostic::error(
                        codes::REQUIRED_SEGMENT,
                        format!(
                            "expected at least {} occurrence(s) of {}, found {}",
                            min_count, segment_id, count
                        ),
                    )
                    .at(Location::segment(segment_id.clone()))]
                } else {
                    Vec::new()
                }
            }

            Rule::RequiredField {
                segment_id,
                field,
                name,
            } => for_each_occurrence(message, segment_id, *field, |segment, location| {
                if segment.field(*field).is_empty() {
                    Some(
                        Diagnostic::error(
                            codes::REQUIRED_FIELD_MISSING,
                            format!("required field {} ({}) is empty", location, name),
                        )
                        .at(location),
                    )
                } else {
                    None
                }
            }),

            Rule::FieldLength {
                segment_id,
                field,
                max,
            } => for_each_occurrence(message, segment_id, *field, |segment, location| {
                // Length counts Unicode scalar values, matching the
                // conformance engine's convention.
                let length = segment.field(*field).raw().chars().count();
                if length > *max {
                    Some(
                        Diagnostic::error(
                            codes::FIELD_LENGTH_EXCEEDED,
                            format!("field is {} characters long, maximum is {}", length, max),
                        )
                        .at(location),
                    )
                } else {
                    None
                }
            }),

            Rule::DataType {
                segment_id,
                field,
                datatype,
            } => {
                let mut issues = Vec::new();
                for (occurrence, segment) in message.segments_by_id(segment_id).enumerate() {
                    for repetition in segment.field(*field).repetitions() {
                        let location = Location::field(segment_id.clone(), *field)
                            .with_occurrence(occurrence + 1);
                        match validate_value(repetition.value(), *datatype) {
                            DataTypeValidation::Valid => {}
                            DataTypeValidation::Warning(reason) => issues.push(
                                Diagnostic::warning(
                                    codes::DATA_TYPE_SUSPICIOUS,
                                    format!("{} value: {}", datatype.as_str(), reason),
                                )
                                .at(location),
                            ),
                            DataTypeValidation::Invalid(reason) => issues.push(
                                Diagnostic::error(
                                    codes::DATA_TYPE_MISMATCH,
                                    format!(
                                        "value {:?} is not a valid {}: {}",
                                        repetition.value(),
                                        datatype.as_str(),
                                        reason
                                    ),
                                )
                                .at(location),
                            ),
                        }
                    }
                }
                issues
            }

            Rule::ValueSet {
                segment_id,
                field,
                allowed,
            } => for_each_occurrence(message, segment_id, *field, |segment, location| {
                let value = segment.field(*field).value();
                if !value.is_empty() && !allowed.iter().any(|a| a == value) {
                    Some(
                        Diagnostic::error(
                            codes::VALUE_NOT_ALLOWED,
                            format!("value {:?} is not in the allowed set", value),
                        )
                        .at(location),
                    )
                } else {
                    None
                }
            }),

            Rule::Pattern {
                segment_id,
                field,
                pattern,
            } => for_each_occurrence(message, segment_id, *field, |segment, location| {
                let value = segment.field(*field).raw();
                if !value.is_empty() && !pattern.is_match(value) {
                    Some(
                        Diagnostic::error(
                            codes::PATTERN_MISMATCH,
                            format!("value {:?} does not match {:?}", value, pattern.as_str()),
                        )
                        .at(location),
                    )
                } else {
                    None
                }
            }),

            Rule::SegmentCardinality {
                segment_id,
                cardinality,
            } => {
                let count = message.count_segments(segment_id);
                if cardinality.satisfied_by(count) {
                    Vec::new()
                } else {
                    vec![Diagnostic::error(
                        codes::SEGMENT_CARDINALITY,
                        format!(
                            "segment {} occurs {} time(s), expected {}",
                            segment_id, count, cardinality
                        ),
                    )
                    .at(Location::segment(segment_id.clone()))]
                }
            }

            Rule::Custom { check, .. } => check(message),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Rule::RequiredSegment { segment_id, .. } => format!("required_segment({})", segment_id),
            Rule::RequiredField {
                segment_id, field, ..
            } => format!("required_field({}-{})", segment_id, field),
            Rule::FieldLength {
                segment_id, field, ..
            } => format!("field_length({}-{})", segment_id, field),
            Rule::DataType {
                segment_id, field, ..
            } => format!("data_type({}-{})", segment_id, field),
            Rule::ValueSet {
                segment_id, field, ..
            } => format!("value_set({}-{})", segment_id, field),
            Rule::Pattern {
                segment_id, field, ..
            } => format!("pattern({}-{})", segment_id, field),
            Rule::SegmentCardinality { segment_id, .. } => {
                format!("segment_cardinality({})", segment_id)
            }
            Rule::Custom { name, .. } => format!("custom({})", name),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Run a per-occurrence field check, labelling issues with the
/// occurrence-qualified location.
fn for_each_occurrence<F>(
    message: &Message,
    segment_id: &str,
    field: usize,
    mut check: F,
) -> Vec<Diagnostic>
where
    F: FnMut(&era7_core::segment::Segment, Location) -> Option<Diagnostic>,
{
    message
        .segments_by_id(segment_id)
        .enumerate()
        .filter_map(|(occurrence, segment)| {
            let location = Location::field(segment_id, field).with_occurrence(occurrence + 1);
            check(segment, location)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use era7_core::builder::MessageBuilder;

    fn sample() -> Message {
        MessageBuilder::new()
            .datetime("20240101120000")
            .message_type("ADT", "A01")
            .control_id("M1")
            .processing_id("P")
            .version_str("2.5")
            .segment("PID")
            .field(1, "1")
            .field(3, "12345")
            .field(7, "19800101")
            .field(8, "M")
            .finish()
            .build()
            .unwrap()
    }

    #[test]
    fn test_required_segment() {
        let message = sample();
        assert!(Rule::required_segment("PID", 1).apply(&message).is_empty());

        let issues = Rule::required_segment("EVN", 1).apply(&message);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, codes::REQUIRED_SEGMENT);
        assert_eq!(issues[0].location.as_ref().unwrap().to_string(), "EVN");
    }

    #[test]
    fn test_required_field() {
        let message = sample();
        assert!(Rule::required_field("PID", 3, "Patient ID").apply(&message).is_empty());

        let issues = Rule::required_field("PID", 5, "Patient Name").apply(&message);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, codes::REQUIRED_FIELD_MISSING);
        assert_eq!(issues[0].location.as_ref().unwrap().to_string(), "PID-5");
    }

    #[test]
    fn test_required_field_absent_segment_is_quiet() {
        let message = sample();
        assert!(Rule::required_field("OBX", 5, "Value").apply(&message).is_empty());
    }

    #[test]
    fn test_field_length() {
        let message = sample();
        assert!(Rule::field_length("PID", 3, 10).apply(&message).is_empty());
        let issues = Rule::field_length("PID", 3, 3).apply(&message);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, codes::FIELD_LENGTH_EXCEEDED);
    }

    #[test]
    fn test_data_type() {
        let message = sample();
        assert!(Rule::data_type("PID", 7, DataTypeKind::DT).apply(&message).is_empty());

        let issues = Rule::data_type("PID", 3, DataTypeKind::DT).apply(&message);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, codes::DATA_TYPE_MISMATCH);
    }

    #[test]
    fn test_value_set() {
        let message = sample();
        assert!(Rule::value_set("PID", 8, ["M", "F", "O", "U"]).apply(&message).is_empty());
        let issues = Rule::value_set("PID", 8, ["F"]).apply(&message);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, codes::VALUE_NOT_ALLOWED);
    }

    #[test]
    fn test_pattern() {
        let message = sample();
        let rule = Rule::pattern("PID", 3, r"^\d+$").unwrap();
        assert!(rule.apply(&message).is_empty());

        let rule = Rule::pattern("PID", 3, r"^[A-Z]+$").unwrap();
        let issues = rule.apply(&message);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, codes::PATTERN_MISMATCH);
    }

    #[test]
    fn test_pattern_rejects_bad_regex() {
        assert!(Rule::pattern("PID", 3, "[unclosed").is_err());
    }

    #[test]
    fn test_segment_cardinality() {
        let message = sample();
        let rule = Rule::segment_cardinality("PID", Cardinality::one());
        assert!(rule.apply(&message).is_empty());

        let rule = Rule::segment_cardinality("PID", Cardinality::new(2, None).unwrap());
        let issues = rule.apply(&message);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, codes::SEGMENT_CARDINALITY);
    }

    #[test]
    fn test_custom() {
        let message = sample();
        let rule = Rule::custom("control id shape", |msg| {
            match msg.control_id() {
                Some(id) if id.len() >= 2 => Vec::new(),
                _ => vec![Diagnostic::error("CONTROL_ID_SHAPE", "control id too short")],
            }
        });
        assert!(rule.apply(&message).is_empty());
    }

    #[test]
    fn test_rule_names() {
        assert_eq!(Rule::required_segment("PID", 1).name(), "required_segment(PID)");
        assert_eq!(
            Rule::field_length("PID", 3, 10).name(),
            "field_length(PID-3)"
        );
    }
}
