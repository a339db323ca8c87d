//! The conformance engine
//!
//! Validates a message against a [`ConformanceProfile`] or a list of
//! [`Rule`]s. The engine never fails on message content: every finding
//! becomes an issue on the outcome, ordered by where it was found in
//! the message.

use crate::datatype::{validate_value, DataTypeValidation};
use crate::profile::{ConformanceProfile, FieldDefinition, Optionality, SegmentRequirement};
use crate::rules::{codes, Rule};
use era7_core::diagnostics::{Diagnostic, Location, Severity};
use era7_core::message::Message;
use era7_core::segment::Segment;

/// Bounds on validation output
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationOptions {
    /// Stop collecting after the first error-severity issue
    pub stop_on_first_error: bool,
    /// Hard cap on the number of issues collected
    pub max_issues: Option<usize>,
    /// Count warnings against validity as well
    pub strict_mode: bool,
}

/// Aggregated result of a validation run
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub issues: Vec<Diagnostic>,
}

impl ValidationOutcome {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }
}

/// Collects issues while honoring the configured bounds
struct Collector {
    options: ValidationOptions,
    issues: Vec<Diagnostic>,
    saturated: bool,
}

impl Collector {
    fn new(options: ValidationOptions) -> Self {
        Self {
            options,
            issues: Vec::new(),
            saturated: false,
        }
    }

    fn push(&mut self, issue: Diagnostic) {
        if self.saturated {
            return;
        }
        let is_error = issue.is_error();
        self.issues.push(issue);

        if self.options.stop_on_first_error && is_error {
            self.saturated = true;
        }
        if let Some(max) = self.options.max_issues {
            if self.issues.len() >= max {
                self.saturated = true;
            }
        }
    }

    fn extend(&mut self, issues: Vec<Diagnostic>) {
        for issue in issues {
            self.push(issue);
        }
    }

    fn finish(self) -> ValidationOutcome {
        let is_valid = if self.options.strict_mode {
            self.issues
                .iter()
                .all(|i| i.severity == Severity::Information)
        } else {
            !self.issues.iter().any(|i| i.is_error())
        };
        ValidationOutcome {
            is_valid,
            issues: self.issues,
        }
    }
}

/// Profile- and rule-driven message validator
#[derive(Debug, Clone, Default)]
pub struct ConformanceEngine {
    options: ValidationOptions,
}

impl ConformanceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ValidationOptions) -> Self {
        Self { options }
    }

    /// Validate a message against a conformance profile
    ///
    /// Sequence: message type check, segment cardinalities, then
    /// field-level checks for each occurrence of each profiled segment.
    pub fn validate_profile(
        &self,
        message: &Message,
        profile: &ConformanceProfile,
    ) -> ValidationOutcome {
        let mut collector = Collector::new(self.options);

        self.check_message_type(message, profile, &mut collector);

        for requirement in &profile.segment_requirements {
            if collector.saturated {
                break;
            }
            self.check_requirement(message, requirement, &mut collector);
        }

        collector.finish()
    }

    /// Validate a message against an ad-hoc rule list
    pub fn validate_rules(&self, message: &Message, rules: &[Rule]) -> ValidationOutcome {
        let mut collector = Collector::new(self.options);
        for rule in rules {
            if collector.saturated {
                break;
            }
            collector.extend(rule.apply(message));
        }
        collector.finish()
    }

    fn check_message_type(
        &self,
        message: &Message,
        profile: &ConformanceProfile,
        collector: &mut Collector,
    ) {
        let expected = profile.expected_message_type();
        match message.message_type() {
            Some((code, trigger))
                if code == profile.message_type && trigger == profile.trigger_event => {}
            Some((code, trigger)) => collector.push(
                Diagnostic::error(
                    codes::MSG_TYPE_MISMATCH,
                    format!(
                        "message type {}^{} does not match profile {} ({})",
                        code, trigger, profile.id, expected
                    ),
                )
                .at(Location::field("MSH", 9)),
            ),
            None => collector.push(
                Diagnostic::error(
                    codes::MSG_TYPE_MISMATCH,
                    format!("message has no MSH-9 type; profile expects {}", expected),
                )
                .at(Location::field("MSH", 9)),
            ),
        }
    }

    fn check_requirement(
        &self,
        message: &Message,
        requirement: &SegmentRequirement,
        collector: &mut Collector,
    ) {
        let occurrences: Vec<&Segment> =
            message.segments_by_id(&requirement.segment_id).collect();

        if !requirement.cardinality.satisfied_by(occurrences.len()) {
            collector.push(
                Diagnostic::error(
                    codes::SEGMENT_CARDINALITY,
                    format!(
                        "segment {} occurs {} time(s), profile requires {}",
                        requirement.segment_id,
                        occurrences.len(),
                        requirement.cardinality
                    ),
                )
                .at(Location::segment(requirement.segment_id.clone())),
            );
        }

        if let Some(definition) = &requirement.definition {
            for (index, segment) in occurrences.iter().enumerate() {
                if collector.saturated {
                    return;
                }
                for field_def in &definition.fields {
                    self.check_field(segment, index + 1, field_def, collector);
                }
            }
        }
    }

    fn check_field(
        &self,
        segment: &Segment,
        occurrence: usize,
        definition: &FieldDefinition,
        collector: &mut Collector,
    ) {
        let field = segment.field(definition.position);
        let location =
            Location::field(segment.id(), definition.position).with_occurrence(occurrence);

        match definition.optionality {
            Optionality::Required if field.is_empty() => {
                collector.push(
                    Diagnostic::error(
                        codes::REQUIRED_FIELD_MISSING,
                        format!("required field {} ({}) is empty", location, definition.name),
                    )
                    .at(location),
                );
                return;
            }
            Optionality::NotUsed | Optionality::Withdrawn if !field.is_empty() => {
                collector.push(
                    Diagnostic::error(
                        codes::NOT_USED_FIELD_PRESENT,
                        format!(
                            "field {} ({}) is marked {} but carries a value",
                            location,
                            definition.name,
                            if definition.optionality == Optionality::NotUsed {
                                "not used"
                            } else {
                                "withdrawn"
                            }
                        ),
                    )
                    .at(location),
                );
                return;
            }
            Optionality::Backward if !field.is_empty() => {
                collector.push(
                    Diagnostic::warning(
                        codes::BACKWARD_FIELD_PRESENT,
                        format!(
                            "field {} ({}) is retained for backward compatibility only",
                            location, definition.name
                        ),
                    )
                    .at(location.clone()),
                );
            }
            _ => {}
        }

        if field.is_empty() {
            return;
        }

        if !definition.repetitions.satisfied_by(field.repetition_count()) {
            collector.push(
                Diagnostic::error(
                    codes::FIELD_REPETITIONS,
                    format!(
                        "field repeats {} time(s), profile allows {}",
                        field.repetition_count(),
                        definition.repetitions
                    ),
                )
                .at(location.clone()),
            );
        }

        if let Some(max_length) = definition.max_length {
            // Codepoint counting, consistent with Rule::FieldLength.
            let length = field.raw().chars().count();
            if length > max_length {
                collector.push(
                    Diagnostic::error(
                        codes::FIELD_LENGTH_EXCEEDED,
                        format!(
                            "field is {} characters long, profile maximum is {}",
                            length, max_length
                        ),
                    )
                    .at(location.clone()),
                );
            }
        }

        if let Some(datatype) = definition.datatype {
            for repetition in field.repetitions() {
                match validate_value(repetition.value(), datatype) {
                    DataTypeValidation::Valid => {}
                    DataTypeValidation::Warning(reason) => collector.push(
                        Diagnostic::warning(
                            codes::DATA_TYPE_SUSPICIOUS,
                            format!("{} value: {}", datatype.as_str(), reason),
                        )
                        .at(location.clone()),
                    ),
                    DataTypeValidation::Invalid(reason) => collector.push(
                        Diagnostic::error(
                            codes::DATA_TYPE_MISMATCH,
                            format!(
                                "value {:?} is not a valid {}: {}",
                                repetition.value(),
                                datatype.as_str(),
                                reason
                            ),
                        )
                        .at(location.clone()),
                    ),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::DataTypeKind;
    use crate::profile::{Cardinality, SegmentDefinition};
    use era7_core::builder::MessageBuilder;

    fn profile() -> ConformanceProfile {
        ConformanceProfile::new("adt-a01-test", "2.5", "ADT", "A01")
            .with_requirement(SegmentRequirement::new("MSH", Cardinality::one()))
            .with_requirement(SegmentRequirement::new("EVN", Cardinality::one()))
            .with_requirement(
                SegmentRequirement::new("PID", Cardinality::one()).with_definition(
                    SegmentDefinition::new("PID", "Patient Identification")
                        .with_field(
                            FieldDefinition::new(3, "Patient Identifier List", Optionality::Required)
                                .with_datatype(DataTypeKind::CX),
                        )
                        .with_field(
                            FieldDefinition::new(7, "Date/Time of Birth", Optionality::Optional)
                                .with_datatype(DataTypeKind::TS),
                        )
                        .with_field(FieldDefinition::new(
                            30,
                            "Patient Death Indicator",
                            Optionality::NotUsed,
                        )),
                ),
            )
    }

    fn valid_message() -> Message {
        MessageBuilder::new()
            .datetime("20240101120000")
            .message_type("ADT", "A01")
            .control_id("M1")
            .processing_id("P")
            .version_str("2.5")
            .segment("EVN")
            .field(1, "A01")
            .segment("PID")
            .field(1, "1")
            .field(3, "12345")
            .field(7, "19800101")
            .finish()
            .build()
            .unwrap()
    }

    #[test]
    fn test_valid_message_passes() {
        let outcome = ConformanceEngine::new().validate_profile(&valid_message(), &profile());
        assert!(outcome.is_valid, "issues: {:?}", outcome.issues);
    }

    #[test]
    fn test_missing_evn_is_cardinality_error() {
        let message = MessageBuilder::new()
            .datetime("20240101120000")
            .message_type("ADT", "A01")
            .control_id("M1")
            .processing_id("P")
            .version_str("2.5")
            .segment("PID")
            .field(3, "12345")
            .finish()
            .build()
            .unwrap();

        let outcome = ConformanceEngine::new().validate_profile(&message, &profile());
        assert!(!outcome.is_valid);
        let issue = outcome
            .issues
            .iter()
            .find(|i| i.code == codes::SEGMENT_CARDINALITY)
            .unwrap();
        assert_eq!(issue.location.as_ref().unwrap().to_string(), "EVN");
    }

    #[test]
    fn test_type_mismatch() {
        let oru = MessageBuilder::new()
            .datetime("20240101120000")
            .message_type("ORU", "R01")
            .control_id("M1")
            .processing_id("P")
            .version_str("2.5")
            .build()
            .unwrap();

        let outcome = ConformanceEngine::new().validate_profile(&oru, &profile());
        assert!(!outcome.is_valid);
        assert_eq!(outcome.issues[0].code, codes::MSG_TYPE_MISMATCH);
    }

    #[test]
    fn test_required_field_missing() {
        let message = MessageBuilder::new()
            .datetime("20240101120000")
            .message_type("ADT", "A01")
            .control_id("M1")
            .processing_id("P")
            .version_str("2.5")
            .segment("EVN")
            .field(1, "A01")
            .segment("PID")
            .field(1, "1")
            .finish()
            .build()
            .unwrap();

        let outcome = ConformanceEngine::new().validate_profile(&message, &profile());
        assert!(!outcome.is_valid);
        let issue = outcome
            .issues
            .iter()
            .find(|i| i.code == codes::REQUIRED_FIELD_MISSING)
            .unwrap();
        assert_eq!(issue.location.as_ref().unwrap().to_string(), "PID-3");
    }

    #[test]
    fn test_not_used_field_present() {
        let message = MessageBuilder::new()
            .datetime("20240101120000")
            .message_type("ADT", "A01")
            .control_id("M1")
            .processing_id("P")
            .version_str("2.5")
            .segment("EVN")
            .field(1, "A01")
            .segment("PID")
            .field(3, "12345")
            .field(30, "N")
            .finish()
            .build()
            .unwrap();

        let outcome = ConformanceEngine::new().validate_profile(&message, &profile());
        assert!(outcome.issues.iter().any(|i| i.code == codes::NOT_USED_FIELD_PRESENT));
    }

    #[test]
    fn test_bad_datatype() {
        let message = MessageBuilder::new()
            .datetime("20240101120000")
            .message_type("ADT", "A01")
            .control_id("M1")
            .processing_id("P")
            .version_str("2.5")
            .segment("EVN")
            .field(1, "A01")
            .segment("PID")
            .field(3, "12345")
            .field(7, "not-a-date")
            .finish()
            .build()
            .unwrap();

        let outcome = ConformanceEngine::new().validate_profile(&message, &profile());
        assert!(!outcome.is_valid);
        assert!(outcome.issues.iter().any(|i| i.code == codes::DATA_TYPE_MISMATCH));
    }

    #[test]
    fn test_stop_on_first_error() {
        let message = MessageBuilder::new()
            .datetime("20240101120000")
            .message_type("ORU", "R01") // mismatch, first error
            .control_id("M1")
            .processing_id("P")
            .version_str("2.5")
            .build()
            .unwrap();

        let engine = ConformanceEngine::with_options(ValidationOptions {
            stop_on_first_error: true,
            ..Default::default()
        });
        let outcome = engine.validate_profile(&message, &profile());
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].code, codes::MSG_TYPE_MISMATCH);
    }

    #[test]
    fn test_max_issues() {
        let message = MessageBuilder::new()
            .datetime("20240101120000")
            .message_type("ORU", "R01")
            .control_id("M1")
            .processing_id("P")
            .version_str("2.5")
            .build()
            .unwrap();

        let engine = ConformanceEngine::with_options(ValidationOptions {
            max_issues: Some(2),
            ..Default::default()
        });
        let outcome = engine.validate_profile(&message, &profile());
        assert!(outcome.issues.len() <= 2);
    }

    #[test]
    fn test_rule_list_monotonicity() {
        let message = valid_message();
        let engine = ConformanceEngine::new();

        let base = vec![Rule::required_segment("EVN", 1)];
        let extended = vec![
            Rule::required_segment("EVN", 1),
            Rule::required_field("PID", 5, "Patient Name"),
        ];

        let base_count = engine.validate_rules(&message, &base).issues.len();
        let extended_count = engine.validate_rules(&message, &extended).issues.len();
        assert!(extended_count >= base_count);
    }

    #[test]
    fn test_strict_mode_counts_warnings() {
        let message = MessageBuilder::new()
            .datetime("20240101120000")
            .message_type("ADT", "A01")
            .control_id("M1")
            .processing_id("P")
            .version_str("2.5")
            .segment("EVN")
            .field(1, "A01")
            .segment("PID")
            .field(3, "12345")
            .finish()
            .build()
            .unwrap();

        let rules = vec![Rule::data_type("PID", 3, DataTypeKind::ST)];
        let lax = ConformanceEngine::new().validate_rules(&message, &rules);
        assert!(lax.is_valid);

        let warning_rule = vec![Rule::custom("warn always", |_| {
            vec![Diagnostic::warning("TEST_WARNING", "advisory only")]
        })];
        let strict = ConformanceEngine::with_options(ValidationOptions {
            strict_mode: true,
            ..Default::default()
        });
        let outcome = strict.validate_rules(&message, &warning_rule);
        assert!(!outcome.is_valid);
        assert_eq!(outcome.issues.len(), 1);
    }
}
