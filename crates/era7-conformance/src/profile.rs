//! Conformance profile data structures
//!
//! A [`ConformanceProfile`] declares what a message of a given type and
//! trigger event must look like: which segments appear, how often, and
//! what constraints their fields carry. Profiles are plain serde data
//! and round-trip through JSON.

use crate::datatype::DataTypeKind;
use crate::error::{ConformanceError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Field optionality codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Optionality {
    /// Must be valued; error when missing
    Required,
    /// May be valued
    Optional,
    /// Required or not depending on context the profile cannot express
    Conditional,
    /// Must not be valued
    NotUsed,
    /// Retained for backward compatibility; discouraged
    Backward,
    /// Withdrawn from the standard; must not be valued
    Withdrawn,
}

impl Optionality {
    pub fn is_required(&self) -> bool {
        matches!(self, Optionality::Required)
    }

    /// Whether a valued occurrence should be flagged
    pub fn forbids_value(&self) -> bool {
        matches!(self, Optionality::NotUsed | Optionality::Withdrawn)
    }
}

/// Occurrence bounds: `max == None` means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cardinality {
    pub min: usize,
    pub max: Option<usize>,
}

impl Cardinality {
    pub fn new(min: usize, max: Option<usize>) -> Result<Self> {
        if let Some(max_value) = max {
            if min > max_value {
                return Err(ConformanceError::InvalidCardinality(format!(
                    "min ({}) > max ({})",
                    min, max_value
                )));
            }
        }
        Ok(Self { min, max })
    }

    /// Exactly one occurrence, `[1..1]`
    pub fn one() -> Self {
        Self { min: 1, max: Some(1) }
    }

    /// `[0..1]`
    pub fn zero_or_one() -> Self {
        Self { min: 0, max: Some(1) }
    }

    /// `[0..*]`
    pub fn zero_or_more() -> Self {
        Self { min: 0, max: None }
    }

    /// `[1..*]`
    pub fn one_or_more() -> Self {
        Self { min: 1, max: None }
    }

    pub fn satisfied_by(&self, count: usize) -> bool {
        if count < self.min {
            return false;
        }
        match self.max {
            Some(max) => count <= max,
            None => true,
        }
    }
}

impl Default for Cardinality {
    fn default() -> Self {
        Self::one()
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "[{}..{}]", self.min, max),
            None => write!(f, "[{}..*]", self.min),
        }
    }
}

/// Constraints on one field position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// 1-based HL7 field number
    pub position: usize,
    pub name: String,
    pub optionality: Optionality,
    #[serde(default)]
    pub datatype: Option<DataTypeKind>,
    #[serde(default)]
    pub max_length: Option<usize>,
    /// Allowed repetition count
    #[serde(default)]
    pub repetitions: Cardinality,
}

impl FieldDefinition {
    pub fn new(position: usize, name: &str, optionality: Optionality) -> Self {
        Self {
            position,
            name: name.to_string(),
            optionality,
            datatype: None,
            max_length: None,
            repetitions: Cardinality::default(),
        }
    }

    pub fn with_datatype(mut self, datatype: DataTypeKind) -> Self {
        self.datatype = Some(datatype);
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_repetitions(mut self, repetitions: Cardinality) -> Self {
        self.repetitions = repetitions;
        self
    }
}

/// Field-level constraints for one segment id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentDefinition {
    pub id: String,
    pub name: String,
    pub fields: Vec<FieldDefinition>,
}

impl SegmentDefinition {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field(&self, position: usize) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.position == position)
    }
}

/// One expected segment: id, occurrence bounds, optional field detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRequirement {
    pub segment_id: String,
    pub cardinality: Cardinality,
    #[serde(default)]
    pub definition: Option<SegmentDefinition>,
}

impl SegmentRequirement {
    pub fn new(segment_id: &str, cardinality: Cardinality) -> Self {
        Self {
            segment_id: segment_id.to_string(),
            cardinality,
            definition: None,
        }
    }

    pub fn with_definition(mut self, definition: SegmentDefinition) -> Self {
        self.definition = Some(definition);
        self
    }
}

/// A complete conformance profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConformanceProfile {
    pub id: String,
    #[serde(default)]
    pub description: String,
    /// HL7 version the profile targets (e.g. "2.5")
    pub version: String,
    /// Expected MSH-9 message code (e.g. "ADT")
    pub message_type: String,
    /// Expected MSH-9 trigger event (e.g. "A01")
    pub trigger_event: String,
    /// Expected segments, in message order
    pub segment_requirements: Vec<SegmentRequirement>,
}

impl ConformanceProfile {
    pub fn new(id: &str, version: &str, message_type: &str, trigger_event: &str) -> Self {
        Self {
            id: id.to_string(),
            description: String::new(),
            version: version.to_string(),
            message_type: message_type.to_string(),
            trigger_event: trigger_event.to_string(),
            segment_requirements: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_requirement(mut self, requirement: SegmentRequirement) -> Self {
        self.segment_requirements.push(requirement);
        self
    }

    /// The expected MSH-9 rendering, e.g. "ADT^A01"
    pub fn expected_message_type(&self) -> String {
        format!("{}^{}", self.message_type, self.trigger_event)
    }

    /// Load a profile from its JSON representation
    pub fn from_json(json: &str) -> Result<Self> {
        let profile: Self = serde_json::from_str(json)?;
        if profile.message_type.is_empty() {
            return Err(ConformanceError::InvalidProfile(
                "profile has an empty message_type".to_string(),
            ));
        }
        Ok(profile)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
