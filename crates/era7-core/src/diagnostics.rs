//! Diagnostic types shared by the parser and the conformance engine
//!
//! A [`Diagnostic`] is a structured report about a deviation found while
//! parsing or validating: a severity, a stable code, a human-readable
//! message, and an optional location rendered as a dotted path such as
//! `PID-3` or `OBX[2]-5`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Information,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Information => write!(f, "information"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Position of a diagnostic within a message
///
/// `occurrence` is the 1-based occurrence of the segment when a message
/// contains more than one segment with the same id; it is omitted from
/// the rendered path for the first occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub segment: String,
    pub occurrence: Option<usize>,
    pub field: Option<usize>,
    pub component: Option<usize>,
    pub subcomponent: Option<usize>,
}

impl Location {
    /// Location of a whole segment
    pub fn segment<S: Into<String>>(segment: S) -> Self {
        Self {
            segment: segment.into(),
            occurrence: None,
            field: None,
            component: None,
            subcomponent: None,
        }
    }

    /// Location of a field within a segment (1-based HL7 numbering)
    pub fn field<S: Into<String>>(segment: S, field: usize) -> Self {
        Self {
            segment: segment.into(),
            occurrence: None,
            field: Some(field),
            component: None,
            subcomponent: None,
        }
    }

    pub fn with_occurrence(mut self, occurrence: usize) -> Self {
        self.occurrence = Some(occurrence);
        self
    }

    pub fn with_component(mut self, component: usize) -> Self {
        self.component = Some(component);
        self
    }

    pub fn with_subcomponent(mut self, subcomponent: usize) -> Self {
        self.subcomponent = Some(subcomponent);
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segment)?;
        if let Some(occ) = self.occurrence {
            if occ > 1 {
                write!(f, "[{}]", occ)?;
            }
        }
        if let Some(field) = self.field {
            write!(f, "-{}", field)?;
            if let Some(comp) = self.component {
                write!(f, "-{}", comp)?;
                if let Some(sub) = self.subcomponent {
                    write!(f, "-{}", sub)?;
                }
            }
        }
        Ok(())
    }
}

/// A single structured issue produced by parsing or validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub message: String,
    pub location: Option<Location>,
}

impl Diagnostic {
    pub fn error<C: Into<String>, M: Into<String>>(code: C, message: M) -> Self {
        Self {
            severity: Severity::Error,
            code: code.into(),
            message: message.into(),
            location: None,
        }
    }

    pub fn warning<C: Into<String>, M: Into<String>>(code: C, message: M) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.into(),
            message: message.into(),
            location: None,
        }
    }

    pub fn information<C: Into<String>, M: Into<String>>(code: C, message: M) -> Self {
        Self {
            severity: Severity::Information,
            code: code.into(),
            message: message.into(),
            location: None,
        }
    }

    /// Attach a location
    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "[{}] {} at {}: {}", self.severity, self.code, loc, self.message),
            None => write!(f, "[{}] {}: {}", self.severity, self.code, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_rendering() {
        assert_eq!(Location::segment("EVN").to_string(), "EVN");
        assert_eq!(Location::field("PID", 3).to_string(), "PID-3");
        assert_eq!(
            Location::field("OBX", 5).with_occurrence(2).to_string(),
            "OBX[2]-5"
        );
        assert_eq!(
            Location::field("PID", 5).with_component(1).to_string(),
            "PID-5-1"
        );
        assert_eq!(
            Location::field("PID", 3)
                .with_component(4)
                .with_subcomponent(2)
                .to_string(),
            "PID-3-4-2"
        );
    }

    #[test]
    fn test_first_occurrence_not_rendered() {
        assert_eq!(
            Location::field("OBX", 5).with_occurrence(1).to_string(),
            "OBX-5"
        );
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::error("SEGMENT_CARDINALITY", "Segment EVN is missing")
            .at(Location::segment("EVN"));
        let rendered = diag.to_string();
        assert!(rendered.contains("SEGMENT_CARDINALITY"));
        assert!(rendered.contains("EVN"));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Information);
    }
}
