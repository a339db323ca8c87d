//! HL7 segment structures

use crate::delimiters::Delimiters;
use crate::error::{Error, Result};
use crate::field::{Field, EMPTY_FIELD};
use crate::intern;
use std::sync::Arc;

/// An HL7 segment: a two- or three-character id plus its fields
///
/// Field access is 1-based per HL7 convention. For MSH the field
/// separator itself is field 1 and the encoding characters are field 2;
/// the parser materializes both so that "MSH-9" addresses the message
/// type the way the standard numbers it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    id: Arc<str>,
    fields: Vec<Field>,
}

impl Segment {
    /// Create a new segment with the given id
    pub fn new(id: &str) -> Self {
        Self {
            id: intern::intern(id),
            fields: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether this is a locally-defined Z-segment
    pub fn is_custom(&self) -> bool {
        self.id.starts_with('Z')
    }

    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Field by 1-based HL7 number; empty sentinel for 0 or out of range
    pub fn field(&self, index: usize) -> &Field {
        if index == 0 {
            return &EMPTY_FIELD;
        }
        self.fields.get(index - 1).unwrap_or(&EMPTY_FIELD)
    }

    /// Whether the segment actually carries the given field number
    pub fn has_field(&self, index: usize) -> bool {
        index >= 1 && index <= self.fields.len()
    }

    /// Raw primary value of a field (1-based)
    pub fn field_value(&self, index: usize) -> &str {
        self.field(index).value()
    }

    /// Set a field at the given 1-based index, padding with empty fields
    pub fn set_field(&mut self, index: usize, field: Field, delimiters: Delimiters) -> Result<()> {
        if index == 0 {
            return Err(Error::validation("cannot set field 0 (the segment id)"));
        }
        while self.fields.len() < index {
            self.fields.push(Field::empty(delimiters));
        }
        self.fields[index - 1] = field;
        Ok(())
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Validate the segment id: 2-3 ASCII uppercase alphanumerics, first
    /// character alphabetic
    pub fn validate_id(&self) -> Result<()> {
        validate_segment_id(&self.id)
    }

    /// Whether this segment's field 1 is the field separator itself
    /// (MSH and the batch/file headers share that layout)
    pub fn has_delimiter_prefix(&self) -> bool {
        matches!(&*self.id, "MSH" | "BHS" | "FHS")
    }

    /// Encode the segment to ER7 text
    ///
    /// MSH (and the BHS/FHS headers, which share its layout) is
    /// reconstructed from the delimiter tuple: the field separator and
    /// encoding characters are emitted from `delimiters`, not from the
    /// stored fields, so the two always agree.
    pub fn encode(&self, delimiters: &Delimiters) -> String {
        let mut result = String::from(&*self.id);
        let sep = delimiters.field_sep();

        if self.has_delimiter_prefix() {
            result.push(sep);
            result.push_str(&delimiters.encoding_characters());
            for field in self.fields.iter().skip(2) {
                result.push(sep);
                result.push_str(field.raw());
            }
        } else {
            for field in &self.fields {
                result.push(sep);
                result.push_str(field.raw());
            }
        }

        result
    }
}

/// Whether the id belongs to the well-known segment set
pub fn is_known_segment_id(id: &str) -> bool {
    intern::is_common(id)
}

/// Check a candidate segment id against the grammar
pub fn validate_segment_id(id: &str) -> Result<()> {
    let len = id.chars().count();
    if !(2..=3).contains(&len) {
        return Err(Error::invalid_segment_id(
            id,
            format!("id must be 2 or 3 characters, got {}", len),
        ));
    }

    let mut chars = id.chars();
    let first = chars.next().unwrap_or(' ');
    if !first.is_ascii_uppercase() {
        return Err(Error::invalid_segment_id(
            id,
            "first character must be an ASCII uppercase letter",
        ));
    }
    if !chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
        return Err(Error::invalid_segment_id(
            id,
            "id must contain only ASCII uppercase letters and digits",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delims() -> Delimiters {
        Delimiters::STANDARD
    }

    #[test]
    fn test_new_segment() {
        let segment = Segment::new("PID");
        assert_eq!(segment.id(), "PID");
        assert_eq!(segment.field_count(), 0);
    }

    #[test]
    fn test_field_access_is_one_based() {
        let mut segment = Segment::new("PID");
        segment.add_field(Field::from_raw("12345", delims()));

        assert_eq!(segment.field(1).value(), "12345");
        assert_eq!(segment.field(0).value(), "");
        assert_eq!(segment.field(2).value(), "");
        assert!(segment.has_field(1));
        assert!(!segment.has_field(2));
    }

    #[test]
    fn test_set_field_pads() {
        let mut segment = Segment::new("PID");
        segment.set_field(3, Field::from_value("Smith", delims()), delims()).unwrap();

        assert_eq!(segment.field_count(), 3);
        assert_eq!(segment.field_value(1), "");
        assert_eq!(segment.field_value(3), "Smith");
    }

    #[test]
    fn test_set_field_zero_rejected() {
        let mut segment = Segment::new("PID");
        assert!(segment.set_field(0, Field::empty(delims()), delims()).is_err());
    }

    #[test]
    fn test_encode_regular_segment() {
        let mut segment = Segment::new("PID");
        segment.add_field(Field::from_raw("1", delims()));
        segment.add_field(Field::from_raw("", delims()));
        segment.add_field(Field::from_raw("12345", delims()));

        assert_eq!(segment.encode(&delims()), "PID|1||12345");
    }

    #[test]
    fn test_encode_msh_reconstructs_delimiters() {
        let mut msh = Segment::new("MSH");
        msh.add_field(Field::from_raw("|", delims())); // MSH-1
        msh.add_field(Field::from_raw("^~\\&", delims())); // MSH-2
        msh.add_field(Field::from_raw("App", delims())); // MSH-3
        msh.add_field(Field::from_raw("Fac", delims())); // MSH-4

        assert_eq!(msh.encode(&delims()), "MSH|^~\\&|App|Fac");
    }

    #[test]
    fn test_validate_id() {
        assert!(Segment::new("PID").validate_id().is_ok());
        assert!(Segment::new("ZB1").validate_id().is_ok());
        assert!(Segment::new("QR").validate_id().is_ok());
        assert!(Segment::new("P").validate_id().is_err());
        assert!(Segment::new("PIDX").validate_id().is_err());
        assert!(Segment::new("1ID").validate_id().is_err());
        assert!(Segment::new("pid").validate_id().is_err());
        assert!(Segment::new("PI!").validate_id().is_err());
    }

    #[test]
    fn test_is_custom() {
        assert!(Segment::new("ZPV").is_custom());
        assert!(!Segment::new("PID").is_custom());
    }
}
