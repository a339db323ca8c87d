//! HL7 delimiter and encoding character handling

use crate::error::{Error, Result};

/// Default HL7 delimiters as defined in the standard
pub const DEFAULT_FIELD_SEPARATOR: char = '|';
pub const DEFAULT_COMPONENT_SEPARATOR: char = '^';
pub const DEFAULT_REPETITION_SEPARATOR: char = '~';
pub const DEFAULT_ESCAPE_CHARACTER: char = '\\';
pub const DEFAULT_SUBCOMPONENT_SEPARATOR: char = '&';

/// The five encoding characters of an ER7 message
///
/// - Field separator: `|` (separates fields in a segment)
/// - Component separator: `^` (separates components within a field)
/// - Repetition separator: `~` (separates repeated field values)
/// - Escape character: `\` (opens and closes escape sequences)
/// - Subcomponent separator: `&` (separates subcomponents within a component)
///
/// The tuple is immutable once constructed; every constructor validates
/// that the five characters are pairwise distinct printable characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Delimiters {
    field: char,
    component: char,
    repetition: char,
    escape: char,
    subcomponent: char,
}

/// The standard `|^~\&` tuple
pub const STANDARD: Delimiters = Delimiters {
    field: DEFAULT_FIELD_SEPARATOR,
    component: DEFAULT_COMPONENT_SEPARATOR,
    repetition: DEFAULT_REPETITION_SEPARATOR,
    escape: DEFAULT_ESCAPE_CHARACTER,
    subcomponent: DEFAULT_SUBCOMPONENT_SEPARATOR,
};

impl Default for Delimiters {
    fn default() -> Self {
        STANDARD
    }
}

impl Delimiters {
    /// The standard `|^~\&` tuple
    pub const STANDARD: Delimiters = STANDARD;

    /// Create a delimiter tuple from the five characters
    pub fn new(field: char, component: char, repetition: char, escape: char, subcomponent: char) -> Result<Self> {
        let delims = Self {
            field,
            component,
            repetition,
            escape,
            subcomponent,
        };
        delims.validate()?;
        Ok(delims)
    }

    /// Create delimiters from MSH-1 and the four MSH-2 encoding characters
    ///
    /// MSH-2 contains, in order: component separator, repetition
    /// separator, escape character, subcomponent separator.
    pub fn from_encoding_characters(field_sep: char, encoding_chars: &str) -> Result<Self> {
        let chars: Vec<char> = encoding_chars.chars().collect();
        if chars.len() != 4 {
            return Err(Error::InvalidEncodingCharacters(format!(
                "expected exactly 4 encoding characters, got {}",
                chars.len()
            )));
        }
        Self::new(field_sep, chars[0], chars[1], chars[2], chars[3])
    }

    /// Detect delimiters from the start of a raw message
    ///
    /// Reads the `MSH<F><C><R><E><S>` prefix: the input must begin with
    /// "MSH" followed by at least five characters.
    pub fn detect(input: &str) -> Result<Self> {
        let mut chars = input.chars();
        let prefix: String = chars.by_ref().take(3).collect();
        if prefix != "MSH" {
            let preview: String = input.chars().take(8).collect();
            return Err(Error::InvalidHeader(format!(
                "message does not begin with MSH (got {:?})",
                preview
            )));
        }
        let rest: Vec<char> = chars.take(5).collect();
        if rest.len() < 5 {
            return Err(Error::InvalidHeader(
                "MSH header too short to carry the delimiter characters".to_string(),
            ));
        }
        Self::new(rest[0], rest[1], rest[2], rest[3], rest[4])
    }

    pub fn field_sep(&self) -> char {
        self.field
    }

    pub fn component_sep(&self) -> char {
        self.component
    }

    pub fn repetition_sep(&self) -> char {
        self.repetition
    }

    pub fn escape_char(&self) -> char {
        self.escape
    }

    pub fn subcomponent_sep(&self) -> char {
        self.subcomponent
    }

    /// The four MSH-2 encoding characters as a string
    pub fn encoding_characters(&self) -> String {
        let mut s = String::with_capacity(4);
        s.push(self.component);
        s.push(self.repetition);
        s.push(self.escape);
        s.push(self.subcomponent);
        s
    }

    /// Check that the five characters are pairwise distinct and printable
    pub fn validate(&self) -> Result<()> {
        let chars = [self.field, self.component, self.repetition, self.escape, self.subcomponent];

        for &c in &chars {
            if c.is_control() || c.is_whitespace() {
                return Err(Error::InvalidEncodingCharacters(format!(
                    "delimiter {:?} is not a printable character",
                    c
                )));
            }
        }

        for (i, &c1) in chars.iter().enumerate() {
            for &c2 in chars.iter().skip(i + 1) {
                if c1 == c2 {
                    return Err(Error::InvalidEncodingCharacters(format!(
                        "duplicate delimiter character: '{}'",
                        c1
                    )));
                }
            }
        }

        Ok(())
    }

    /// Check if a character is one of the four structural separators
    pub fn is_separator(&self, c: char) -> bool {
        c == self.field || c == self.component || c == self.repetition || c == self.subcomponent
    }

    /// Check if a character is any of the five delimiter characters
    pub fn contains(&self, c: char) -> bool {
        self.is_separator(c) || c == self.escape
    }

    /// Check if a character is the escape character
    pub fn is_escape(&self, c: char) -> bool {
        c == self.escape
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_delimiters() {
        let delims = Delimiters::default();
        assert_eq!(delims.field_sep(), '|');
        assert_eq!(delims.component_sep(), '^');
        assert_eq!(delims.repetition_sep(), '~');
        assert_eq!(delims.escape_char(), '\\');
        assert_eq!(delims.subcomponent_sep(), '&');
    }

    #[test]
    fn test_from_encoding_characters() {
        let delims = Delimiters::from_encoding_characters('|', "^~\\&").unwrap();
        assert_eq!(delims, Delimiters::STANDARD);
    }

    #[test]
    fn test_encoding_characters() {
        assert_eq!(Delimiters::default().encoding_characters(), "^~\\&");
    }

    #[test]
    fn test_detect() {
        let delims = Delimiters::detect("MSH|^~\\&|App|Fac").unwrap();
        assert_eq!(delims, Delimiters::STANDARD);
    }

    #[test]
    fn test_detect_non_standard() {
        let delims = Delimiters::detect("MSH#!@*%#App").unwrap();
        assert_eq!(delims.field_sep(), '#');
        assert_eq!(delims.component_sep(), '!');
        assert_eq!(delims.repetition_sep(), '@');
        assert_eq!(delims.escape_char(), '*');
        assert_eq!(delims.subcomponent_sep(), '%');
    }

    #[test]
    fn test_detect_rejects_non_msh() {
        assert!(matches!(
            Delimiters::detect("PID|1||12345"),
            Err(Error::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_detect_rejects_short_header() {
        assert!(matches!(Delimiters::detect("MSH|^~"), Err(Error::InvalidHeader(_))));
    }

    #[test]
    fn test_invalid_length() {
        assert!(Delimiters::from_encoding_characters('|', "^~\\").is_err());
    }

    #[test]
    fn test_duplicate_delimiters() {
        assert!(Delimiters::from_encoding_characters('|', "^^^^").is_err());
        assert!(Delimiters::new('|', '|', '~', '\\', '&').is_err());
    }

    #[test]
    fn test_rejects_unprintable() {
        assert!(Delimiters::new('\t', '^', '~', '\\', '&').is_err());
        assert!(Delimiters::new('|', '^', '~', '\u{0007}', '&').is_err());
    }

    #[test]
    fn test_is_separator() {
        let delims = Delimiters::default();
        assert!(delims.is_separator('|'));
        assert!(delims.is_separator('^'));
        assert!(delims.is_separator('~'));
        assert!(delims.is_separator('&'));
        assert!(!delims.is_separator('\\'));
        assert!(!delims.is_separator('A'));
        assert!(delims.contains('\\'));
    }
}
