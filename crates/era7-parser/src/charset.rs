//! Character set resolution
//!
//! HL7 declares its character set in the repeating MSH-18 field using
//! the table 0211 names (`ASCII`, `8859/1`, `ISO IR192`, ...). This
//! module maps those names to concrete byte decoders, auto-detects an
//! encoding from raw bytes, and checks declared-vs-effective agreement.
//!
//! Per the reference behavior, MSH-18 never triggers a re-decode of
//! already-decoded text: disagreement is reported as a warning and only
//! the first declared set is honored.

use crate::config::{codes, EncodingHint};
use encoding_rs::Encoding;
use era7_core::diagnostics::{Diagnostic, Location};
use era7_core::message::Message;

/// A named character set from HL7 table 0211 (plus common aliases)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterSet {
    /// ASCII / ISO IR6
    Ascii,
    /// 8859/1 / ISO IR100
    Latin1,
    /// 8859/2 / ISO IR101
    Latin2,
    /// 8859/3 / ISO IR109
    Latin3,
    /// 8859/4 / ISO IR110
    Latin4,
    /// 8859/5 / ISO IR144 (Cyrillic)
    Cyrillic,
    /// 8859/6 / ISO IR127 (Arabic)
    Arabic,
    /// 8859/7 / ISO IR126 (Greek)
    Greek,
    /// 8859/8 / ISO IR138 (Hebrew)
    Hebrew,
    /// 8859/9 / ISO IR148 (Turkish)
    Latin5,
    /// UNICODE UTF-8 / ISO IR192
    Utf8,
    /// UNICODE UTF-16
    Utf16,
    /// windows-1252 (not in table 0211, seen in the wild)
    Windows1252,
}

impl CharacterSet {
    /// Parse a table 0211 identifier or alias, case-insensitively
    pub fn parse(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "ASCII" | "ISO IR6" | "US-ASCII" => Some(CharacterSet::Ascii),
            "8859/1" | "ISO IR100" | "ISO-8859-1" | "LATIN1" => Some(CharacterSet::Latin1),
            "8859/2" | "ISO IR101" | "ISO-8859-2" | "LATIN2" => Some(CharacterSet::Latin2),
            "8859/3" | "ISO IR109" | "ISO-8859-3" => Some(CharacterSet::Latin3),
            "8859/4" | "ISO IR110" | "ISO-8859-4" => Some(CharacterSet::Latin4),
            "8859/5" | "ISO IR144" | "ISO-8859-5" => Some(CharacterSet::Cyrillic),
            "8859/6" | "ISO IR127" | "ISO-8859-6" => Some(CharacterSet::Arabic),
            "8859/7" | "ISO IR126" | "ISO-8859-7" => Some(CharacterSet::Greek),
            "8859/8" | "ISO IR138" | "ISO-8859-8" => Some(CharacterSet::Hebrew),
            "8859/9" | "ISO IR148" | "ISO-8859-9" => Some(CharacterSet::Latin5),
            "UNICODE UTF-8" | "ISO IR192" | "UTF-8" | "UNICODE" => Some(CharacterSet::Utf8),
            "UNICODE UTF-16" | "UTF-16" => Some(CharacterSet::Utf16),
            "WINDOWS-1252" | "CP1252" => Some(CharacterSet::Windows1252),
            _ => None,
        }
    }

    /// The table 0211 identifier (or conventional name)
    pub fn as_str(&self) -> &'static str {
        match self {
            CharacterSet::Ascii => "ASCII",
            CharacterSet::Latin1 => "8859/1",
            CharacterSet::Latin2 => "8859/2",
            CharacterSet::Latin3 => "8859/3",
            CharacterSet::Latin4 => "8859/4",
            CharacterSet::Cyrillic => "8859/5",
            CharacterSet::Arabic => "8859/6",
            CharacterSet::Greek => "8859/7",
            CharacterSet::Hebrew => "8859/8",
            CharacterSet::Latin5 => "8859/9",
            CharacterSet::Utf8 => "UNICODE UTF-8",
            CharacterSet::Utf16 => "UNICODE UTF-16",
            CharacterSet::Windows1252 => "windows-1252",
        }
    }

    /// The concrete decoder for this set
    ///
    /// Latin-1 decodes byte-per-codepoint and has no encoding_rs
    /// equivalent (the WHATWG registry folds it into windows-1252), so
    /// it returns `None` and is handled specially.
    pub fn encoding(&self) -> Option<&'static Encoding> {
        match self {
            CharacterSet::Ascii | CharacterSet::Utf8 => Some(encoding_rs::UTF_8),
            CharacterSet::Latin1 => None,
            CharacterSet::Latin2 => Some(encoding_rs::ISO_8859_2),
            CharacterSet::Latin3 => Some(encoding_rs::ISO_8859_3),
            CharacterSet::Latin4 => Some(encoding_rs::ISO_8859_4),
            CharacterSet::Cyrillic => Some(encoding_rs::ISO_8859_5),
            CharacterSet::Arabic => Some(encoding_rs::ISO_8859_6),
            CharacterSet::Greek => Some(encoding_rs::ISO_8859_7),
            CharacterSet::Hebrew => Some(encoding_rs::ISO_8859_8),
            CharacterSet::Latin5 => Some(encoding_rs::WINDOWS_1254),
            CharacterSet::Utf16 => Some(encoding_rs::UTF_16LE),
            CharacterSet::Windows1252 => Some(encoding_rs::WINDOWS_1252),
        }
    }

    /// Whether text decoded as `self` is also valid under `other`
    ///
    /// ASCII is a subset of every set in the registry, so an ASCII
    /// declaration never conflicts.
    pub fn compatible_with(&self, other: CharacterSet) -> bool {
        *self == other || *self == CharacterSet::Ascii || other == CharacterSet::Ascii
    }
}

impl std::fmt::Display for CharacterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Auto-detect the character set of raw bytes
///
/// Ladder: BOM sniffing (UTF-8, UTF-16 LE/BE), then a UTF-8 validity
/// probe, then a probe for 0x80-0x9F bytes (printable in windows-1252,
/// control codes in Latin-1), then Latin-1 as the fallback.
pub fn detect_encoding(bytes: &[u8]) -> CharacterSet {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return CharacterSet::Utf8;
    }
    if bytes.starts_with(&[0xFF, 0xFE]) || bytes.starts_with(&[0xFE, 0xFF]) {
        return CharacterSet::Utf16;
    }
    if std::str::from_utf8(bytes).is_ok() {
        return CharacterSet::Utf8;
    }
    if bytes.iter().any(|b| (0x80..=0x9F).contains(b)) {
        return CharacterSet::Windows1252;
    }
    CharacterSet::Latin1
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Decode raw bytes per the configured hint
///
/// Returns the text, the character set actually used, and any
/// diagnostics (replacement characters, non-ASCII bytes under an ASCII
/// hint).
pub fn decode_bytes(bytes: &[u8], hint: EncodingHint) -> (String, CharacterSet, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();

    let charset = match hint {
        EncodingHint::Auto => detect_encoding(bytes),
        EncodingHint::Utf8 => CharacterSet::Utf8,
        EncodingHint::Ascii => CharacterSet::Ascii,
        EncodingHint::Latin1 => CharacterSet::Latin1,
        EncodingHint::Utf16Le | EncodingHint::Utf16Be => CharacterSet::Utf16,
        EncodingHint::Windows1252 => CharacterSet::Windows1252,
    };

    let text = match charset {
        CharacterSet::Latin1 => decode_latin1(bytes),
        CharacterSet::Ascii => {
            if bytes.iter().any(|&b| b >= 0x80) {
                diagnostics.push(Diagnostic::warning(
                    codes::DECODE_REPLACEMENT,
                    "input declared ASCII but contains bytes above 0x7F; decoded as Latin-1",
                ));
            }
            decode_latin1(bytes)
        }
        CharacterSet::Utf16 => {
            // BOM decides the byte order; an explicit hint overrides.
            let encoding = match hint {
                EncodingHint::Utf16Be => encoding_rs::UTF_16BE,
                EncodingHint::Utf16Le => encoding_rs::UTF_16LE,
                _ if bytes.starts_with(&[0xFE, 0xFF]) => encoding_rs::UTF_16BE,
                _ => encoding_rs::UTF_16LE,
            };
            let (text, _, had_errors) = encoding.decode(bytes);
            if had_errors {
                diagnostics.push(Diagnostic::warning(
                    codes::DECODE_REPLACEMENT,
                    "malformed UTF-16 input; replacement characters substituted",
                ));
            }
            strip_bom(&text)
        }
        other => {
            let encoding = other.encoding().unwrap_or(encoding_rs::UTF_8);
            let (text, _, had_errors) = encoding.decode(bytes);
            if had_errors {
                diagnostics.push(Diagnostic::warning(
                    codes::DECODE_REPLACEMENT,
                    format!(
                        "malformed {} input; replacement characters substituted",
                        other
                    ),
                ));
            }
            strip_bom(&text)
        }
    };

    (text, charset, diagnostics)
}

fn strip_bom(text: &str) -> String {
    text.strip_prefix('\u{FEFF}').unwrap_or(text).to_string()
}

/// Resolve the declared character sets from MSH-18
///
/// Returns the honored set (the first declared one, when recognized)
/// plus diagnostics for unknown names and extra repetitions.
pub fn resolve_msh18(message: &Message) -> (Option<CharacterSet>, Vec<Diagnostic>) {
    let declared = message.character_sets();
    let mut diagnostics = Vec::new();

    if declared.is_empty() {
        return (None, diagnostics);
    }

    if declared.len() > 1 {
        diagnostics.push(
            Diagnostic::warning(
                codes::MULTIPLE_CHARACTER_SETS,
                format!(
                    "MSH-18 declares {} character sets; only the first ({}) is honored",
                    declared.len(),
                    declared[0]
                ),
            )
            .at(Location::field("MSH", 18)),
        );
    }

    let first = declared[0];
    match CharacterSet::parse(first) {
        Some(set) => (Some(set), diagnostics),
        None => {
            diagnostics.push(
                Diagnostic::warning(
                    codes::UNKNOWN_CHARACTER_SET,
                    format!("MSH-18 declares unrecognized character set {:?}", first),
                )
                .at(Location::field("MSH", 18)),
            );
            (None, diagnostics)
        }
    }
}

/// Compare the declared set with the decoder actually used
pub fn validate_declared(declared: CharacterSet, effective: CharacterSet) -> Option<Diagnostic> {
    if declared.compatible_with(effective) {
        None
    } else {
        Some(
            Diagnostic::warning(
                codes::ENCODING_MISMATCH,
                format!(
                    "MSH-18 declares {} but the message was decoded as {}; text was not re-decoded",
                    declared, effective
                ),
            )
            .at(Location::field("MSH", 18)),
        )
    }
}
