//! HL7 escape sequence encoding and decoding
//!
//! Escape sequences put delimiter characters and a few specials in band:
//!
//! - `\F\` - field separator
//! - `\S\` - component separator
//! - `\T\` - subcomponent separator
//! - `\R\` - repetition separator
//! - `\E\` - escape character
//! - `\.br\` - line break (U+000A)
//! - `\.sp\` - space (U+0020)
//! - `\Xhh..\` - one or more bytes, two hex digits each
//!
//! The codec is a plain value carrying the delimiters it was configured
//! with, so messages with divergent delimiters can coexist in one
//! process.

use crate::delimiters::Delimiters;
use crate::error::{Error, Result};

/// Bidirectional mapping between raw on-wire text and decoded user text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscapeCodec {
    delimiters: Delimiters,
}

impl EscapeCodec {
    pub fn new(delimiters: Delimiters) -> Self {
        Self { delimiters }
    }

    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    /// Replace special characters with their escape sequences
    ///
    /// Total: every delimiter character, the escape character, and the
    /// newline character are rewritten; all other characters pass
    /// through unchanged.
    pub fn encode(&self, input: &str) -> String {
        let d = &self.delimiters;
        let esc = d.escape_char();
        let mut result = String::with_capacity(input.len());

        for ch in input.chars() {
            if ch == esc {
                result.push(esc);
                result.push('E');
                result.push(esc);
            } else if ch == d.field_sep() {
                result.push(esc);
                result.push('F');
                result.push(esc);
            } else if ch == d.component_sep() {
                result.push(esc);
                result.push('S');
                result.push(esc);
            } else if ch == d.subcomponent_sep() {
                result.push(esc);
                result.push('T');
                result.push(esc);
            } else if ch == d.repetition_sep() {
                result.push(esc);
                result.push('R');
                result.push(esc);
            } else if ch == '\n' {
                result.push(esc);
                result.push_str(".br");
                result.push(esc);
            } else {
                result.push(ch);
            }
        }

        result
    }

    /// Replace escape sequences with the characters they stand for
    ///
    /// Fails with [`Error::UnclosedEscape`] when an escape character
    /// opens a sequence that never closes, and with
    /// [`Error::UnknownEscape`] for an unrecognized token between
    /// escape characters.
    pub fn decode(&self, input: &str) -> Result<String> {
        let d = &self.delimiters;
        let esc = d.escape_char();
        let mut result = String::with_capacity(input.len());
        let mut chars = input.char_indices();

        while let Some((offset, ch)) = chars.next() {
            if ch != esc {
                result.push(ch);
                continue;
            }

            let mut token = String::new();
            let mut closed = false;
            for (_, next_ch) in chars.by_ref() {
                if next_ch == esc {
                    closed = true;
                    break;
                }
                token.push(next_ch);
            }

            if !closed {
                return Err(Error::UnclosedEscape { offset });
            }

            match token.as_str() {
                "F" => result.push(d.field_sep()),
                "S" => result.push(d.component_sep()),
                "T" => result.push(d.subcomponent_sep()),
                "R" => result.push(d.repetition_sep()),
                "E" => result.push(esc),
                ".br" => result.push('\n'),
                ".sp" => result.push(' '),
                t if t.starts_with('X') && t.len() > 1 => {
                    Self::decode_hex(&t[1..], &mut result)
                        .ok_or_else(|| Error::UnknownEscape { token: token.clone() })?;
                }
                _ => return Err(Error::UnknownEscape { token }),
            }
        }

        Ok(result)
    }

    // Each two-digit hex pair is one byte, interpreted as a Latin-1
    // codepoint.
    fn decode_hex(hex: &str, out: &mut String) -> Option<()> {
        if hex.is_empty() || hex.len() % 2 != 0 {
            return None;
        }
        let bytes = hex.as_bytes();
        for pair in bytes.chunks(2) {
            let pair = std::str::from_utf8(pair).ok()?;
            let code = u8::from_str_radix(pair, 16).ok()?;
            out.push(code as char);
        }
        Some(())
    }
}

impl Default for EscapeCodec {
    fn default() -> Self {
        Self::new(Delimiters::STANDARD)
    }
}
