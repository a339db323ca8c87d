//! HL7 v2.x message parsing
//!
//! Turns ER7 text (or raw bytes) into the [`Message`] tree. The parser
//! is recoverable: depending on [`ErrorRecovery`] a malformed segment
//! either fails the parse, is dropped with a diagnostic, or is repaired
//! where the deviation is minor. Anything short of "no tree at all"
//! is reported through [`ParseDiagnostics`] rather than an error.
//!
//! ```
//! use era7_parser::parse_message;
//!
//! let hl7 = "MSH|^~\\&|HIS|WARD|LAB|CENTRAL|20240101||ADT^A01|MSG1|P|2.5\rPID|1||12345||Smith^John";
//! let message = parse_message(hl7).unwrap();
//! assert_eq!(message.segment_count(), 2);
//! assert_eq!(message.message_type(), Some(("ADT", "A01")));
//! ```

pub mod charset;
pub mod config;
pub mod envelope;
pub mod streaming;

pub use config::{
    EncodingHint, ErrorRecovery, ParseDiagnostics, ParseResult, ParserOptions, SegmentTerminator,
    SplitStrategy,
};

use charset::CharacterSet;
use config::codes;
use era7_core::delimiters::Delimiters;
use era7_core::diagnostics::{Diagnostic, Location};
use era7_core::error::{Error, Result};
use era7_core::field::Field;
use era7_core::message::{msh_prefix_fields, Message};
use era7_core::segment::{is_known_segment_id, validate_segment_id, Segment};
use std::time::Instant;

/// Parse a message with default options, discarding diagnostics
pub fn parse_message(input: &str) -> Result<Message> {
    parse_message_with_options(input, &ParserOptions::default()).map(|r| r.message)
}

/// Parse a message and keep the diagnostics
pub fn parse_message_with_options(input: &str, options: &ParserOptions) -> Result<ParseResult> {
    parse_text(input, options, None, Vec::new())
}

/// Parse raw bytes with default options
pub fn parse_message_bytes(input: &[u8]) -> Result<Message> {
    parse_message_bytes_with_options(input, &ParserOptions::default()).map(|r| r.message)
}

/// Parse raw bytes, interpreting them per the configured encoding
pub fn parse_message_bytes_with_options(input: &[u8], options: &ParserOptions) -> Result<ParseResult> {
    if input.len() > options.max_message_size {
        return Err(Error::TooLarge {
            size: input.len(),
            limit: options.max_message_size,
        });
    }
    let (text, effective, decode_diags) = charset::decode_bytes(input, options.encoding);
    parse_text(&text, options, Some(effective), decode_diags)
}

fn parse_text(
    input: &str,
    options: &ParserOptions,
    effective_charset: Option<CharacterSet>,
    mut pre_warnings: Vec<Diagnostic>,
) -> Result<ParseResult> {
    let started = Instant::now();

    if input.len() > options.max_message_size {
        return Err(Error::TooLarge {
            size: input.len(),
            limit: options.max_message_size,
        });
    }

    let lines = split_lines(input, options.segment_terminator);
    if lines.is_empty() {
        return Err(Error::EmptyMessage);
    }

    let header = lines[0];
    if !header.starts_with("MSH") {
        let preview: String = header.chars().take(3).collect();
        return Err(Error::MissingHeader(format!(
            "first segment is {:?}, expected MSH",
            preview
        )));
    }

    let delimiters = if options.auto_detect_delimiters {
        Delimiters::detect(header)?
    } else {
        options.delimiters
    };

    let mut diagnostics = ParseDiagnostics {
        warnings: std::mem::take(&mut pre_warnings),
        ..Default::default()
    };
    let mut message = Message::with_delimiters(delimiters);

    let msh = parse_msh_line(header, &delimiters, options.strategy)?;
    message.add_segment(msh);
    diagnostics.segments_parsed += 1;

    for line in lines.iter().skip(1) {
        match parse_segment_line(line, &delimiters, options.strategy) {
            Ok(segment) => {
                note_segment(&segment, options, &mut diagnostics);
                message.add_segment(segment);
                diagnostics.segments_parsed += 1;
            }
            Err(err) => {
                recover_segment(line, err, &delimiters, options, &mut message, &mut diagnostics)?;
            }
        }
    }

    if options.strict_mode {
        check_required_header_fields(&message, &mut diagnostics);
    }

    if options.respect_msh18 || options.validate_encoding {
        let (declared, charset_diags) = charset::resolve_msh18(&message);
        diagnostics.warnings.extend(charset_diags);
        if options.validate_encoding {
            if let Some(declared) = declared {
                let effective = effective_charset.unwrap_or(CharacterSet::Utf8);
                if let Some(diag) = charset::validate_declared(declared, effective) {
                    diagnostics.warnings.push(diag);
                }
            }
        }
    }

    diagnostics.parse_time = started.elapsed();
    Ok(ParseResult {
        message,
        diagnostics,
    })
}

/// Split input into candidate segment lines, discarding empty ones
pub(crate) fn split_lines(input: &str, terminator: SegmentTerminator) -> Vec<&str> {
    let lines: Vec<&str> = match terminator {
        SegmentTerminator::Cr => input.split('\r').collect(),
        SegmentTerminator::Lf => input.split('\n').collect(),
        SegmentTerminator::CrLf => input.split("\r\n").collect(),
        SegmentTerminator::Any => input.split(['\r', '\n']).collect(),
    };
    lines.into_iter().filter(|l| !l.is_empty()).collect()
}

fn make_field(raw: &str, delimiters: Delimiters, strategy: SplitStrategy) -> Field {
    match strategy {
        SplitStrategy::Eager => Field::from_raw_eager(raw, delimiters),
        SplitStrategy::Lazy => Field::from_raw(raw, delimiters),
    }
}

/// Parse the MSH line, materializing MSH-1 and MSH-2 from the delimiters
pub(crate) fn parse_msh_line(
    line: &str,
    delimiters: &Delimiters,
    strategy: SplitStrategy,
) -> Result<Segment> {
    parse_header_line(line, "MSH", delimiters, strategy)
}

/// Parse a delimiter-prefixed header line (MSH, BHS, FHS): fields 1 and
/// 2 are materialized from the delimiter tuple and the wire text after
/// the encoding characters supplies field 3 onwards.
pub(crate) fn parse_header_line(
    line: &str,
    id: &str,
    delimiters: &Delimiters,
    strategy: SplitStrategy,
) -> Result<Segment> {
    let mut segment = Segment::new(id);
    let (f1, f2) = msh_prefix_fields(delimiters);
    segment.add_field(f1);
    segment.add_field(f2);

    // Byte offset of the character after the id + field sep + 4
    // encoding chars; that character, when present, must be the field
    // separator opening field 3.
    match line.char_indices().nth(8) {
        None => Ok(segment),
        Some((idx, ch)) if ch == delimiters.field_sep() => {
            let rest = &line[idx + ch.len_utf8()..];
            for token in rest.split(delimiters.field_sep()) {
                segment.add_field(make_field(token, *delimiters, strategy));
            }
            Ok(segment)
        }
        Some((_, ch)) => Err(Error::malformed(format!(
            "expected field separator after the {} encoding characters, found {:?}",
            id, ch
        ))),
    }
}

/// Parse a non-MSH segment line
pub(crate) fn parse_segment_line(
    line: &str,
    delimiters: &Delimiters,
    strategy: SplitStrategy,
) -> Result<Segment> {
    let sep = delimiters.field_sep();
    let (id, rest) = match line.find(sep) {
        Some(pos) => (&line[..pos], Some(&line[pos + sep.len_utf8()..])),
        None => (line, None),
    };

    validate_segment_id(id)?;

    let mut segment = Segment::new(id);
    if let Some(rest) = rest {
        for token in rest.split(sep) {
            segment.add_field(make_field(token, *delimiters, strategy));
        }
    }
    Ok(segment)
}

/// Warnings attached to a successfully parsed segment
fn note_segment(segment: &Segment, options: &ParserOptions, diagnostics: &mut ParseDiagnostics) {
    if segment.is_custom() {
        if !options.allow_custom_segments {
            diagnostics.warnings.push(
                Diagnostic::warning(
                    codes::CUSTOM_SEGMENT,
                    format!("custom segment {} while custom segments are disallowed", segment.id()),
                )
                .at(Location::segment(segment.id())),
            );
        }
    } else if !is_known_segment_id(segment.id()) {
        diagnostics.warnings.push(
            Diagnostic::warning(
                codes::UNKNOWN_SEGMENT_ID,
                format!("segment id {} is not a known HL7 segment", segment.id()),
            )
            .at(Location::segment(segment.id())),
        );
    }
}

fn recover_segment(
    line: &str,
    err: Error,
    delimiters: &Delimiters,
    options: &ParserOptions,
    message: &mut Message,
    diagnostics: &mut ParseDiagnostics,
) -> Result<()> {
    match options.error_recovery {
        ErrorRecovery::Strict => Err(err),
        ErrorRecovery::SkipInvalid => {
            skip_line(line, &err, diagnostics);
            Ok(())
        }
        ErrorRecovery::BestEffort => {
            // A lowercase or mixed-case id is the one deviation worth
            // repairing; everything else is dropped like skip_invalid.
            if let Some(repaired) = normalize_line(line, delimiters) {
                match parse_segment_line(&repaired, delimiters, options.strategy) {
                    Ok(segment) => {
                        diagnostics.warnings.push(
                            Diagnostic::warning(
                                codes::SEGMENT_NORMALIZED,
                                format!("segment id normalized to {}", segment.id()),
                            )
                            .at(Location::segment(segment.id())),
                        );
                        note_segment(&segment, options, diagnostics);
                        message.add_segment(segment);
                        diagnostics.segments_parsed += 1;
                        return Ok(());
                    }
                    Err(inner) => {
                        skip_line(line, &inner, diagnostics);
                        return Ok(());
                    }
                }
            }
            skip_line(line, &err, diagnostics);
            Ok(())
        }
    }
}

fn skip_line(line: &str, err: &Error, diagnostics: &mut ParseDiagnostics) {
    let preview: String = line.chars().take(16).collect();
    tracing::warn!(error = %err, segment = %preview, "skipping malformed segment");
    diagnostics.errors.push(Diagnostic::error(
        codes::SEGMENT_SKIPPED,
        format!("malformed segment {:?} skipped: {}", preview, err),
    ));
    diagnostics.segments_skipped += 1;
}

/// Uppercase the candidate id when that alone would make it valid
fn normalize_line(line: &str, delimiters: &Delimiters) -> Option<String> {
    let sep = delimiters.field_sep();
    let id_end = line.find(sep).unwrap_or(line.len());
    let id = &line[..id_end];

    let len = id.chars().count();
    if !(2..=3).contains(&len) {
        return None;
    }
    let mut chars = id.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() || !chars.all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }

    let upper = id.to_ascii_uppercase();
    if upper == id {
        return None;
    }
    Some(format!("{}{}", upper, &line[id_end..]))
}

fn check_required_header_fields(message: &Message, diagnostics: &mut ParseDiagnostics) {
    const REQUIRED: &[(usize, &str)] = &[
        (7, "date/time of message"),
        (9, "message type"),
        (10, "message control id"),
        (11, "processing id"),
        (12, "version id"),
    ];

    let Some(msh) = message.msh() else { return };
    for &(index, name) in REQUIRED {
        if msh.field(index).is_empty() {
            diagnostics.warnings.push(
                Diagnostic::warning(
                    codes::EMPTY_REQUIRED_HEADER_FIELD,
                    format!("required header field MSH-{} ({}) is empty", index, name),
                )
                .at(Location::field("MSH", index)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str =
        "MSH|^~\\&|SendApp|SendFac|RecApp|RecFac|20240315143000||ADT^A01|12345|P|2.5\rPID|1|12345|67890^^^MRN|DOE^JOHN^A||19800101|M\rPV1|1|I|Ward^Room^Bed";

    #[test]
    fn test_parse_minimal() {
        let message = parse_message("MSH|^~\\&|A|B|C|D|20240101||ADT^A01|M1|P|2.5").unwrap();
        assert_eq!(message.segment_count(), 1);
        assert_eq!(message.message_type(), Some(("ADT", "A01")));
        assert_eq!(message.control_id(), Some("M1"));
        assert_eq!(message.version().map(|v| v.as_str()), Some("2.5"));
        assert_eq!(*message.delimiters(), Delimiters::STANDARD);
    }

    #[test]
    fn test_parse_multi_segment() {
        let message = parse_message(SAMPLE).unwrap();
        assert_eq!(message.segment_count(), 3);

        let pid = message.first_segment("PID").unwrap();
        assert_eq!(pid.field_value(2), "12345");
        assert_eq!(pid.field(5).component(0).value(), "DOE");
        assert_eq!(pid.field(5).component(1).value(), "JOHN");
        assert_eq!(pid.field(3).subcomponent(0, 3, 0).raw(), "MRN");
    }

    #[test]
    fn test_roundtrip() {
        let message = parse_message(SAMPLE).unwrap();
        assert_eq!(message.encode(), SAMPLE);
    }

    #[test]
    fn test_roundtrip_preserves_escapes() {
        let input = "MSH|^~\\&|A|B|C|D|T||ADT^A01|1|P|2.5\rNTE|1||Systolic \\F\\ diastolic";
        let message = parse_message(input).unwrap();
        assert_eq!(message.encode(), input);
        let nte = message.first_segment("NTE").unwrap();
        assert_eq!(nte.field(3).decoded_value().unwrap(), "Systolic | diastolic");
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse_message(""), Err(Error::EmptyMessage)));
        assert!(matches!(parse_message("\r\r\n"), Err(Error::EmptyMessage)));
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(
            parse_message("PID|1||12345"),
            Err(Error::MissingHeader(_))
        ));
    }

    #[test]
    fn test_non_standard_delimiters_carried() {
        let input = "MSH#!@*%#A#B#C#D#T##ADT!A01#1#P#2.5";
        let message = parse_message(input).unwrap();
        assert_eq!(message.delimiters().field_sep(), '#');
        assert_eq!(message.message_type(), Some(("ADT", "A01")));
        assert_eq!(message.encode(), input);
    }

    #[test]
    fn test_empty_fields_preserved() {
        let message = parse_message("MSH|^~\\&|A||C|D|T||ADT^A01|1|P|2.5\rPID|1||3|4").unwrap();
        let pid = message.first_segment("PID").unwrap();
        assert_eq!(pid.field_value(1), "1");
        assert_eq!(pid.field_value(2), "");
        assert!(pid.has_field(2));
        assert_eq!(pid.field_value(3), "3");
        assert_eq!(message.sending_facility(), None);
    }

    #[test]
    fn test_strict_fails_on_garbage() {
        let input = "MSH|^~\\&|A|B|C|D|T||ADT^A01|1|P|2.5\r!!garbage\rPID|||1";
        assert!(matches!(
            parse_message(input),
            Err(Error::InvalidSegmentId { .. })
        ));
    }

    #[test]
    fn test_skip_invalid_recovers() {
        let input = "MSH|^~\\&|A|B|C|D|T||ADT^A01|1|P|2.5\r!!garbage\rPID|||1";
        let options = ParserOptions::new().error_recovery(ErrorRecovery::SkipInvalid);
        let result = parse_message_with_options(input, &options).unwrap();

        assert_eq!(result.message.segment_count(), 2);
        assert_eq!(result.message.segments()[1].id(), "PID");
        assert_eq!(result.diagnostics.segments_skipped, 1);
        assert_eq!(result.diagnostics.segments_parsed, 2);
        assert!(result
            .diagnostics
            .errors
            .iter()
            .any(|d| d.code == codes::SEGMENT_SKIPPED));
    }

    #[test]
    fn test_best_effort_normalizes_lowercase_id() {
        let input = "MSH|^~\\&|A|B|C|D|T||ADT^A01|1|P|2.5\rpid|1||12345";
        let options = ParserOptions::new().error_recovery(ErrorRecovery::BestEffort);
        let result = parse_message_with_options(input, &options).unwrap();

        assert_eq!(result.message.segment_count(), 2);
        assert_eq!(result.message.segments()[1].id(), "PID");
        assert!(result
            .diagnostics
            .warnings
            .iter()
            .any(|d| d.code == codes::SEGMENT_NORMALIZED));
        assert_eq!(result.diagnostics.segments_skipped, 0);
    }

    #[test]
    fn test_unknown_segment_id_warns() {
        let input = "MSH|^~\\&|A|B|C|D|T||ADT^A01|1|P|2.5\rXYZ|1";
        let result = parse_message_with_options(input, &ParserOptions::default()).unwrap();
        assert!(result
            .diagnostics
            .warnings
            .iter()
            .any(|d| d.code == codes::UNKNOWN_SEGMENT_ID));
    }

    #[test]
    fn test_custom_segment_policy() {
        let input = "MSH|^~\\&|A|B|C|D|T||ADT^A01|1|P|2.5\rZPV|custom";

        let allowed = parse_message_with_options(input, &ParserOptions::default()).unwrap();
        assert!(allowed.diagnostics.warnings.is_empty());

        let options = ParserOptions::new().allow_custom_segments(false);
        let flagged = parse_message_with_options(input, &options).unwrap();
        assert!(flagged
            .diagnostics
            .warnings
            .iter()
            .any(|d| d.code == codes::CUSTOM_SEGMENT));
        // The segment still lands in the tree
        assert_eq!(flagged.message.segment_count(), 2);
    }

    #[test]
    fn test_too_large() {
        let options = ParserOptions::new().max_message_size(10);
        assert!(matches!(
            parse_message_with_options(SAMPLE, &options),
            Err(Error::TooLarge { .. })
        ));
    }

    #[test]
    fn test_strict_mode_header_warnings() {
        let input = "MSH|^~\\&|A|B|C|D|||ADT^A01||P|";
        let options = ParserOptions::new().strict_mode(true);
        let result = parse_message_with_options(input, &options).unwrap();

        let warned: Vec<_> = result
            .diagnostics
            .warnings
            .iter()
            .filter(|d| d.code == codes::EMPTY_REQUIRED_HEADER_FIELD)
            .filter_map(|d| d.location.as_ref())
            .map(|l| l.to_string())
            .collect();
        assert!(warned.contains(&"MSH-7".to_string()));
        assert!(warned.contains(&"MSH-10".to_string()));
        assert!(warned.contains(&"MSH-12".to_string()));
        assert!(!warned.contains(&"MSH-9".to_string()));
    }

    #[test]
    fn test_lazy_strategy_defers_split() {
        let options = ParserOptions::new().strategy(SplitStrategy::Lazy);
        let result = parse_message_with_options(SAMPLE, &options).unwrap();
        let pid = result.message.first_segment("PID").unwrap();
        assert!(!pid.field(5).is_split());
        assert_eq!(pid.field(5).component(1).value(), "JOHN");
        assert!(pid.field(5).is_split());
    }

    #[test]
    fn test_terminator_variants() {
        for (terminator, input) in [
            (SegmentTerminator::Cr, "MSH|^~\\&|A|B|C|D|T||ADT^A01|1|P|2.5\rPID|1"),
            (SegmentTerminator::Lf, "MSH|^~\\&|A|B|C|D|T||ADT^A01|1|P|2.5\nPID|1"),
            (SegmentTerminator::CrLf, "MSH|^~\\&|A|B|C|D|T||ADT^A01|1|P|2.5\r\nPID|1"),
        ] {
            let options = ParserOptions::new().segment_terminator(terminator);
            let result = parse_message_with_options(input, &options).unwrap();
            assert_eq!(result.message.segment_count(), 2, "terminator {:?}", terminator);
        }
        // Any accepts every convention, including mixed
        let mixed = "MSH|^~\\&|A|B|C|D|T||ADT^A01|1|P|2.5\r\nPID|1\rPV1|1\nOBX|1";
        assert_eq!(parse_message(mixed).unwrap().segment_count(), 4);
    }

    #[test]
    fn test_parse_bytes_auto_utf8() {
        let message = parse_message_bytes(SAMPLE.as_bytes()).unwrap();
        assert_eq!(message.segment_count(), 3);
    }

    #[test]
    fn test_parse_bytes_latin1() {
        let bytes = b"MSH|^~\\&|A|B|C|D|T||ADT^A01|1|P|2.5\rPID|1||1||Mu\xF1oz^Jos\xE9";
        let message = parse_message_bytes(bytes).unwrap();
        let pid = message.first_segment("PID").unwrap();
        assert_eq!(pid.field(5).component(0).value(), "Muñoz");
        assert_eq!(pid.field(5).component(1).value(), "José");
    }

    #[test]
    fn test_parse_bytes_utf8_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"MSH|^~\\&|A|B|C|D|T||ADT^A01|1|P|2.5");
        let message = parse_message_bytes(&bytes).unwrap();
        assert_eq!(message.segment_count(), 1);
    }

    #[test]
    fn test_validate_encoding_mismatch_warns() {
        // Declared 8859/1 but the message text is plain UTF-8 input
        let input = "MSH|^~\\&|A|B|C|D|T||ADT^A01|1|P|2.5||||||8859/1";
        let options = ParserOptions::new().validate_encoding(true);
        let result = parse_message_with_options(input, &options).unwrap();
        assert!(result
            .diagnostics
            .warnings
            .iter()
            .any(|d| d.code == codes::ENCODING_MISMATCH));
    }

    #[test]
    fn test_respect_msh18_multiple_sets_warns() {
        let input = "MSH|^~\\&|A|B|C|D|T||ADT^A01|1|P|2.5||||||UNICODE UTF-8~8859/1";
        let options = ParserOptions::new().respect_msh18(true);
        let result = parse_message_with_options(input, &options).unwrap();
        assert!(result
            .diagnostics
            .warnings
            .iter()
            .any(|d| d.code == codes::MULTIPLE_CHARACTER_SETS));
    }

    #[test]
    fn test_msh_only_header_fields() {
        let message = parse_message("MSH|^~\\&").unwrap();
        let msh = message.msh().unwrap();
        assert_eq!(msh.field_value(1), "|");
        assert_eq!(msh.field_value(2), "^~\\&");
        assert_eq!(msh.field_count(), 2);
    }

    #[test]
    fn test_malformed_msh_tail() {
        assert!(matches!(
            parse_message("MSH|^~\\&X|A|B"),
            Err(Error::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_msh_field_numbering() {
        let message = parse_message(SAMPLE).unwrap();
        let msh = message.msh().unwrap();
        assert_eq!(msh.field_value(1), "|");
        assert_eq!(msh.field_value(2), "^~\\&");
        assert_eq!(msh.field_value(3), "SendApp");
        assert_eq!(msh.field_value(9), "ADT^A01");
        assert_eq!(msh.field_value(12), "2.5");
    }
}
