//! Incremental streaming parser
//!
//! [`StreamingParser`] accepts arbitrary byte chunks and emits segments
//! as their lines complete, so transports can hand over whatever the
//! socket produced without re-chunking. The instance owns its buffers
//! and is meant for a single feeder; callers serialize `feed`/`next`
//! themselves.
//!
//! ```
//! use era7_parser::streaming::StreamingParser;
//!
//! let mut parser = StreamingParser::new();
//! parser.feed(b"MSH|^~\\&|A|B|C|D|T||ADT^A01|1|P|2.5\rPID|1|").unwrap();
//! parser.feed(b"|12345\r").unwrap();
//! parser.finish().unwrap();
//!
//! assert_eq!(parser.next().unwrap().id(), "MSH");
//! assert_eq!(parser.next().unwrap().id(), "PID");
//! assert!(parser.next().is_none());
//! ```

use crate::charset;
use crate::config::{codes, ErrorRecovery, ParserOptions, SegmentTerminator};
use era7_core::delimiters::Delimiters;
use era7_core::diagnostics::Diagnostic;
use era7_core::error::{Error, Result};
use era7_core::segment::Segment;
use std::collections::VecDeque;

/// Diagnostics accumulated across the life of a streaming parse
#[derive(Debug, Clone, Default)]
pub struct StreamDiagnostics {
    pub warnings: Vec<Diagnostic>,
    pub errors: Vec<Diagnostic>,
    pub segments_parsed: usize,
    pub segments_skipped: usize,
}

/// Incremental segment parser fed by byte chunks
pub struct StreamingParser {
    options: ParserOptions,
    buffer: Vec<u8>,
    queue: VecDeque<Segment>,
    delimiters: Option<Delimiters>,
    header_seen: bool,
    finished: bool,
    diagnostics: StreamDiagnostics,
}

impl StreamingParser {
    /// Create a streaming parser with default options
    pub fn new() -> Self {
        Self::with_options(ParserOptions::default())
    }

    pub fn with_options(options: ParserOptions) -> Self {
        Self {
            options,
            buffer: Vec::new(),
            queue: VecDeque::new(),
            delimiters: None,
            header_seen: false,
            finished: false,
            diagnostics: StreamDiagnostics::default(),
        }
    }

    /// Append a chunk and parse any segment lines it completes
    ///
    /// In strict recovery a malformed segment fails on the `feed` that
    /// completes it. Feeding after [`finish`](Self::finish) fails with
    /// [`Error::AfterFinish`]; the guard on total buffered bytes fails
    /// with [`Error::TooLarge`].
    pub fn feed(&mut self, bytes: &[u8]) -> Result<()> {
        if self.finished {
            return Err(Error::AfterFinish);
        }

        self.buffer.extend_from_slice(bytes);
        if self.buffer.len() > self.options.max_message_size {
            return Err(Error::TooLarge {
                size: self.buffer.len(),
                limit: self.options.max_message_size,
            });
        }

        self.drain_complete_lines()
    }

    /// Dequeue the next completed segment
    pub fn next(&mut self) -> Option<Segment> {
        self.queue.pop_front()
    }

    /// Flush a trailing unterminated line and close the stream
    ///
    /// Idempotent: calling `finish` again is a no-op.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        let mut rest = std::mem::take(&mut self.buffer);
        // A held-back trailing CR (or stray final terminator) is a real
        // line end now that no more bytes can arrive.
        while matches!(rest.last(), Some(b'\r') | Some(b'\n')) {
            rest.pop();
        }
        if !rest.is_empty() {
            self.handle_line_bytes(&rest)?;
        }
        Ok(())
    }

    /// Discard all state and return to the initial configuration
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.queue.clear();
        self.delimiters = None;
        self.header_seen = false;
        self.finished = false;
        self.diagnostics = StreamDiagnostics::default();
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Delimiters, once the MSH header line has completed
    pub fn delimiters(&self) -> Option<&Delimiters> {
        self.delimiters.as_ref()
    }

    pub fn diagnostics(&self) -> &StreamDiagnostics {
        &self.diagnostics
    }

    /// Number of segments parsed but not yet taken with `next`
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn drain_complete_lines(&mut self) -> Result<()> {
        loop {
            let Some((line_end, skip)) = self.find_terminator() else {
                return Ok(());
            };
            let line: Vec<u8> = self.buffer.drain(..line_end + skip).take(line_end).collect();
            if !line.is_empty() {
                self.handle_line_bytes(&line)?;
            }
        }
    }

    /// Locate the next terminator: returns (line length, terminator length)
    ///
    /// A CR as the very last buffered byte is left alone under the Any
    /// and CrLf conventions, because the next chunk may start with the
    /// LF that completes a CRLF pair.
    fn find_terminator(&self) -> Option<(usize, usize)> {
        let buf = &self.buffer;
        match self.options.segment_terminator {
            SegmentTerminator::Cr => buf.iter().position(|&b| b == b'\r').map(|i| (i, 1)),
            SegmentTerminator::Lf => buf.iter().position(|&b| b == b'\n').map(|i| (i, 1)),
            SegmentTerminator::CrLf => buf
                .windows(2)
                .position(|w| w == [b'\r', b'\n'])
                .map(|i| (i, 2)),
            SegmentTerminator::Any => {
                for (i, &b) in buf.iter().enumerate() {
                    if b == b'\n' {
                        return Some((i, 1));
                    }
                    if b == b'\r' {
                        if i + 1 < buf.len() {
                            let skip = if buf[i + 1] == b'\n' { 2 } else { 1 };
                            return Some((i, skip));
                        }
                        // Trailing CR: wait for the next chunk
                        return None;
                    }
                }
                None
            }
        }
    }

    fn handle_line_bytes(&mut self, line: &[u8]) -> Result<()> {
        let (text, _, decode_diags) = charset::decode_bytes(line, self.options.encoding);
        self.diagnostics.warnings.extend(decode_diags);
        self.handle_line(&text)
    }

    fn handle_line(&mut self, line: &str) -> Result<()> {
        if !self.header_seen {
            if !line.starts_with("MSH") {
                let preview: String = line.chars().take(3).collect();
                return Err(Error::MissingHeader(format!(
                    "first segment is {:?}, expected MSH",
                    preview
                )));
            }
            let delimiters = if self.options.auto_detect_delimiters {
                Delimiters::detect(line)?
            } else {
                self.options.delimiters
            };
            let msh = crate::parse_msh_line(line, &delimiters, self.options.strategy)?;
            self.delimiters = Some(delimiters);
            self.header_seen = true;
            self.queue.push_back(msh);
            self.diagnostics.segments_parsed += 1;
            return Ok(());
        }

        let delimiters = self.delimiters.unwrap_or(self.options.delimiters);
        match crate::parse_segment_line(line, &delimiters, self.options.strategy) {
            Ok(segment) => {
                self.queue.push_back(segment);
                self.diagnostics.segments_parsed += 1;
                Ok(())
            }
            Err(err) => match self.options.error_recovery {
                ErrorRecovery::Strict => Err(err),
                ErrorRecovery::SkipInvalid | ErrorRecovery::BestEffort => {
                    let preview: String = line.chars().take(16).collect();
                    tracing::warn!(error = %err, segment = %preview, "skipping malformed segment in stream");
                    self.diagnostics.errors.push(Diagnostic::error(
                        codes::SEGMENT_SKIPPED,
                        format!("malformed segment {:?} skipped: {}", preview, err),
                    ));
                    self.diagnostics.segments_skipped += 1;
                    Ok(())
                }
            },
        }
    }
}

impl Default for StreamingParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_message;

    const SAMPLE: &str =
        "MSH|^~\\&|A|B|C|D|20240101||ADT^A01|M1|P|2.5\rPID|1||12345||Smith^John";

    #[test]
    fn test_single_feed() {
        let mut parser = StreamingParser::new();
        parser.feed(SAMPLE.as_bytes()).unwrap();
        parser.finish().unwrap();

        let msh = parser.next().unwrap();
        assert_eq!(msh.id(), "MSH");
        let pid = parser.next().unwrap();
        assert_eq!(pid.id(), "PID");
        assert_eq!(pid.field(5).component(0).value(), "Smith");
        assert!(parser.next().is_none());
    }

    #[test]
    fn test_byte_at_a_time_matches_whole_parse() {
        let mut parser = StreamingParser::new();
        for byte in SAMPLE.as_bytes() {
            parser.feed(std::slice::from_ref(byte)).unwrap();
        }
        parser.finish().unwrap();

        let whole = parse_message(SAMPLE).unwrap();
        let mut streamed = Vec::new();
        while let Some(segment) = parser.next() {
            streamed.push(segment);
        }

        assert_eq!(streamed.len(), whole.segment_count());
        for (streamed_seg, whole_seg) in streamed.iter().zip(whole.segments()) {
            assert_eq!(streamed_seg, whole_seg);
        }
        assert!(parser.diagnostics().errors.is_empty());
    }

    #[test]
    fn test_segments_available_before_finish() {
        let mut parser = StreamingParser::new();
        parser.feed(b"MSH|^~\\&|A|B|C|D|T||ADT^A01|1|P|2.5\rPID|1\rPV1|").unwrap();

        // Two complete lines are already parseable
        assert_eq!(parser.pending(), 2);
        assert_eq!(parser.next().unwrap().id(), "MSH");
        assert_eq!(parser.next().unwrap().id(), "PID");
        assert!(parser.next().is_none());

        parser.feed(b"1|I\n").unwrap();
        assert_eq!(parser.next().unwrap().id(), "PV1");
    }

    #[test]
    fn test_feed_after_finish() {
        let mut parser = StreamingParser::new();
        parser.feed(b"MSH|^~\\&|A|B|C|D|T||ADT^A01|1|P|2.5\r").unwrap();
        parser.finish().unwrap();
        assert!(matches!(parser.feed(b"PID|1"), Err(Error::AfterFinish)));
    }

    #[test]
    fn test_finish_idempotent() {
        let mut parser = StreamingParser::new();
        parser.feed(b"MSH|^~\\&|A|B|C|D|T||ADT^A01|1|P|2.5").unwrap();
        parser.finish().unwrap();
        parser.finish().unwrap();
        assert!(parser.is_finished());
        assert_eq!(parser.next().unwrap().id(), "MSH");
    }

    #[test]
    fn test_reset() {
        let mut parser = StreamingParser::new();
        parser.feed(b"MSH|^~\\&|A|B|C|D|T||ADT^A01|1|P|2.5\r").unwrap();
        parser.finish().unwrap();
        parser.reset();

        assert!(!parser.is_finished());
        assert!(parser.next().is_none());
        assert!(parser.delimiters().is_none());
        parser.feed(b"MSH|^~\\&|X|Y|Z|W|T||ORU^R01|2|P|2.5\n").unwrap();
        assert_eq!(parser.next().unwrap().id(), "MSH");
    }

    #[test]
    fn test_missing_header() {
        let mut parser = StreamingParser::new();
        assert!(matches!(
            parser.feed(b"PID|1||12345\n"),
            Err(Error::MissingHeader(_))
        ));
    }

    #[test]
    fn test_strict_error_on_completing_feed() {
        let mut parser = StreamingParser::new();
        parser.feed(b"MSH|^~\\&|A|B|C|D|T||ADT^A01|1|P|2.5\r!!gar").unwrap();
        // The malformed line is still incomplete, so no error yet
        assert!(matches!(
            parser.feed(b"bage\n"),
            Err(Error::InvalidSegmentId { .. })
        ));
    }

    #[test]
    fn test_skip_invalid_stream() {
        let options = ParserOptions::new().error_recovery(ErrorRecovery::SkipInvalid);
        let mut parser = StreamingParser::with_options(options);
        parser
            .feed(b"MSH|^~\\&|A|B|C|D|T||ADT^A01|1|P|2.5\r!!garbage\rPID|||1\r")
            .unwrap();
        parser.finish().unwrap();

        assert_eq!(parser.next().unwrap().id(), "MSH");
        assert_eq!(parser.next().unwrap().id(), "PID");
        assert!(parser.next().is_none());
        assert_eq!(parser.diagnostics().segments_skipped, 1);
    }

    #[test]
    fn test_max_buffered_bytes() {
        let options = ParserOptions::new().max_message_size(32);
        let mut parser = StreamingParser::with_options(options);
        assert!(matches!(
            parser.feed(&[b'A'; 64]),
            Err(Error::TooLarge { .. })
        ));
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        let mut parser = StreamingParser::new();
        parser.feed(b"MSH|^~\\&|A|B|C|D|T||ADT^A01|1|P|2.5\r").unwrap();
        // The CR is held back until we know whether an LF follows
        assert_eq!(parser.pending(), 0);
        parser.feed(b"\nPID|1").unwrap();
        assert_eq!(parser.pending(), 1);
        parser.finish().unwrap();

        assert_eq!(parser.next().unwrap().id(), "MSH");
        assert_eq!(parser.next().unwrap().id(), "PID");
        assert!(parser.next().is_none());
    }

    #[test]
    fn test_delimiters_exposed_after_header() {
        let mut parser = StreamingParser::new();
        assert!(parser.delimiters().is_none());
        parser.feed(b"MSH#!@*%#A#B\n").unwrap();
        assert_eq!(parser.delimiters().unwrap().field_sep(), '#');
    }

    #[test]
    fn test_custom_delimiter_segments() {
        let mut parser = StreamingParser::new();
        parser.feed(b"MSH#!@*%#A#B#C#D#T##ADT!A01#1#P#2.5\rPID#1##12345\r").unwrap();
        parser.finish().unwrap();
        parser.next().unwrap();
        let pid = parser.next().unwrap();
        assert_eq!(pid.field_value(3), "12345");
    }
}
