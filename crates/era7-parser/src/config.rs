//! Parser configuration and diagnostics
//!
//! Real-world HL7 feeds deviate from the standard in predictable
//! ways: stray terminators, lowercase segment ids, outright garbage
//! lines. [`ParserOptions`] selects how tolerant the parser is and how
//! the input bytes are interpreted; [`ParseDiagnostics`] reports what
//! was tolerated.

use era7_core::delimiters::Delimiters;
use era7_core::diagnostics::Diagnostic;
use std::time::Duration;

/// Diagnostic codes emitted by the parser
pub mod codes {
    /// A malformed segment was dropped (skip_invalid / best_effort)
    pub const SEGMENT_SKIPPED: &str = "SEGMENT_SKIPPED";
    /// A lowercase segment id was uppercased (best_effort)
    pub const SEGMENT_NORMALIZED: &str = "SEGMENT_NORMALIZED";
    /// Segment id is syntactically valid but not a known HL7 id
    pub const UNKNOWN_SEGMENT_ID: &str = "UNKNOWN_SEGMENT_ID";
    /// Z-segment encountered while custom segments are disallowed
    pub const CUSTOM_SEGMENT: &str = "CUSTOM_SEGMENT";
    /// Required MSH field is empty (strict mode)
    pub const EMPTY_REQUIRED_HEADER_FIELD: &str = "EMPTY_REQUIRED_HEADER_FIELD";
    /// Declared MSH-18 character set disagrees with the decoder used
    pub const ENCODING_MISMATCH: &str = "ENCODING_MISMATCH";
    /// MSH-18 names a character set outside the registry
    pub const UNKNOWN_CHARACTER_SET: &str = "UNKNOWN_CHARACTER_SET";
    /// More than one MSH-18 repetition; only the first is honored
    pub const MULTIPLE_CHARACTER_SETS: &str = "MULTIPLE_CHARACTER_SETS";
    /// Byte decoding substituted replacement characters
    pub const DECODE_REPLACEMENT: &str = "DECODE_REPLACEMENT";
}

/// When the field split into repetitions/components happens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitStrategy {
    /// Split every field while parsing
    #[default]
    Eager,
    /// Defer the split of each field to its first positional access
    Lazy,
}

/// Policy for malformed segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorRecovery {
    /// The first malformed segment fails the whole parse
    #[default]
    Strict,
    /// Malformed segments are dropped with a diagnostic
    SkipInvalid,
    /// Like SkipInvalid, but minor deviations are repaired instead
    BestEffort,
}

/// How segment boundaries are read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SegmentTerminator {
    Cr,
    Lf,
    CrLf,
    /// Accept CR, LF, or CRLF
    #[default]
    Any,
}

/// Source byte interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingHint {
    /// BOM sniffing, then UTF-8 probe, then windows-1252/Latin-1
    #[default]
    Auto,
    Utf8,
    Ascii,
    Latin1,
    Utf16Le,
    Utf16Be,
    Windows1252,
}

/// Default maximum message size (10 MiB)
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// Configuration for the message parser
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Eager or lazy field splitting
    pub strategy: SplitStrategy,
    /// Warn when required MSH fields are empty
    pub strict_mode: bool,
    /// Reject inputs larger than this many bytes
    pub max_message_size: usize,
    /// Accept Z-segments without a diagnostic
    pub allow_custom_segments: bool,
    /// Source byte interpretation for byte inputs
    pub encoding: EncodingHint,
    /// Segment boundary convention
    pub segment_terminator: SegmentTerminator,
    /// Read the delimiters from the MSH header
    pub auto_detect_delimiters: bool,
    /// Delimiters used when auto-detection is off
    pub delimiters: Delimiters,
    /// Policy for malformed segments
    pub error_recovery: ErrorRecovery,
    /// Consult MSH-18 for the effective character set
    pub respect_msh18: bool,
    /// Warn when MSH-18 disagrees with the decoder actually used
    pub validate_encoding: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            strategy: SplitStrategy::Eager,
            strict_mode: false,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            allow_custom_segments: true,
            encoding: EncodingHint::Auto,
            segment_terminator: SegmentTerminator::Any,
            auto_detect_delimiters: true,
            delimiters: Delimiters::STANDARD,
            error_recovery: ErrorRecovery::Strict,
            respect_msh18: false,
            validate_encoding: false,
        }
    }
}

impl ParserOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strategy(mut self, strategy: SplitStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    pub fn max_message_size(mut self, max: usize) -> Self {
        self.max_message_size = max;
        self
    }

    pub fn allow_custom_segments(mut self, allow: bool) -> Self {
        self.allow_custom_segments = allow;
        self
    }

    pub fn encoding(mut self, encoding: EncodingHint) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn segment_terminator(mut self, terminator: SegmentTerminator) -> Self {
        self.segment_terminator = terminator;
        self
    }

    pub fn auto_detect_delimiters(mut self, auto: bool) -> Self {
        self.auto_detect_delimiters = auto;
        self
    }

    pub fn delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = delimiters;
        self
    }

    pub fn error_recovery(mut self, recovery: ErrorRecovery) -> Self {
        self.error_recovery = recovery;
        self
    }

    pub fn respect_msh18(mut self, respect: bool) -> Self {
        self.respect_msh18 = respect;
        self
    }

    pub fn validate_encoding(mut self, validate: bool) -> Self {
        self.validate_encoding = validate;
        self
    }
}

/// What happened during a parse, alongside the tree
#[derive(Debug, Clone, Default)]
pub struct ParseDiagnostics {
    pub warnings: Vec<Diagnostic>,
    pub errors: Vec<Diagnostic>,
    pub segments_parsed: usize,
    pub segments_skipped: usize,
    pub parse_time: Duration,
}

impl ParseDiagnostics {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// All diagnostics in severity-then-source order
    pub fn all(&self) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter().chain(self.warnings.iter())
    }
}

/// A successful parse: the tree plus everything noticed along the way
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub message: era7_core::Message,
    pub diagnostics: ParseDiagnostics,
}
