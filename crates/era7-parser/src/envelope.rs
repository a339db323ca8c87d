//! Batch and file envelope parsing
//!
//! Recognizes the BHS/BTS and FHS/FTS framing segments and partitions
//! the enclosed lines into messages, reusing the segment parser for
//! every line. A missing header or trailer is an
//! [`Error::InvalidEnvelope`]; a trailer count that disagrees with the
//! actual content is logged and left to
//! [`Batch::count_consistent`]/[`File::count_consistent`].

use crate::config::{ParserOptions, SegmentTerminator};
use crate::{parse_message_with_options, split_lines};
use era7_core::batch::{Batch, BatchHeader, BatchTrailer, File, FileHeader, FileTrailer};
use era7_core::delimiters::Delimiters;
use era7_core::error::{Error, Result};
use era7_core::message::Message;

/// Parse a batch (BHS ... BTS) with default options
pub fn parse_batch(input: &str) -> Result<Batch> {
    parse_batch_with_options(input, &ParserOptions::default())
}

pub fn parse_batch_with_options(input: &str, options: &ParserOptions) -> Result<Batch> {
    let lines = split_lines(input, options.segment_terminator);
    if lines.is_empty() {
        return Err(Error::EmptyMessage);
    }

    let mut cursor = Cursor::new(&lines, options);
    let batch = cursor.parse_batch()?;
    cursor.expect_end()?;
    Ok(batch)
}

/// Parse a file (FHS ... FTS) with default options
pub fn parse_file(input: &str) -> Result<File> {
    parse_file_with_options(input, &ParserOptions::default())
}

pub fn parse_file_with_options(input: &str, options: &ParserOptions) -> Result<File> {
    let lines = split_lines(input, options.segment_terminator);
    if lines.is_empty() {
        return Err(Error::EmptyMessage);
    }

    let mut cursor = Cursor::new(&lines, options);
    let file = cursor.parse_file()?;
    cursor.expect_end()?;
    Ok(file)
}

/// Read delimiters from an envelope header line (`BHS`/`FHS` share the
/// MSH layout: the five delimiter characters follow the id).
fn envelope_delimiters(line: &str) -> Result<Delimiters> {
    let chars: Vec<char> = line.chars().skip(3).take(5).collect();
    if chars.len() < 5 {
        return Err(Error::InvalidEnvelope(format!(
            "envelope header {:?} too short to carry delimiters",
            line.chars().take(8).collect::<String>()
        )));
    }
    Delimiters::new(chars[0], chars[1], chars[2], chars[3], chars[4])
}

struct Cursor<'a> {
    lines: &'a [&'a str],
    position: usize,
    options: &'a ParserOptions,
}

impl<'a> Cursor<'a> {
    fn new(lines: &'a [&'a str], options: &'a ParserOptions) -> Self {
        Self {
            lines,
            position: 0,
            options,
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.position).copied()
    }

    fn advance(&mut self) -> Option<&'a str> {
        let line = self.peek()?;
        self.position += 1;
        Some(line)
    }

    fn expect_end(&self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(line) => Err(Error::InvalidEnvelope(format!(
                "unexpected content after trailer: {:?}",
                line.chars().take(16).collect::<String>()
            ))),
        }
    }

    /// Collect one message's lines: an MSH line plus everything up to
    /// the next framing boundary.
    fn parse_inner_message(&mut self) -> Result<Message> {
        let start = self.position;
        debug_assert!(self.peek().is_some_and(|l| l.starts_with("MSH")));
        self.advance();

        while let Some(line) = self.peek() {
            if starts_boundary(line) {
                break;
            }
            self.advance();
        }

        let text = self.lines[start..self.position].join("\r");
        let mut options = self.options.clone();
        options.segment_terminator = SegmentTerminator::Cr;
        parse_message_with_options(&text, &options).map(|r| r.message)
    }

    fn parse_batch(&mut self) -> Result<Batch> {
        let header_line = self
            .advance()
            .filter(|l| l.starts_with("BHS"))
            .ok_or_else(|| Error::InvalidEnvelope("batch must begin with BHS".to_string()))?;
        let delimiters = envelope_delimiters(header_line)?;
        let header_segment =
            crate::parse_header_line(header_line, "BHS", &delimiters, self.options.strategy)?;
        let header = BatchHeader::from_segment(&header_segment);

        let mut messages = Vec::new();
        let trailer_line = loop {
            match self.peek() {
                Some(line) if line.starts_with("MSH") => {
                    messages.push(self.parse_inner_message()?);
                }
                Some(line) if line.starts_with("BTS") => {
                    self.advance();
                    break line;
                }
                Some(line) => {
                    return Err(Error::InvalidEnvelope(format!(
                        "unexpected segment {:?} inside batch",
                        line.chars().take(8).collect::<String>()
                    )));
                }
                None => {
                    return Err(Error::InvalidEnvelope(
                        "batch is not closed by a BTS trailer".to_string(),
                    ));
                }
            }
        };

        let trailer_segment =
            crate::parse_segment_line(trailer_line, &delimiters, self.options.strategy)?;
        let trailer = BatchTrailer::from_segment(&trailer_segment);

        let batch = Batch {
            header,
            messages,
            trailer,
        };
        if !batch.count_consistent() {
            tracing::warn!(
                declared = ?batch.trailer.message_count,
                actual = batch.messages.len(),
                "BTS message count disagrees with batch content"
            );
        }
        Ok(batch)
    }

    fn parse_file(&mut self) -> Result<File> {
        let header_line = self
            .advance()
            .filter(|l| l.starts_with("FHS"))
            .ok_or_else(|| Error::InvalidEnvelope("file must begin with FHS".to_string()))?;
        let delimiters = envelope_delimiters(header_line)?;
        let header_segment =
            crate::parse_header_line(header_line, "FHS", &delimiters, self.options.strategy)?;
        let header = FileHeader::from_segment(&header_segment);

        let mut batches = Vec::new();
        let mut messages = Vec::new();
        let trailer_line = loop {
            match self.peek() {
                Some(line) if line.starts_with("BHS") => {
                    batches.push(self.parse_batch()?);
                }
                Some(line) if line.starts_with("MSH") => {
                    messages.push(self.parse_inner_message()?);
                }
                Some(line) if line.starts_with("FTS") => {
                    self.advance();
                    break line;
                }
                Some(line) => {
                    return Err(Error::InvalidEnvelope(format!(
                        "unexpected segment {:?} inside file",
                        line.chars().take(8).collect::<String>()
                    )));
                }
                None => {
                    return Err(Error::InvalidEnvelope(
                        "file is not closed by an FTS trailer".to_string(),
                    ));
                }
            }
        };

        let trailer_segment =
            crate::parse_segment_line(trailer_line, &delimiters, self.options.strategy)?;
        let trailer = FileTrailer::from_segment(&trailer_segment);

        let file = File {
            header,
            batches,
            messages,
            trailer,
        };
        if !file.count_consistent() {
            tracing::warn!(
                declared = ?file.trailer.batch_count,
                actual = file.batches.len(),
                "FTS batch count disagrees with file content"
            );
        }
        Ok(file)
    }
}

fn starts_boundary(line: &str) -> bool {
    line.starts_with("MSH")
        || line.starts_with("BHS")
        || line.starts_with("BTS")
        || line.starts_with("FHS")
        || line.starts_with("FTS")
}

#[cfg(test)]
mod tests {
    use super::*;

    const BATCH: &str = "BHS|^~\\&|LAB|FAC|REC|DEST|20240101120000|||B001\r\
MSH|^~\\&|LAB|FAC|REC|DEST|20240101||ORU^R01|M1|P|2.5\rPID|1||111\rOBX|1|NM|WBC||7.5\r\
MSH|^~\\&|LAB|FAC|REC|DEST|20240101||ORU^R01|M2|P|2.5\rPID|1||222\r\
BTS|2";

    #[test]
    fn test_parse_batch() {
        let batch = parse_batch(BATCH).unwrap();
        assert_eq!(batch.messages.len(), 2);
        assert_eq!(batch.header.0.sending_application.as_deref(), Some("LAB"));
        assert_eq!(batch.header.0.control_id.as_deref(), Some("B001"));
        assert_eq!(batch.trailer.message_count, Some(2));
        assert!(batch.count_consistent());

        assert_eq!(batch.messages[0].control_id(), Some("M1"));
        assert_eq!(batch.messages[0].segment_count(), 3);
        assert_eq!(batch.messages[1].control_id(), Some("M2"));
    }

    #[test]
    fn test_missing_bhs() {
        let input = "MSH|^~\\&|A|B|C|D|T||ORU^R01|1|P|2.5\rBTS|1";
        assert!(matches!(parse_batch(input), Err(Error::InvalidEnvelope(_))));
    }

    #[test]
    fn test_missing_bts() {
        let input = "BHS|^~\\&|LAB|FAC\rMSH|^~\\&|A|B|C|D|T||ORU^R01|1|P|2.5";
        assert!(matches!(parse_batch(input), Err(Error::InvalidEnvelope(_))));
    }

    #[test]
    fn test_count_mismatch_is_not_an_error() {
        let input = "BHS|^~\\&|LAB\rMSH|^~\\&|A|B|C|D|T||ORU^R01|1|P|2.5\rBTS|5";
        let batch = parse_batch(input).unwrap();
        assert_eq!(batch.messages.len(), 1);
        assert!(!batch.count_consistent());
    }

    #[test]
    fn test_parse_file_with_batches() {
        let input = format!(
            "FHS|^~\\&|LAB|FAC|REC|DEST|20240101120000|||F001\r{}\rFTS|1",
            BATCH
        );
        let file = parse_file(&input).unwrap();
        assert_eq!(file.batches.len(), 1);
        assert_eq!(file.messages.len(), 0);
        assert_eq!(file.batches[0].messages.len(), 2);
        assert_eq!(file.trailer.batch_count, Some(1));
        assert!(file.count_consistent());
    }

    #[test]
    fn test_parse_file_with_loose_messages() {
        let input = "FHS|^~\\&|LAB\r\
MSH|^~\\&|A|B|C|D|T||ADT^A01|1|P|2.5\rPID|1||333\r\
FTS|0";
        let file = parse_file(input).unwrap();
        assert_eq!(file.batches.len(), 0);
        assert_eq!(file.messages.len(), 1);
        assert_eq!(file.messages[0].first_segment("PID").unwrap().field_value(3), "333");
    }

    #[test]
    fn test_missing_fts() {
        let input = "FHS|^~\\&|LAB\rMSH|^~\\&|A|B|C|D|T||ADT^A01|1|P|2.5";
        assert!(matches!(parse_file(input), Err(Error::InvalidEnvelope(_))));
    }

    #[test]
    fn test_content_after_trailer_rejected() {
        let input = "BHS|^~\\&|LAB\rMSH|^~\\&|A|B|C|D|T||ADT^A01|1|P|2.5\rBTS|1\rPID|1";
        assert!(matches!(parse_batch(input), Err(Error::InvalidEnvelope(_))));
    }

    #[test]
    fn test_envelope_roundtrip() {
        let batch = parse_batch(BATCH).unwrap();
        let encoded = batch.encode(&Delimiters::STANDARD);
        let reparsed = parse_batch(&encoded).unwrap();
        assert_eq!(reparsed.messages, batch.messages);
        assert_eq!(reparsed.trailer, batch.trailer);
    }
}
