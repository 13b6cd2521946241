//! HL7 v2 message parser
//!
//! Turns raw pipe-and-hat text into a [`ParsedMessage`]. Parsing is pure:
//! the same bytes always produce the same structure.

use super::delimiters::Delimiters;
use super::escape::unescape;
use super::message::{MessageHeader, Node, ParsedMessage, Segment};
use crate::domain::Hl7Error;
use std::borrow::Cow;

const UTF8_BOM: char = '\u{feff}';

/// HL7 v2 parser
///
/// Holds the delimiter defaults applied when MSH-2 leaves characters out.
///
/// # Examples
///
/// ```
/// use hl7stage::hl7::Hl7Parser;
///
/// let raw = b"MSH|^~\\&|APP|FAC|||20230101||ADT^A01|MSG001|P|2.3\rPID|1||12345^^^MRN||Doe^John";
/// let message = Hl7Parser::new().parse(raw).unwrap();
///
/// assert_eq!(message.segments.len(), 2);
/// assert_eq!(message.control_id(), Some("MSG001"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Hl7Parser {
    defaults: Delimiters,
}

impl Hl7Parser {
    /// Parser using the standard `|^~\&` defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser with custom fallbacks for missing encoding characters
    pub fn with_defaults(defaults: Delimiters) -> Self {
        Self { defaults }
    }

    /// Delimiter fallbacks used by this parser
    pub fn defaults(&self) -> &Delimiters {
        &self.defaults
    }

    /// Parse raw message bytes
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns an [`Hl7Error`] if the message is empty, does not start with a
    /// usable MSH segment, or contains a segment without a valid name.
    pub fn parse(&self, raw: &[u8]) -> Result<ParsedMessage, Hl7Error> {
        let text = String::from_utf8_lossy(raw);
        if matches!(text, Cow::Owned(_)) {
            tracing::warn!(
                bytes = raw.len(),
                "Message contains invalid UTF-8, replacing undecodable bytes"
            );
        }
        self.parse_str(&text)
    }

    /// Parse an already decoded message
    ///
    /// # Errors
    ///
    /// See [`Hl7Parser::parse`].
    pub fn parse_str(&self, text: &str) -> Result<ParsedMessage, Hl7Error> {
        let text = text.trim_start_matches(|c: char| c == UTF8_BOM || c.is_whitespace());
        let mut lines = split_segments(text);

        let header_line = lines.next().ok_or(Hl7Error::Empty)?;
        let header = Delimiters::from_header(header_line, &self.defaults)?;
        let delimiters = header.delimiters;

        let mut msh_fields = vec![
            Node::leaf(delimiters.field.to_string()),
            Node::leaf(header.encoding_characters),
        ];
        if let Some(remainder) = header.remainder {
            msh_fields.extend(
                remainder
                    .split(delimiters.field)
                    .map(|raw| parse_field(raw, &delimiters)),
            );
        }
        let msh = Segment {
            name: "MSH".to_string(),
            fields: msh_fields,
        };
        let message_header = MessageHeader::from_msh(&msh);

        let mut segments = vec![msh];
        for (offset, line) in lines.enumerate() {
            segments.push(parse_segment(line, offset + 2, &delimiters)?);
        }

        tracing::debug!(
            segment_count = segments.len(),
            control_id = message_header.control_id.as_deref().unwrap_or(""),
            "Parsed HL7 message"
        );

        Ok(ParsedMessage {
            segments,
            delimiters,
            header: message_header,
        })
    }
}

/// Parse with the standard delimiter defaults
///
/// # Errors
///
/// See [`Hl7Parser::parse`].
pub fn parse(raw: &[u8]) -> Result<ParsedMessage, Hl7Error> {
    Hl7Parser::new().parse(raw)
}

/// Split on CR, LF or CRLF, dropping blank pieces
fn split_segments(text: &str) -> impl Iterator<Item = &str> {
    text.split(['\r', '\n'])
        .filter(|line| !line.trim().is_empty())
}

fn parse_segment(line: &str, position: usize, delimiters: &Delimiters) -> Result<Segment, Hl7Error> {
    let mut parts = line.split(delimiters.field);
    let name = parts.next().unwrap_or_default();

    if name.len() != 3 || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Hl7Error::InvalidSegmentName {
            position,
            name: name.to_string(),
        });
    }

    Ok(Segment {
        name: name.to_string(),
        fields: parts.map(|raw| parse_field(raw, delimiters)).collect(),
    })
}

fn parse_field(raw: &str, delimiters: &Delimiters) -> Node {
    Node::List(
        raw.split(delimiters.repetition)
            .map(|repetition| {
                Node::List(
                    repetition
                        .split(delimiters.component)
                        .map(|component| {
                            Node::List(
                                component
                                    .split(delimiters.subcomponent)
                                    .map(|sub| Node::leaf(unescape(sub, delimiters)))
                                    .collect(),
                            )
                        })
                        .collect(),
                )
            })
            .collect(),
    )
}
