//! HL7 escape sequence decoding
//!
//! Unknown or malformed sequences are kept verbatim rather than rejected.

use super::delimiters::Delimiters;
use std::borrow::Cow;

/// Decode the escape sequences in a single leaf value
///
/// Supported sequences:
/// - `\F\` `\S\` `\T\` `\R\` `\E\` - field, component, sub-component,
///   repetition and escape characters
/// - `\.br\` - line break (`\n`)
/// - `\Xhh...\` - hex-encoded bytes, decoded as UTF-8
///
/// # Examples
///
/// ```
/// use hl7stage::hl7::{escape::unescape, Delimiters};
///
/// let d = Delimiters::default();
/// assert_eq!(unescape("Smith\\S\\Jones", &d), "Smith^Jones");
/// assert_eq!(unescape("\\H\\bold\\N\\", &d), "\\H\\bold\\N\\");
/// ```
pub fn unescape<'a>(input: &'a str, delimiters: &Delimiters) -> Cow<'a, str> {
    let escape = delimiters.escape;
    if !input.contains(escape) {
        return Cow::Borrowed(input);
    }

    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find(escape) {
        output.push_str(&rest[..start]);
        let after_open = &rest[start + escape.len_utf8()..];

        let Some(end) = after_open.find(escape) else {
            // Unterminated: keep the remainder as written
            output.push_str(&rest[start..]);
            return Cow::Owned(output);
        };

        let body = &after_open[..end];
        match decode_sequence(body, delimiters) {
            Some(decoded) => output.push_str(&decoded),
            None => {
                output.push(escape);
                output.push_str(body);
                output.push(escape);
            }
        }
        rest = &after_open[end + escape.len_utf8()..];
    }

    output.push_str(rest);
    Cow::Owned(output)
}

fn decode_sequence(body: &str, delimiters: &Delimiters) -> Option<String> {
    match body {
        "F" => Some(delimiters.field.to_string()),
        "S" => Some(delimiters.component.to_string()),
        "T" => Some(delimiters.subcomponent.to_string()),
        "R" => Some(delimiters.repetition.to_string()),
        "E" => Some(delimiters.escape.to_string()),
        ".br" => Some("\n".to_string()),
        _ => body.strip_prefix('X').and_then(decode_hex),
    }
}

fn decode_hex(digits: &str) -> Option<String> {
    if digits.is_empty() || digits.len() % 2 != 0 {
        return None;
    }

    let bytes = (0..digits.len())
        .step_by(2)
        .map(|i| digits.get(i..i + 2).and_then(|pair| u8::from_str_radix(pair, 16).ok()))
        .collect::<Option<Vec<u8>>>()?;

    Some(String::from_utf8_lossy(&bytes).into_owned())
}
