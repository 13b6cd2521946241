//! Delimiter set declared by the MSH segment

use crate::domain::Hl7Error;
use serde::{Deserialize, Serialize};

/// The five HL7 v2 delimiter characters
///
/// The field separator always comes from the message itself (the character
/// right after `MSH`). The other four are read from MSH-2, which must declare at
/// least the component separator; trailing ones it leaves out fall back to a
/// default set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiters {
    pub field: char,
    pub component: char,
    pub repetition: char,
    pub escape: char,
    pub subcomponent: char,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            field: '|',
            component: '^',
            repetition: '~',
            escape: '\\',
            subcomponent: '&',
        }
    }
}

/// Result of reading the first characters of MSH
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HeaderPrefix<'a> {
    pub delimiters: Delimiters,
    /// MSH-2 exactly as written
    pub encoding_characters: &'a str,
    /// Everything after MSH-2, starting at MSH-3 (without the leading separator)
    pub remainder: Option<&'a str>,
}

impl Delimiters {
    /// Resolve the delimiter set from an MSH line
    ///
    /// `fallback` supplies the component, repetition, escape and sub-component
    /// characters that MSH-2 leaves out; its `field` value is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is not an MSH segment, does not declare a
    /// field separator and at least one encoding character, or declares an
    /// unusable delimiter set.
    pub(crate) fn from_header<'a>(
        line: &'a str,
        fallback: &Delimiters,
    ) -> Result<HeaderPrefix<'a>, Hl7Error> {
        let name: String = line.chars().take(3).collect();
        if name != "MSH" {
            return Err(Hl7Error::MissingHeader { found: name });
        }

        let after_name = &line[3..];
        let field = after_name.chars().next().ok_or(Hl7Error::HeaderTooShort {
            length: line.chars().count(),
        })?;
        check_delimiter_char(field, "field separator")?;

        let after_field = &after_name[field.len_utf8()..];
        let (encoding_characters, remainder) = match after_field.split_once(field) {
            Some((encoding, rest)) => (encoding, Some(rest)),
            None => (after_field, None),
        };

        let declared: Vec<char> = encoding_characters.chars().collect();
        if declared.is_empty() {
            return Err(Hl7Error::HeaderTooShort {
                length: 3 + field.len_utf8(),
            });
        }
        if declared.len() > 5 {
            return Err(Hl7Error::InvalidEncodingCharacters(format!(
                "MSH-2 declares {} characters, at most 5 are allowed",
                declared.len()
            )));
        }

        let pick = |index: usize, default: char| declared.get(index).copied().unwrap_or(default);
        let delimiters = Delimiters {
            field,
            component: pick(0, fallback.component),
            repetition: pick(1, fallback.repetition),
            escape: pick(2, fallback.escape),
            subcomponent: pick(3, fallback.subcomponent),
        };
        delimiters.validate()?;

        Ok(HeaderPrefix {
            delimiters,
            encoding_characters,
            remainder,
        })
    }

    /// Check that the set is usable for splitting
    ///
    /// # Errors
    ///
    /// Returns an error if any delimiter is alphanumeric or whitespace, or if
    /// two delimiters share a character.
    pub fn validate(&self) -> Result<(), Hl7Error> {
        check_distinct(&[
            (self.field, "field separator"),
            (self.component, "component separator"),
            (self.repetition, "repetition separator"),
            (self.escape, "escape character"),
            (self.subcomponent, "sub-component separator"),
        ])
    }

    /// Like [`Delimiters::validate`] but ignores the field separator
    ///
    /// Used for configured fallbacks, whose field value is never applied.
    ///
    /// # Errors
    ///
    /// Returns an error if an encoding character is alphanumeric or
    /// whitespace, or if two of them share a character.
    pub fn validate_encoding(&self) -> Result<(), Hl7Error> {
        check_distinct(&[
            (self.component, "component separator"),
            (self.repetition, "repetition separator"),
            (self.escape, "escape character"),
            (self.subcomponent, "sub-component separator"),
        ])
    }

    /// The four encoding characters in MSH-2 order
    pub fn encoding_characters(&self) -> String {
        [self.component, self.repetition, self.escape, self.subcomponent]
            .iter()
            .collect()
    }
}

fn check_distinct(named: &[(char, &str)]) -> Result<(), Hl7Error> {
    for (index, (ch, label)) in named.iter().enumerate() {
        check_delimiter_char(*ch, label)?;
        if let Some((_, other)) = named[..index].iter().find(|(c, _)| c == ch) {
            return Err(Hl7Error::InvalidEncodingCharacters(format!(
                "{label} '{ch}' is already used as the {other}"
            )));
        }
    }
    Ok(())
}

fn check_delimiter_char(ch: char, label: &str) -> Result<(), Hl7Error> {
    if ch.is_alphanumeric() || ch.is_whitespace() {
        return Err(Hl7Error::InvalidEncodingCharacters(format!(
            "{label} cannot be '{}'",
            ch.escape_debug()
        )));
    }
    Ok(())
}
