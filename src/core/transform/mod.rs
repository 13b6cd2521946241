//! JSON projection of parsed HL7 messages
//!
//! Each segment becomes an object keyed by 1-based field number. A segment
//! name that occurs once maps to that object; a name that repeats maps to an
//! array of objects in message order.
//!
//! - [`collapse`] - singleton collapse of field trees

pub mod collapse;

use crate::hl7::{ParsedMessage, Segment};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

pub use collapse::collapse;

/// Projected JSON form of one message
#[derive(Debug, Clone, PartialEq)]
pub struct JsonDocument {
    value: Value,
}

impl JsonDocument {
    /// Underlying JSON value
    pub fn as_value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Projection for a segment name, either an object or an array of objects
    pub fn segment(&self, name: &str) -> Option<&Value> {
        self.value.get(name)
    }

    /// Serialize to the canonical byte form written to the outbound store
    ///
    /// Pretty-printed with two-space indentation and a trailing newline. Key
    /// order follows message order, so identical input yields identical bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut bytes = serde_json::to_vec_pretty(&self.value)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Hex-encoded SHA-256 of the canonical bytes
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn digest(&self) -> Result<String, serde_json::Error> {
        Ok(digest_bytes(&self.to_canonical_bytes()?))
    }
}

/// Hex-encoded SHA-256 of arbitrary bytes
pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Project a parsed message into its JSON document
///
/// Every instance of a segment name carries keys `"1"` through the highest
/// field number seen on any instance of that name; missing trailing fields
/// are filled with `""`.
///
/// # Examples
///
/// ```
/// use hl7stage::core::transform::project;
/// use hl7stage::hl7::parse;
/// use serde_json::json;
///
/// let message = parse(b"MSH|^~\\&|APP\rPID|1||12345^^^MRN||Doe^John").unwrap();
/// let document = project(&message);
///
/// assert_eq!(document.segment("PID").unwrap()["3"], json!(["12345", "", "", "MRN"]));
/// assert_eq!(document.segment("PID").unwrap()["5"], json!(["Doe", "John"]));
/// ```
pub fn project(message: &ParsedMessage) -> JsonDocument {
    let mut groups: Vec<(&str, Vec<&Segment>)> = Vec::new();
    for segment in &message.segments {
        match groups.iter_mut().find(|(name, _)| *name == segment.name) {
            Some((_, members)) => members.push(segment),
            None => groups.push((segment.name.as_str(), vec![segment])),
        }
    }

    let mut root = Map::with_capacity(groups.len());
    for (name, members) in groups {
        let width = members
            .iter()
            .map(|s| s.field_count())
            .max()
            .unwrap_or_default();

        let mut objects: Vec<Value> = members
            .into_iter()
            .map(|segment| project_segment(segment, width))
            .collect();

        let projected = if objects.len() == 1 {
            objects.remove(0)
        } else {
            Value::Array(objects)
        };
        root.insert(name.to_string(), projected);
    }

    JsonDocument {
        value: Value::Object(root),
    }
}

fn project_segment(segment: &Segment, width: usize) -> Value {
    let fields = (1..=width)
        .map(|number| {
            let value = segment
                .field(number)
                .map(collapse)
                .unwrap_or_else(|| Value::String(String::new()));
            (number.to_string(), value)
        })
        .collect::<Map<String, Value>>();
    Value::Object(fields)
}
