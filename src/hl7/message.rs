//! Structured representation of a parsed HL7 v2 message

use super::delimiters::Delimiters;
use serde::{Deserialize, Serialize};

/// One level of the field / repetition / component / sub-component nesting
///
/// A parsed field is always `List(repetitions)`, each repetition is
/// `List(components)`, each component is `List(sub-components)` and each
/// sub-component is a `Leaf`. MSH-1 and MSH-2 are stored as bare leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    Leaf(String),
    List(Vec<Node>),
}

impl Node {
    /// Create a leaf node
    pub fn leaf(value: impl Into<String>) -> Self {
        Node::Leaf(value.into())
    }

    /// Child at a 0-based index, `None` for leaves
    pub fn child(&self, index: usize) -> Option<&Node> {
        match self {
            Node::Leaf(_) => None,
            Node::List(children) => children.get(index),
        }
    }

    /// Number of direct children (a leaf counts as one)
    pub fn len(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::List(children) => children.len(),
        }
    }

    /// First leaf reached by always descending into the first child
    pub fn first_value(&self) -> Option<&str> {
        match self {
            Node::Leaf(value) => Some(value.as_str()),
            Node::List(children) => children.first().and_then(Node::first_value),
        }
    }

    /// True when every leaf below this node is the empty string
    pub fn is_empty(&self) -> bool {
        match self {
            Node::Leaf(value) => value.is_empty(),
            Node::List(children) => children.iter().all(Node::is_empty),
        }
    }
}

/// A named segment and its fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Three character segment code, e.g. `PID`
    pub name: String,

    /// Fields in order; index 0 holds HL7 field 1
    pub fields: Vec<Node>,
}

impl Segment {
    /// Field by its 1-based HL7 number
    pub fn field(&self, number: usize) -> Option<&Node> {
        number.checked_sub(1).and_then(|i| self.fields.get(i))
    }

    /// Highest field number present in this segment
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// First sub-component of a 1-based component in the first repetition
    ///
    /// Empty values are reported as `None`.
    pub fn component(&self, field: usize, component: usize) -> Option<&str> {
        let field = self.field(field)?;
        let value = match field {
            Node::Leaf(value) if component == 1 => Some(value.as_str()),
            Node::Leaf(_) => None,
            Node::List(_) => field
                .child(0)
                .and_then(|repetition| repetition.child(component.checked_sub(1)?))
                .and_then(Node::first_value),
        };
        value.filter(|v| !v.is_empty())
    }
}

/// Message-level metadata taken from MSH
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    /// MSH-3
    pub sending_application: Option<String>,
    /// MSH-4
    pub sending_facility: Option<String>,
    /// MSH-9.1, e.g. `ADT`
    pub message_type: Option<String>,
    /// MSH-9.2, e.g. `A01`
    pub trigger_event: Option<String>,
    /// MSH-9.3, e.g. `ADT_A01`
    pub message_structure: Option<String>,
    /// MSH-10
    pub control_id: Option<String>,
    /// MSH-11
    pub processing_id: Option<String>,
    /// MSH-12
    pub version: Option<String>,
}

impl MessageHeader {
    pub(crate) fn from_msh(msh: &Segment) -> Self {
        let owned = |field, component| msh.component(field, component).map(str::to_string);
        Self {
            sending_application: owned(3, 1),
            sending_facility: owned(4, 1),
            message_type: owned(9, 1),
            trigger_event: owned(9, 2),
            message_structure: owned(9, 3),
            control_id: owned(10, 1),
            processing_id: owned(11, 1),
            version: owned(12, 1),
        }
    }

    /// Message type and trigger joined as they appear on the wire, e.g. `ADT^A01`
    pub fn message_code(&self, delimiters: &Delimiters) -> Option<String> {
        let message_type = self.message_type.as_deref()?;
        Some(match self.trigger_event.as_deref() {
            Some(trigger) => format!("{message_type}{}{trigger}", delimiters.component),
            None => message_type.to_string(),
        })
    }
}

/// A fully parsed message
///
/// Owned by a single invocation and dropped once projected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedMessage {
    /// Segments in message order; the first is always MSH
    pub segments: Vec<Segment>,

    /// Delimiters resolved from MSH
    pub delimiters: Delimiters,

    /// Metadata extracted from MSH
    pub header: MessageHeader,
}

impl ParsedMessage {
    /// First segment with the given name
    pub fn segment(&self, name: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.name == name)
    }

    /// All segments with the given name, in message order
    pub fn segments_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Segment> + 'a {
        self.segments.iter().filter(move |s| s.name == name)
    }

    /// Control ID from MSH-10, if present
    pub fn control_id(&self) -> Option<&str> {
        self.header.control_id.as_deref()
    }
}
