//! HL7 v2 wire format
//!
//! - [`delimiters`] - delimiter set declared by MSH
//! - [`escape`] - escape sequence decoding
//! - [`message`] - parsed message model
//! - [`parser`] - the parser itself
//!
//! ```
//! use hl7stage::hl7;
//!
//! let message = hl7::parse(b"MSH|^~\\&|APP\rPID|1||12345").unwrap();
//! assert_eq!(message.segments_named("PID").count(), 1);
//! ```

pub mod delimiters;
pub mod escape;
pub mod message;
pub mod parser;

pub use delimiters::Delimiters;
pub use message::{MessageHeader, Node, ParsedMessage, Segment};
pub use parser::{parse, Hl7Parser};
