//! Domain error types
//!
//! This module defines the error hierarchy for hl7stage.
//! All errors are domain-specific and don't expose third-party types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::core::pipeline::state::HandlerState;

/// Main hl7stage error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum StageError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A single pipeline invocation failed
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// The inbound notification could not be understood
    #[error("Event error: {0}")]
    Event(String),

    /// Object storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The alert collaborator could not be reached
    #[error("Alert error: {0}")]
    Alert(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Structural HL7 failures raised by the parser
///
/// A message that produces one of these can only be fixed at its source;
/// the pipeline never retries it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Hl7Error {
    /// Nothing but whitespace was supplied
    #[error("message is empty")]
    Empty,

    /// The first segment is not MSH
    #[error("first segment must be MSH, found '{found}'")]
    MissingHeader { found: String },

    /// MSH does not declare a field separator and at least one encoding character
    #[error("MSH segment is too short to declare its delimiters ({length} characters)")]
    HeaderTooShort { length: usize },

    /// The declared delimiter set is unusable
    #[error("invalid encoding characters: {0}")]
    InvalidEncodingCharacters(String),

    /// A segment does not start with a three character name
    #[error("segment {position} has invalid name '{name}'")]
    InvalidSegmentName { position: usize, name: String },
}

/// Object storage errors
///
/// Adapters translate backend errors into these variants so callers can
/// distinguish "missing" from "denied" from "unreachable".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Object does not exist
    #[error("object not found: {0}")]
    NotFound(String),

    /// Credentials were rejected or the policy denies the operation
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Backend unreachable or returned an unexpected failure
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The store URL or object key is not usable
    #[error("invalid storage location: {0}")]
    InvalidLocation(String),
}

/// Failure of a single pipeline invocation
///
/// Every variant maps onto exactly one [`FailureKind`], which is what the
/// alert sink receives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Inbound object could not be read
    #[error("failed to fetch inbound object: {0}")]
    Fetch(String),

    /// Inbound object is not structurally valid HL7
    #[error("malformed HL7 message: {0}")]
    MalformedMessage(#[from] Hl7Error),

    /// Outbound object could not be written
    #[error("failed to write outbound object: {0}")]
    Write(String),

    /// Invocation exceeded its wall-clock budget
    #[error("invocation exceeded {}ms budget while {state}", budget.as_millis())]
    Timeout {
        state: HandlerState,
        budget: Duration,
    },
}

impl PipelineError {
    /// The failure category reported to the alert sink
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::Fetch(_) => FailureKind::Fetch,
            PipelineError::MalformedMessage(_) => FailureKind::MalformedMessage,
            PipelineError::Write(_) => FailureKind::Write,
            PipelineError::Timeout { .. } => FailureKind::Timeout,
        }
    }
}

/// Failure categories surfaced to operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    #[serde(rename = "MalformedMessageError")]
    MalformedMessage,
    #[serde(rename = "FetchError")]
    Fetch,
    #[serde(rename = "WriteError")]
    Write,
    #[serde(rename = "TimeoutError")]
    Timeout,
}

impl FailureKind {
    /// Stable name used in logs and alert payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::MalformedMessage => "MalformedMessageError",
            FailureKind::Fetch => "FetchError",
            FailureKind::Write => "WriteError",
            FailureKind::Timeout => "TimeoutError",
        }
    }

    /// Whether redelivering the same object could plausibly succeed
    pub fn is_transient(&self) -> bool {
        !matches!(self, FailureKind::MalformedMessage)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for StageError {
    fn from(err: std::io::Error) -> Self {
        StageError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for StageError {
    fn from(err: serde_json::Error) -> Self {
        StageError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for StageError {
    fn from(err: toml::de::Error) -> Self {
        StageError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_error_display() {
        let err = StageError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_hl7_error_converts_to_malformed() {
        let err: PipelineError = Hl7Error::Empty.into();
        assert_eq!(err.kind(), FailureKind::MalformedMessage);
        assert_eq!(err.to_string(), "malformed HL7 message: message is empty");
    }

    #[test]
    fn test_pipeline_error_kinds() {
        assert_eq!(
            PipelineError::Fetch("gone".to_string()).kind(),
            FailureKind::Fetch
        );
        assert_eq!(
            PipelineError::Write("denied".to_string()).kind(),
            FailureKind::Write
        );
        let timeout = PipelineError::Timeout {
            state: HandlerState::Writing,
            budget: Duration::from_millis(1500),
        };
        assert_eq!(timeout.kind(), FailureKind::Timeout);
        assert_eq!(
            timeout.to_string(),
            "invocation exceeded 1500ms budget while Writing"
        );
    }

    #[test]
    fn test_failure_kind_names() {
        assert_eq!(FailureKind::MalformedMessage.to_string(), "MalformedMessageError");
        assert_eq!(FailureKind::Fetch.to_string(), "FetchError");
        assert_eq!(FailureKind::Write.to_string(), "WriteError");
        assert_eq!(FailureKind::Timeout.to_string(), "TimeoutError");
    }

    #[test]
    fn test_failure_kind_serializes_as_error_name() {
        let json = serde_json::to_string(&FailureKind::Timeout).unwrap();
        assert_eq!(json, "\"TimeoutError\"");
    }

    #[test]
    fn test_only_malformed_is_permanent() {
        assert!(!FailureKind::MalformedMessage.is_transient());
        assert!(FailureKind::Fetch.is_transient());
        assert!(FailureKind::Write.is_transient());
        assert!(FailureKind::Timeout.is_transient());
    }

    #[test]
    fn test_storage_error_conversion() {
        let err: StageError = StorageError::NotFound("raw/a.hl7".to_string()).into();
        assert!(matches!(err, StageError::Storage(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: StageError = io_err.into();
        assert!(matches!(err, StageError::Io(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: StageError = toml_err.into();
        assert!(matches!(err, StageError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }
}
