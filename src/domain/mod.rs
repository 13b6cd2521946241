//! Domain types for hl7stage.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`ObjectKey`], [`BucketName`], [`InvocationId`])
//! - **Error types** ([`StageError`], [`Hl7Error`], [`PipelineError`], [`StorageError`])
//! - **Failure taxonomy** ([`FailureKind`]) shared by the handler and the alert sinks
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! ```rust
//! use hl7stage::domain::{FailureKind, Hl7Error, PipelineError};
//!
//! let err: PipelineError = Hl7Error::Empty.into();
//! assert_eq!(err.kind(), FailureKind::MalformedMessage);
//! ```

pub mod errors;
pub mod ids;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{FailureKind, Hl7Error, PipelineError, StageError, StorageError};
pub use ids::{BucketName, InvocationId, ObjectKey};
pub use result::Result;
