// hl7stage - HL7 v2 to JSON staging pipeline
// Copyright (c) 2025 hl7stage Contributors
// Licensed under the MIT License

//! # hl7stage - HL7 v2 to JSON staging
//!
//! hl7stage turns HL7 v2 messages dropped into an inbound object store into
//! positional JSON documents in a staging store, and reports every failed
//! message to an alert sink.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Parsing** HL7 v2 messages using the delimiters each message declares
//! - **Projecting** parsed messages into deterministic JSON documents
//! - **Staging** documents under keys derived from the inbound key
//! - **Alerting** on malformed messages, fetch and write failures and timeouts
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (projection, pipeline handler)
//! - [`hl7`] - HL7 v2 wire-format parser
//! - [`adapters`] - Object stores, alert sinks, event decoding
//! - [`domain`] - Identifiers and error types
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust
//! use hl7stage::core::transform::project;
//! use hl7stage::hl7::parse;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let message = parse(b"MSH|^~\\&|LAB|GENERAL|||20240101||ORU^R01|42|P|2.5\rOBX|1|NM|GLU||5.4")?;
//! assert_eq!(message.header.control_id.as_deref(), Some("42"));
//!
//! let document = project(&message);
//! assert_eq!(document.segment("OBX").unwrap()["5"], "5.4");
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every invocation failure is a [`domain::PipelineError`] whose
//! [`kind`](domain::PipelineError::kind) is what operators see:
//!
//! ```rust
//! use hl7stage::domain::{FailureKind, PipelineError};
//! use hl7stage::hl7::parse;
//!
//! let err: PipelineError = parse(b"PID|1").unwrap_err().into();
//! assert_eq!(err.kind(), FailureKind::MalformedMessage);
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod hl7;
pub mod logging;
