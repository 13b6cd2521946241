//! Event-driven pipeline
//!
//! - [`handler`] - one invocation per inbound object
//! - [`state`] - invocation state machine
//! - [`keys`] - outbound key derivation
//! - [`runner`] - bounded-concurrency batch processing
//! - [`summary`] - batch results

pub mod handler;
pub mod keys;
pub mod runner;
pub mod state;
pub mod summary;

pub use handler::{HandlerOutcome, HandlerSettings, InboundObject, PipelineHandler};
pub use runner::run_objects;
pub use state::HandlerState;
pub use summary::{RunFailure, RunSummary};
