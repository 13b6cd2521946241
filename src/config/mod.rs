//! Configuration management for hl7stage.
//!
//! # Overview
//!
//! Configuration comes from an optional TOML file layered under
//! environment variables:
//! - Environment variable substitution inside the file (`${VAR_NAME}`)
//! - `HL7STAGE_<SECTION>_<KEY>` overrides
//! - `RAW_BUCKET` / `STAGING_BUCKET` shorthands for plain S3 buckets
//! - Default values for every optional setting
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use hl7stage::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config(Some("hl7stage.toml"))?;
//! println!("Staging store: {}", config.outbound.url);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - log level, dry run
//! - [`InboundConfig`] / [`OutboundConfig`] - store URLs and key prefix
//! - [`ParserConfig`] - fallback encoding characters
//! - [`PipelineConfig`] - timeout, concurrency, raw object cleanup
//! - [`AlertingConfig`] - webhook and failure window
//! - [`LoggingConfig`] - local file logging and output format
//!
//! # Example Configuration
//!
//! ```toml
//! [inbound]
//! url = "s3://hospital-raw"
//!
//! [outbound]
//! url = "s3://hospital-staging"
//! key_prefix = "adt"
//!
//! [pipeline]
//! timeout_seconds = 30
//!
//! [alerting]
//! webhook_url = "${HL7STAGE_WEBHOOK}"
//! threshold = 5
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    AlertingConfig, ApplicationConfig, InboundConfig, LoggingConfig, OutboundConfig,
    ParserConfig, PipelineConfig, StageConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
