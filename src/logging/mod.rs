//! Logging and observability
//!
//! Structured logging built on `tracing`:
//! - Human-readable or JSON console output
//! - Configurable log levels, overridable with `RUST_LOG`
//! - Optional local file logging with rotation
//!
//! Alerts are emitted on their own target (see
//! [`crate::adapters::alert::log_sink::ALERT_TARGET`]) so log routers can
//! pick them out.
//!
//! # Example
//!
//! ```no_run
//! use hl7stage::logging::init_logging;
//! use hl7stage::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(object_key = "raw/a.hl7", "Staged");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use hl7stage::log_error_with_context;
/// use hl7stage::domain::StageError;
///
/// let error = StageError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log the result of one staged object
///
/// # Example
///
/// ```no_run
/// use hl7stage::log_object_staged;
///
/// log_object_staged!("raw/a.hl7", "raw/a.json", 1024usize);
/// ```
#[macro_export]
macro_rules! log_object_staged {
    ($inbound:expr, $outbound:expr, $bytes:expr) => {
        tracing::info!(
            inbound_key = %$inbound,
            outbound_key = %$outbound,
            bytes = $bytes,
            "Object staged"
        );
    };
}
