//! Configuration schema types
//!
//! Every section has defaults, so a configuration can be built entirely
//! from the environment without a TOML file.

use crate::adapters::alert::AlertPolicy;
use crate::adapters::storage::StoreLocation;
use crate::config::SecretString;
use crate::domain::{Result, StageError};
use crate::hl7::Delimiters;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main hl7stage configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Store holding raw HL7 messages
    #[serde(default)]
    pub inbound: InboundConfig,

    /// Store receiving staged JSON documents
    #[serde(default)]
    pub outbound: OutboundConfig,

    /// Delimiter fallbacks
    #[serde(default)]
    pub parser: ParserConfig,

    /// Invocation behaviour
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Failure notification policy
    #[serde(default)]
    pub alerting: AlertingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StageConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.application.validate()?;
        self.inbound.validate()?;
        self.outbound.validate()?;
        self.parser.validate()?;
        self.pipeline.validate()?;
        self.alerting.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Parse and project without writing to the staging store
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid application.log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Inbound store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundConfig {
    /// `s3://bucket[/prefix]`, `file:///path` or `memory://`
    #[serde(default)]
    pub url: String,
}

impl InboundConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        validate_store_url("inbound.url", &self.url)
    }
}

/// Outbound (staging) store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutboundConfig {
    /// `s3://bucket[/prefix]`, `file:///path` or `memory://`
    #[serde(default)]
    pub url: String,

    /// Prepended to every derived outbound key
    #[serde(default)]
    pub key_prefix: Option<String>,
}

impl OutboundConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        validate_store_url("outbound.url", &self.url)
    }
}

fn validate_store_url(name: &str, url: &str) -> std::result::Result<(), String> {
    if url.trim().is_empty() {
        return Err(format!("{name} is required"));
    }
    StoreLocation::parse(url)
        .map(|_| ())
        .map_err(|e| format!("{name}: {e}"))
}

/// Default encoding characters used when MSH-2 leaves some out
///
/// The field separator always comes from the message, so these are only
/// checked against each other. A fallback that collides with a message's own
/// field separator makes that message malformed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    #[serde(default = "default_component")]
    pub component: char,

    #[serde(default = "default_repetition")]
    pub repetition: char,

    #[serde(default = "default_escape")]
    pub escape: char,

    #[serde(default = "default_subcomponent")]
    pub subcomponent: char,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            component: default_component(),
            repetition: default_repetition(),
            escape: default_escape(),
            subcomponent: default_subcomponent(),
        }
    }
}

impl ParserConfig {
    /// Delimiter fallbacks, checked for usability
    ///
    /// # Errors
    ///
    /// Returns a configuration error if two of the four characters collide
    /// or one is alphanumeric or whitespace.
    pub fn delimiters(&self) -> Result<Delimiters> {
        let delimiters = Delimiters {
            component: self.component,
            repetition: self.repetition,
            escape: self.escape,
            subcomponent: self.subcomponent,
            ..Delimiters::default()
        };
        delimiters
            .validate_encoding()
            .map_err(|e| StageError::Configuration(format!("parser: {e}")))?;
        Ok(delimiters)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        self.delimiters().map(|_| ()).map_err(|e| e.to_string())
    }
}

/// Invocation behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Wall-clock budget per invocation; unset means unbounded
    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    /// Objects processed at once when a notification carries several
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Delete the raw object after writing its JSON
    #[serde(default)]
    pub delete_inbound_on_success: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: None,
            max_concurrency: default_max_concurrency(),
            delete_inbound_on_success: false,
        }
    }
}

impl PipelineConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.timeout_seconds == Some(0) {
            return Err("pipeline.timeout_seconds must be > 0".to_string());
        }
        if self.max_concurrency == 0 {
            return Err("pipeline.max_concurrency must be > 0".to_string());
        }
        Ok(())
    }
}

/// Failure notification policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertingConfig {
    /// Endpoint receiving failure reports; log-only when unset
    #[serde(default)]
    pub webhook_url: Option<SecretString>,

    /// Rolling window over which failures are counted
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,

    /// Notify once the count inside the window exceeds this
    #[serde(default)]
    pub threshold: u32,
}

impl Default for AlertingConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            window_seconds: default_window_seconds(),
            threshold: 0,
        }
    }
}

impl AlertingConfig {
    pub fn policy(&self) -> AlertPolicy {
        AlertPolicy {
            window: Duration::from_secs(self.window_seconds),
            threshold: self.threshold,
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.window_seconds == 0 {
            return Err("alerting.window_seconds must be > 0".to_string());
        }
        if let Some(url) = &self.webhook_url {
            let raw: &str = url.expose_secret().as_ref();
            let parsed = url::Url::parse(raw)
                .map_err(|_| "alerting.webhook_url is not a valid URL".to_string())?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err("alerting.webhook_url must use http or https".to_string());
            }
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to a local rolling file
    #[serde(default)]
    pub local_enabled: bool,

    /// Directory for local log files
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Rotation strategy: daily, hourly or never
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
            json: false,
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path is required when local logging is enabled".to_string());
        }
        Ok(())
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_component() -> char {
    '^'
}

fn default_repetition() -> char {
    '~'
}

fn default_escape() -> char {
    '\\'
}

fn default_subcomponent() -> char {
    '&'
}

fn default_max_concurrency() -> usize {
    4
}

fn default_window_seconds() -> u64 {
    300
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    fn valid() -> StageConfig {
        StageConfig {
            inbound: InboundConfig {
                url: "s3://raw".to_string(),
            },
            outbound: OutboundConfig {
                url: "s3://staging".to_string(),
                key_prefix: None,
            },
            ..StageConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = StageConfig::default();
        assert_eq!(config.application.log_level, "info");
        assert_eq!(config.pipeline.max_concurrency, 4);
        assert_eq!(config.pipeline.timeout(), None);
        assert!(!config.pipeline.delete_inbound_on_success);
        assert_eq!(config.alerting.policy(), AlertPolicy::default());
        assert_eq!(config.parser.delimiters().unwrap(), Delimiters::default());
    }

    #[test]
    fn test_valid_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_store_urls_required() {
        let err = StageConfig::default().validate().unwrap_err();
        assert!(err.contains("inbound.url"));

        let mut config = valid();
        config.outbound.url = "ftp://nope".to_string();
        assert!(config.validate().unwrap_err().contains("outbound.url"));
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = valid();
        config.application.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = valid();
        config.pipeline.timeout_seconds = Some(0);
        assert!(config.validate().is_err());

        config.pipeline.timeout_seconds = Some(30);
        assert_eq!(config.pipeline.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_colliding_parser_defaults_rejected() {
        let mut config = valid();
        config.parser.escape = '^';
        assert!(config.validate().is_err());
        assert!(matches!(
            config.parser.delimiters(),
            Err(StageError::Configuration(_))
        ));
    }

    #[test]
    fn test_parser_default_may_equal_pipe() {
        let mut config = valid();
        config.parser.component = '|';
        assert!(config.validate().is_ok());
        assert_eq!(config.parser.delimiters().unwrap().component, '|');
    }

    #[test]
    fn test_webhook_scheme_checked() {
        let mut config = valid();
        config.alerting.webhook_url = Some(secret_string("ftp://hooks.example.com".to_string()));
        assert!(config.validate().is_err());

        config.alerting.webhook_url = Some(secret_string("https://hooks.example.com/x".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_rotation() {
        let mut config = valid();
        config.logging.local_rotation = "weekly".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_toml_sections() {
        let config: StageConfig = toml::from_str(
            r#"
[inbound]
url = "s3://raw"

[outbound]
url = "file:///var/lib/staging"
key_prefix = "adt"

[parser]
escape = "!"

[pipeline]
timeout_seconds = 15
"#,
        )
        .unwrap();

        assert_eq!(config.outbound.key_prefix.as_deref(), Some("adt"));
        assert_eq!(config.parser.escape, '!');
        assert_eq!(config.parser.component, '^');
        assert_eq!(config.pipeline.timeout(), Some(Duration::from_secs(15)));
        assert!(config.validate().is_ok());
    }
}
