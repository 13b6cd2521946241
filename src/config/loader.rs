//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::StageConfig;
use super::secret_string;
use crate::domain::errors::StageError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Loads configuration from an optional TOML file plus the environment
///
/// This function:
/// 1. Reads the TOML file, if one is given
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`StageConfig`]
/// 4. Applies environment variable overrides (`HL7STAGE_*` prefix, plus the
///    `RAW_BUCKET` and `STAGING_BUCKET` shorthands)
/// 5. Validates the configuration
///
/// Without a file the configuration is built from defaults and the
/// environment alone, which is how the handler runs inside a function
/// runtime.
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - An override has an unparseable value
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use hl7stage::config::loader::load_config;
///
/// let config = load_config(Some("hl7stage.toml")).expect("Failed to load config");
/// let from_env = load_config(None::<&str>).expect("Failed to load config");
/// ```
pub fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<StageConfig> {
    let mut config = match path {
        Some(path) => read_file(path.as_ref())?,
        None => StageConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;

    config.validate().map_err(|e| {
        StageError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

fn read_file(path: &Path) -> Result<StageConfig> {
    if !path.exists() {
        return Err(StageError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        StageError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents, |name| std::env::var(name).ok())?;

    toml::from_str(&contents)
        .map_err(|e| StageError::Configuration(format!("Failed to parse TOML: {e}")))
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are passed through untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars<F>(input: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| StageError::Other(format!("invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match lookup(var_name) {
                Some(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                None => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(StageError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_override<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        StageError::Configuration(format!("{name} has invalid value '{value}'"))
    })
}

fn parse_char(name: &str, value: &str) -> Result<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => Err(StageError::Configuration(format!(
            "{name} must be a single character, got '{value}'"
        ))),
    }
}

/// Applies environment variable overrides
///
/// Variables follow the pattern `HL7STAGE_<SECTION>_<KEY>`, for example
/// `HL7STAGE_OUTBOUND_URL` or `HL7STAGE_PIPELINE_TIMEOUT_SECONDS`.
/// `RAW_BUCKET` and `STAGING_BUCKET` name plain S3 buckets and lose to the
/// explicit URL variables.
fn apply_env_overrides<F>(config: &mut StageConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    // Bucket shorthands first so the URL variables win
    if let Some(val) = lookup("RAW_BUCKET").filter(|v| !v.trim().is_empty()) {
        config.inbound.url = format!("s3://{}", val.trim());
    }
    if let Some(val) = lookup("STAGING_BUCKET").filter(|v| !v.trim().is_empty()) {
        config.outbound.url = format!("s3://{}", val.trim());
    }

    // Application overrides
    if let Some(val) = lookup("HL7STAGE_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(val) = lookup("HL7STAGE_APPLICATION_DRY_RUN") {
        config.application.dry_run = parse_override("HL7STAGE_APPLICATION_DRY_RUN", &val)?;
    }

    // Store overrides
    if let Some(val) = lookup("HL7STAGE_INBOUND_URL") {
        config.inbound.url = val;
    }
    if let Some(val) = lookup("HL7STAGE_OUTBOUND_URL") {
        config.outbound.url = val;
    }
    if let Some(val) = lookup("HL7STAGE_OUTBOUND_KEY_PREFIX") {
        config.outbound.key_prefix = Some(val).filter(|v| !v.trim().is_empty());
    }

    // Parser overrides
    if let Some(val) = lookup("HL7STAGE_PARSER_COMPONENT") {
        config.parser.component = parse_char("HL7STAGE_PARSER_COMPONENT", &val)?;
    }
    if let Some(val) = lookup("HL7STAGE_PARSER_REPETITION") {
        config.parser.repetition = parse_char("HL7STAGE_PARSER_REPETITION", &val)?;
    }
    if let Some(val) = lookup("HL7STAGE_PARSER_ESCAPE") {
        config.parser.escape = parse_char("HL7STAGE_PARSER_ESCAPE", &val)?;
    }
    if let Some(val) = lookup("HL7STAGE_PARSER_SUBCOMPONENT") {
        config.parser.subcomponent = parse_char("HL7STAGE_PARSER_SUBCOMPONENT", &val)?;
    }

    // Pipeline overrides
    if let Some(val) = lookup("HL7STAGE_PIPELINE_TIMEOUT_SECONDS") {
        config.pipeline.timeout_seconds =
            Some(parse_override("HL7STAGE_PIPELINE_TIMEOUT_SECONDS", &val)?);
    }
    if let Some(val) = lookup("HL7STAGE_PIPELINE_MAX_CONCURRENCY") {
        config.pipeline.max_concurrency =
            parse_override("HL7STAGE_PIPELINE_MAX_CONCURRENCY", &val)?;
    }
    if let Some(val) = lookup("HL7STAGE_PIPELINE_DELETE_INBOUND_ON_SUCCESS") {
        config.pipeline.delete_inbound_on_success =
            parse_override("HL7STAGE_PIPELINE_DELETE_INBOUND_ON_SUCCESS", &val)?;
    }

    // Alerting overrides
    if let Some(val) = lookup("HL7STAGE_ALERTING_WEBHOOK_URL") {
        config.alerting.webhook_url = Some(val)
            .filter(|v| !v.trim().is_empty())
            .map(secret_string);
    }
    if let Some(val) = lookup("HL7STAGE_ALERTING_WINDOW_SECONDS") {
        config.alerting.window_seconds = parse_override("HL7STAGE_ALERTING_WINDOW_SECONDS", &val)?;
    }
    if let Some(val) = lookup("HL7STAGE_ALERTING_THRESHOLD") {
        config.alerting.threshold = parse_override("HL7STAGE_ALERTING_THRESHOLD", &val)?;
    }

    // Logging overrides
    if let Some(val) = lookup("HL7STAGE_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_override("HL7STAGE_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Some(val) = lookup("HL7STAGE_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Some(val) = lookup("HL7STAGE_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }
    if let Some(val) = lookup("HL7STAGE_LOGGING_JSON") {
        config.logging.json = parse_override("HL7STAGE_LOGGING_JSON", &val)?;
    }

    Ok(())
}
