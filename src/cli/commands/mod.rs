//! CLI command implementations

pub mod convert;
pub mod handle;
pub mod process;
pub mod validate;

use crate::config::{load_config, StageConfig};
use crate::core::pipeline::PipelineHandler;
use crate::domain::StageError;

/// Load configuration and build the handler
///
/// On failure the error is printed and the exit code to return is given
/// back: 2 for configuration problems, 5 for anything else.
pub(crate) async fn prepare_handler(
    config_path: Option<&str>,
    dry_run: bool,
) -> std::result::Result<(StageConfig, PipelineHandler), i32> {
    let mut config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            crate::log_error_with_context!(&e, "Failed to load configuration");
            eprintln!("Configuration error: {e}");
            return Err(2);
        }
    };

    if dry_run {
        tracing::info!("Enabling dry-run mode from CLI");
        config.application.dry_run = true;
    }

    match PipelineHandler::from_config(&config).await {
        Ok(handler) => Ok((config, handler)),
        Err(e) => {
            crate::log_error_with_context!(&e, "Failed to initialize pipeline");
            eprintln!("Failed to initialize pipeline: {e}");
            Err(match e {
                StageError::Configuration(_) | StageError::Storage(_) => 2,
                _ => 5,
            })
        }
    }
}
