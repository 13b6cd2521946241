//! Validate config command implementation

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: Option<&str>) -> anyhow::Result<i32> {
        let source = config_path.unwrap_or("environment");
        tracing::info!(source = %source, "Validating configuration");
        println!("Validating configuration from {source}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        println!("Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);
        println!("  Inbound Store: {}", config.inbound.url);
        println!("  Outbound Store: {}", config.outbound.url);
        println!(
            "  Outbound Key Prefix: {}",
            config.outbound.key_prefix.as_deref().unwrap_or("(none)")
        );
        println!(
            "  Default Encoding Characters: {}{}{}{}",
            config.parser.component,
            config.parser.repetition,
            config.parser.escape,
            config.parser.subcomponent
        );
        println!(
            "  Timeout: {}",
            config
                .pipeline
                .timeout_seconds
                .map(|s| format!("{s}s"))
                .unwrap_or_else(|| "unbounded".to_string())
        );
        println!("  Max Concurrency: {}", config.pipeline.max_concurrency);
        println!(
            "  Delete Inbound On Success: {}",
            config.pipeline.delete_inbound_on_success
        );
        // The webhook URL itself stays redacted
        println!(
            "  Webhook Alerts: {}",
            if config.alerting.webhook_url.is_some() {
                "enabled"
            } else {
                "disabled"
            }
        );
        println!(
            "  Alert Window: {}s, threshold {}",
            config.alerting.window_seconds, config.alerting.threshold
        );
        println!();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_valid_file_exits_zero() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[inbound]\nurl = \"memory://\"\n[outbound]\nurl = \"memory://\"\n")
            .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let code = ValidateArgs {}.execute(Some(&path)).await.unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_missing_file_exits_two() {
        let code = ValidateArgs {}
            .execute(Some("/nonexistent/hl7stage.toml"))
            .await
            .unwrap();
        assert_eq!(code, 2);
    }
}
