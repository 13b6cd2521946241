//! Handle command implementation
//!
//! Processes every object named by an object-created notification, the way
//! the function runtime would invoke the handler.

use super::prepare_handler;
use crate::adapters::event::ObjectCreatedEvent;
use crate::core::pipeline::{run_objects, RunSummary};
use clap::Args;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

/// Arguments for the handle command
#[derive(Args, Debug)]
pub struct HandleArgs {
    /// Notification JSON file, or `-` for stdin
    #[arg(short, long, value_name = "FILE")]
    pub event: PathBuf,

    /// Parse and project without writing to the staging store
    #[arg(long)]
    pub dry_run: bool,
}

impl HandleArgs {
    /// Execute the handle command
    pub async fn execute(&self, config_path: Option<&str>) -> anyhow::Result<i32> {
        let body = self.read_event().await?;

        let event = match ObjectCreatedEvent::from_json(&body) {
            Ok(event) => event,
            Err(e) => {
                crate::log_error_with_context!(&e, "Failed to decode notification");
                eprintln!("Invalid notification: {e}");
                return Ok(1);
            }
        };
        let objects = match event.objects() {
            Ok(objects) => objects,
            Err(e) => {
                crate::log_error_with_context!(&e, "Notification names an unusable object");
                eprintln!("Invalid notification: {e}");
                return Ok(1);
            }
        };

        if objects.is_empty() {
            tracing::warn!("Notification carries no object-created records");
            println!("No objects to process");
            return Ok(0);
        }

        let (config, handler) = match prepare_handler(config_path, self.dry_run).await {
            Ok(prepared) => prepared,
            Err(code) => return Ok(code),
        };

        let summary = run_objects(&handler, objects, config.pipeline.max_concurrency).await;
        summary.log_summary();
        print_summary(&summary);

        Ok(if summary.is_successful() { 0 } else { 1 })
    }

    async fn read_event(&self) -> anyhow::Result<String> {
        let mut body = String::new();
        if self.event.as_os_str() == "-" {
            tokio::io::stdin().read_to_string(&mut body).await?;
        } else {
            body = tokio::fs::read_to_string(&self.event).await.map_err(|e| {
                anyhow::anyhow!("cannot read event file {}: {e}", self.event.display())
            })?;
        }
        Ok(body)
    }
}

fn print_summary(summary: &RunSummary) {
    println!("Run Summary:");
    println!("  Processed: {}", summary.processed);
    println!("  Succeeded: {}", summary.succeeded);
    println!("  Failed: {}", summary.failed);
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());

    for outcome in &summary.outcomes {
        println!(
            "  {} -> {} ({} bytes{})",
            outcome.inbound_key,
            outcome.outbound_key,
            outcome.bytes,
            if outcome.written { "" } else { ", dry run" }
        );
    }
    for failure in &summary.failures {
        println!("  {} failed: {}: {}", failure.key, failure.kind, failure.message);
    }
}
