// hl7stage - HL7 v2 to JSON staging pipeline
// Copyright (c) 2025 hl7stage Contributors
// Licensed under the MIT License

use clap::Parser;
use hl7stage::cli::{Cli, Commands};
use hl7stage::config::{load_config, LoggingConfig};
use hl7stage::logging::init_logging;
use std::process;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Commands reload and report configuration errors themselves
    let (config_level, logging_config) = match load_config(cli.config.as_deref()) {
        Ok(config) => (config.application.log_level, config.logging),
        Err(_) => ("info".to_string(), LoggingConfig::default()),
    };
    let log_level = cli.log_level.clone().unwrap_or(config_level);

    let guard = match init_logging(&log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "hl7stage starting");

    let exit_code = tokio::select! {
        result = execute_command(&cli) => match result {
            Ok(code) => code,
            Err(e) => {
                tracing::error!(error = %e, "Command execution failed");
                eprintln!("Error: {e}");
                5 // Fatal error exit code
            }
        },
        _ = shutdown_signal() => {
            tracing::warn!("Shutdown signal received, abandoning in-flight invocations");
            130 // SIGINT exit code (standard Unix convention)
        }
    };

    // Flush buffered log lines before exiting
    drop(guard);
    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> anyhow::Result<i32> {
    let config_path = cli.config.as_deref();
    match &cli.command {
        Commands::Handle(args) => args.execute(config_path).await,
        Commands::Process(args) => args.execute(config_path).await,
        Commands::Convert(args) => args.execute().await,
        Commands::ValidateConfig(args) => args.execute(config_path).await,
    }
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => tracing::info!("Received SIGINT (Ctrl+C)"),
                    _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                if tokio::signal::ctrl_c().await.is_err() {
                    std::future::pending::<()>().await;
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}
