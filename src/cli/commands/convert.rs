//! Convert command implementation
//!
//! Runs the parser and projector over a local file without touching any
//! store. Useful for checking what a message will look like once staged.

use crate::core::transform::{digest_bytes, project};
use crate::hl7::Hl7Parser;
use clap::Args;
use std::io::Write;
use std::path::PathBuf;

/// Arguments for the convert command
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// HL7 v2 message file
    pub file: PathBuf,

    /// Write the JSON here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl ConvertArgs {
    /// Canonical JSON bytes for the input file
    ///
    /// `Ok(Err(_))` carries a message the parser rejected.
    fn convert(&self) -> anyhow::Result<Result<Vec<u8>, String>> {
        let raw = std::fs::read(&self.file)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", self.file.display()))?;

        let message = match Hl7Parser::new().parse(&raw) {
            Ok(message) => message,
            Err(e) => return Ok(Err(e.to_string())),
        };
        Ok(Ok(project(&message).to_canonical_bytes()?))
    }

    /// Execute the convert command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        let body = match self.convert()? {
            Ok(body) => body,
            Err(reason) => {
                tracing::error!(file = %self.file.display(), error = %reason, "Malformed HL7 message");
                eprintln!("MalformedMessageError: {reason}");
                return Ok(1);
            }
        };

        match &self.output {
            Some(path) => {
                tokio::fs::write(path, &body).await?;
                crate::log_object_staged!(self.file.display(), path.display(), body.len());
                println!("{} ({})", path.display(), digest_bytes(&body));
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(&body)?;
                stdout.flush()?;
            }
        }
        Ok(0)
    }
}
