//! Process command implementation

use super::prepare_handler;
use crate::core::pipeline::InboundObject;
use crate::domain::{BucketName, ObjectKey};
use clap::Args;

/// Arguments for the process command
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Key of the inbound object
    #[arg(short, long)]
    pub key: String,

    /// Bucket the object was written to; checked against the inbound store
    #[arg(short, long)]
    pub bucket: Option<String>,

    /// Parse and project without writing to the staging store
    #[arg(long)]
    pub dry_run: bool,
}

impl ProcessArgs {
    fn inbound_object(&self) -> anyhow::Result<InboundObject> {
        let key = ObjectKey::new(self.key.as_str()).map_err(anyhow::Error::msg)?;
        let mut object = InboundObject::new(key);
        if let Some(bucket) = &self.bucket {
            object = object.with_bucket(BucketName::new(bucket.as_str()).map_err(anyhow::Error::msg)?);
        }
        Ok(object)
    }

    /// Execute the process command
    pub async fn execute(&self, config_path: Option<&str>) -> anyhow::Result<i32> {
        let object = self.inbound_object()?;

        let (_config, handler) = match prepare_handler(config_path, self.dry_run).await {
            Ok(prepared) => prepared,
            Err(code) => return Ok(code),
        };

        match handler.handle(&object).await {
            Ok(outcome) => {
                println!("{} -> {}", outcome.inbound_key, outcome.outbound_key);
                println!("  Control ID: {}", outcome.control_id.as_deref().unwrap_or("-"));
                println!("  Message Type: {}", outcome.message_type.as_deref().unwrap_or("-"));
                println!("  Segments: {}", outcome.segment_count);
                println!("  SHA-256: {}", outcome.digest);
                if !outcome.written {
                    println!("  Dry run: nothing written");
                }
                Ok(0)
            }
            Err(e) => {
                eprintln!("{}: {e}", e.kind());
                Ok(1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_object_with_bucket() {
        let args = ProcessArgs {
            key: "raw/adt.hl7".to_string(),
            bucket: Some("raw".to_string()),
            dry_run: false,
        };
        let object = args.inbound_object().unwrap();
        assert_eq!(object.key.as_str(), "raw/adt.hl7");
        assert_eq!(object.bucket.unwrap().as_str(), "raw");
    }

    #[test]
    fn test_blank_key_rejected() {
        let args = ProcessArgs {
            key: " ".to_string(),
            bucket: None,
            dry_run: false,
        };
        assert!(args.inbound_object().is_err());
    }
}
