//! Core business logic for hl7stage.
//!
//! # Modules
//!
//! - [`transform`] - JSON projection of parsed messages
//! - [`pipeline`] - fetch / parse / project / write orchestration
//!
//! # Invocation Workflow
//!
//! 1. **Fetch**: Read the inbound object named by the notification
//! 2. **Parse**: Decode it as HL7 v2 using the delimiters declared in MSH
//! 3. **Project**: Build the positional JSON document
//! 4. **Write**: Store the canonical JSON under the derived `.json` key
//! 5. **Report**: On failure, hand a report to the alert sink once
//!
//! # Example
//!
//! ```rust,no_run
//! use hl7stage::config::load_config;
//! use hl7stage::core::pipeline::{InboundObject, PipelineHandler};
//! use hl7stage::domain::ObjectKey;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config(None::<&str>)?;
//! let handler = PipelineHandler::from_config(&config).await?;
//!
//! let key = ObjectKey::new("incoming/adt-0001.hl7")?;
//! let outcome = handler.handle(&InboundObject::new(key)).await?;
//! println!("staged {}", outcome.outbound_key);
//! # Ok(())
//! # }
//! ```

pub mod pipeline;
pub mod transform;
