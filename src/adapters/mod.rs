//! External system integrations for hl7stage.
//!
//! - [`storage`] - inbound and staging object stores (trait-based)
//! - [`alert`] - failure reporting to operators
//! - [`event`] - object-created notification decoding
//! - [`factory`] - builds stores and sinks from configuration
//!
//! # Design Pattern
//!
//! Adapters isolate external dependencies behind traits ([`storage::BlobStore`],
//! [`alert::AlertSink`]) so the pipeline can be tested with in-memory and
//! recording implementations.
//!
//! ```rust
//! use hl7stage::adapters::storage::{BlobStore, ObjectStoreBackend};
//! use hl7stage::domain::ObjectKey;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = ObjectStoreBackend::in_memory();
//! let key = ObjectKey::new("raw/adt.hl7")?;
//! store.put(&key, "MSH|^~\\&|A".into(), "text/plain").await?;
//! assert_eq!(store.get(&key).await?.as_ref(), b"MSH|^~\\&|A");
//! # Ok(())
//! # }
//! ```

pub mod alert;
pub mod event;
pub mod factory;
pub mod storage;
