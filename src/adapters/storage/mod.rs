//! Object storage abstraction
//!
//! The pipeline reads raw messages from one store and writes staged JSON to
//! another. Both sides go through [`BlobStore`] so tests can substitute
//! in-memory or failing stores.

pub mod backend;

pub use backend::ObjectStoreBackend;

use crate::domain::{BucketName, ObjectKey, StorageError};
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Content type written with every staged document
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Store holding inbound or outbound objects
///
/// Keys are relative to the store's configured prefix.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read an object in full
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] when the object does not exist.
    async fn get(&self, key: &ObjectKey) -> Result<Bytes, StorageError>;

    /// Create or overwrite an object
    ///
    /// Writes are all-or-nothing: readers never observe a partial object.
    async fn put(
        &self,
        key: &ObjectKey,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Remove an object
    async fn delete(&self, key: &ObjectKey) -> Result<(), StorageError>;

    /// Bucket name, for stores that have one
    fn bucket(&self) -> Option<&BucketName>;

    /// Human-readable location used in logs
    fn location(&self) -> &str;
}

/// Parsed store URL
///
/// # Examples
///
/// ```
/// use hl7stage::adapters::storage::StoreLocation;
///
/// let location = StoreLocation::parse("s3://raw-hl7/incoming").unwrap();
/// assert_eq!(
///     location,
///     StoreLocation::S3 { bucket: "raw-hl7".to_string(), prefix: Some("incoming".to_string()) }
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// `s3://bucket[/prefix]`
    S3 {
        bucket: String,
        prefix: Option<String>,
    },
    /// `file:///absolute/path`
    Local { path: PathBuf },
    /// `memory://`, for tests and dry runs
    Memory,
}

impl StoreLocation {
    /// Parse a store URL
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidLocation`] for malformed URLs or
    /// unsupported schemes.
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        let url = Url::parse(raw.trim())
            .map_err(|e| StorageError::InvalidLocation(format!("'{raw}': {e}")))?;

        match url.scheme() {
            "s3" | "s3a" => {
                let bucket = url
                    .host_str()
                    .filter(|h| !h.is_empty())
                    .ok_or_else(|| {
                        StorageError::InvalidLocation(format!("'{raw}': missing bucket name"))
                    })?
                    .to_string();
                let prefix = Some(url.path().trim_matches('/'))
                    .filter(|p| !p.is_empty())
                    .map(str::to_string);
                Ok(Self::S3 { bucket, prefix })
            }
            "file" => {
                let path = url.to_file_path().map_err(|_| {
                    StorageError::InvalidLocation(format!("'{raw}': not an absolute file path"))
                })?;
                Ok(Self::Local { path })
            }
            "memory" => Ok(Self::Memory),
            other => Err(StorageError::InvalidLocation(format!(
                "'{raw}': unsupported scheme '{other}', expected s3, file or memory"
            ))),
        }
    }

    /// Bucket name, for S3 locations
    pub fn bucket(&self) -> Option<&str> {
        match self {
            Self::S3 { bucket, .. } => Some(bucket),
            _ => None,
        }
    }
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::S3 {
                bucket,
                prefix: Some(prefix),
            } => write!(f, "s3://{bucket}/{prefix}"),
            Self::S3 {
                bucket,
                prefix: None,
            } => write!(f, "s3://{bucket}"),
            Self::Local { path } => write!(f, "file://{}", path.display()),
            Self::Memory => f.write_str("memory://"),
        }
    }
}
