//! [`BlobStore`] backed by the `object_store` crate
//!
//! Covers S3 (credentials and region from the standard `AWS_*` environment),
//! the local filesystem and an in-memory store.

use super::{BlobStore, StoreLocation};
use crate::domain::{BucketName, ObjectKey, StorageError};
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{Attribute, AttributeValue, Attributes, ObjectStore, PutOptions, PutPayload};
use std::sync::Arc;

/// Object store with an optional key prefix
pub struct ObjectStoreBackend {
    store: Arc<dyn ObjectStore>,
    bucket: Option<BucketName>,
    prefix: Option<Path>,
    location: String,
    // LocalFileSystem rejects object attributes
    supports_attributes: bool,
}

impl std::fmt::Debug for ObjectStoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectStoreBackend<{}>", self.location)
    }
}

impl ObjectStoreBackend {
    /// Wrap an existing store
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidLocation`] if `prefix` is not a valid
    /// object path.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: Option<BucketName>,
        prefix: Option<&str>,
    ) -> Result<Self, StorageError> {
        let prefix = prefix
            .map(|p| p.trim_matches('/'))
            .filter(|p| !p.is_empty())
            .map(|p| {
                Path::parse(p).map_err(|e| StorageError::InvalidLocation(format!("prefix '{p}': {e}")))
            })
            .transpose()?;

        let location = match (&bucket, &prefix) {
            (Some(bucket), Some(prefix)) => format!("{bucket}/{prefix}"),
            (Some(bucket), None) => bucket.to_string(),
            (None, Some(prefix)) => prefix.to_string(),
            (None, None) => store.to_string(),
        };

        Ok(Self {
            store,
            bucket,
            prefix,
            location,
            supports_attributes: true,
        })
    }

    /// Fresh in-memory store
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            bucket: None,
            prefix: None,
            location: StoreLocation::Memory.to_string(),
            supports_attributes: true,
        }
    }

    /// Build a store from its URL
    ///
    /// Local directories are created if they do not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidLocation`] for unusable URLs and
    /// [`StorageError::Unavailable`] when the backend cannot be constructed.
    pub async fn from_url(url: &str) -> Result<Self, StorageError> {
        let location = StoreLocation::parse(url)?;
        let display = location.to_string();

        let mut backend = match location {
            StoreLocation::S3 { bucket, prefix } => {
                let store = AmazonS3Builder::from_env()
                    .with_bucket_name(&bucket)
                    .build()
                    .map_err(|e| StorageError::Unavailable(format!("S3 store for '{bucket}': {e}")))?;
                let bucket = BucketName::new(bucket).map_err(StorageError::InvalidLocation)?;
                Self::new(Arc::new(store), Some(bucket), prefix.as_deref())?
            }
            StoreLocation::Local { path } => {
                tokio::fs::create_dir_all(&path).await.map_err(|e| {
                    StorageError::Unavailable(format!("cannot create '{}': {e}", path.display()))
                })?;
                let store = LocalFileSystem::new_with_prefix(&path).map_err(|e| {
                    StorageError::InvalidLocation(format!("'{}': {e}", path.display()))
                })?;
                let mut backend = Self::new(Arc::new(store), None, None)?;
                backend.supports_attributes = false;
                backend
            }
            StoreLocation::Memory => Self::in_memory(),
        };
        backend.location = display;

        tracing::debug!(location = %backend.location, "Object store ready");
        Ok(backend)
    }

    fn qualify(&self, key: &ObjectKey) -> Result<Path, StorageError> {
        let relative = Path::parse(key.as_str())
            .map_err(|e| StorageError::InvalidLocation(format!("key '{key}': {e}")))?;
        Ok(match &self.prefix {
            Some(prefix) => prefix.parts().chain(relative.parts()).collect(),
            None => relative,
        })
    }
}

#[async_trait]
impl BlobStore for ObjectStoreBackend {
    async fn get(&self, key: &ObjectKey) -> Result<Bytes, StorageError> {
        let path = self.qualify(key)?;
        let result = self
            .store
            .get(&path)
            .await
            .map_err(|e| map_store_error(key, e))?;
        result.bytes().await.map_err(|e| map_store_error(key, e))
    }

    async fn put(
        &self,
        key: &ObjectKey,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let path = self.qualify(key)?;

        let mut options = PutOptions::default();
        if self.supports_attributes {
            let mut attributes = Attributes::new();
            attributes.insert(
                Attribute::ContentType,
                AttributeValue::from(content_type.to_string()),
            );
            options.attributes = attributes;
        }

        self.store
            .put_opts(&path, PutPayload::from(body), options)
            .await
            .map_err(|e| map_store_error(key, e))?;
        Ok(())
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), StorageError> {
        let path = self.qualify(key)?;
        self.store
            .delete(&path)
            .await
            .map_err(|e| map_store_error(key, e))
    }

    fn bucket(&self) -> Option<&BucketName> {
        self.bucket.as_ref()
    }

    fn location(&self) -> &str {
        &self.location
    }
}

fn map_store_error(key: &ObjectKey, err: object_store::Error) -> StorageError {
    match err {
        object_store::Error::NotFound { .. } => StorageError::NotFound(key.to_string()),
        object_store::Error::PermissionDenied { .. }
        | object_store::Error::Unauthenticated { .. } => {
            StorageError::AccessDenied(format!("{key}: {err}"))
        }
        other => StorageError::Unavailable(format!("{key}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(raw: &str) -> ObjectKey {
        ObjectKey::new(raw).unwrap()
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = ObjectStoreBackend::in_memory();
        store
            .put(&key("a/b.json"), Bytes::from_static(b"{}"), "application/json")
            .await
            .unwrap();
        assert_eq!(store.get(&key("a/b.json")).await.unwrap(), Bytes::from_static(b"{}"));
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let store = ObjectStoreBackend::in_memory();
        let err = store.get(&key("missing.hl7")).await.unwrap_err();
        assert_eq!(err, StorageError::NotFound("missing.hl7".to_string()));
    }

    #[tokio::test]
    async fn test_prefix_is_applied() {
        let inner: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let store = ObjectStoreBackend::new(inner.clone(), None, Some("/staged/")).unwrap();
        store
            .put(&key("adt.json"), Bytes::from_static(b"x"), "application/json")
            .await
            .unwrap();

        let raw = inner.get(&Path::from("staged/adt.json")).await.unwrap();
        assert_eq!(raw.bytes().await.unwrap(), Bytes::from_static(b"x"));
        assert_eq!(store.location(), "staged");
    }

    #[tokio::test]
    async fn test_content_type_attribute_recorded() {
        let inner: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let store = ObjectStoreBackend::new(inner.clone(), None, None).unwrap();
        store
            .put(&key("adt.json"), Bytes::from_static(b"{}"), "application/json")
            .await
            .unwrap();

        let result = inner.get(&Path::from("adt.json")).await.unwrap();
        assert_eq!(
            result.attributes.get(&Attribute::ContentType).map(|v| v.as_ref()),
            Some("application/json")
        );
    }

    #[tokio::test]
    async fn test_delete_removes_object() {
        let store = ObjectStoreBackend::in_memory();
        let k = key("raw.hl7");
        store.put(&k, Bytes::from_static(b"MSH"), "text/plain").await.unwrap();
        store.delete(&k).await.unwrap();
        assert!(matches!(store.get(&k).await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_local_filesystem_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("file://{}/staging", dir.path().display());
        let store = ObjectStoreBackend::from_url(&url).await.unwrap();

        store
            .put(&key("2024/adt.json"), Bytes::from_static(b"{}\n"), "application/json")
            .await
            .unwrap();

        let on_disk = std::fs::read(dir.path().join("staging/2024/adt.json")).unwrap();
        assert_eq!(on_disk, b"{}\n");
    }

    #[tokio::test]
    async fn test_invalid_key_rejected() {
        let store = ObjectStoreBackend::in_memory();
        let err = store.get(&key("a//b")).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidLocation(_)));
    }
}
