//! Object-created notifications
//!
//! Accepts the S3 event notification shape (`Records[].s3.bucket.name` and
//! `Records[].s3.object.key`, keys form-encoded) as well as a bare
//! `{"bucket": ..., "key": ...}` object for manual invocations.

use crate::core::pipeline::InboundObject;
use crate::domain::{BucketName, ObjectKey, Result, StageError};
use serde::Deserialize;

const OBJECT_CREATED_PREFIX: &str = "ObjectCreated";

/// A parsed inbound notification
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ObjectCreatedEvent {
    S3 {
        #[serde(rename = "Records")]
        records: Vec<S3Record>,
    },
    Direct {
        #[serde(default)]
        bucket: Option<String>,
        key: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct S3Record {
    #[serde(rename = "eventName", default)]
    pub event_name: Option<String>,
    pub s3: S3Entity,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct S3Object {
    pub key: String,
    #[serde(default)]
    pub size: Option<u64>,
}

impl ObjectCreatedEvent {
    /// Parse a notification body
    ///
    /// # Errors
    ///
    /// Returns [`StageError::Event`] when the JSON matches neither shape.
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map_err(|e| StageError::Event(format!("unrecognized notification: {e}")))
    }

    /// Inbound objects named by this notification
    ///
    /// Records for other event types (e.g. `ObjectRemoved:*`) are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::Event`] if a record carries an empty bucket or key.
    ///
    /// # Examples
    ///
    /// ```
    /// use hl7stage::adapters::event::ObjectCreatedEvent;
    ///
    /// let event = ObjectCreatedEvent::from_json(
    ///     r#"{"Records":[{"eventName":"ObjectCreated:Put",
    ///         "s3":{"bucket":{"name":"raw"},"object":{"key":"in/adt+0001.hl7"}}}]}"#,
    /// ).unwrap();
    ///
    /// let objects = event.objects().unwrap();
    /// assert_eq!(objects[0].key.as_str(), "in/adt 0001.hl7");
    /// ```
    pub fn objects(&self) -> Result<Vec<InboundObject>> {
        match self {
            Self::Direct { bucket, key } => {
                let bucket = bucket
                    .as_deref()
                    .filter(|b| !b.trim().is_empty())
                    .map(BucketName::new)
                    .transpose()
                    .map_err(StageError::Event)?;
                let key = ObjectKey::new(key.as_str()).map_err(StageError::Event)?;
                Ok(vec![InboundObject { bucket, key }])
            }
            Self::S3 { records } => {
                let mut objects = Vec::with_capacity(records.len());
                for record in records {
                    if let Some(name) = record.event_name.as_deref() {
                        if !name.starts_with(OBJECT_CREATED_PREFIX) {
                            tracing::debug!(event_name = name, "Skipping non-create record");
                            continue;
                        }
                    }
                    let bucket =
                        BucketName::new(record.s3.bucket.name.as_str()).map_err(StageError::Event)?;
                    let key = decode_key(&record.s3.object.key)
                        .and_then(|k| ObjectKey::new(k).ok())
                        .ok_or_else(|| {
                            StageError::Event(format!(
                                "record for bucket '{bucket}' has an empty object key"
                            ))
                        })?;
                    objects.push(InboundObject {
                        bucket: Some(bucket),
                        key,
                    });
                }
                Ok(objects)
            }
        }
    }
}

/// Decode an S3 notification key (`+` is a space, `%XX` escapes)
fn decode_key(raw: &str) -> Option<String> {
    // Keep literal separators from being read as form pairs
    let protected = raw.replace('&', "%26").replace('=', "%3D");
    url::form_urlencoded::parse(protected.as_bytes())
        .next()
        .map(|(name, _)| name.into_owned())
}
