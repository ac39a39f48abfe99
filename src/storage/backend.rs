//! Object store trait for abstracting bucket implementations
//!
//! The sync pipeline only needs two bucket operations: a metadata lookup and a
//! streaming upload. Backends (S3-compatible services, the in-memory store used
//! in tests) implement `ObjectStore` so the pipeline stays independent of the
//! storage SDK.

use std::collections::HashMap;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::error::Result;
use crate::types::SHA256_METADATA_KEY;

/// Streaming object body
pub type ObjectBody = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send + Sync>>;

/// Build a single-chunk body from in-memory bytes
pub fn body_from_bytes(data: impl Into<Bytes>) -> ObjectBody {
    Box::pin(futures::stream::iter(vec![Ok(data.into())]))
}

/// Metadata returned by a HEAD request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// User-defined metadata (`x-amz-meta-*` on S3)
    pub user_metadata: HashMap<String, String>,
    /// Object size in bytes, if reported
    pub content_length: Option<u64>,
}

impl ObjectMetadata {
    /// Hash recorded by a previous transfer
    pub fn sha256(&self) -> Option<&str> {
        self.user_metadata
            .get(SHA256_METADATA_KEY)
            .map(String::as_str)
    }
}

/// Upload request for a single object
pub struct PutRequest<'a> {
    pub bucket: &'a str,
    pub key: &'a str,
    pub body: ObjectBody,
    /// Declared length of `body`, when the source advertised one
    pub content_length: Option<u64>,
    pub metadata: HashMap<String, String>,
}

/// Bucket operations used by the sync pipeline
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object's metadata without downloading its body
    ///
    /// # Returns
    /// `Ok(None)` if the object does not exist. Every other failure is an
    /// error; callers must not treat it as absence.
    async fn head_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectMetadata>>;

    /// Upload an object, consuming the body stream
    ///
    /// The body is dropped before this returns, whether the upload succeeded
    /// or not.
    async fn put_object(&self, request: PutRequest<'_>) -> Result<()>;

    /// Backend name for logs (e.g. "s3", "memory")
    fn backend_name(&self) -> &'static str;
}
