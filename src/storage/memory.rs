//! In-memory object store
//!
//! Keeps objects in a map keyed by bucket and key. Used by tests and for
//! exercising the pipeline without network access. Failures can be injected
//! per key to model denied HEAD requests and rejected uploads.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use parking_lot::Mutex;

use super::backend::{ObjectMetadata, ObjectStore, PutRequest};
use crate::error::{Result, SyncError};

/// A stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Bytes,
    pub metadata: HashMap<String, String>,
}

#[derive(Default)]
struct Inner {
    objects: HashMap<(String, String), StoredObject>,
    head_failures: HashMap<String, String>,
    put_failures: HashSet<String>,
    head_calls: usize,
    put_calls: Vec<String>,
}

/// Object store backed by a `HashMap`
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object
    pub fn insert(
        &self,
        bucket: &str,
        key: &str,
        data: impl Into<Bytes>,
        metadata: HashMap<String, String>,
    ) {
        self.inner.lock().objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                data: data.into(),
                metadata,
            },
        );
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.inner
            .lock()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Make every HEAD of `key` fail with `message`
    pub fn fail_head(&self, key: &str, message: &str) {
        self.inner
            .lock()
            .head_failures
            .insert(key.to_string(), message.to_string());
    }

    /// Make every upload to `key` fail after the body is consumed
    pub fn fail_put(&self, key: &str) {
        self.inner.lock().put_failures.insert(key.to_string());
    }

    pub fn head_calls(&self) -> usize {
        self.inner.lock().head_calls
    }

    /// Keys passed to `put_object`, in call order
    pub fn put_calls(&self) -> Vec<String> {
        self.inner.lock().put_calls.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn head_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectMetadata>> {
        let mut inner = self.inner.lock();
        inner.head_calls += 1;

        if let Some(message) = inner.head_failures.get(key) {
            return Err(SyncError::ObjectStore(message.clone()));
        }

        Ok(inner
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|obj| ObjectMetadata {
                user_metadata: obj.metadata.clone(),
                content_length: Some(obj.data.len() as u64),
            }))
    }

    async fn put_object(&self, request: PutRequest<'_>) -> Result<()> {
        self.inner.lock().put_calls.push(request.key.to_string());

        let chunks: Vec<Bytes> = request.body.try_collect().await?;
        let data = Bytes::from(chunks.concat());

        let mut inner = self.inner.lock();
        if inner.put_failures.contains(request.key) {
            return Err(SyncError::ObjectStore(format!(
                "upload rejected for {}",
                request.key
            )));
        }

        inner.objects.insert(
            (request.bucket.to_string(), request.key.to_string()),
            StoredObject {
                data,
                metadata: request.metadata,
            },
        );
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
