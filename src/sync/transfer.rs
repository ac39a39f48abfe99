//! Transfer executor
//!
//! Streams each stale artifact from its source URL into the bucket, one at a
//! time. The first failure stops the batch; later artifacts are never opened.

use std::collections::HashMap;

use futures::TryStreamExt;

use super::progress::TransferProgress;
use crate::error::{Result, SyncError};
use crate::http::HttpClient;
use crate::storage::{ObjectBody, ObjectStore, PutRequest};
use crate::types::{Dependency, SHA256_METADATA_KEY};

/// Transfer a single artifact.
///
/// The download stream is owned by the upload request and is dropped when
/// `put_object` returns, on success and on failure alike.
pub async fn transfer_dependency<S>(
    store: &S,
    http: &HttpClient,
    bucket: &str,
    dependency: &Dependency,
) -> Result<u64>
where
    S: ObjectStore + ?Sized,
{
    let uri = dependency.uri();
    let key = dependency.storage_key()?;

    tracing::info!("Downloading {:?}", uri);
    let download = http
        .download(uri)
        .await
        .map_err(|e| SyncError::transfer(uri, e))?;

    tracing::info!("Transferring {:?} to {:?}", uri, key);
    let progress = TransferProgress::new(key.as_str(), download.content_length);
    let counter = progress.clone();
    let body: ObjectBody = Box::pin(
        download
            .body
            .inspect_ok(move |chunk| counter.advance(chunk.len() as u64)),
    );

    let metadata = HashMap::from([(
        SHA256_METADATA_KEY.to_string(),
        dependency.sha256().to_string(),
    )]);

    store
        .put_object(PutRequest {
            bucket,
            key: &key,
            body,
            content_length: download.content_length,
            metadata,
        })
        .await
        .map_err(|e| SyncError::transfer(uri, e))?;

    progress.finish();
    tracing::info!("Successfully transferred {:?}", uri);
    Ok(progress.transferred())
}

/// Transfer every dependency in order, stopping at the first failure.
///
/// Returns the number of artifacts transferred.
pub async fn transfer_all<S>(
    store: &S,
    http: &HttpClient,
    bucket: &str,
    dependencies: &[Dependency],
) -> Result<usize>
where
    S: ObjectStore + ?Sized,
{
    let mut transferred = 0;
    for dependency in dependencies {
        transfer_dependency(store, http, bucket, dependency).await?;
        transferred += 1;
    }
    Ok(transferred)
}
