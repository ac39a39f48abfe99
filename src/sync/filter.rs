//! Staleness filter
//!
//! Queries the bucket for every declared artifact and keeps the ones whose
//! object is missing or carries a different `sha256` metadata value.

use crate::error::{Result, SyncError};
use crate::storage::ObjectStore;
use crate::types::Dependency;

/// Why a dependency needs a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    /// No object at the key
    Missing,
    /// Object exists without a `sha256` metadata value
    Untagged,
    /// Object carries a different hash
    HashMismatch,
}

impl Staleness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Staleness::Missing => "missing",
            Staleness::Untagged => "untagged",
            Staleness::HashMismatch => "hash mismatch",
        }
    }
}

/// Classify one dependency against the bucket.
///
/// Returns `None` when the stored object is up to date.
pub async fn check_dependency<S>(
    store: &S,
    bucket: &str,
    dependency: &Dependency,
) -> Result<Option<Staleness>>
where
    S: ObjectStore + ?Sized,
{
    let key = dependency.storage_key()?;

    let metadata = store
        .head_object(bucket, &key)
        .await
        .map_err(|e| SyncError::MetadataQuery {
            key: key.clone(),
            message: e.to_string(),
        })?;

    let staleness = match metadata {
        None => Some(Staleness::Missing),
        Some(meta) => match meta.sha256() {
            None => Some(Staleness::Untagged),
            Some(stored) if stored == dependency.sha256() => None,
            Some(_) => Some(Staleness::HashMismatch),
        },
    };

    match staleness {
        Some(reason) => tracing::debug!("{} needs transfer ({})", key, reason.as_str()),
        None => tracing::debug!("{} is up to date", key),
    }
    Ok(staleness)
}

/// Keep the dependencies that must be transferred, in manifest order.
///
/// Any metadata query failure other than not-found aborts the whole filter.
pub async fn filter_stale<S>(
    store: &S,
    bucket: &str,
    dependencies: Vec<Dependency>,
) -> Result<Vec<Dependency>>
where
    S: ObjectStore + ?Sized,
{
    let mut stale = Vec::with_capacity(dependencies.len());
    for dependency in dependencies {
        if check_dependency(store, bucket, &dependency).await?.is_some() {
            stale.push(dependency);
        }
    }
    Ok(stale)
}
