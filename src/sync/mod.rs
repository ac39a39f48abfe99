//! Manifest-to-bucket synchronization pipeline
//!
//! Three phases run strictly in sequence: fetch the manifest, filter out
//! artifacts that are already up to date, then transfer the rest. Any error
//! aborts the run.

mod filter;
mod progress;
mod transfer;

pub use filter::{check_dependency, filter_stale, Staleness};
pub use progress::TransferProgress;
pub use transfer::{transfer_all, transfer_dependency};

use crate::error::Result;
use crate::http::HttpClient;
use crate::manifest::fetch_manifest;
use crate::storage::ObjectStore;
use crate::types::Dependency;

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Dependencies declared in the manifest
    pub declared: usize,
    /// Dependencies found missing or stale, in manifest order
    pub stale: Vec<Dependency>,
    /// Dependencies actually transferred
    pub transferred: usize,
    pub dry_run: bool,
}

impl SyncReport {
    pub fn is_up_to_date(&self) -> bool {
        self.stale.is_empty()
    }
}

/// Drives one run against a bucket
pub struct Syncer<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    http: &'a HttpClient,
    bucket: &'a str,
    dry_run: bool,
}

impl<'a, S: ObjectStore + ?Sized> Syncer<'a, S> {
    pub fn new(store: &'a S, http: &'a HttpClient, bucket: &'a str) -> Self {
        Self {
            store,
            http,
            bucket,
            dry_run: false,
        }
    }

    /// Stop after the filter phase
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Fetch the manifest at `manifest_url` and run the pipeline
    pub async fn run(&self, manifest_url: &str) -> Result<SyncReport> {
        let manifest = fetch_manifest(self.http, manifest_url).await?;
        self.sync(manifest.dependencies).await
    }

    /// Filter and transfer an already parsed dependency list
    pub async fn sync(&self, dependencies: Vec<Dependency>) -> Result<SyncReport> {
        let declared = dependencies.len();
        tracing::debug!(
            "Checking {} dependencies against {} bucket {}",
            declared,
            self.store.backend_name(),
            self.bucket
        );

        let stale = filter_stale(self.store, self.bucket, dependencies).await?;

        if stale.is_empty() {
            tracing::info!("All files are up to date");
            return Ok(SyncReport {
                declared,
                stale,
                transferred: 0,
                dry_run: self.dry_run,
            });
        }

        if self.dry_run {
            for dependency in &stale {
                tracing::info!(
                    "Would transfer {:?} ({} {})",
                    dependency.uri(),
                    dependency.id(),
                    dependency.version()
                );
            }
            tracing::info!("Dry run: {} of {} files need transfer", stale.len(), declared);
            return Ok(SyncReport {
                declared,
                stale,
                transferred: 0,
                dry_run: true,
            });
        }

        let transferred = transfer_all(self.store, self.http, self.bucket, &stale).await?;
        tracing::info!("Successfully transferred {} files", transferred);

        Ok(SyncReport {
            declared,
            stale,
            transferred,
            dry_run: false,
        })
    }
}
