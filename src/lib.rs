//! depsync - mirror manifest-declared artifacts into object storage
//!
//! Fetches a `buildpack.toml`-style manifest, queries the target bucket for
//! each declared artifact, and streams the missing or stale ones from their
//! source URLs into the bucket, tagging each object with its `sha256`.

pub mod config;
pub mod error;
pub mod http;
pub mod manifest;
pub mod storage;
pub mod sync;
pub mod types;

pub use error::{Result, SyncError};
pub use sync::{SyncReport, Syncer};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
