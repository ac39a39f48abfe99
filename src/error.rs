//! Error types for depsync

use thiserror::Error;

/// Result type alias for depsync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Main error type for depsync
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("failed to fetch manifest {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot resolve storage key for {uri:?}: {reason}")]
    KeyResolution { uri: String, reason: String },

    #[error("failed to get object meta for {key:?}: {message}")]
    MetadataQuery { key: String, message: String },

    #[error("failed to transfer {uri:?}: {message}")]
    Transfer { uri: String, message: String },

    #[error("Object store error: {0}")]
    ObjectStore(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Short label used in structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Fetch { .. } => "fetch",
            SyncError::Parse(_) => "parse",
            SyncError::KeyResolution { .. } => "key",
            SyncError::MetadataQuery { .. } => "metadata",
            SyncError::Transfer { .. } => "transfer",
            SyncError::ObjectStore(_) => "store",
            SyncError::Config(_) => "config",
            SyncError::Io(_) => "io",
        }
    }

    /// Source URI of the artifact whose transfer failed, if any
    pub fn failed_uri(&self) -> Option<&str> {
        match self {
            SyncError::Transfer { uri, .. } => Some(uri),
            _ => None,
        }
    }

    pub(crate) fn key_resolution(uri: &str, reason: impl Into<String>) -> Self {
        SyncError::KeyResolution {
            uri: uri.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn transfer(uri: &str, err: impl std::fmt::Display) -> Self {
        SyncError::Transfer {
            uri: uri.to_string(),
            message: err.to_string(),
        }
    }
}
