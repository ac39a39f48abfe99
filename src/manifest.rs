//! Manifest fetching and parsing
//!
//! The manifest is a `buildpack.toml`-style document:
//!
//! ```toml
//! [[metadata.dependencies]]
//! id = "jdk"
//! sha256 = "8f2d..."
//! uri = "https://github.com/example/jdk/releases/download/v1/jdk.tgz"
//! version = "21.0.1"
//! ```

use serde::Deserialize;

use crate::error::{Result, SyncError};
use crate::http::HttpClient;
use crate::types::{Dependency, Manifest, RawDependency};

#[derive(Debug, Default, Deserialize)]
struct Document {
    #[serde(default)]
    metadata: Metadata,
}

#[derive(Debug, Default, Deserialize)]
struct Metadata {
    #[serde(default)]
    dependencies: Vec<RawDependency>,
}

/// Parse a manifest document, keeping declaration order
pub fn parse_manifest(text: &str) -> Result<Manifest> {
    let document: Document = toml::from_str(text)?;
    let dependencies = document
        .metadata
        .dependencies
        .into_iter()
        .map(Dependency::try_from)
        .collect::<Result<Vec<_>>>()?;

    Ok(Manifest { dependencies })
}

/// Download and parse the manifest at `url`
pub async fn fetch_manifest(http: &HttpClient, url: &str) -> Result<Manifest> {
    let fetch_error = |source: reqwest::Error| SyncError::Fetch {
        url: url.to_string(),
        source,
    };

    let response = http.get(url).await.map_err(fetch_error)?;
    let text = response.text().await.map_err(fetch_error)?;

    let manifest = parse_manifest(&text)?;
    tracing::info!(
        "Fetched manifest {} ({} dependencies)",
        url,
        manifest.len()
    );
    Ok(manifest)
}
