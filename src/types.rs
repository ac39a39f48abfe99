//! Core types for depsync

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, SyncError};

/// Object metadata key holding the manifest hash of the stored artifact
pub const SHA256_METADATA_KEY: &str = "sha256";

/// One artifact declared in the manifest.
///
/// Fields are read-only after construction, so the cached URL and the storage
/// key always agree with `uri`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    id: String,
    sha256: String,
    uri: String,
    version: String,
    url: Url,
}

impl Dependency {
    /// Build a descriptor, rejecting URIs that are not absolute http(s) URLs
    pub fn new(
        id: impl Into<String>,
        sha256: impl Into<String>,
        uri: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self> {
        let uri = uri.into();
        let url = parse_source_url(&uri)?;
        Ok(Self {
            id: id.into(),
            sha256: sha256.into(),
            uri,
            version: version.into(),
            url,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Expected content hash, compared verbatim against stored metadata
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    /// Source URI exactly as declared
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Parsed source URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Object key this artifact is stored under
    pub fn storage_key(&self) -> Result<String> {
        key_from_url(&self.url, &self.uri)
    }
}

/// Manifest entry as it appears in the document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDependency {
    #[serde(default)]
    pub id: String,
    pub sha256: String,
    pub uri: String,
    #[serde(default)]
    pub version: String,
}

impl TryFrom<RawDependency> for Dependency {
    type Error = SyncError;

    fn try_from(raw: RawDependency) -> Result<Self> {
        Dependency::new(raw.id, raw.sha256, raw.uri, raw.version)
    }
}

/// Ordered list of declared artifacts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub dependencies: Vec<Dependency>,
}

impl Manifest {
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }
}

impl IntoIterator for Manifest {
    type Item = Dependency;
    type IntoIter = std::vec::IntoIter<Dependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.dependencies.into_iter()
    }
}

/// Derive the storage key for a source URI.
///
/// The URL path is percent-decoded once and a single leading `/` is removed.
/// `+` is not treated as an encoded space.
pub fn storage_key(uri: &str) -> Result<String> {
    let url = parse_source_url(uri)?;
    key_from_url(&url, uri)
}

fn parse_source_url(uri: &str) -> Result<Url> {
    let url = Url::parse(uri).map_err(|e| SyncError::key_resolution(uri, e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(SyncError::key_resolution(
            uri,
            format!("unsupported scheme {:?}", other),
        )),
    }
}

fn key_from_url(url: &Url, uri: &str) -> Result<String> {
    let decoded = percent_decode_str(url.path())
        .decode_utf8()
        .map_err(|e| SyncError::key_resolution(uri, format!("path is not UTF-8: {}", e)))?;

    let key = decoded.strip_prefix('/').unwrap_or(&decoded);
    if key.is_empty() {
        return Err(SyncError::key_resolution(uri, "empty object key"));
    }
    Ok(key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_decodes_path() {
        assert_eq!(storage_key("https://host/x%2By.bin").unwrap(), "x+y.bin");
        assert_eq!(
            storage_key("https://host/a%20b/c.tgz").unwrap(),
            "a b/c.tgz"
        );
    }

    #[test]
    fn test_storage_key_keeps_plus() {
        assert_eq!(storage_key("https://host/x+y.bin").unwrap(), "x+y.bin");
    }

    #[test]
    fn test_storage_key_ignores_query_and_fragment() {
        assert_eq!(
            storage_key("https://host/dir/file.tgz?token=1#frag").unwrap(),
            "dir/file.tgz"
        );
    }

    #[test]
    fn test_storage_key_strips_one_separator() {
        assert_eq!(storage_key("https://host//nested/a").unwrap(), "/nested/a");
    }

    #[test]
    fn test_storage_key_rejects_empty() {
        let err = storage_key("https://host/").unwrap_err();
        assert!(matches!(err, SyncError::KeyResolution { .. }));
    }

    #[test]
    fn test_storage_key_rejects_relative() {
        let err = storage_key("dir/file.tgz").unwrap_err();
        assert!(matches!(err, SyncError::KeyResolution { .. }));
    }

    #[test]
    fn test_storage_key_rejects_non_http() {
        let err = storage_key("ftp://host/file.tgz").unwrap_err();
        assert!(matches!(err, SyncError::KeyResolution { .. }));
    }

    #[test]
    fn test_storage_key_rejects_invalid_utf8() {
        let err = storage_key("https://host/%FF.bin").unwrap_err();
        assert!(matches!(err, SyncError::KeyResolution { .. }));
    }

    #[test]
    fn test_dependency_key_matches_free_function() {
        let dep = Dependency::new("a", "abc123", "https://host/x%2By.bin", "1.0").unwrap();
        assert_eq!(dep.storage_key().unwrap(), storage_key(dep.uri()).unwrap());
        assert_eq!(dep.url().host_str(), Some("host"));
    }

    #[test]
    fn test_dependency_accessors() {
        let dep = Dependency::new("jdk", "abc123", "https://host/x%2By.bin", "17.0.9").unwrap();
        assert_eq!(dep.id(), "jdk");
        assert_eq!(dep.sha256(), "abc123");
        assert_eq!(dep.uri(), "https://host/x%2By.bin");
        assert_eq!(dep.version(), "17.0.9");

        // A clone carries the same key; there is no way to repoint it
        let copy = dep.clone();
        assert_eq!(copy.storage_key().unwrap(), "x+y.bin");
        assert_eq!(copy, dep);
    }

    #[test]
    fn test_dependency_rejects_invalid_uri() {
        let result = Dependency::new("a", "abc123", "not a url", "");
        assert!(matches!(result, Err(SyncError::KeyResolution { .. })));
    }
}
