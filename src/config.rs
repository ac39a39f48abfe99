//! Run configuration
//!
//! Values come from command-line flags first, then the process environment.
//! An env file can be imported into the environment beforehand; it never
//! overrides variables that are already set.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use clap::Args;

use crate::error::{Result, SyncError};
use crate::http::DEFAULT_CONNECT_TIMEOUT_SECS;

/// Environment variable names
pub mod env {
    pub const URL: &str = "URL";
    pub const REGION: &str = "REGION";
    pub const BUCKET: &str = "BUCKET";
    pub const ACCESS_KEY: &str = "ACCESS_KEY";
    pub const ACCESS_KEY_SECRET: &str = "ACCESS_KEY_SECRET";
    pub const ENDPOINT: &str = "ENDPOINT";
    pub const PATH_STYLE: &str = "PATH_STYLE";
    pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
}

/// Flags accepted by the CLI
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// buildpack.toml URL
    #[arg(long)]
    pub url: Option<String>,

    /// Bearer token for the manifest and artifact downloads
    #[arg(long)]
    pub token: Option<String>,

    /// Bucket region
    #[arg(long)]
    pub region: Option<String>,

    /// Target bucket
    #[arg(long)]
    pub bucket: Option<String>,

    /// Access key id
    #[arg(long = "ak")]
    pub access_key_id: Option<String>,

    /// Access key secret
    #[arg(long = "sk")]
    pub access_key_secret: Option<String>,

    /// S3-compatible endpoint URL (defaults to AWS)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Use path-style bucket addressing
    #[arg(long)]
    pub path_style: bool,

    /// Connect timeout in seconds
    #[arg(long = "connect-timeout", default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    pub connect_timeout_secs: u64,

    /// Only report what would be transferred
    #[arg(long)]
    pub dry_run: bool,
}

/// Bucket connection settings
#[derive(Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub region: String,
    pub bucket: String,
    pub endpoint: Option<String>,
    pub access_key_id: String,
    pub access_key_secret: String,
    pub path_style: bool,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .field("path_style", &self.path_style)
            .finish()
    }
}

/// Fully resolved configuration for one run
#[derive(Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub manifest_url: String,
    pub token: Option<String>,
    pub storage: StorageConfig,
    pub connect_timeout: Duration,
    pub dry_run: bool,
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("manifest_url", &self.manifest_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("storage", &self.storage)
            .field("connect_timeout", &self.connect_timeout)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl SyncConfig {
    /// Resolve against the process environment
    pub fn from_env(args: ConfigArgs) -> Result<Self> {
        Self::resolve(args, |name| std::env::var(name).ok())
    }

    /// Resolve flags, falling back to `lookup` for anything not given.
    ///
    /// Empty values count as missing. Required values are checked in the
    /// order URL, REGION, BUCKET, ACCESS_KEY, ACCESS_KEY_SECRET and the first
    /// missing one is reported.
    pub fn resolve<F>(args: ConfigArgs, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |flag: Option<String>, name: &str| {
            flag.filter(|v| !v.is_empty())
                .or_else(|| lookup(name).filter(|v| !v.is_empty()))
        };
        let require = |flag: Option<String>, name: &str| {
            pick(flag, name).ok_or_else(|| SyncError::Config(format!("{} is required", name)))
        };

        let manifest_url = require(args.url, env::URL)?;
        let region = require(args.region, env::REGION)?;
        let bucket = require(args.bucket, env::BUCKET)?;
        let access_key_id = require(args.access_key_id, env::ACCESS_KEY)?;
        let access_key_secret = require(args.access_key_secret, env::ACCESS_KEY_SECRET)?;

        let endpoint = pick(args.endpoint, env::ENDPOINT);
        let token = pick(args.token, env::GITHUB_TOKEN);

        let path_style = if args.path_style {
            true
        } else {
            match lookup(env::PATH_STYLE) {
                Some(value) => parse_bool(env::PATH_STYLE, &value)?,
                None => false,
            }
        };

        Ok(Self {
            manifest_url,
            token,
            storage: StorageConfig {
                region,
                bucket,
                endpoint,
                access_key_id,
                access_key_secret,
                path_style,
            },
            connect_timeout: Duration::from_secs(args.connect_timeout_secs),
            dry_run: args.dry_run,
        })
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        other => Err(SyncError::Config(format!(
            "{} must be a boolean, got {:?}",
            name, other
        ))),
    }
}

/// Import an env file into the process environment.
///
/// Only variables that are unset or empty are filled from the file; a
/// non-empty value already in the environment always wins. Returns
/// `Ok(false)` when the file does not exist.
pub fn import_env_file(path: &Path) -> Result<bool> {
    if !path.exists() {
        tracing::info!("skip loading env file: {} not found", path.display());
        return Ok(false);
    }

    let load_error = |e: dotenvy::Error| {
        SyncError::Config(format!("failed to load env file {}: {}", path.display(), e))
    };

    for item in dotenvy::from_path_iter(path).map_err(load_error)? {
        let (name, value) = item.map_err(load_error)?;
        let unset = std::env::var_os(&name).filter(|v| !v.is_empty()).is_none();
        if unset {
            std::env::set_var(&name, value);
        }
    }

    tracing::debug!("Loaded env file {}", path.display());
    Ok(true)
}
