//! depsync CLI
//!
//! Mirrors the dependencies declared in a buildpack manifest into an
//! S3-compatible bucket.

use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use depsync::config::{import_env_file, ConfigArgs, SyncConfig};
use depsync::http::HttpClient;
use depsync::storage::S3Store;
use depsync::Syncer;

#[derive(Parser)]
#[command(name = "depsync")]
#[command(about = "Mirror manifest dependencies into an object storage bucket")]
#[command(version)]
struct Cli {
    /// Env file imported before reading configuration from the environment
    #[arg(long = "env", default_value = ".env")]
    env_file: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(flatten)]
    config: ConfigArgs,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    // Expand ~ in path
    let env_file = shellexpand::tilde(&cli.env_file).to_string();
    import_env_file(Path::new(&env_file)).context("loading env file")?;

    let config = SyncConfig::from_env(cli.config).context("checking failed")?;
    tracing::debug!("Resolved configuration: {:?}", config);

    let http = HttpClient::new(config.token.clone(), config.connect_timeout)
        .context("building HTTP client")?;
    let store = S3Store::connect(&config.storage).await;

    let started = Instant::now();
    let report = Syncer::new(&store, &http, &config.storage.bucket)
        .dry_run(config.dry_run)
        .run(&config.manifest_url)
        .await
        .map_err(|e| {
            tracing::error!(kind = e.kind(), "sync failed: {}", e);
            e
        })
        .context("sync failed")?;

    tracing::debug!(
        "Run finished in {:.1}s ({} declared, {} stale, {} transferred)",
        started.elapsed().as_secs_f64(),
        report.declared,
        report.stale.len(),
        report.transferred
    );
    Ok(())
}
