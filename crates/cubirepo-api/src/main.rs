//! # cubirepo: Binary Entry Point
//!
//! Parses the command line, restores the registry, and serves the Axum
//! router until interrupted.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use cubirepo_api::state::{AppConfig, DEFAULT_MAX_UPLOAD_MB, DEFAULT_PASSWORD, DEFAULT_PORT};
use cubirepo_feed::config::{DEFAULT_ARTIFACT_DIR, DEFAULT_ARTIFACT_PREFIX, DEFAULT_TIMEOUT_SECS};
use cubirepo_feed::retry::DEFAULT_MAX_ATTEMPTS;
use cubirepo_feed::FeedConfig;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

/// cubirepo: a small named-artifact registry.
///
/// Serves versioned artifacts at `/{author}/{name}/{name}_{version}.{ext}`
/// and their metadata at the same path with a `.json` extension.
#[derive(Parser)]
#[command(name = "cubirepo", version, about)]
struct Cli {
    /// Port to listen on.
    #[arg(long, env = "CUBIREPO_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Administrator password for /login/.
    #[arg(long, env = "CUBIREPO_PASSWORD", default_value = DEFAULT_PASSWORD, hide_env_values = true, hide_default_value = true)]
    password: String,

    /// Directory holding cubirepo.dat and the cache/ payload directory.
    #[arg(long, env = "CUBIREPO_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// Upload size limit in MiB.
    #[arg(long, env = "CUBIREPO_MAX_UPLOAD_MB", default_value_t = DEFAULT_MAX_UPLOAD_MB)]
    max_upload_mb: usize,

    /// Build server project URL serving cubition/server@latest.
    #[arg(long, env = "CUBIREPO_FEED_URL")]
    feed_url: Option<String>,

    /// Filename prefix of the artifact picked from the latest stable build.
    #[arg(long, env = "CUBIREPO_FEED_PREFIX", default_value = DEFAULT_ARTIFACT_PREFIX)]
    feed_prefix: String,

    /// Directory under the build's artifact/ holding the artifact.
    #[arg(long, env = "CUBIREPO_FEED_ARTIFACT_DIR", default_value = DEFAULT_ARTIFACT_DIR)]
    feed_artifact_dir: String,

    /// Timeout of each build server request, in seconds.
    #[arg(long, env = "CUBIREPO_FEED_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    feed_timeout_secs: u64,

    /// Attempts per build server request when the connection is refused.
    #[arg(long, env = "CUBIREPO_FEED_MAX_ATTEMPTS", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    feed_max_attempts: u32,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn feed_config(&self) -> anyhow::Result<Option<FeedConfig>> {
        let Some(url) = self.feed_url.as_deref() else {
            return Ok(None);
        };
        let mut config = FeedConfig::new(url)
            .context("invalid --feed-url")?
            .with_timeout_secs(self.feed_timeout_secs);
        config.artifact_prefix = self.feed_prefix.clone();
        config.artifact_dir = self.feed_artifact_dir.clone();
        config.retry.max_attempts = self.feed_max_attempts;
        tracing::info!(
            deadline_secs = config.fetch_deadline().as_secs_f64(),
            "build feed lookups are capped"
        );
        Ok(Some(config))
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();
    init_tracing(cli.log_json);

    let feed = cli.feed_config()?;
    let config = AppConfig {
        port: cli.port,
        password: Zeroizing::new(std::mem::take(&mut cli.password)),
        data_dir: cli.data_dir.clone(),
        max_upload_bytes: cli.max_upload_mb.saturating_mul(1024 * 1024),
    };
    if config.uses_default_password() {
        tracing::warn!("using the default administrator password; set --password or CUBIREPO_PASSWORD");
    }

    let state = cubirepo_api::bootstrap::bootstrap(config, feed).map_err(|e| {
        tracing::error!("Bootstrap failed: {e}");
        e
    })?;

    let app = cubirepo_api::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("cubirepo listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("cubirepo stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
