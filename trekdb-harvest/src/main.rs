//! trekdb-harvest - Star Trek data harvester and API server
//!
//! - `trekdb-harvest harvest` runs the pipeline once and rewrites the caches
//! - `trekdb-harvest serve` serves the caches, enrichment and the image proxy

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use trekdb_common::config::{load_toml_config, resolve_root_folder, TomlConfig};

use trekdb_harvest::clients::{StapiClient, WikiClient};
use trekdb_harvest::services::{
    CacheLayout, CastTable, EnrichmentService, Harvester, HttpImageFetcher, ImageCache,
};
use trekdb_harvest::utils::{RequestQueue, RetryPolicy};
use trekdb_harvest::AppState;

/// Command-line arguments for trekdb-harvest
#[derive(Parser, Debug)]
#[command(name = "trekdb-harvest")]
#[command(about = "Harvest, deduplicate and serve Star Trek character data")]
#[command(version)]
struct Args {
    /// Root folder for caches and images
    #[arg(short, long, global = true)]
    root_folder: Option<PathBuf>,

    /// Bootstrap config file (default: ~/.config/trekdb/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the harvest pipeline once
    Harvest {
        /// Maximum wiki enrichments this run
        #[arg(long)]
        enrich_limit: Option<usize>,
    },
    /// Serve the harvested data over HTTP
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "TREKDB_PORT")]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_toml_config(args.config.as_deref()).context("Failed to load config")?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(&config))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &config);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Root folder: {}", root_folder.display());

    let layout = CacheLayout::new(root_folder);
    let retry = RetryPolicy::new(
        config.max_attempts,
        Duration::from_millis(config.retry_base_delay_ms),
    );
    let queue = RequestQueue::new(Duration::from_millis(config.request_delay_ms));
    let wiki = Arc::new(WikiClient::new(config.wiki_base_url.clone())?);
    let fetcher = Arc::new(HttpImageFetcher::new()?);

    match args.command {
        Command::Harvest { enrich_limit } => {
            let source = StapiClient::new(config.stapi_base_url.clone(), retry)?;
            let enrichment = EnrichmentService::new(Arc::new(Vec::new()), wiki, queue, retry);
            let images = ImageCache::new(fetcher, layout.character_images_dir());
            let cast_table_path = config.cast_table.as_ref().map(|p| layout.root().join(p));
            let cast_table = load_cast_table(cast_table_path.as_deref())?;

            let harvester = Harvester::new(source, enrichment, images, layout)
                .with_cast_table(cast_table)
                .with_enrich_limit(enrich_limit.unwrap_or(config.enrich_limit));

            let summary = harvester.run().await.context("Harvest failed")?;
            info!("{}", serde_json::to_string(&summary)?);
        }
        Command::Serve { port } => {
            let port = port.unwrap_or(config.port);
            let state = AppState::load(&layout, wiki, fetcher, queue, retry);
            let app = trekdb_harvest::build_router(state);

            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            info!("Starting HTTP server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .context("Failed to bind to address")?;

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("Server error")?;

            info!("Server shutdown complete");
        }
    }

    Ok(())
}

fn default_filter(config: &TomlConfig) -> String {
    format!(
        "{level},trekdb_harvest={level},trekdb_common={level},tower_http=info",
        level = config.logging.level
    )
}

/// Explicit table path must load; without one the run has no cast lists
fn load_cast_table(path: Option<&Path>) -> Result<CastTable> {
    match path {
        Some(path) => CastTable::load(path)
            .with_context(|| format!("Failed to load cast table {}", path.display())),
        None => {
            warn!("No cast_table configured, cast lists will be empty");
            Ok(CastTable::default())
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
