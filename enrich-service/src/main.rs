//! enrich-service - simulated multi-provider contact enrichment
//!
//! Serves the enrichment API and runs the background scheduler that walks
//! pending enrichments through the provider list.

use anyhow::{Context, Result};
use clap::Parser;
use enrich_common::config::{load_config, TomlConfig};
use enrich_common::db::init_database;
use enrich_common::SystemClock;
use enrich_service::db::EnrichmentStore;
use enrich_service::directory::{Directory, SeedDirectory};
use enrich_service::worker::SeededRandom;
use enrich_service::{build_router, AppState, EnrichmentService};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "enrich-service")]
#[command(about = "Simulated multi-provider contact enrichment service")]
#[command(version)]
struct Args {
    /// Configuration file (defaults to <config_dir>/enrich/config.toml)
    #[arg(short, long, env = "ENRICH_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "ENRICH_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// SQLite database file, or ":memory:"
    #[arg(short, long, env = "ENRICH_DATABASE")]
    database: Option<String>,

    /// Seed for the provider simulation
    #[arg(long, env = "ENRICH_SEED")]
    seed: Option<u64>,

    /// Log level when RUST_LOG is unset
    #[arg(long, env = "ENRICH_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Args {
    /// Overlay command-line values on the loaded configuration
    fn apply(&self, config: &mut TomlConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(database) = &self.database {
            config.database.path = database.clone();
        }
        if self.seed.is_some() {
            config.worker.seed = self.seed;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Loaded before tracing so the configured level can drive the filter
    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    let level = &config.logging.level;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("enrich_service={0},enrich_common={0},tower_http={0}", level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting enrich-service v{} [{}] ({})",
        env!("CARGO_PKG_VERSION"),
        env!("ENRICH_COMMIT"),
        env!("ENRICH_BUILD_PROFILE")
    );

    if config.database.is_memory() {
        warn!("Using in-memory database; records are lost on restart");
    } else {
        info!("Database path: {}", config.database.path);
    }

    let pool = init_database(&config.database.path)
        .await
        .context("Failed to initialize database")?;

    let store = EnrichmentStore::new(pool, Arc::new(SystemClock));
    store
        .seed_static()
        .await
        .context("Failed to seed static enrichments")?;
    info!("✓ Database ready ({} enrichments)", store.count().await?);

    let directory: Arc<dyn Directory> = Arc::new(SeedDirectory::seeded());
    let random = Arc::new(SeededRandom::new(config.worker.seed));
    let service = Arc::new(EnrichmentService::new(
        store,
        directory,
        config.worker.clone(),
        random,
    ));

    let scheduler = service.start();

    let app = build_router(AppState::new(service.clone()));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("enrich-service listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    service.stop();
    if let Err(e) = scheduler.await {
        error!("Scheduler task ended abnormally: {}", e);
    }

    let in_flight = service.in_flight();
    if in_flight > 0 {
        info!("Exiting with {} enrichments still in flight", in_flight);
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
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
