//! cfm-recorder - playback recording service
//!
//! Accepts playback submissions, reconciles them against the mbs catalog
//! lookup and serves the recorded history over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use cfm_common::config::load_config;
use cfm_recorder::mbs::MbsClient;
use cfm_recorder::{build_router, AppState};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments; flags override the TOML file
#[derive(Parser, Debug)]
#[command(name = "cfm-recorder")]
#[command(about = "Playback recording and reconciliation service")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "CFM_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "CFM_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    bind: Option<String>,

    /// SQLite database file
    #[arg(short, long, env = "CFM_DATABASE")]
    database: Option<PathBuf>,

    /// Base URL of the mbs lookup service
    #[arg(long, env = "CFM_MBS_URL")]
    mbs_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    if let Some(database) = args.database {
        config.database_path = Some(database);
    }
    if let Some(mbs_url) = args.mbs_url {
        config.mbs.base_url = mbs_url;
    }

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting cfm-recorder v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let db_path = config.resolved_database_path();
    info!("Database path: {}", db_path.display());
    let pool = cfm_common::db::init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let lookup = MbsClient::new(&config.mbs).context("Failed to create mbs client")?;
    info!(
        "Catalog lookup at {} (timeout {} ms, default threshold {})",
        lookup.base_url(),
        config.mbs.timeout_ms,
        config.matching.default_threshold
    );

    let state = AppState::new(pool, Arc::new(lookup), config.matching.default_threshold);
    let app = build_router(state);

    let addr = config.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("cfm-recorder listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
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
