//! booktrack-server - personal library service
//!
//! Serves the ingestion pipeline (photo → OCR → book extraction → covers),
//! library management, reports and recommendations over HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use booktrack_common::config::{load_toml_config, RootFolderInitializer, RootFolderResolver};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use booktrack_server::auth::TrustedHeaderIdentity;
use booktrack_server::config::ServiceSettings;
use booktrack_server::services::{GoogleBooksClient, OpenAiClient, VisionClient};
use booktrack_server::AppState;

/// Command-line arguments for booktrack-server
#[derive(Parser, Debug)]
#[command(name = "booktrack-server")]
#[command(about = "Personal library service for BookTrack")]
#[command(version)]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1", env = "BOOKTRACK_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "5780", env = "BOOKTRACK_PORT")]
    port: u16,

    /// Data folder holding the database
    #[arg(short, long, env = "BOOKTRACK_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Path to booktrack.toml
    #[arg(short, long, env = "BOOKTRACK_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config =
        load_toml_config(args.config.as_deref()).context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&toml_config.logging.level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting booktrack-server");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Step 1: Resolve root folder
    let root_folder = RootFolderResolver::new(args.root_folder.as_deref(), &toml_config).resolve();

    // Step 2: Create root folder directory if missing
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    // Step 3: Open or create database
    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());
    let db_pool = booktrack_common::db::init_database(&db_path)
        .await
        .context("Failed to open database")?;

    // Step 4: External service adapters
    let settings = ServiceSettings::resolve(&toml_config.services);
    for service in settings.missing_keys() {
        warn!("{} API key not configured; its requests will fail", service);
    }

    let ocr = VisionClient::new(settings.vision_api_key.clone(), settings.request_timeout)
        .context("Failed to build Vision client")?;
    let completion = OpenAiClient::new(
        settings.openai_api_key.clone(),
        settings.openai_model.clone(),
        settings.request_timeout,
    )
    .context("Failed to build OpenAI client")?;
    let covers = GoogleBooksClient::new(
        settings.google_books_api_key.clone(),
        settings.request_timeout,
    )
    .context("Failed to build Google Books client")?;
    info!("Completion model: {}", completion.model());

    let state = AppState::new(
        db_pool.clone(),
        Arc::new(TrustedHeaderIdentity::new(db_pool)),
        Arc::new(ocr),
        Arc::new(completion),
        Arc::new(covers),
    );
    let app = booktrack_server::build_router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", args.host, args.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
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
