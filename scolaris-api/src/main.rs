//! Scolaris student records backend - main entry point
//!
//! Serves the REST API for student and admin authentication, student
//! management, document requests, and the notes import.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use scolaris_common::{auth, config, db};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scolaris_api::{build_router, AppState};

/// Command-line arguments for scolaris-api
#[derive(Parser, Debug)]
#[command(name = "scolaris-api")]
#[command(about = "Student records backend for Scolaris")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5680", env = "SCOLARIS_PORT")]
    port: u16,

    /// Root folder for the database and uploads (falls back to env,
    /// config file, then the OS data directory)
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Token signing secret; generated and persisted on first run when
    /// omitted
    #[arg(long, env = "SCOLARIS_AUTH_SECRET")]
    auth_secret: Option<String>,

    /// Create or refresh an admin account, format: email:password
    #[arg(long, env = "SCOLARIS_SEED_ADMIN")]
    seed_admin: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scolaris_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting Scolaris backend (scolaris-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let root_folder = config::resolve_root_folder(args.root_folder.as_deref())
        .context("Failed to resolve root folder")?;
    config::ensure_root_folder(&root_folder).context("Failed to create root folder")?;
    info!("Root folder: {}", root_folder.display());

    let db_path = config::database_path(&root_folder);
    let pool = db::init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    // Explicit configuration beats the persisted secret
    let signing_secret = match args.auth_secret {
        Some(secret) => secret,
        None => auth::load_signing_secret(&pool)
            .await
            .context("Failed to load signing secret")?,
    };

    if let Some(seed) = args.seed_admin.as_deref() {
        let (email, password) = seed
            .split_once(':')
            .context("--seed-admin expects email:password")?;
        scolaris_api::db::admins::seed(&pool, email, &auth::hash_password(password))
            .await
            .context("Failed to seed admin account")?;
    }

    let state = AppState::new(
        pool,
        signing_secret,
        config::uploads_dir(&root_folder),
        config::documents_dir(&root_folder),
    );
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("scolaris-api listening on http://{}", addr);
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
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
