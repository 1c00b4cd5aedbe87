//! nbc-server - Nursery back check web service
//!
//! Serves the data-entry forms, the protected record views and the JSON API
//! over one SQLite database in the configured root folder.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nbc_common::attachments::Uploader;
use nbc_common::auth;
use nbc_common::config::{load_toml_config, CliOverrides, Settings};
use nbc_common::db::init_database;
use nbc_server::{build_router, AppState};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for nbc-server
#[derive(Parser, Debug)]
#[command(name = "nbc-server")]
#[command(about = "Nursery back check data collection service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "NBC_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(short, long)]
    bind: Option<String>,

    /// Folder holding nursery.db
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// TOML config file (default: <config dir>/nbc/config.toml)
    #[arg(short, long, env = "NBC_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset (e.g. "info", "nbc_server=debug")
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a user, or reset an existing user's password
    AddUser {
        #[arg(short, long)]
        username: String,

        /// Read from NBC_PASSWORD when omitted
        #[arg(short, long, env = "NBC_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml = load_toml_config(args.config.as_deref()).context("Failed to load config file")?;
    let cli = CliOverrides {
        root_folder: args.root_folder.clone(),
        bind: args.bind.clone(),
        port: args.port,
        log_level: args.log_level.clone(),
    };
    let settings = Settings::resolve(&cli, &toml).context("Invalid configuration")?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting nbc-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let db_path = settings.database_path();
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    if let Some(Command::AddUser { username, password }) = args.command {
        auth::upsert_user(&pool, &username, &password)
            .await
            .context("Failed to store user")?;
        println!("User '{}' saved", username.trim());
        return Ok(());
    }

    let purged = auth::purge_expired_sessions(&pool).await?;
    if purged > 0 {
        info!("Removed {} expired session(s)", purged);
    }
    if auth::user_count(&pool).await? == 0 {
        warn!("No users configured; add one with `nbc-server add-user --username <name>` to reach the records pages");
    }

    let uploader = Uploader::new(settings.upload.clone())?;
    if uploader.is_enabled() {
        info!("Audio uploads enabled");
    } else {
        warn!("No [upload] endpoint configured; farmer audio clips will not be stored");
    }

    let state = AppState::new(
        pool,
        uploader,
        chrono::Duration::hours(settings.session_ttl_hours),
    );
    let app = build_router(state);

    let addr = format!("{}:{}", settings.bind, settings.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("nbc-server listening on http://{}", addr);
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
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
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
