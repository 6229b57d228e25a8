// Vaultd Server - Main Entry Point
//
// This file contains only the application bootstrap logic and CLI commands.
// All handlers, routes, and membership logic are in separate modules.

pub use vaultd_server::*;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::{Error as DotenvError, dotenv, from_filename};
use std::{
    env,
    path::{Path, PathBuf},
    sync::OnceLock,
};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_appender::non_blocking;
use tracing_subscriber::EnvFilter;
use vaultd_core::{config::AppConfig, db::Database, service::MembershipError};

static TRACING_GUARD: OnceLock<non_blocking::WorkerGuard> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(author, version, about = "Vaultd server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server
    Serve,
    /// Grant vault membership directly against the store
    AddMember {
        /// Vault identifier
        vault: String,
        /// User identifier
        user: String,
    },
    /// Report whether a user is an active member of a vault
    CheckMember {
        /// Vault identifier
        vault: String,
        /// User identifier
        user: String,
    },
    /// Revoke vault membership (the record is kept, flagged inactive)
    RemoveMember {
        /// Vault identifier
        vault: String,
        /// User identifier
        user: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_status = load_env_file();
    init_tracing();
    report_env_status(&env_status);

    let cli = Cli::parse();
    let config = AppConfig::load()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_serve(config).await,
        Command::AddMember { vault, user } => run_add_member(config, vault, user).await,
        Command::CheckMember { vault, user } => run_check_member(config, vault, user).await,
        Command::RemoveMember { vault, user } => run_remove_member(config, vault, user).await,
    }
}

async fn run_serve(config: AppConfig) -> anyhow::Result<()> {
    info!(
        store_backend = ?config.store_backend,
        store_path = %config.store_path,
        "Starting server with store configuration"
    );
    let database = Database::connect(&config)?;
    let state = build_state(&database);

    let app = router::build_router(state);

    let listener = TcpListener::bind(config.bind_address)
        .await
        .context("failed to bind socket")?;
    let actual_addr = listener
        .local_addr()
        .context("failed to read local address")?;

    info!("listening on {actual_addr}");

    if let Err(error) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(?error, "server terminated with error");
    }

    Ok(())
}

async fn run_add_member(config: AppConfig, vault: String, user: String) -> anyhow::Result<()> {
    let database = Database::connect(&config)?;
    let state = build_state(&database);

    state.membership.add(&vault, &user).await?;
    println!("added user {user} to vault {vault}");

    Ok(())
}

async fn run_check_member(config: AppConfig, vault: String, user: String) -> anyhow::Result<()> {
    let database = Database::connect(&config)?;
    let state = build_state(&database);

    match state.membership.check(&vault, &user).await {
        Ok(_) => {
            println!("user {user} is a member of vault {vault}");
            Ok(())
        }
        Err(MembershipError::NotFound { .. }) => {
            println!("user {user} is not a member of vault {vault}");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

async fn run_remove_member(config: AppConfig, vault: String, user: String) -> anyhow::Result<()> {
    let database = Database::connect(&config)?;
    let state = build_state(&database);

    state.membership.remove(&vault, &user).await?;
    println!("removed user {user} from vault {vault}");

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // When VAULTD_LOG_DIR is set, emit compact JSON to a rolling file
    // instead of stdout. Use RUST_LOG to control level.
    let log_dir = env::var("VAULTD_LOG_DIR")
        .ok()
        .map(|dir| dir.trim().to_owned())
        .filter(|dir| !dir.is_empty());

    let Some(log_dir) = log_dir else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .try_init();
        return;
    };

    if let Err(err) = std::fs::create_dir_all(&log_dir) {
        eprintln!("failed to create log dir '{log_dir}': {err}");
        std::process::exit(1);
    }
    let file_appender = tracing_appender::rolling::daily(&log_dir, "server.log");
    let (writer, guard) = non_blocking(file_appender);

    if tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .json()
        .with_writer(writer)
        .try_init()
        .is_ok()
    {
        let _ = TRACING_GUARD.set(guard);
    }
}

enum EnvLoadStatus {
    Loaded(PathBuf),
    NotFound,
    Failed(DotenvError),
}

fn load_env_file() -> EnvLoadStatus {
    if let Ok(env_file) = env::var("VAULTD_ENV_FILE") {
        let trimmed = env_file.trim();
        if !trimmed.is_empty() {
            let path = PathBuf::from(trimmed);
            return match from_filename(&path) {
                Ok(_) => {
                    let display_path = make_relative(&path).unwrap_or_else(|| path.clone());
                    EnvLoadStatus::Loaded(display_path)
                }
                Err(err) => EnvLoadStatus::Failed(err),
            };
        }
    }

    match dotenv() {
        Ok(path) => {
            let display_path = make_relative(&path).unwrap_or_else(|| path.clone());
            EnvLoadStatus::Loaded(display_path)
        }
        Err(DotenvError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            EnvLoadStatus::NotFound
        }
        Err(err) => EnvLoadStatus::Failed(err),
    }
}

fn report_env_status(status: &EnvLoadStatus) {
    match status {
        EnvLoadStatus::Loaded(path) => {
            info!("Loaded environment variables from {}", path.display());
        }
        EnvLoadStatus::NotFound => {
            info!("No .env file found; using process environment only");
        }
        EnvLoadStatus::Failed(err) => {
            warn!("Failed to load .env file: {err:?}");
        }
    }
}

fn make_relative(path: &Path) -> Option<PathBuf> {
    let cwd = env::current_dir().ok()?;
    path.strip_prefix(&cwd).map(|p| p.to_path_buf()).ok()
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut int = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");

        tokio::select! {
            _ = term.recv() => {},
            _ = int.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
