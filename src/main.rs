#![forbid(unsafe_code)]

//! `runstop-demo`: walks a few records through checkpoints.
//!
//! Open the printed URL, inspect each dump, and press Run to let the loop
//! advance, or Detach to let it finish unobstructed.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use runstop::{snapshot, AppError, Result, Runstop, RunstopConfig};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "runstop-demo", about = "Step through records in the browser", version, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file (defaults to the environment).
    #[arg(long)]
    config: Option<PathBuf>,

    /// First port to try for the observer page.
    #[arg(long)]
    port: Option<u16>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Debug, Serialize)]
struct User {
    id: u32,
    name: &'static str,
    role: &'static str,
}

#[derive(Debug, Serialize)]
struct Metadata {
    timestamp: DateTime<Utc>,
    processed: u32,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    let mut config = match args.config {
        Some(path) => RunstopConfig::load_from_path(path)?,
        None => RunstopConfig::from_env()?,
    };
    if let Some(port) = args.port {
        config.start_port = port;
    }

    let session = Runstop::new(config);

    tokio::select! {
        result = process_users(&session) => result?,
        () = shutdown_signal() => {
            info!("shutdown signal received; detaching");
            session.detach().await;
        }
    }

    info!("done");
    Ok(())
}

async fn process_users(session: &Runstop) -> Result<()> {
    let users = [
        User {
            id: 1,
            name: "Alice",
            role: "admin",
        },
        User {
            id: 2,
            name: "Bob",
            role: "user",
        },
    ];
    let total = users.len();

    for (position, user) in users.iter().enumerate() {
        let metadata = Metadata {
            timestamp: Utc::now(),
            processed: user.id,
        };

        session
            .checkpoint(&snapshot!(user, metadata, remaining = total - position - 1))
            .await?;

        info!(user = user.name, "processed user");
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter).with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
