//! Svar server entry point.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use svar::config::Settings;
use svar::server::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Document question answering and video transcription backend.
#[derive(Parser, Debug)]
#[command(name = "svar", version, about)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long)]
    config: Option<String>,

    /// Host to bind (overrides configuration).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides configuration).
    #[arg(long)]
    port: Option<u16>,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Secrets (OPENAI_API_KEY) come from the environment or a local .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("svar={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    if let Some(host) = cli.host {
        settings.server.host = host;
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }

    // Ensure data directories exist
    std::fs::create_dir_all(settings.upload_dir())?;
    std::fs::create_dir_all(settings.temp_dir())?;
    if let Some(parent) = settings.index_path().parent() {
        std::fs::create_dir_all(parent)?;
    }

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let state = Arc::new(AppState::new(settings)?);

    svar::server::run(&host, port, state).await?;

    Ok(())
}
