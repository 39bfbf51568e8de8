//! Framecast: render web animations to video over HTTP.
//!
//! Usage:
//!   framecast serve [OPTIONS]   Start the export service
//!   framecast check [OPTIONS]   Check the capture engine and show effective configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use framecast_common::config::ServiceConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "framecast",
    about = "Render timed web animations to video files on request",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the export service
    Serve {
        /// Listen address
        #[arg(long)]
        host: Option<String>,

        /// Listen port (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Emit structured JSON logs
        #[arg(long)]
        json_logs: bool,
    },

    /// Check the capture engine and print the effective configuration
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, mut warnings) = match &cli.config {
        Some(path) => (ServiceConfig::load_from(path)?, Vec::new()),
        None => ServiceConfig::load(),
    };
    warnings.extend(config.apply_env_overrides()?);
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if let Commands::Serve {
        host,
        port,
        json_logs,
    } = &cli.command
    {
        if let Some(host) = host {
            config.server.host = host.clone();
        }
        if let Some(port) = port {
            config.server.port = *port;
        }
        config.logging.json |= *json_logs;
    }
    config.validate()?;

    framecast_common::logging::init_logging(&config.logging);
    for warning in &warnings {
        tracing::warn!("{warning}");
    }

    match cli.command {
        Commands::Serve { .. } => commands::serve::run(config).await,
        Commands::Check => commands::check::run(&config),
    }
}
