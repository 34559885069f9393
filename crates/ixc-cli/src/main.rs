//! ixc - Command-line tool for iXcommand EV chargers
//!
//! Registers a charger, watches its live state and drives the control
//! surfaces from a terminal. Credentials are validated once by the setup
//! flow and persisted; every other command reads them back from the config.

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "ixc")]
#[command(author, version, about = "iXcommand EV charger CLI")]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "IXC_CONFIG")]
    config: Option<PathBuf>,

    /// Vendor API base URL override (staging, local mock)
    #[arg(long, env = "IXC_BASE_URL")]
    base_url: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a charger: validate the serial, probe the API, store the key
    Setup {
        /// Charger serial number (XXX-XXX-XXX)
        serial: String,

        /// Vendor API key
        #[arg(long, env = "IXC_API_KEY")]
        api_key: String,
    },

    /// Validate and store a replacement API key for the registered charger
    Reauth {
        /// Replacement vendor API key
        #[arg(long, env = "IXC_API_KEY")]
        api_key: String,
    },

    /// Read and print the full property set once
    Status,

    /// Poll the charger and print every refreshed snapshot
    Watch {
        /// Polling interval in seconds
        #[arg(short, long, default_value_t = 30)]
        interval: u64,
    },

    /// Enable charging
    Enable,

    /// Disable charging
    Disable,

    /// Write one property (value parsed as JSON scalar, else as a string)
    Set {
        /// Property key, e.g. targetCurrent
        key: String,

        /// Value to write
        value: String,
    },

    /// Probe the connection with the stored credential
    Test,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config_path = cli.config.as_deref();
    let base_url = cli.base_url.as_deref();

    match cli.command {
        Commands::Setup { serial, api_key } => {
            commands::setup(config_path, base_url, &serial, &api_key).await
        }
        Commands::Reauth { api_key } => commands::reauth(config_path, base_url, &api_key).await,
        Commands::Status => commands::status(config_path, base_url).await,
        Commands::Watch { interval } => commands::watch(config_path, base_url, interval).await,
        Commands::Enable => commands::set_charging(config_path, base_url, true).await,
        Commands::Disable => commands::set_charging(config_path, base_url, false).await,
        Commands::Set { key, value } => commands::set(config_path, base_url, &key, &value).await,
        Commands::Test => commands::test(config_path, base_url).await,
    }
}
