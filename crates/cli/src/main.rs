//! Bookshop CLI
//!
//! A command-line client for searching, viewing and editing books and
//! customers of the bookshop REST API, and for charting their ratings
//! and categories.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use bookshop_lib::{BuchService, KundeService, SyncMetrics};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::buecher::{self, BuchCommands};
use commands::kunden::{self, KundeCommands};
use output::{print_info, OutputFormat};

/// Bookshop CLI
#[derive(Parser)]
#[command(name = "bookshop")]
#[command(author, version, about = "CLI for the Bookshop REST API", long_about = None)]
pub struct Cli {
    /// REST API base URI (can also be set via BOOKSHOP_API_URL env var)
    #[arg(long, env = "BOOKSHOP_API_URL")]
    pub api_url: Option<String>,

    /// Path to a config file (default: ~/.config/bookshop/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    /// Write logs as JSON
    #[arg(long)]
    pub log_json: bool,

    /// Print request metrics after the command
    #[arg(long)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search, show, create, update and delete books
    #[command(subcommand)]
    Buecher(BuchCommands),

    /// Search, show, create, update and delete customers
    #[command(subcommand)]
    Kunden(KundeCommands),
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let settings = config::Settings::load(cli.config.as_deref())?;
    let client_config = settings.client_config(cli.api_url.as_deref())?;
    debug!(base_uri = %client_config.base_uri, "Configuration loaded");

    let result = match cli.command {
        Commands::Buecher(command) => {
            let service = BuchService::from_config(&client_config)
                .context("Failed to create API client")?;
            buecher::run(&service, command, cli.format).await
        }
        Commands::Kunden(command) => {
            let service = KundeService::from_config(&client_config)
                .context("Failed to create API client")?;
            kunden::run(&service, command, cli.format).await
        }
    };

    if cli.metrics {
        print_info("Request metrics");
        print!("{}", SyncMetrics::encode_text());
    }

    result
}
