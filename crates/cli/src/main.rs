//! Lodestar CLI — the main entry point.
//!
//! Commands:
//! - `search`   — Ask a question (one-shot or interactive)
//! - `doctor`   — Diagnose configuration and backend health
//! - `onboard`  — Write a starter config file

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "lodestar",
    about = "Lodestar — AI answer engine over your search backend",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question; omit QUERY for an interactive session
    Search {
        /// The question to answer
        query: Option<String>,

        /// Comma-separated search sources (web, academic, social)
        #[arg(short, long)]
        sources: Option<String>,

        /// Optimization mode
        #[arg(short, long, default_value = "balanced")]
        mode: lodestar_config::OptimizationMode,

        /// Model override as "provider:model"
        #[arg(long)]
        model: Option<String>,

        /// Config file path (default: ~/.lodestar/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Diagnose configuration and backend health
    Doctor {
        /// Config file path (default: ~/.lodestar/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write a starter config file
    Onboard {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Search {
            query,
            sources,
            mode,
            model,
            config,
        } => commands::search::run(query, sources, mode, model, config).await?,
        Commands::Doctor { config } => commands::doctor::run(config).await?,
        Commands::Onboard { force } => commands::onboard::run(force).await?,
    }

    Ok(())
}
