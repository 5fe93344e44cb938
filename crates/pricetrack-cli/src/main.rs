mod extract;
mod sites;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pricetrack-cli")]
#[command(about = "Scrape product prices and photos from supported shops")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape each URL in order and print one JSON report per URL
    Extract {
        /// Product page URLs
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// List the registered site profiles
    Sites,
    /// Load and validate a sites file without scraping anything
    CheckSites {
        /// Path to a YAML sites file
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = pricetrack_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Extract { urls } => extract::run_extract(&config, &urls).await,
        Commands::Sites => sites::run_sites(&config),
        Commands::CheckSites { path } => sites::run_check_sites(&path),
    }
}
