mod commands;
mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kitehistory_lib::{FetchLimits, FetcherConfig, Instruments, RangeChunker};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "kitehistory")]
#[command(about = "Fetch historical OHLCV candles from Kite Connect in API-sized chunks")]
struct Cli {
    /// Output format: table, json, csv, or markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// Replace the built-in interval limit table with this YAML file
    #[arg(long, global = true)]
    limits: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch candles for a symbol over a date range
    Fetch(commands::fetch::FetchArgs),
    /// Validate parameters and show the chunk plan without fetching
    Plan(commands::RangeArgs),
    /// Show per-interval span limits
    Intervals,
    /// List supported symbols
    Symbols(commands::symbols::SymbolsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kitehistory=info".parse()?)
                .add_directive("kite_api=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::parse(&cli.output);

    let limits = match &cli.limits {
        Some(path) => FetchLimits::from_path(path)?,
        None => FetchLimits::embedded().context("built-in interval limits are invalid")?,
    };
    let limits = Arc::new(limits);
    let instruments =
        Arc::new(Instruments::nifty50().context("built-in instrument table is invalid")?);
    let config = FetcherConfig::from_env();

    match &cli.command {
        Commands::Fetch(args) => {
            commands::fetch::run(args, limits, instruments, config, &format).await?
        }
        Commands::Plan(args) => {
            let chunker = RangeChunker::new(limits);
            commands::plan::run(args, &chunker, &instruments, &config, &format)?
        }
        Commands::Intervals => commands::intervals::run(&limits, &format)?,
        Commands::Symbols(args) => commands::symbols::run(args, &instruments, &format)?,
    }

    Ok(())
}
