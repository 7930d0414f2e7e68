use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use kitehistory_lib::kite_api::{Client, Credentials, DEFAULT_BASE_URL};
use kitehistory_lib::validation::{parse_date, parse_interval, validate_symbol};
use kitehistory_lib::{
    DataStatistics, FetchLimits, FetcherConfig, HistoryError, HistoryService, Instruments,
    KiteSource,
};
use tokio_util::sync::CancellationToken;

use super::RangeArgs;
use crate::output::{
    print_conflicts, print_failures, print_json, print_records, print_statistics, write_records,
    OutputFormat,
};

#[derive(Args)]
pub struct FetchArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    /// Also write the records to this file (.csv for CSV, anything else for JSON)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

fn credentials_from_env() -> Result<Credentials> {
    let api_key = std::env::var("KITE_API_KEY")
        .context("KITE_API_KEY is not set. Add it to the environment or a .env file")?;
    let access_token = std::env::var("KITE_ACCESS_TOKEN")
        .context("KITE_ACCESS_TOKEN is not set. Add it to the environment or a .env file")?;
    Ok(Credentials::new(api_key, access_token))
}

pub async fn run(
    args: &FetchArgs,
    limits: Arc<FetchLimits>,
    instruments: Arc<Instruments>,
    config: FetcherConfig,
    format: &OutputFormat,
) -> Result<()> {
    let symbol = validate_symbol(&args.range.symbol)?;
    let from = parse_date(&args.range.from)?;
    let to = parse_date(&args.range.to)?;
    let interval = parse_interval(&args.range.interval)?;

    let base_url = std::env::var("KITE_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let client = Client::with_base_url(&base_url, credentials_from_env()?)?;
    let source = KiteSource::new(client, instruments);
    let service = HistoryService::new(limits, source, config);

    let chunk_count = service.chunker().compute_chunks(from, to, interval)?.len();

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Cancelling after the current chunk...");
            signal_token.cancel();
        }
    });

    let pb = ProgressBar::new(chunk_count as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>4}/{len:4} chunks ({eta}) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.set_message(format!("{} {}", symbol, interval));

    let outcome = service
        .fetch_historical_with(&symbol, from, to, interval, &cancel, |chunk| {
            pb.inc(1);
            if let Err(err) = &chunk.result {
                pb.set_message(format!("chunk {} failed: {}", chunk.chunk.index + 1, err));
            }
        })
        .await;
    pb.finish_and_clear();
    signal_task.abort();

    let result = match outcome {
        Ok(result) => result,
        Err(HistoryError::AggregateFetch { reason, failures }) => {
            print_failures(&failures, format)?;
            bail!("Historical fetch failed: {}", reason);
        }
        Err(err) => return Err(err.into()),
    };

    if let Some(path) = &args.out {
        write_records(path, &result.records)?;
        eprintln!("Wrote {} records to {}", result.records.len(), path.display());
    }

    if *format == OutputFormat::Json {
        print_json(&serde_json::json!({
            "symbol": symbol,
            "interval": interval,
            "records": result.records,
            "failures": result.failures,
            "conflicts": result.conflicts,
            "statistics": DataStatistics::from_records(&result.records),
        }));
        return Ok(());
    }

    print_records(&result.records, format)?;
    if let Some(stats) = DataStatistics::from_records(&result.records) {
        print_statistics(&stats);
    }
    if !result.conflicts.is_empty() {
        eprintln!("{} boundary conflict(s); earlier chunk kept:", result.conflicts.len());
        print_conflicts(&result.conflicts, format)?;
    }
    if result.is_partial() {
        eprintln!(
            "Partial result: {} chunk(s) failed, data has gaps:",
            result.failures.len()
        );
        print_failures(&result.failures, format)?;
    }

    Ok(())
}
