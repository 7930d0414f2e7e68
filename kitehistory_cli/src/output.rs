use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use kitehistory_lib::{
    BoundaryConflict, ChunkFailure, DataStatistics, FetchPlan, Instrument, IntervalLimit,
    OhlcvRecord, ValidationReport,
};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug, PartialEq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

impl OutputFormat {
    pub fn parse(input: &str) -> Self {
        match input {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            "md" | "markdown" => OutputFormat::Markdown,
            _ => OutputFormat::Table,
        }
    }
}

#[derive(Tabled, Serialize)]
struct RecordRow {
    #[tabled(rename = "Timestamp")]
    #[serde(rename = "timestamp")]
    timestamp: String,
    #[tabled(rename = "Open")]
    #[serde(rename = "open")]
    open: String,
    #[tabled(rename = "High")]
    #[serde(rename = "high")]
    high: String,
    #[tabled(rename = "Low")]
    #[serde(rename = "low")]
    low: String,
    #[tabled(rename = "Close")]
    #[serde(rename = "close")]
    close: String,
    #[tabled(rename = "Volume")]
    #[serde(rename = "volume")]
    volume: i64,
}

#[derive(Tabled, Serialize)]
struct FailureRow {
    #[tabled(rename = "Chunk")]
    #[serde(rename = "Chunk")]
    chunk: usize,
    #[tabled(rename = "From")]
    #[serde(rename = "From")]
    from: String,
    #[tabled(rename = "To")]
    #[serde(rename = "To")]
    to: String,
    #[tabled(rename = "Reason")]
    #[serde(rename = "Reason")]
    reason: String,
}

#[derive(Tabled, Serialize)]
struct ConflictRow {
    #[tabled(rename = "Timestamp")]
    #[serde(rename = "Timestamp")]
    timestamp: String,
    #[tabled(rename = "Kept Chunk")]
    #[serde(rename = "Kept Chunk")]
    kept: usize,
    #[tabled(rename = "Dropped Chunk")]
    #[serde(rename = "Dropped Chunk")]
    dropped: usize,
}

#[derive(Tabled, Serialize)]
struct LimitRow {
    #[tabled(rename = "Interval")]
    #[serde(rename = "Interval")]
    interval: String,
    #[tabled(rename = "Max Days/Call")]
    #[serde(rename = "Max Days/Call")]
    max_days: u32,
    #[tabled(rename = "Ceiling (days)")]
    #[serde(rename = "Ceiling (days)")]
    ceiling_days: u32,
}

#[derive(Tabled, Serialize)]
struct InstrumentRow {
    #[tabled(rename = "Symbol")]
    #[serde(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Token")]
    #[serde(rename = "Token")]
    token: u64,
    #[tabled(rename = "Exchange")]
    #[serde(rename = "Exchange")]
    exchange: String,
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
}

#[derive(Tabled, Serialize)]
struct ChunkRow {
    #[tabled(rename = "Chunk")]
    #[serde(rename = "Chunk")]
    chunk: usize,
    #[tabled(rename = "From")]
    #[serde(rename = "From")]
    from: String,
    #[tabled(rename = "To")]
    #[serde(rename = "To")]
    to: String,
    #[tabled(rename = "Days")]
    #[serde(rename = "Days")]
    days: i64,
}

// -- Row builders --

fn build_record_rows(records: &[OhlcvRecord]) -> Vec<RecordRow> {
    records
        .iter()
        .map(|r| RecordRow {
            timestamp: r.timestamp.format("%Y-%m-%d %H:%M:%S%:z").to_string(),
            open: format_price(r.open),
            high: format_price(r.high),
            low: format_price(r.low),
            close: format_price(r.close),
            volume: r.volume,
        })
        .collect()
}

fn build_failure_rows(failures: &[ChunkFailure]) -> Vec<FailureRow> {
    failures
        .iter()
        .map(|f| FailureRow {
            chunk: f.chunk.index + 1,
            from: f.chunk.from_date().to_string(),
            to: f.chunk.to_date().to_string(),
            reason: f.reason.clone(),
        })
        .collect()
}

fn build_conflict_rows(conflicts: &[BoundaryConflict]) -> Vec<ConflictRow> {
    conflicts
        .iter()
        .map(|c| ConflictRow {
            timestamp: c.timestamp.to_rfc3339(),
            kept: c.kept_chunk + 1,
            dropped: c.dropped_chunk + 1,
        })
        .collect()
}

fn build_limit_rows<'a>(limits: impl Iterator<Item = &'a IntervalLimit>) -> Vec<LimitRow> {
    limits
        .map(|l| LimitRow {
            interval: l.interval.to_string(),
            max_days: l.max_days,
            ceiling_days: l.ceiling_days,
        })
        .collect()
}

fn build_instrument_rows(instruments: &[&Instrument]) -> Vec<InstrumentRow> {
    instruments
        .iter()
        .map(|i| InstrumentRow {
            symbol: i.symbol.clone(),
            token: i.token,
            exchange: i.exchange.clone(),
            name: i.name.clone(),
        })
        .collect()
}

fn build_chunk_rows(plan: &FetchPlan) -> Vec<ChunkRow> {
    plan.chunks
        .iter()
        .map(|c| ChunkRow {
            chunk: c.index + 1,
            from: c.from_date().to_string(),
            to: c.to_date().to_string(),
            days: c.span_days(),
        })
        .collect()
}

// -- Generic rendering --

/// Where a table goes. Records own stdout; annotations about them (failed
/// chunks, boundary conflicts) go to stderr unless the whole run is JSON.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Stream {
    Stdout,
    Stderr,
}

fn annotation_stream(format: &OutputFormat) -> Stream {
    match format {
        OutputFormat::Json => Stream::Stdout,
        _ => Stream::Stderr,
    }
}

fn render<T, W>(rows: Vec<T>, format: &OutputFormat, mut out: W) -> Result<()>
where
    T: Tabled + Serialize,
    W: Write,
{
    match format {
        OutputFormat::Table => writeln!(out, "{}", Table::new(rows))?,
        OutputFormat::Markdown => {
            let mut table = Table::new(rows);
            table.with(Style::markdown());
            writeln!(out, "{}", table)?;
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(out);
            for row in rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &rows)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn render_to<T: Tabled + Serialize>(
    rows: Vec<T>,
    format: &OutputFormat,
    stream: Stream,
) -> Result<()> {
    match stream {
        Stream::Stdout => render(rows, format, std::io::stdout().lock()),
        Stream::Stderr => render(rows, format, std::io::stderr().lock()),
    }
}

pub fn print_records(records: &[OhlcvRecord], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            print_json(&records);
            Ok(())
        }
        _ => render_to(build_record_rows(records), format, Stream::Stdout),
    }
}

pub fn print_failures(failures: &[ChunkFailure], format: &OutputFormat) -> Result<()> {
    render_to(build_failure_rows(failures), format, annotation_stream(format))
}

pub fn print_conflicts(conflicts: &[BoundaryConflict], format: &OutputFormat) -> Result<()> {
    render_to(build_conflict_rows(conflicts), format, annotation_stream(format))
}

pub fn print_limits<'a>(
    limits: impl Iterator<Item = &'a IntervalLimit>,
    format: &OutputFormat,
) -> Result<()> {
    render_to(build_limit_rows(limits), format, Stream::Stdout)
}

pub fn print_instruments(instruments: &[&Instrument], format: &OutputFormat) -> Result<()> {
    render_to(build_instrument_rows(instruments), format, Stream::Stdout)
}

pub fn print_plan_chunks(plan: &FetchPlan, format: &OutputFormat) -> Result<()> {
    render_to(build_chunk_rows(plan), format, Stream::Stdout)
}

// -- Summaries (always stderr) --

pub fn print_statistics(stats: &DataStatistics) {
    eprintln!(
        "{} records from {} to {}",
        stats.total_records,
        stats.first.to_rfc3339(),
        stats.last.to_rfc3339()
    );
    eprintln!(
        "High {}  Low {}  Avg close {}  Volume {}",
        format_price(stats.max_high),
        format_price(stats.min_low),
        format_price(stats.avg_close),
        stats.total_volume
    );
}

pub fn print_plan_summary(plan: &FetchPlan) {
    eprintln!(
        "{} {} to {} ({} days): {:?} fetch, {} call(s) of up to {} days",
        plan.interval,
        plan.from,
        plan.to,
        plan.span_days,
        plan.strategy,
        plan.chunks_needed(),
        plan.max_days_per_call
    );
    eprintln!(
        "Expected records: ~{}  Estimated time: {:.1}s",
        plan.expected_records,
        plan.estimated_duration.as_secs_f64()
    );
}

pub fn print_report(report: &ValidationReport) {
    for error in &report.errors {
        eprintln!("error: {}", error);
    }
    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }
}

// -- File output --

/// Writes records to `path`: CSV when the extension is `.csv`, JSON otherwise.
pub fn write_records(path: &Path, records: &[OhlcvRecord]) -> Result<()> {
    let is_csv = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    if is_csv {
        let mut wtr = csv::Writer::from_path(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        for record in records {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
    } else {
        let json = serde_json::to_string_pretty(records)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}

// -- JSON output --

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

fn format_price(value: f64) -> String {
    format!("{:.2}", value)
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod output_tests;
