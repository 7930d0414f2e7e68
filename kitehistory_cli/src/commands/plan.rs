use anyhow::{bail, Result};
use chrono::Local;
use kitehistory_lib::validation::{parse_date, parse_interval};
use kitehistory_lib::{
    plan_fetch, validate_fetch_parameters, FetcherConfig, Instruments, RangeChunker,
};

use super::RangeArgs;
use crate::output::{
    print_json, print_plan_chunks, print_plan_summary, print_report, OutputFormat,
};

pub fn run(
    args: &RangeArgs,
    chunker: &RangeChunker,
    instruments: &Instruments,
    config: &FetcherConfig,
    format: &OutputFormat,
) -> Result<()> {
    let from = parse_date(&args.from)?;
    let to = parse_date(&args.to)?;

    let report = validate_fetch_parameters(
        chunker,
        instruments,
        &args.symbol,
        from,
        to,
        &args.interval,
        Local::now().date_naive(),
    );

    if !report.valid {
        if *format == OutputFormat::Json {
            print_json(&report);
        } else {
            print_report(&report);
        }
        bail!("fetch parameters are invalid");
    }

    let interval = parse_interval(&args.interval)?;
    let plan = plan_fetch(chunker, config, from, to, interval)?;

    if *format == OutputFormat::Json {
        print_json(&serde_json::json!({ "validation": report, "plan": plan }));
        return Ok(());
    }

    print_report(&report);
    print_plan_summary(&plan);
    print_plan_chunks(&plan, format)
}
