use chrono::{Datelike, NaiveDate, Weekday};
use kite_api::types::Interval;
use serde::Serialize;

use crate::chunker::RangeChunker;
use crate::error::HistoryError;
use crate::instruments::Instruments;
use crate::plan::expected_records;

pub const MAX_SYMBOL_LENGTH: usize = 32;
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// More chunks than this earns a "this will take a while" warning.
pub const MANY_CHUNKS_WARNING: usize = 10;
/// More expected bars than this earns a large-response warning.
pub const LARGE_RESULT_WARNING: u64 = 100_000;

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(input: &str) -> Result<NaiveDate, HistoryError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).map_err(|_| {
        HistoryError::InvalidInput(format!(
            "invalid date '{}'. Expected format YYYY-MM-DD",
            input
        ))
    })
}

/// Parse an interval code, case-insensitive; `hour` maps to `60minute`.
pub fn parse_interval(input: &str) -> Result<Interval, HistoryError> {
    input.parse::<Interval>().map_err(|_| {
        let codes: Vec<&str> = Interval::ALL.iter().map(|i| i.as_str()).collect();
        HistoryError::InvalidRange(format!(
            "unknown interval '{}'. Valid intervals: {}",
            input,
            codes.join(", ")
        ))
    })
}

/// Validate a trading symbol: trim, uppercase, restrict to the characters
/// NSE symbols use.
pub fn validate_symbol(input: &str) -> Result<String, HistoryError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(HistoryError::InvalidInput("symbol is empty".to_string()));
    }
    if trimmed.len() > MAX_SYMBOL_LENGTH {
        return Err(HistoryError::InvalidInput(format!(
            "symbol exceeds maximum length of {} bytes",
            MAX_SYMBOL_LENGTH
        )));
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '&' | '-' | '_'))
    {
        return Err(HistoryError::InvalidInput(format!(
            "symbol '{}' contains invalid characters",
            trimmed
        )));
    }
    Ok(trimmed.to_uppercase())
}

/// Outcome of [`validate_fetch_parameters`]. `valid` is false when
/// `errors` is non-empty; warnings never block a fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Check a prospective fetch against the instrument registry and the limit
/// table, collecting every problem instead of stopping at the first.
pub fn validate_fetch_parameters(
    chunker: &RangeChunker,
    instruments: &Instruments,
    symbol: &str,
    from: NaiveDate,
    to: NaiveDate,
    interval: &str,
    today: NaiveDate,
) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    match validate_symbol(symbol) {
        Ok(symbol) if !instruments.contains(&symbol) => {
            errors.push(format!("Symbol {} not found in supported instruments", symbol));
        }
        Ok(_) => {}
        Err(err) => errors.push(err.to_string()),
    }

    let interval = match parse_interval(interval) {
        Ok(interval) => Some(interval),
        Err(err) => {
            errors.push(err.to_string());
            None
        }
    };

    if from > to {
        errors.push(format!("from_date {} is after to_date {}", from, to));
    } else if let Some(interval) = interval {
        match chunker.compute_chunks(from, to, interval) {
            Ok(chunks) => {
                if chunks.len() > MANY_CHUNKS_WARNING {
                    warnings.push(format!(
                        "Range needs {} API calls; the fetch will take a while",
                        chunks.len()
                    ));
                }
                let expected = expected_records(from, to, interval);
                if expected > LARGE_RESULT_WARNING {
                    warnings.push(format!(
                        "About {} records expected; consider a coarser interval",
                        expected
                    ));
                }
            }
            Err(err) => errors.push(err.to_string()),
        }
    }

    if to > today {
        warnings.push(format!("to_date {} is in the future", to));
    }
    if matches!(from.weekday(), Weekday::Sat | Weekday::Sun) {
        warnings.push(format!(
            "from_date {} is a {}; markets are closed on weekends",
            from,
            from.weekday()
        ));
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod validation_tests;
