//! Per-interval span limits and the outer request ceiling.
//!
//! The table ships as `seed_data/interval_limits.yml`, embedded at compile
//! time; a replacement file can be loaded at runtime when the provider
//! changes its limits. One `FetchLimits` value feeds the chunker, the
//! planner and the parameter validator.

use std::collections::BTreeMap;
use std::path::Path;

use kite_api::types::Interval;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for limit table loading.
#[derive(Error, Debug)]
pub enum LimitsError {
    #[error("Failed to parse interval limits YAML: {0}")]
    YamlParse(#[from] serde_yml::Error),
    #[error("Failed to read interval limits file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Unknown interval code in limits file: {0}")]
    UnknownInterval(String),
    #[error("Duplicate interval in limits file: {0}")]
    DuplicateInterval(Interval),
    #[error("Interval {0} must allow at least one day per call")]
    ZeroSpan(Interval),
    #[error("Limits file defines no intervals")]
    Empty,
}

/// Top-level structure of the limits YAML file.
#[derive(Deserialize, Debug)]
pub struct LimitsFile {
    pub default_ceiling_days: u32,
    pub intervals: Vec<IntervalLimitEntry>,
}

/// One row of the limits YAML file, before validation.
#[derive(Deserialize, Debug)]
pub struct IntervalLimitEntry {
    pub interval: String,
    pub max_days: u32,
    pub ceiling_days: Option<u32>,
}

/// Validated limits for a single interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntervalLimit {
    pub interval: Interval,
    /// Widest span one API call may cover.
    pub max_days: u32,
    /// Widest total span accepted before chunking.
    pub ceiling_days: u32,
}

/// Immutable interval → limit table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchLimits {
    limits: BTreeMap<Interval, IntervalLimit>,
}

impl FetchLimits {
    /// Limits from the YAML file embedded at compile time.
    pub fn embedded() -> Result<Self, LimitsError> {
        let yaml_content = include_str!("../../seed_data/interval_limits.yml");
        Self::parse(yaml_content)
    }

    /// Limits from a YAML file on disk, same format as the embedded one.
    pub fn from_path(path: &Path) -> Result<Self, LimitsError> {
        let yaml_content = std::fs::read_to_string(path).map_err(|source| LimitsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&yaml_content)
    }

    /// Parse and validate a limits table from YAML content.
    pub fn parse(yaml_content: &str) -> Result<Self, LimitsError> {
        let file: LimitsFile = serde_yml::from_str(yaml_content)?;
        if file.intervals.is_empty() {
            return Err(LimitsError::Empty);
        }

        let mut limits = BTreeMap::new();
        for entry in file.intervals {
            let interval: Interval = entry
                .interval
                .parse()
                .map_err(|_| LimitsError::UnknownInterval(entry.interval.clone()))?;
            if entry.max_days == 0 {
                return Err(LimitsError::ZeroSpan(interval));
            }
            if limits.contains_key(&interval) {
                return Err(LimitsError::DuplicateInterval(interval));
            }
            limits.insert(
                interval,
                IntervalLimit {
                    interval,
                    max_days: entry.max_days,
                    ceiling_days: entry.ceiling_days.unwrap_or(file.default_ceiling_days),
                },
            );
        }

        Ok(Self { limits })
    }

    pub fn get(&self, interval: Interval) -> Option<&IntervalLimit> {
        self.limits.get(&interval)
    }

    /// All configured limits, ordered from the finest interval to `day`.
    pub fn iter(&self) -> impl Iterator<Item = &IntervalLimit> {
        self.limits.values()
    }

    pub fn len(&self) -> usize {
        self.limits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }
}
