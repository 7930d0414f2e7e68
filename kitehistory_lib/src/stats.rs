//! Summary statistics over a fetched series.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::record::OhlcvRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataStatistics {
    pub total_records: usize,
    pub first: DateTime<FixedOffset>,
    pub last: DateTime<FixedOffset>,
    pub max_high: f64,
    pub min_low: f64,
    pub avg_close: f64,
    pub total_volume: i64,
}

impl DataStatistics {
    /// `None` for an empty series. Expects records in chronological order,
    /// as produced by the merger.
    pub fn from_records(records: &[OhlcvRecord]) -> Option<Self> {
        let first = records.first()?;
        let last = records.last()?;

        let mut max_high = f64::MIN;
        let mut min_low = f64::MAX;
        let mut close_sum = 0.0;
        let mut total_volume: i64 = 0;
        for r in records {
            max_high = max_high.max(r.high);
            min_low = min_low.min(r.low);
            close_sum += r.close;
            total_volume = total_volume.saturating_add(r.volume);
        }

        Some(Self {
            total_records: records.len(),
            first: first.timestamp,
            last: last.timestamp,
            max_high,
            min_low,
            avg_close: close_sum / records.len() as f64,
            total_volume,
        })
    }
}
