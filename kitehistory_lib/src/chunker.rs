//! Splits a requested date range into API-sized chunks.

use std::fmt;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use kite_api::types::Interval;
use serde::Serialize;

use crate::error::HistoryError;
use crate::limits::FetchLimits;

/// Inclusive calendar-date range with `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, HistoryError> {
        if from > to {
            return Err(HistoryError::InvalidRange(format!(
                "from_date {} is after to_date {}",
                from, to
            )));
        }
        Ok(Self { from, to })
    }

    pub fn from_date(&self) -> NaiveDate {
        self.from
    }

    pub fn to_date(&self) -> NaiveDate {
        self.to
    }

    /// Whole days between the two bounds; a single-day range has span 0.
    pub fn span_days(&self) -> i64 {
        (self.to - self.from).num_days()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.from, self.to)
    }
}

/// One API-sized slice of a request. `index` is the chunk's position in
/// chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Chunk {
    pub index: usize,
    pub range: DateRange,
}

impl Chunk {
    pub fn from_date(&self) -> NaiveDate {
        self.range.from_date()
    }

    pub fn to_date(&self) -> NaiveDate {
        self.range.to_date()
    }

    pub fn span_days(&self) -> i64 {
        self.range.span_days()
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.index + 1, self.range)
    }
}

/// Computes chunk sequences against an injected limit table.
#[derive(Debug, Clone)]
pub struct RangeChunker {
    limits: Arc<FetchLimits>,
}

impl RangeChunker {
    pub fn new(limits: Arc<FetchLimits>) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &FetchLimits {
        &self.limits
    }

    /// Splits `[from, to]` into chunks no wider than the interval's
    /// `max_days`. Consecutive chunks share their boundary date, so
    /// `chunks[i].to_date() == chunks[i + 1].from_date()`.
    ///
    /// Fails with `InvalidRange` for inverted ranges and intervals missing
    /// from the table, and with `RangeTooLarge` when the total span is above
    /// the interval's ceiling.
    pub fn compute_chunks(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        interval: Interval,
    ) -> Result<Vec<Chunk>, HistoryError> {
        let range = DateRange::new(from, to)?;
        let limit = self.limits.get(interval).ok_or_else(|| {
            HistoryError::InvalidRange(format!("no limit configured for interval '{}'", interval))
        })?;

        let span = range.span_days();
        if span > i64::from(limit.ceiling_days) {
            return Err(HistoryError::RangeTooLarge {
                span_days: span,
                ceiling_days: limit.ceiling_days,
                interval,
            });
        }

        if span == 0 {
            return Ok(vec![Chunk { index: 0, range }]);
        }

        let step = Duration::days(i64::from(limit.max_days));
        let mut chunks = Vec::with_capacity((span / i64::from(limit.max_days) + 1) as usize);
        let mut start = from;
        while start < to {
            let end = (start + step).min(to);
            chunks.push(Chunk {
                index: chunks.len(),
                range: DateRange { from: start, to: end },
            });
            start = end;
        }
        Ok(chunks)
    }
}
