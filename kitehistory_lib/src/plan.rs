//! Pre-flight fetch planning: how many calls a request needs, roughly how
//! many bars it returns and how long it takes. No network access.

use std::time::Duration;

use chrono::{Datelike, NaiveDate, Weekday};
use kite_api::types::Interval;
use serde::Serialize;

use crate::chunker::{Chunk, RangeChunker};
use crate::config::FetcherConfig;
use crate::error::HistoryError;

/// Length of the NSE cash session (09:15 to 15:30) in minutes.
pub const SESSION_MINUTES: u32 = 375;

/// Latency allowance per adapter call used for time estimates.
pub const ESTIMATED_CALL_LATENCY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStrategy {
    /// The whole range fits one call.
    Single,
    /// The range is split across several calls.
    Chunked,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchPlan {
    pub interval: Interval,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub span_days: i64,
    pub max_days_per_call: u32,
    pub strategy: FetchStrategy,
    pub chunks: Vec<Chunk>,
    pub expected_records: u64,
    #[serde(serialize_with = "serialize_secs")]
    pub estimated_duration: Duration,
}

impl FetchPlan {
    pub fn chunks_needed(&self) -> usize {
        self.chunks.len()
    }
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Plans a fetch without performing it. Fails exactly where
/// [`RangeChunker::compute_chunks`] would.
pub fn plan_fetch(
    chunker: &RangeChunker,
    config: &FetcherConfig,
    from: NaiveDate,
    to: NaiveDate,
    interval: Interval,
) -> Result<FetchPlan, HistoryError> {
    let chunks = chunker.compute_chunks(from, to, interval)?;
    let max_days_per_call = chunker
        .limits()
        .get(interval)
        .map(|l| l.max_days)
        .unwrap_or_default();

    let strategy = if chunks.len() > 1 {
        FetchStrategy::Chunked
    } else {
        FetchStrategy::Single
    };

    Ok(FetchPlan {
        interval,
        from,
        to,
        span_days: (to - from).num_days(),
        max_days_per_call,
        strategy,
        expected_records: expected_records(from, to, interval),
        estimated_duration: estimated_duration(chunks.len(), config.call_delay),
        chunks,
    })
}

/// Mondays through Fridays in `[from, to]`. Exchange holidays are not known
/// here and count as trading days.
pub fn weekdays_between(from: NaiveDate, to: NaiveDate) -> u64 {
    if from > to {
        return 0;
    }
    let total = (to - from).num_days() as u64 + 1;
    let full_weeks = total / 7;
    let mut count = full_weeks * 5;
    let mut day = from + chrono::Duration::days((full_weeks * 7) as i64);
    while day <= to {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            count += 1;
        }
        day = day + chrono::Duration::days(1);
    }
    count
}

/// Bars one trading session yields at `interval`; a partial last bar counts.
pub fn bars_per_session(interval: Interval) -> u64 {
    match interval.minutes() {
        Some(minutes) => u64::from(SESSION_MINUTES.div_ceil(minutes)),
        None => 1,
    }
}

pub fn expected_records(from: NaiveDate, to: NaiveDate, interval: Interval) -> u64 {
    weekdays_between(from, to) * bars_per_session(interval)
}

fn estimated_duration(chunks: usize, call_delay: Duration) -> Duration {
    let calls = chunks as u32;
    ESTIMATED_CALL_LATENCY * calls + call_delay * calls.saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::limits::FetchLimits;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn chunker() -> RangeChunker {
        RangeChunker::new(Arc::new(FetchLimits::embedded().unwrap()))
    }

    #[test]
    fn weekdays_in_a_known_month() {
        // January 2024 starts on a Monday and has 23 weekdays.
        assert_eq!(weekdays_between(date(2024, 1, 1), date(2024, 1, 31)), 23);
        // Saturday and Sunday only.
        assert_eq!(weekdays_between(date(2024, 1, 6), date(2024, 1, 7)), 0);
        assert_eq!(weekdays_between(date(2024, 1, 8), date(2024, 1, 8)), 1);
        assert_eq!(weekdays_between(date(2024, 1, 9), date(2024, 1, 8)), 0);
    }

    #[test]
    fn bars_per_session_by_interval() {
        assert_eq!(bars_per_session(Interval::Minute), 375);
        assert_eq!(bars_per_session(Interval::FiveMinute), 75);
        assert_eq!(bars_per_session(Interval::TenMinute), 38);
        assert_eq!(bars_per_session(Interval::SixtyMinute), 7);
        assert_eq!(bars_per_session(Interval::Day), 1);
    }

    #[test]
    fn single_call_plan() {
        let plan = plan_fetch(
            &chunker(),
            &FetcherConfig::default(),
            date(2024, 1, 1),
            date(2024, 1, 31),
            Interval::Day,
        )
        .unwrap();
        assert_eq!(plan.strategy, FetchStrategy::Single);
        assert_eq!(plan.chunks_needed(), 1);
        assert_eq!(plan.expected_records, 23);
        assert_eq!(plan.max_days_per_call, 2000);
        assert_eq!(plan.estimated_duration, Duration::from_millis(500));
    }

    #[test]
    fn chunked_plan_counts_delays_between_calls() {
        let config = FetcherConfig {
            call_delay: Duration::from_secs(1),
            ..FetcherConfig::default()
        };
        let plan = plan_fetch(
            &chunker(),
            &config,
            date(2023, 1, 1),
            date(2023, 4, 1),
            Interval::Minute,
        )
        .unwrap();
        assert_eq!(plan.strategy, FetchStrategy::Chunked);
        assert_eq!(plan.chunks_needed(), 2);
        assert_eq!(plan.span_days, 90);
        assert_eq!(plan.estimated_duration, Duration::from_millis(2000));
        assert_eq!(plan.expected_records, weekdays_between(plan.from, plan.to) * 375);
    }

    #[test]
    fn plan_rejects_over_ceiling() {
        let err = plan_fetch(
            &chunker(),
            &FetcherConfig::default(),
            date(2018, 1, 1),
            date(2024, 1, 1),
            Interval::Minute,
        )
        .unwrap_err();
        assert!(matches!(err, HistoryError::RangeTooLarge { .. }));
    }

    #[test]
    fn plan_serializes_duration_as_seconds() {
        let plan = plan_fetch(
            &chunker(),
            &FetcherConfig::immediate(),
            date(2024, 1, 1),
            date(2024, 1, 2),
            Interval::Day,
        )
        .unwrap();
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["strategy"], "single");
        assert_eq!(json["estimated_duration"], 0.5);
        assert_eq!(json["interval"], "day");
    }
}
