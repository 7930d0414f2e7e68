//! Combines per-chunk results into one ordered, de-duplicated series.
//!
//! Adjacent chunks share a boundary date, so the same bar can arrive twice.
//! Records are keyed on their exact timestamp; the first chunk (in
//! chronological order) to deliver a timestamp wins. When the later copy
//! differs from the kept one a [`BoundaryConflict`] is recorded.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::chunker::Chunk;
use crate::error::ChunkFetchError;
use crate::record::OhlcvRecord;

/// A chunk that produced no records, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkFailure {
    pub chunk: Chunk,
    pub reason: String,
    #[serde(skip)]
    pub error: ChunkFetchError,
}

impl ChunkFailure {
    pub fn new(chunk: Chunk, error: ChunkFetchError) -> Self {
        Self {
            chunk,
            reason: error.to_string(),
            error,
        }
    }
}

/// Two chunks returned different bars for the same timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryConflict {
    pub timestamp: DateTime<FixedOffset>,
    pub kept_chunk: usize,
    pub dropped_chunk: usize,
}

/// Merged output of a historical fetch.
///
/// `records` is strictly increasing by timestamp. A non-empty `failures`
/// list means the series has gaps.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchResult {
    pub records: Vec<OhlcvRecord>,
    pub failures: Vec<ChunkFailure>,
    pub conflicts: Vec<BoundaryConflict>,
}

impl FetchResult {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Merges successful chunk results and carries the failures through.
///
/// Input order does not matter; chunks are processed by index.
pub fn merge(
    mut successes: Vec<(Chunk, Vec<OhlcvRecord>)>,
    mut failures: Vec<ChunkFailure>,
) -> FetchResult {
    successes.sort_by_key(|(chunk, _)| chunk.index);
    failures.sort_by_key(|f| f.chunk.index);

    let mut by_timestamp: BTreeMap<DateTime<FixedOffset>, (usize, OhlcvRecord)> =
        BTreeMap::new();
    let mut conflicts = Vec::new();

    for (chunk, records) in successes {
        for record in records {
            match by_timestamp.get(&record.timestamp) {
                Some((kept_chunk, kept)) => {
                    if *kept != record {
                        tracing::warn!(
                            "Conflicting bars at {} from chunks {} and {}; keeping the earlier one",
                            record.timestamp,
                            kept_chunk + 1,
                            chunk.index + 1
                        );
                        conflicts.push(BoundaryConflict {
                            timestamp: record.timestamp,
                            kept_chunk: *kept_chunk,
                            dropped_chunk: chunk.index,
                        });
                    }
                }
                None => {
                    by_timestamp.insert(record.timestamp, (chunk.index, record));
                }
            }
        }
    }

    FetchResult {
        records: by_timestamp.into_values().map(|(_, record)| record).collect(),
        failures,
        conflicts,
    }
}
