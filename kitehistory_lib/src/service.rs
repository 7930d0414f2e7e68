//! The historical fetch pipeline: chunk, fetch sequentially, merge.

use std::sync::Arc;

use chrono::NaiveDate;
use kite_api::types::Interval;
use tokio_util::sync::CancellationToken;

use crate::chunker::{Chunk, RangeChunker};
use crate::config::FetcherConfig;
use crate::error::HistoryError;
use crate::fetcher::{ChunkFetcher, ChunkOutcome};
use crate::limits::FetchLimits;
use crate::merger::{merge, ChunkFailure, FetchResult};
use crate::record::OhlcvRecord;
use crate::source::HistoricalSource;

/// Fetches arbitrarily long histories from a source limited per call.
pub struct HistoryService<S> {
    chunker: RangeChunker,
    fetcher: ChunkFetcher<S>,
}

impl<S: HistoricalSource> HistoryService<S> {
    pub fn new(limits: Arc<FetchLimits>, source: S, config: FetcherConfig) -> Self {
        Self {
            chunker: RangeChunker::new(limits),
            fetcher: ChunkFetcher::new(source, config),
        }
    }

    pub fn chunker(&self) -> &RangeChunker {
        &self.chunker
    }

    pub fn fetcher(&self) -> &ChunkFetcher<S> {
        &self.fetcher
    }

    /// Fetches `[from, to]` for `symbol` at `interval`.
    ///
    /// Returns a possibly partial [`FetchResult`] as long as at least one
    /// chunk produced data. Range errors are returned before any call is
    /// made; a fatal chunk error or the failure of every chunk becomes
    /// [`HistoryError::AggregateFetch`].
    pub async fn fetch_historical(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
        interval: Interval,
    ) -> Result<FetchResult, HistoryError> {
        self.fetch_historical_with(symbol, from, to, interval, &CancellationToken::new(), |_| {})
            .await
    }

    /// [`fetch_historical`](Self::fetch_historical) with cancellation and a
    /// per-chunk progress callback. A cancelled run keeps what was fetched
    /// before the token fired.
    pub async fn fetch_historical_with<F>(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
        interval: Interval,
        cancel: &CancellationToken,
        on_chunk: F,
    ) -> Result<FetchResult, HistoryError>
    where
        F: FnMut(&ChunkOutcome),
    {
        let chunks = self.chunker.compute_chunks(from, to, interval)?;
        tracing::info!(
            "Fetching {} {} data from {} to {} in {} chunk(s)",
            symbol,
            interval,
            from,
            to,
            chunks.len()
        );

        let outcomes = self
            .fetcher
            .fetch_chunks_with(symbol, &chunks, interval, cancel, on_chunk)
            .await;
        collect(chunks.len(), outcomes)
    }
}

fn collect(total: usize, outcomes: Vec<ChunkOutcome>) -> Result<FetchResult, HistoryError> {
    let mut successes: Vec<(Chunk, Vec<OhlcvRecord>)> = Vec::new();
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome.result {
            Ok(records) => successes.push((outcome.chunk, records)),
            Err(err) => failures.push(ChunkFailure::new(outcome.chunk, err)),
        }
    }

    if let Some(fatal) = failures.iter().find(|f| f.error.is_fatal()) {
        return Err(HistoryError::AggregateFetch {
            reason: fatal.reason.clone(),
            failures,
        });
    }

    if successes.is_empty() {
        return Err(HistoryError::AggregateFetch {
            reason: format!("all {} chunk(s) failed", total),
            failures,
        });
    }

    let result = merge(successes, failures);
    if result.is_partial() {
        tracing::warn!(
            "Partial result: {} of {} chunk(s) failed, {} records kept",
            result.failures.len(),
            total,
            result.records.len()
        );
    } else {
        tracing::info!("Fetched {} records", result.records.len());
    }
    Ok(result)
}
