//! Sequential, paced, failure-isolating chunk fetcher.
//!
//! Chunks are fetched one at a time in chronological order with
//! `call_delay` between adapter calls. A failed chunk is recorded and the
//! loop moves on; retryable failures (rate limit, transport, 5xx) get a
//! bounded number of extra attempts with exponential backoff. A fatal
//! failure (rejected credentials, unknown symbol) stops further calls and
//! marks the remaining chunks as skipped. Cancellation is observed between
//! calls and during retry backoff, never in the middle of a call.

use kite_api::types::Interval;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::chunker::Chunk;
use crate::config::FetcherConfig;
use crate::error::ChunkFetchError;
use crate::record::OhlcvRecord;
use crate::source::HistoricalSource;

/// The result of fetching one chunk.
#[derive(Debug, Clone)]
pub struct ChunkOutcome {
    pub chunk: Chunk,
    pub result: Result<Vec<OhlcvRecord>, ChunkFetchError>,
}

pub struct ChunkFetcher<S> {
    source: S,
    config: FetcherConfig,
}

impl<S: HistoricalSource> ChunkFetcher<S> {
    pub fn new(source: S, config: FetcherConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetches every chunk in order. Always returns one outcome per chunk.
    pub async fn fetch_chunks(
        &self,
        symbol: &str,
        chunks: &[Chunk],
        interval: Interval,
    ) -> Vec<ChunkOutcome> {
        self.fetch_chunks_with(symbol, chunks, interval, &CancellationToken::new(), |_| {})
            .await
    }

    /// Like [`fetch_chunks`](Self::fetch_chunks), with a cancellation token
    /// checked before each call and a callback invoked after each chunk.
    pub async fn fetch_chunks_with<F>(
        &self,
        symbol: &str,
        chunks: &[Chunk],
        interval: Interval,
        cancel: &CancellationToken,
        mut on_chunk: F,
    ) -> Vec<ChunkOutcome>
    where
        F: FnMut(&ChunkOutcome),
    {
        let mut outcomes = Vec::with_capacity(chunks.len());
        let mut halted: Option<ChunkFetchError> = None;
        let mut calls_made = 0usize;

        for (position, chunk) in chunks.iter().enumerate() {
            let result = if let Some(fatal) = &halted {
                Err(ChunkFetchError::Skipped(fatal.to_string()))
            } else {
                if calls_made > 0 && !self.config.call_delay.is_zero() {
                    tokio::select! {
                        _ = sleep(self.config.call_delay) => {}
                        _ = cancel.cancelled() => {}
                    }
                }
                if cancel.is_cancelled() {
                    Err(ChunkFetchError::Cancelled)
                } else {
                    calls_made += 1;
                    self.fetch_one(symbol, chunk, interval, cancel).await
                }
            };

            match &result {
                Ok(records) => {
                    tracing::info!("Fetched chunk {} ({} records)", chunk, records.len());
                }
                Err(ChunkFetchError::Cancelled) | Err(ChunkFetchError::Skipped(_)) => {}
                Err(err) => {
                    tracing::warn!("Chunk {} failed: {}", chunk, err);
                    if err.is_fatal() {
                        tracing::error!(
                            "Stopping after fatal error; {} remaining chunk(s) will not be requested",
                            chunks.len() - position - 1
                        );
                        halted = Some(err.clone());
                    }
                }
            }

            let outcome = ChunkOutcome {
                chunk: *chunk,
                result,
            };
            on_chunk(&outcome);
            outcomes.push(outcome);
        }

        outcomes
    }

    async fn fetch_one(
        &self,
        symbol: &str,
        chunk: &Chunk,
        interval: Interval,
        cancel: &CancellationToken,
    ) -> Result<Vec<OhlcvRecord>, ChunkFetchError> {
        let mut attempt = 0u32;
        loop {
            let result = self
                .source
                .fetch_range(symbol, interval, chunk.from_date(), chunk.to_date())
                .await;
            match result {
                Ok(records) if records.is_empty() => return Err(ChunkFetchError::EmptyPayload),
                Ok(records) => return Ok(records),
                Err(err) => {
                    attempt += 1;
                    if attempt > self.config.max_retries || !err.is_retryable() {
                        return Err(err);
                    }
                    let delay = self.config.delay_for_attempt(attempt);
                    tracing::warn!(
                        "Chunk {} failed (attempt {}/{}): {}, retrying in {:.1}s",
                        chunk,
                        attempt,
                        self.config.max_retries,
                        err,
                        delay.as_secs_f64()
                    );
                    tokio::select! {
                        _ = sleep(delay) => {}
                        _ = cancel.cancelled() => return Err(ChunkFetchError::Cancelled),
                    }
                }
            }
        }
    }
}
