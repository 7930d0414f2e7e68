//! Library layer for kitehistory: chunked historical OHLCV fetching.
//!
//! Splits a requested date range into API-sized chunks using a configured
//! per-interval limit table, fetches the chunks sequentially through a
//! [`HistoricalSource`] with pacing and bounded retries, and merges the
//! results into one de-duplicated, chronologically ordered series. Also
//! provides the Kite Connect source, the instrument registry, pre-flight
//! planning and validation, and summary statistics.

pub mod chunker;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod instruments;
pub mod kite_source;
pub mod limits;
pub mod merger;
pub mod plan;
pub mod record;
pub mod service;
pub mod source;
pub mod stats;
pub mod validation;

pub use kite_api;
pub use kite_api::types::Interval;

pub use chunker::{Chunk, DateRange, RangeChunker};
pub use config::FetcherConfig;
pub use error::{ChunkFetchError, HistoryError};
pub use fetcher::{ChunkFetcher, ChunkOutcome};
pub use instruments::{Instrument, InstrumentError, Instruments};
pub use kite_source::KiteSource;
pub use limits::{FetchLimits, IntervalLimit, LimitsError};
pub use merger::{merge, BoundaryConflict, ChunkFailure, FetchResult};
pub use plan::{plan_fetch, FetchPlan, FetchStrategy};
pub use record::OhlcvRecord;
pub use service::HistoryService;
pub use source::HistoricalSource;
pub use stats::DataStatistics;
pub use validation::{validate_fetch_parameters, ValidationReport};
