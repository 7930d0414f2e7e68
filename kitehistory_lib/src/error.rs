//! Error types for the library layer.

use kite_api::types::Interval;
use thiserror::Error;

use crate::merger::ChunkFailure;

/// Request-level failures of the historical fetch pipeline.
#[derive(Error, Debug)]
pub enum HistoryError {
    /// `from_date > to_date`, or an interval with no configured limit.
    #[error("Invalid range: {0}")]
    InvalidRange(String),
    /// The total span is above the configured ceiling. Nothing was fetched.
    #[error(
        "Requested span of {span_days} days exceeds the {ceiling_days}-day ceiling for {interval} data"
    )]
    RangeTooLarge {
        span_days: i64,
        ceiling_days: u32,
        interval: Interval,
    },
    /// User-provided input (symbol, date string) failed validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Every chunk failed, or a failure that would repeat for every chunk was hit.
    #[error("Historical fetch failed: {reason}")]
    AggregateFetch {
        reason: String,
        failures: Vec<ChunkFailure>,
    },
}

/// Why a single chunk produced no records.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChunkFetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("rate limited by provider")]
    RateLimited,
    #[error("provider error: {message}")]
    Provider { message: String, transient: bool },
    #[error("authentication rejected: {0}")]
    Unauthorized(String),
    #[error("unknown symbol '{0}'")]
    UnknownSymbol(String),
    #[error("provider returned no records")]
    EmptyPayload,
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("cancelled before the request was sent")]
    Cancelled,
    #[error("skipped after an earlier fatal error: {0}")]
    Skipped(String),
}

impl ChunkFetchError {
    /// Failures that would repeat identically for every remaining chunk.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::UnknownSymbol(_))
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::RateLimited => true,
            Self::Provider { transient, .. } => *transient,
            _ => false,
        }
    }
}

impl From<kite_api::Error> for ChunkFetchError {
    fn from(err: kite_api::Error) -> Self {
        if err.is_auth_failure() {
            return Self::Unauthorized(err.to_string());
        }
        match err {
            kite_api::Error::RequestFailed(msg) => Self::Network(msg),
            kite_api::Error::RateLimited => Self::RateLimited,
            kite_api::Error::Parse(msg) => Self::Malformed(msg),
            other => Self::Provider {
                transient: other.is_retryable(),
                message: other.to_string(),
            },
        }
    }
}
