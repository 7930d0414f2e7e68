//! The normalized price bar handed to callers.

use chrono::{DateTime, FixedOffset};
use kite_api::types::Candle;
use serde::{Deserialize, Serialize};

/// One timestamped OHLCV bar. Unique per symbol and interval by `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvRecord {
    pub timestamp: DateTime<FixedOffset>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl From<Candle> for OhlcvRecord {
    fn from(candle: Candle) -> Self {
        Self {
            timestamp: candle.timestamp,
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
            volume: candle.volume,
        }
    }
}
