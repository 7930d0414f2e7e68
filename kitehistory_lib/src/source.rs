//! The data-provider seam: anything that can return bars for one chunk.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use kite_api::types::Interval;

use crate::error::ChunkFetchError;
use crate::record::OhlcvRecord;

/// A provider of historical bars. Each call covers one chunk, so
/// `to - from` never exceeds the interval's configured `max_days`.
#[async_trait]
pub trait HistoricalSource: Send + Sync {
    async fn fetch_range(
        &self,
        symbol: &str,
        interval: Interval,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<OhlcvRecord>, ChunkFetchError>;
}

#[async_trait]
impl<S: HistoricalSource + ?Sized> HistoricalSource for Arc<S> {
    async fn fetch_range(
        &self,
        symbol: &str,
        interval: Interval,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<OhlcvRecord>, ChunkFetchError> {
        (**self).fetch_range(symbol, interval, from, to).await
    }
}
