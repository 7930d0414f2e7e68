//! `HistoricalSource` backed by the Kite Connect historical endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use kite_api::types::Interval;
use kite_api::{Client, HistoricalQuery};

use crate::error::ChunkFetchError;
use crate::instruments::Instruments;
use crate::record::OhlcvRecord;
use crate::source::HistoricalSource;

/// Resolves symbols through the instrument registry and fetches whole
/// calendar days for each chunk.
pub struct KiteSource {
    client: Client,
    instruments: Arc<Instruments>,
}

impl KiteSource {
    pub fn new(client: Client, instruments: Arc<Instruments>) -> Self {
        Self {
            client,
            instruments,
        }
    }
}

#[async_trait]
impl HistoricalSource for KiteSource {
    async fn fetch_range(
        &self,
        symbol: &str,
        interval: Interval,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<OhlcvRecord>, ChunkFetchError> {
        let instrument = self
            .instruments
            .resolve(symbol)
            .map_err(|_| ChunkFetchError::UnknownSymbol(symbol.to_string()))?;

        tracing::debug!(
            "Requesting {} ({}) {} bars {} to {}",
            instrument.symbol,
            instrument.token,
            interval,
            from,
            to
        );

        let query = HistoricalQuery::for_dates(from, to);
        let candles = self
            .client
            .get_historical(instrument.token, interval, &query)
            .await?;
        Ok(candles.into_iter().map(OhlcvRecord::from).collect())
    }
}
