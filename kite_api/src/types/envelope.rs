use serde::{Deserialize, Serialize};

use super::Candle;

/// Every Kite response is wrapped in `{"status": ..., "data": ...}`; error
/// responses carry `message` and `error_type` instead of `data`.
#[derive(Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_type: Option<String>,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Serialize, Deserialize, Default)]
pub struct HistoricalData {
    pub candles: Vec<Candle>,
}
