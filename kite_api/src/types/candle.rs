use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One OHLCV bar as returned by the historical endpoint.
///
/// On the wire a candle is a positional array:
/// `["2023-01-02T09:15:00+0530", open, high, low, close, volume]`, with an
/// optional trailing open-interest value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCandle")]
pub struct Candle {
    pub timestamp: DateTime<FixedOffset>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oi: Option<i64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCandle {
    WithOi(String, f64, f64, f64, f64, i64, i64),
    Plain(String, f64, f64, f64, f64, i64),
}

impl TryFrom<RawCandle> for Candle {
    type Error = String;

    fn try_from(raw: RawCandle) -> Result<Self, Self::Error> {
        let (ts, open, high, low, close, volume, oi) = match raw {
            RawCandle::WithOi(ts, o, h, l, c, v, oi) => (ts, o, h, l, c, v, Some(oi)),
            RawCandle::Plain(ts, o, h, l, c, v) => (ts, o, h, l, c, v, None),
        };
        Ok(Candle {
            timestamp: parse_timestamp(&ts)?,
            open,
            high,
            low,
            close,
            volume,
            oi,
        })
    }
}

/// Kite sends `+0530` style offsets, which RFC 3339 does not allow.
fn parse_timestamp(ts: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(ts))
        .map_err(|e| format!("invalid candle timestamp '{}': {}", ts, e))
}
