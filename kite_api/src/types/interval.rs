use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Candle width accepted by the historical endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Interval {
    Minute,
    ThreeMinute,
    FiveMinute,
    TenMinute,
    FifteenMinute,
    ThirtyMinute,
    SixtyMinute,
    Day,
}

/// Returned when an interval code is not one the API knows.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown interval '{0}'")]
pub struct ParseIntervalError(pub String);

impl Interval {
    pub const ALL: [Interval; 8] = [
        Interval::Minute,
        Interval::ThreeMinute,
        Interval::FiveMinute,
        Interval::TenMinute,
        Interval::FifteenMinute,
        Interval::ThirtyMinute,
        Interval::SixtyMinute,
        Interval::Day,
    ];

    /// The code used in the request path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Minute => "minute",
            Interval::ThreeMinute => "3minute",
            Interval::FiveMinute => "5minute",
            Interval::TenMinute => "10minute",
            Interval::FifteenMinute => "15minute",
            Interval::ThirtyMinute => "30minute",
            Interval::SixtyMinute => "60minute",
            Interval::Day => "day",
        }
    }

    /// Bar width in minutes, `None` for daily bars.
    pub fn minutes(&self) -> Option<u32> {
        match self {
            Interval::Minute => Some(1),
            Interval::ThreeMinute => Some(3),
            Interval::FiveMinute => Some(5),
            Interval::TenMinute => Some(10),
            Interval::FifteenMinute => Some(15),
            Interval::ThirtyMinute => Some(30),
            Interval::SixtyMinute => Some(60),
            Interval::Day => None,
        }
    }

    pub fn is_intraday(&self) -> bool {
        self.minutes().is_some()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ParseIntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minute" | "1minute" => Ok(Interval::Minute),
            "3minute" => Ok(Interval::ThreeMinute),
            "5minute" => Ok(Interval::FiveMinute),
            "10minute" => Ok(Interval::TenMinute),
            "15minute" => Ok(Interval::FifteenMinute),
            "30minute" => Ok(Interval::ThirtyMinute),
            "60minute" | "hour" => Ok(Interval::SixtyMinute),
            "day" => Ok(Interval::Day),
            _ => Err(ParseIntervalError(s.to_string())),
        }
    }
}

impl TryFrom<String> for Interval {
    type Error = ParseIntervalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Interval> for String {
    fn from(value: Interval) -> Self {
        value.as_str().to_string()
    }
}
