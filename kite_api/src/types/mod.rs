mod envelope;
pub use self::envelope::{Envelope, HistoricalData};

mod candle;
pub use self::candle::Candle;

mod interval;
pub use self::interval::{Interval, ParseIntervalError};
