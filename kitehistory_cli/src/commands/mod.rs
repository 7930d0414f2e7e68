pub mod fetch;
pub mod intervals;
pub mod plan;
pub mod symbols;

use clap::Args;

/// Symbol, date range and interval shared by `fetch` and `plan`.
#[derive(Args, Debug)]
pub struct RangeArgs {
    /// Trading symbol (e.g. RELIANCE, INFY, M&M)
    #[arg(long)]
    pub symbol: String,

    /// First date to fetch (YYYY-MM-DD)
    #[arg(long)]
    pub from: String,

    /// Last date to fetch (YYYY-MM-DD)
    #[arg(long)]
    pub to: String,

    /// Candle interval: minute, 3minute, 5minute, 10minute, 15minute,
    /// 30minute, 60minute (or hour), day
    #[arg(long, default_value = "day")]
    pub interval: String,
}
