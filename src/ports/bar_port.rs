//! Bar data access port trait.

use crate::domain::bar::{Bar, Interval};
use crate::domain::error::WavetraderError;
use chrono::NaiveDateTime;

/// Source of prepared candle series. Implementations must return bars
/// strictly increasing in timestamp, restricted to `[start, end)`.
pub trait BarPort {
    fn fetch_bars(
        &self,
        ticker: &str,
        interval: Interval,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Bar>, WavetraderError>;

    fn list_tickers(&self) -> Result<Vec<String>, WavetraderError>;
}
