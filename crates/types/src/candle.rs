//! OHLCV bar record.

/// One OHLCV bar.
///
/// `timestamp_ns` is the **open time** of the bar, not its close time.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Candle {
    /// Unix epoch nanoseconds UTC (open time)
    pub timestamp_ns: i64,
    /// Unix epoch nanoseconds UTC (close time = open + duration - 1ns)
    pub close_time_ns: i64,
    /// Open price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Close price
    pub close: f64,
    /// Volume
    pub volume: f64,
}

impl Candle {
    /// Builds a bar from its open time, duration and OHLCV values.
    #[must_use]
    pub fn from_ohlcv(
        timestamp_ns: i64,
        duration_ns: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp_ns,
            close_time_ns: timestamp_ns + duration_ns - 1,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Duration covered by the bar in nanoseconds.
    #[must_use]
    pub fn duration_ns(&self) -> i64 {
        self.close_time_ns - self.timestamp_ns + 1
    }
}
