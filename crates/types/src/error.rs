use thiserror::Error;

/// Errors raised while building or extending a bar series.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SeriesError {
    /// A bounded series must retain at least one bar
    #[error("maximum bar count must be at least 1")]
    InvalidMaximumBarCount,

    /// Appended bar does not open after the current last bar
    #[error("bar open time {next} does not advance past {previous}")]
    NonMonotonicTimestamp {
        /// Open time of the current last bar.
        previous: i64,
        /// Open time of the rejected bar.
        next: i64,
    },

    /// Replacement bar opens at a different time than the bar it replaces
    #[error("replacement bar opens at {actual}, expected {expected}")]
    ReplaceTimestampMismatch {
        /// Open time of the bar being replaced.
        expected: i64,
        /// Open time of the rejected replacement.
        actual: i64,
    },

    /// Operation needs at least one bar
    #[error("series is empty")]
    EmptySeries,
}
