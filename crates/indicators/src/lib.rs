//! Ridgeline Indicators
//!
//! Incremental, memoized indicator engine over a growing bar series.
//!
//! # Features
//! - `ValueCache`: per-indicator ring buffer with eviction for bounded series
//!   and a reentrant compute gate for self-referential formulas
//! - `CachedIndicator`: computes each index at most once, with special
//!   handling for removed bars and a still-forming newest bar
//! - `RecursiveIndicator`: backfills large gaps iteratively so deep reads of
//!   recurrences never exhaust the stack
//! - Fractal pivot detection with plateau tolerance
//! - Incremental swing-point tracking and a swing marker overlay
//!
//! # Available Indicators
//! - SMA: Simple Moving Average
//! - EMA: Exponential Moving Average
//! - Price: Open/High/Low/Close/Volume field reads
//! - RecentFractalSwingHigh / RecentFractalSwingLow
//! - ZigZagState, RecentZigZagSwingHigh / RecentZigZagSwingLow
//! - SwingPointMarker

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![allow(clippy::upper_case_acronyms)]

pub mod cache;
pub mod cached;
pub mod config;
pub mod error;
pub mod fractal;
mod gate;
pub mod impl_;
pub mod recursive;
pub mod swing;
pub mod traits;

// Re-export main types
pub use cache::ValueCache;
pub use cached::CachedIndicator;
pub use config::{
    CacheConfig, DEFAULT_RECURSION_THRESHOLD, DEFAULT_UNBOUNDED_CAPACITY, MAX_CACHE_CAPACITY,
};
pub use error::IndicatorError;
pub use fractal::{find_latest_confirmed_pivot, is_confirmed_pivot, PivotDirection, PivotWindow};
pub use recursive::RecursiveIndicator;
pub use swing::{SwingCalculation, SwingDetector, SwingIndicator, SwingPointTracker, SwingPoints};
pub use traits::{in_window, same_series, Calculate, Indicator, SharedIndicator};

// Re-export indicator implementations
pub use impl_::{
    constant::ConstantIndicator,
    ema::EMA,
    fractal_swing::{FractalSwingDetector, RecentFractalSwingIndicator},
    price::{PriceField, PriceIndicator},
    sma::SMA,
    swing_marker::SwingPointMarker,
    zigzag::{
        RecentZigZagSwingIndicator, ZigZag, ZigZagPivot, ZigZagState, ZigZagSwingDetector,
        ZigZagTrend,
    },
};
