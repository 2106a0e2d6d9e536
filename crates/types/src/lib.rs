//! Ridgeline Types
//!
//! Bar data and the series boundary consumed by the ridgeline indicator crates.
//! This crate provides the `Candle` record, the `BarSeries` trait that
//! indicators read from, and `BaseBarSeries`, an append-only in-memory series
//! that can optionally retain only the most recent bars.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]

pub mod candle;
pub mod error;
pub mod series;

// Re-export main types for convenience
pub use candle::Candle;
pub use error::SeriesError;
pub use series::{BarSeries, BaseBarSeries, SharedSeries};
