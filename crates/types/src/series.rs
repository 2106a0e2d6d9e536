//! Bar series boundary and the in-memory series implementation.
//!
//! Indices are absolute: the first bar ever added has index 0 and keeps it
//! even after a size-bounded series has dropped it. `begin_index` therefore
//! advances together with `end_index` once the bound is reached.

use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock};

use crate::candle::Candle;
use crate::error::SeriesError;

/// Shared handle to a series, as held by indicators.
pub type SharedSeries = Arc<dyn BarSeries>;

/// Read side of a time-indexed bar sequence.
pub trait BarSeries: Send + Sync {
    /// Human readable series name.
    fn name(&self) -> &str;

    /// Index of the oldest retained bar (equals `removed_bars_count` while empty).
    fn begin_index(&self) -> usize;

    /// Index of the newest bar, `None` while the series is empty.
    fn end_index(&self) -> Option<usize>;

    /// Number of retained bars.
    fn bar_count(&self) -> usize;

    /// Maximum number of retained bars, `None` when unbounded.
    fn maximum_bar_count(&self) -> Option<usize>;

    /// Number of bars dropped from the front so far.
    fn removed_bars_count(&self) -> usize;

    /// Returns the bar at `index`.
    ///
    /// Indices before `begin_index` resolve to the oldest retained bar;
    /// indices after `end_index` yield `None`.
    fn bar(&self, index: usize) -> Option<Candle>;

    /// Returns `true` if the series holds no bars.
    fn is_empty(&self) -> bool {
        self.end_index().is_none()
    }
}

#[derive(Debug)]
struct SeriesWindow {
    candles: VecDeque<Candle>,
    removed_bars_count: usize,
    maximum_bar_count: Option<usize>,
}

impl SeriesWindow {
    fn trim(&mut self) {
        let Some(max) = self.maximum_bar_count else {
            return;
        };
        while self.candles.len() > max {
            self.candles.pop_front();
            self.removed_bars_count += 1;
        }
    }
}

/// Append-only series backed by a `VecDeque`, optionally size-bounded.
///
/// Interior locking lets one writer append while indicators read through a
/// shared `Arc<dyn BarSeries>`.
#[derive(Debug)]
pub struct BaseBarSeries {
    name: String,
    window: RwLock<SeriesWindow>,
}

impl BaseBarSeries {
    /// Creates an empty, unbounded series.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            window: RwLock::new(SeriesWindow {
                candles: VecDeque::new(),
                removed_bars_count: 0,
                maximum_bar_count: None,
            }),
        }
    }

    /// Creates an empty series that keeps at most `maximum_bar_count` bars.
    ///
    /// # Errors
    /// Returns `SeriesError::InvalidMaximumBarCount` if `maximum_bar_count` is 0.
    pub fn with_maximum_bar_count(
        name: impl Into<String>,
        maximum_bar_count: usize,
    ) -> Result<Self, SeriesError> {
        let series = Self::new(name);
        series.set_maximum_bar_count(maximum_bar_count)?;
        Ok(series)
    }

    /// Creates an unbounded series from an ordered list of bars.
    ///
    /// # Errors
    /// Returns `SeriesError::NonMonotonicTimestamp` if open times do not
    /// strictly increase.
    pub fn from_candles(
        name: impl Into<String>,
        candles: impl IntoIterator<Item = Candle>,
    ) -> Result<Self, SeriesError> {
        let series = Self::new(name);
        for candle in candles {
            series.add_candle(candle)?;
        }
        Ok(series)
    }

    /// Appends a bar, dropping the oldest bar if the bound is exceeded.
    ///
    /// # Errors
    /// Returns `SeriesError::NonMonotonicTimestamp` if the bar does not open
    /// after the current last bar.
    pub fn add_candle(&self, candle: Candle) -> Result<(), SeriesError> {
        let mut window = self.window.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(last) = window.candles.back() {
            if candle.timestamp_ns <= last.timestamp_ns {
                return Err(SeriesError::NonMonotonicTimestamp {
                    previous: last.timestamp_ns,
                    next: candle.timestamp_ns,
                });
            }
        }
        window.candles.push_back(candle);
        let removed_before = window.removed_bars_count;
        window.trim();
        if window.removed_bars_count != removed_before {
            tracing::trace!(
                "{}: dropped oldest bar, begin index now {}",
                self.name,
                window.removed_bars_count
            );
        }
        Ok(())
    }

    /// Replaces the newest bar, e.g. while the current bar is still forming.
    ///
    /// Indicators that already cached values at that index must be
    /// invalidated by the caller.
    ///
    /// # Errors
    /// Returns `SeriesError::EmptySeries` if there is no bar to replace and
    /// `SeriesError::ReplaceTimestampMismatch` if the open times differ.
    pub fn replace_last_candle(&self, candle: Candle) -> Result<(), SeriesError> {
        let mut window = self.window.write().unwrap_or_else(PoisonError::into_inner);
        let last = window.candles.back_mut().ok_or(SeriesError::EmptySeries)?;
        if last.timestamp_ns != candle.timestamp_ns {
            return Err(SeriesError::ReplaceTimestampMismatch {
                expected: last.timestamp_ns,
                actual: candle.timestamp_ns,
            });
        }
        *last = candle;
        Ok(())
    }

    /// Bounds the series, dropping bars from the front immediately if needed.
    ///
    /// Caches of indicators created earlier keep the capacity they were
    /// built with.
    ///
    /// # Errors
    /// Returns `SeriesError::InvalidMaximumBarCount` if `maximum_bar_count` is 0.
    pub fn set_maximum_bar_count(&self, maximum_bar_count: usize) -> Result<(), SeriesError> {
        if maximum_bar_count == 0 {
            return Err(SeriesError::InvalidMaximumBarCount);
        }
        let mut window = self.window.write().unwrap_or_else(PoisonError::into_inner);
        window.maximum_bar_count = Some(maximum_bar_count);
        window.trim();
        Ok(())
    }

    /// Snapshot of the retained bars, oldest first.
    #[must_use]
    pub fn candles(&self) -> Vec<Candle> {
        let window = self.window.read().unwrap_or_else(PoisonError::into_inner);
        window.candles.iter().copied().collect()
    }

    /// Wraps the series into a shared handle.
    #[must_use]
    pub fn into_shared(self) -> SharedSeries {
        Arc::new(self)
    }
}

impl BarSeries for BaseBarSeries {
    fn name(&self) -> &str {
        &self.name
    }

    fn begin_index(&self) -> usize {
        self.removed_bars_count()
    }

    fn end_index(&self) -> Option<usize> {
        let window = self.window.read().unwrap_or_else(PoisonError::into_inner);
        if window.candles.is_empty() {
            None
        } else {
            Some(window.removed_bars_count + window.candles.len() - 1)
        }
    }

    fn bar_count(&self) -> usize {
        self.window
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .candles
            .len()
    }

    fn maximum_bar_count(&self) -> Option<usize> {
        self.window
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .maximum_bar_count
    }

    fn removed_bars_count(&self) -> usize {
        self.window
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .removed_bars_count
    }

    fn bar(&self, index: usize) -> Option<Candle> {
        let window = self.window.read().unwrap_or_else(PoisonError::into_inner);
        let offset = index.saturating_sub(window.removed_bars_count);
        window.candles.get(offset).copied()
    }
}
