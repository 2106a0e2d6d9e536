//! Memoized indicator.
//!
//! Binds a [`Calculate`] formula to one [`ValueCache`] sized after the
//! series' maximum bar count. Three read paths:
//!
//! - indices already dropped from a bounded series resolve to the value of the
//!   first retained bar, memoized per removed-bar count;
//! - the newest bar may still be forming, so its value is kept next to a copy
//!   of the bar and recomputed once the bar changes;
//! - everything else goes through the ring buffer.

use std::sync::{Mutex, MutexGuard, PoisonError};

use ridgeline_types::{Candle, SharedSeries};

use crate::cache::ValueCache;
use crate::config::CacheConfig;
use crate::error::IndicatorError;
use crate::traits::{Calculate, Indicator};

#[derive(Debug)]
struct FirstBarValue<T> {
    removed_bars_count: usize,
    value: T,
}

#[derive(Debug)]
struct LastBarValue<T> {
    index: usize,
    bar: Candle,
    value: T,
}

/// Indicator whose per-index values are computed at most once.
pub struct CachedIndicator<C: Calculate> {
    calculator: C,
    series: SharedSeries,
    cache: ValueCache<C::Output>,
    first_bar: Mutex<Option<FirstBarValue<C::Output>>>,
    last_bar: Mutex<Option<LastBarValue<C::Output>>>,
}

impl<C: Calculate> CachedIndicator<C> {
    /// Creates a cached indicator with the default cache sizing.
    ///
    /// # Errors
    /// Returns `IndicatorError::InvalidParams` if the series bound cannot be
    /// used as a cache capacity.
    pub fn new(series: SharedSeries, calculator: C) -> Result<Self, IndicatorError> {
        Self::with_config(series, calculator, &CacheConfig::default())
    }

    /// Creates a cached indicator with explicit cache sizing.
    ///
    /// # Errors
    /// Returns `IndicatorError::InvalidParams` for an invalid config or a
    /// series bound above `config.max_capacity`.
    pub fn with_config(
        series: SharedSeries,
        calculator: C,
        config: &CacheConfig,
    ) -> Result<Self, IndicatorError> {
        let cache = ValueCache::with_config(series.maximum_bar_count(), config)?;
        Ok(Self {
            calculator,
            series,
            cache,
            first_bar: Mutex::new(None),
            last_bar: Mutex::new(None),
        })
    }

    /// The wrapped formula.
    #[must_use]
    pub fn calculator(&self) -> &C {
        &self.calculator
    }

    /// The backing cache.
    #[must_use]
    pub fn cache(&self) -> &ValueCache<C::Output> {
        &self.cache
    }

    /// Newest index with a memoized value, including a cached newest bar.
    #[must_use]
    pub fn highest_result_index(&self) -> Option<usize> {
        let last = lock(&self.last_bar).as_ref().map(|entry| entry.index);
        self.cache.highest_result_index().max(last)
    }

    /// Drops every memoized value at or after `index`.
    pub fn invalidate_from(&self, index: usize) {
        {
            let mut last = lock(&self.last_bar);
            if last.as_ref().is_some_and(|entry| entry.index >= index) {
                *last = None;
            }
        }
        // the removed-index memo is computed from the first retained bar
        if index <= self.series.removed_bars_count() {
            *lock(&self.first_bar) = None;
        }
        self.cache.invalidate_from(index);
    }

    /// Drops every memoized value.
    pub fn clear(&self) {
        *lock(&self.last_bar) = None;
        *lock(&self.first_bar) = None;
        self.cache.clear();
    }

    /// Reads `index` with `this` as the formula's self handle.
    pub(crate) fn value_via(
        &self,
        this: &dyn Indicator<Output = C::Output>,
        index: usize,
    ) -> C::Output {
        let removed_bars_count = self.series.removed_bars_count();
        if index < removed_bars_count {
            tracing::trace!(
                "{}: bar {} already removed, using first retained bar {}",
                self.calculator.name(),
                index,
                removed_bars_count
            );
            return self.first_bar_value(this, removed_bars_count);
        }
        if self.series.end_index() == Some(index) {
            return self.last_bar_value(this, index);
        }
        let stored = self
            .cache
            .get_or_compute(index, |i| self.compute(this, i));
        self.expect_stored(index, stored)
    }

    pub(crate) fn compute(&self, this: &dyn Indicator<Output = C::Output>, index: usize) -> C::Output {
        let value = self.calculator.calculate(this, index);
        tracing::trace!("{}({}): {:?}", self.calculator.name(), index, value);
        value
    }

    /// Unwraps a cache store result; the only failure is running into the
    /// unbounded ceiling, which is fatal.
    pub(crate) fn expect_stored<T>(&self, index: usize, stored: Result<T, IndicatorError>) -> T {
        match stored {
            Ok(value) => value,
            Err(err) => {
                tracing::error!("{}({}): {}", self.calculator.name(), index, err);
                panic!("{}({index}): {err}", self.calculator.name());
            }
        }
    }

    fn first_bar_value(
        &self,
        this: &dyn Indicator<Output = C::Output>,
        removed_bars_count: usize,
    ) -> C::Output {
        if let Some(value) = self.memoized_first_bar(removed_bars_count) {
            return value;
        }

        let _gate = self.cache.enter_gate();
        if let Some(value) = self.memoized_first_bar(removed_bars_count) {
            return value;
        }
        let value = self.compute(this, 0);
        // dropped if the window moved meanwhile
        if self.series.removed_bars_count() == removed_bars_count {
            *lock(&self.first_bar) = Some(FirstBarValue {
                removed_bars_count,
                value: value.clone(),
            });
        }
        value
    }

    fn memoized_first_bar(&self, removed_bars_count: usize) -> Option<C::Output> {
        lock(&self.first_bar)
            .as_ref()
            .filter(|entry| entry.removed_bars_count == removed_bars_count)
            .map(|entry| entry.value.clone())
    }

    /// The newest bar may still change, so its value is kept next to a copy of
    /// the bar instead of in the ring buffer. Computed under the cache gate
    /// like any other miss.
    fn last_bar_value(&self, this: &dyn Indicator<Output = C::Output>, index: usize) -> C::Output {
        let Some(bar) = self.series.bar(index) else {
            return self.compute(this, index);
        };
        if let Some(value) = self.memoized_last_bar(index, &bar) {
            return value;
        }

        let _gate = self.cache.enter_gate();
        if let Some(value) = self.memoized_last_bar(index, &bar) {
            return value;
        }
        let value = self.compute(this, index);
        let unchanged = self.series.end_index() == Some(index)
            && self
                .series
                .bar(index)
                .is_some_and(|current| same_bar(&current, &bar));
        if unchanged {
            *lock(&self.last_bar) = Some(LastBarValue {
                index,
                bar,
                value: value.clone(),
            });
        }
        value
    }

    fn memoized_last_bar(&self, index: usize, bar: &Candle) -> Option<C::Output> {
        lock(&self.last_bar)
            .as_ref()
            .filter(|entry| entry.index == index && same_bar(&entry.bar, bar))
            .map(|entry| entry.value.clone())
    }
}

impl<C: Calculate> Indicator for CachedIndicator<C> {
    type Output = C::Output;

    /// # Panics
    /// Panics if an unbounded cache would have to grow past its ceiling.
    fn value(&self, index: usize) -> Self::Output {
        self.value_via(self, index)
    }

    fn name(&self) -> &str {
        self.calculator.name()
    }

    fn warmup_periods(&self) -> usize {
        self.calculator.warmup_periods()
    }

    fn series(&self) -> &SharedSeries {
        &self.series
    }
}

impl<C: Calculate> std::fmt::Debug for CachedIndicator<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedIndicator")
            .field("name", &self.calculator.name())
            .field("series", &self.series.name())
            .field("highest_result_index", &self.highest_result_index())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Bit-level bar equality, so a bar holding NaN still matches its own copy.
fn same_bar(a: &Candle, b: &Candle) -> bool {
    let fields = |c: &Candle| [c.open, c.high, c.low, c.close, c.volume].map(f64::to_bits);
    a.timestamp_ns == b.timestamp_ns
        && a.close_time_ns == b.close_time_ns
        && fields(a) == fields(b)
}
