//! Recursion-safe cached indicator.
//!
//! Formulas such as `v(i) = f(v(i - 1), x(i))` recurse once per uncached
//! index. Before evaluating an index whose distance to the newest cached value
//! exceeds the threshold, the gap is filled iteratively in ascending order, so
//! each nested self-read then hits the cache and the stack stays shallow.

use ridgeline_types::SharedSeries;

use crate::cached::CachedIndicator;
use crate::config::CacheConfig;
use crate::error::IndicatorError;
use crate::traits::{Calculate, Indicator};

/// Cached indicator for self-referential formulas.
#[derive(Debug)]
pub struct RecursiveIndicator<C: Calculate> {
    inner: CachedIndicator<C>,
    recursion_threshold: usize,
}

impl<C: Calculate> RecursiveIndicator<C> {
    /// Creates a recursive indicator with the default sizing and threshold.
    ///
    /// # Errors
    /// Returns `IndicatorError::InvalidParams` if the series bound cannot be
    /// used as a cache capacity.
    pub fn new(series: SharedSeries, calculator: C) -> Result<Self, IndicatorError> {
        Self::with_config(series, calculator, &CacheConfig::default())
    }

    /// Creates a recursive indicator with explicit sizing and threshold.
    ///
    /// # Errors
    /// Returns `IndicatorError::InvalidParams` for an invalid config.
    pub fn with_config(
        series: SharedSeries,
        calculator: C,
        config: &CacheConfig,
    ) -> Result<Self, IndicatorError> {
        Ok(Self {
            inner: CachedIndicator::with_config(series, calculator, config)?,
            recursion_threshold: config.recursion_threshold,
        })
    }

    /// Gap size above which evaluation backfills iteratively.
    #[must_use]
    pub fn recursion_threshold(&self) -> usize {
        self.recursion_threshold
    }

    /// The memoizing indicator underneath.
    #[must_use]
    pub fn cached(&self) -> &CachedIndicator<C> {
        &self.inner
    }

    /// Drops every memoized value at or after `index`.
    pub fn invalidate_from(&self, index: usize) {
        self.inner.invalidate_from(index);
    }

    /// Drops every memoized value.
    pub fn clear(&self) {
        self.inner.clear();
    }

    fn prefill_gap(&self, index: usize) {
        let series = self.inner.series();
        match series.end_index() {
            Some(end) if index <= end => {}
            _ => return,
        }

        let removed_bars_count = series.removed_bars_count();
        let start = self
            .inner
            .cache()
            .highest_result_index()
            .map_or(removed_bars_count, |highest| highest.max(removed_bars_count));
        if index.saturating_sub(start) <= self.recursion_threshold {
            return;
        }

        tracing::debug!(
            "{}: backfilling [{}, {}) before evaluating {}",
            self.inner.name(),
            start,
            index,
            index
        );
        let filled = self
            .inner
            .cache()
            .prefill_until(start, index, |i| self.inner.compute(self, i));
        self.inner.expect_stored(index, filled);
    }
}

impl<C: Calculate> Indicator for RecursiveIndicator<C> {
    type Output = C::Output;

    /// # Panics
    /// Panics if an unbounded cache would have to grow past its ceiling.
    fn value(&self, index: usize) -> Self::Output {
        self.prefill_gap(index);
        self.inner.value_via(self, index)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn warmup_periods(&self) -> usize {
        self.inner.warmup_periods()
    }

    fn series(&self) -> &SharedSeries {
        self.inner.series()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridgeline_types::{BaseBarSeries, Candle};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const MINUTE_NS: i64 = 60_000_000_000;

    fn series_of_len(len: usize) -> SharedSeries {
        let series = BaseBarSeries::new("recursive");
        for minute in 0..len {
            let ts = minute as i64 * MINUTE_NS;
            series
                .add_candle(Candle::from_ohlcv(ts, MINUTE_NS, 1.0, 1.0, 1.0, 1.0, 0.0))
                .unwrap();
        }
        series.into_shared()
    }

    /// `v(0) = 1`, `v(i) = v(i - 1) + 1`.
    struct Counting {
        calls: Arc<AtomicUsize>,
    }

    impl Calculate for Counting {
        type Output = f64;

        fn calculate(&self, this: &dyn Indicator<Output = f64>, index: usize) -> f64 {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if index == 0 {
                1.0
            } else {
                this.value(index - 1) + 1.0
            }
        }

        fn name(&self) -> &str {
            "Counting"
        }

        fn warmup_periods(&self) -> usize {
            0
        }
    }

    fn counting(len: usize) -> (RecursiveIndicator<Counting>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let indicator = RecursiveIndicator::new(
            series_of_len(len),
            Counting {
                calls: Arc::clone(&calls),
            },
        )
        .unwrap();
        (indicator, calls)
    }

    #[test]
    fn test_deep_index_is_evaluated_without_overflow() {
        let (indicator, _) = counting(100_001);
        assert_eq!(indicator.value(100_000), 100_001.0);
    }

    #[test]
    fn test_each_index_computed_once() {
        let (indicator, calls) = counting(301);
        assert_eq!(indicator.value(200), 201.0);
        assert_eq!(calls.load(Ordering::SeqCst), 201);

        assert_eq!(indicator.value(300), 301.0);
        assert_eq!(calls.load(Ordering::SeqCst), 301);
        assert_eq!(indicator.value(150), 151.0);
        assert_eq!(calls.load(Ordering::SeqCst), 301);
    }

    #[test]
    fn test_prefill_syncs_highest_result_index() {
        let (indicator, _) = counting(401);
        indicator.value(200);
        assert_eq!(indicator.cached().cache().highest_result_index(), Some(200));
    }

    #[test]
    fn test_small_gap_skips_prefill() {
        let (indicator, calls) = counting(50);
        assert_eq!(indicator.value(40), 41.0);
        assert_eq!(calls.load(Ordering::SeqCst), 41);
        assert_eq!(indicator.cached().cache().first_cached_index(), Some(0));
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let config = CacheConfig {
            recursion_threshold: 0,
            ..CacheConfig::default()
        };
        let calls = Arc::new(AtomicUsize::new(0));
        let result = RecursiveIndicator::with_config(series_of_len(3), Counting { calls }, &config);
        assert!(result.is_err());
    }
}
