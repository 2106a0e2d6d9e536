//! Indicator traits.
//!
//! `Indicator` is the single read capability every value provider exposes;
//! composed indicators hold their inputs as `Arc<dyn Indicator<Output = f64>>`.
//! `Calculate` is the pure per-index formula that a cached wrapper memoizes.

use std::fmt::Debug;
use std::sync::Arc;

use ridgeline_types::{BarSeries, SharedSeries};

/// Shared numeric indicator handle.
pub type SharedIndicator = Arc<dyn Indicator<Output = f64>>;

/// Read access to a time-indexed indicator.
///
/// `value` is deterministic for a fixed series: repeated reads of an index
/// return the same result until the owner invalidates it. Undefined results
/// (warm-up, missing inputs) are `f64::NAN` for numeric indicators.
pub trait Indicator: Send + Sync {
    /// Value type produced per index.
    type Output;

    /// Returns the value at `index`.
    fn value(&self, index: usize) -> Self::Output;

    /// Name of the indicator (e.g., "EMA", "SMA").
    fn name(&self) -> &str;

    /// Number of leading bars whose values are not yet reliable.
    fn warmup_periods(&self) -> usize;

    /// Series the indicator reads from.
    fn series(&self) -> &SharedSeries;
}

impl<I> Indicator for Arc<I>
where
    I: Indicator + ?Sized,
{
    type Output = I::Output;

    fn value(&self, index: usize) -> Self::Output {
        (**self).value(index)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn warmup_periods(&self) -> usize {
        (**self).warmup_periods()
    }

    fn series(&self) -> &SharedSeries {
        (**self).series()
    }
}

/// Per-index formula memoized by a cached indicator.
///
/// `this` is the owning indicator; recurrences read their own earlier values
/// through it so those reads hit the cache.
pub trait Calculate: Send + Sync {
    /// Value type produced per index.
    type Output: Clone + Debug + Send + Sync;

    /// Computes the value at `index`.
    fn calculate(&self, this: &dyn Indicator<Output = Self::Output>, index: usize)
        -> Self::Output;

    /// Name of the formula.
    fn name(&self) -> &str;

    /// Number of leading bars whose values are not yet reliable.
    fn warmup_periods(&self) -> usize;
}

/// Returns `true` if both handles point at the same series instance.
#[must_use]
pub fn same_series(a: &SharedSeries, b: &SharedSeries) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a).cast::<()>(),
        Arc::as_ptr(b).cast::<()>(),
    )
}

/// Returns `true` if `index` lies within `[begin_index, end_index]`.
#[must_use]
pub fn in_window(series: &dyn BarSeries, index: usize) -> bool {
    series
        .end_index()
        .is_some_and(|end| index >= series.begin_index() && index <= end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridgeline_types::{BaseBarSeries, Candle};

    fn make_candle(minute: i64, close: f64) -> Candle {
        Candle::from_ohlcv(minute * 60_000_000_000, 60_000_000_000, close, close, close, close, 0.0)
    }

    #[test]
    fn test_same_series_compares_instances() {
        let a = BaseBarSeries::new("a").into_shared();
        let b = BaseBarSeries::new("a").into_shared();
        let a2 = Arc::clone(&a);

        assert!(same_series(&a, &a2));
        assert!(!same_series(&a, &b));
    }

    #[test]
    fn test_in_window() {
        let series = BaseBarSeries::with_maximum_bar_count("w", 3).unwrap();
        assert!(!in_window(&series, 0));

        for minute in 0..5 {
            series.add_candle(make_candle(minute, 1.0)).unwrap();
        }
        assert!(!in_window(&series, 1));
        assert!(in_window(&series, 2));
        assert!(in_window(&series, 4));
        assert!(!in_window(&series, 5));
    }
}
