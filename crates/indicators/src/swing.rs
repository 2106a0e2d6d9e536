//! Incremental swing-point tracking.
//!
//! [`SwingPointTracker`] scans each series index once, asks a detector for the
//! latest confirmed swing at that index and keeps the confirmed swings as a
//! strictly increasing list. [`SwingIndicator`] wraps a tracker and a
//! [`SwingDetector`] into a memoized indicator whose value is the price at the
//! latest confirmed swing.

use std::sync::{Mutex, MutexGuard, PoisonError};

use ridgeline_types::{BarSeries, SharedSeries};

use crate::cached::CachedIndicator;
use crate::config::CacheConfig;
use crate::error::IndicatorError;
use crate::traits::{in_window, Calculate, Indicator, SharedIndicator};

/// Monotonic list of confirmed swing indices with a scan high-water mark.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwingPointTracker {
    swing_point_indexes: Vec<usize>,
    last_scanned_index: Option<usize>,
    purge_on_negative_detection: bool,
}

impl SwingPointTracker {
    /// Creates an empty tracker.
    ///
    /// With `purge_on_negative_detection` a detection of `None` clears every
    /// recorded swing.
    #[must_use]
    pub fn new(purge_on_negative_detection: bool) -> Self {
        Self {
            swing_point_indexes: Vec::new(),
            last_scanned_index: None,
            purge_on_negative_detection,
        }
    }

    /// Runs `detect` on every index up to `min(target_index, end_index)` that
    /// has not been scanned yet, in ascending order.
    pub fn ensure_scanned<F>(&mut self, series: &dyn BarSeries, target_index: usize, mut detect: F)
    where
        F: FnMut(usize) -> Option<usize>,
    {
        let begin = series.begin_index();
        self.purge_before(begin);

        let Some(end) = series.end_index() else {
            return;
        };
        if target_index < begin {
            return;
        }

        let target = target_index.min(end);
        let resume = self
            .last_scanned_index
            .map_or(begin, |last| (last + 1).max(begin));
        if resume > target {
            return;
        }

        for index in resume..=target {
            match detect(index) {
                None => {
                    if self.purge_on_negative_detection && !self.swing_point_indexes.is_empty() {
                        tracing::trace!("no swing at {}, dropping recorded swings", index);
                        self.swing_point_indexes.clear();
                    }
                }
                Some(swing) if swing < begin || swing > index => {
                    tracing::trace!("ignoring swing {} reported at {}", swing, index);
                }
                Some(swing) => self.record(swing),
            }
        }
        self.last_scanned_index = Some(target);
    }

    /// Greatest recorded swing at or before `index`.
    #[must_use]
    pub fn latest_swing_index(&self, index: usize) -> Option<usize> {
        self.swing_point_indexes
            .iter()
            .rev()
            .find(|&&swing| swing <= index)
            .copied()
    }

    /// Recorded swings at or before `index`, ascending.
    #[must_use]
    pub fn swing_point_indexes(&self, index: usize) -> Vec<usize> {
        let count = self.swing_point_indexes.partition_point(|&swing| swing <= index);
        self.swing_point_indexes[..count].to_vec()
    }

    /// Highest index handed to the detector so far.
    #[must_use]
    pub fn last_scanned_index(&self) -> Option<usize> {
        self.last_scanned_index
    }

    /// Forgets all swings and the scan position.
    pub fn reset(&mut self) {
        self.swing_point_indexes.clear();
        self.last_scanned_index = None;
    }

    fn purge_before(&mut self, begin: usize) {
        let stale = self.swing_point_indexes.partition_point(|&swing| swing < begin);
        if stale > 0 {
            self.swing_point_indexes.drain(..stale);
        }
    }

    /// Drops trailing swings newer than `swing`, then appends it if it is
    /// newer than what remains.
    fn record(&mut self, swing: usize) {
        while self
            .swing_point_indexes
            .last()
            .is_some_and(|&last| last > swing)
        {
            self.swing_point_indexes.pop();
        }
        if self
            .swing_point_indexes
            .last()
            .map_or(true, |&last| swing > last)
        {
            self.swing_point_indexes.push(swing);
        }
    }
}

/// Per-index swing detection strategy.
pub trait SwingDetector: Send + Sync {
    /// Latest swing confirmed with the data up to `index`, if any.
    fn detect_latest_swing_index(&self, index: usize) -> Option<usize>;

    /// Whether a `None` detection invalidates every recorded swing.
    fn purge_on_negative_detection(&self) -> bool {
        false
    }

    /// Price read at swing indices.
    fn price_indicator(&self) -> &SharedIndicator;

    /// Name of the detector.
    fn name(&self) -> &str;

    /// Number of leading bars before a swing can be confirmed.
    fn warmup_periods(&self) -> usize;
}

/// Read side shared by all swing indicators.
pub trait SwingPoints: Indicator<Output = f64> {
    /// Latest confirmed swing at or before `index`.
    fn latest_swing_index(&self, index: usize) -> Option<usize>;

    /// Confirmed swings at or before `index`, ascending.
    fn swing_point_indexes_up_to(&self, index: usize) -> Vec<usize>;

    /// Confirmed swings up to the end of the series, ascending.
    fn swing_point_indexes(&self) -> Vec<usize> {
        match self.series().end_index() {
            Some(end) => self.swing_point_indexes_up_to(end),
            None => Vec::new(),
        }
    }

    /// Price read at swing indices.
    fn price_indicator(&self) -> &SharedIndicator;
}

/// Formula behind [`SwingIndicator`]: detector plus tracker state.
pub struct SwingCalculation<D: SwingDetector> {
    detector: D,
    tracker: Mutex<SwingPointTracker>,
}

impl<D: SwingDetector> SwingCalculation<D> {
    fn tracker(&self) -> MutexGuard<'_, SwingPointTracker> {
        self.tracker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn scanned(&self, series: &dyn BarSeries, index: usize) -> MutexGuard<'_, SwingPointTracker> {
        let mut tracker = self.tracker();
        tracker.ensure_scanned(series, index, |i| self.detector.detect_latest_swing_index(i));
        tracker
    }
}

impl<D: SwingDetector> Calculate for SwingCalculation<D> {
    type Output = f64;

    fn calculate(&self, this: &dyn Indicator<Output = f64>, index: usize) -> f64 {
        let series = this.series();
        if !in_window(series.as_ref(), index) {
            return f64::NAN;
        }
        let latest = self.scanned(series.as_ref(), index).latest_swing_index(index);
        match latest {
            Some(swing) if swing >= series.begin_index() => {
                self.detector.price_indicator().value(swing)
            }
            _ => f64::NAN,
        }
    }

    fn name(&self) -> &str {
        self.detector.name()
    }

    fn warmup_periods(&self) -> usize {
        self.detector.warmup_periods()
    }
}

/// Memoized price of the latest confirmed swing.
#[derive(Debug)]
pub struct SwingIndicator<D: SwingDetector> {
    inner: CachedIndicator<SwingCalculation<D>>,
}

impl<D: SwingDetector> SwingIndicator<D> {
    /// Wraps `detector`, reading the series of its price indicator.
    ///
    /// # Errors
    /// Returns `IndicatorError::InvalidParams` if the series bound cannot be
    /// used as a cache capacity.
    pub fn new(detector: D) -> Result<Self, IndicatorError> {
        Self::with_config(detector, &CacheConfig::default())
    }

    /// Like [`SwingIndicator::new`] with explicit cache sizing.
    ///
    /// # Errors
    /// Returns `IndicatorError::InvalidParams` for an invalid config.
    pub fn with_config(detector: D, config: &CacheConfig) -> Result<Self, IndicatorError> {
        let series = detector.price_indicator().series().clone();
        let tracker = Mutex::new(SwingPointTracker::new(detector.purge_on_negative_detection()));
        Ok(Self {
            inner: CachedIndicator::with_config(series, SwingCalculation { detector, tracker }, config)?,
        })
    }

    /// The swing detector.
    #[must_use]
    pub fn detector(&self) -> &D {
        &self.inner.calculator().detector
    }

    /// Drops memoized values at or after `index` and rescans swings from
    /// the start of the window on the next read.
    pub fn invalidate_from(&self, index: usize) {
        self.inner.calculator().tracker().reset();
        self.inner.invalidate_from(index);
    }

    /// Drops all memoized values and swings.
    pub fn clear(&self) {
        self.inner.calculator().tracker().reset();
        self.inner.clear();
    }
}

impl<D: SwingDetector> Indicator for SwingIndicator<D> {
    type Output = f64;

    fn value(&self, index: usize) -> f64 {
        self.inner.value(index)
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

impl<D: SwingDetector> SwingPoints for SwingIndicator<D> {
    fn latest_swing_index(&self, index: usize) -> Option<usize> {
        let series = self.inner.series();
        self.inner
            .calculator()
            .scanned(series.as_ref(), index)
            .latest_swing_index(index)
    }

    fn swing_point_indexes_up_to(&self, index: usize) -> Vec<usize> {
        let series = self.inner.series();
        self.inner
            .calculator()
            .scanned(series.as_ref(), index)
            .swing_point_indexes(index)
    }

    fn price_indicator(&self) -> &SharedIndicator {
        self.inner.calculator().detector.price_indicator()
    }
}
