//! ZigZag reversal state and the swing indicators built on it.
//!
//! The state follows the running extreme of a price. A move away from that
//! extreme by at least the reversal amount confirms it as a swing high
//! (after an up leg) or a swing low (after a down leg) and flips the trend.
//! Each state is derived from the previous one, so the indicator is a
//! recurrence and deep first reads are backfilled iteratively.

use std::sync::Arc;

use ridgeline_types::SharedSeries;

use crate::error::IndicatorError;
use crate::fractal::PivotDirection;
use crate::impl_::constant::ConstantIndicator;
use crate::recursive::RecursiveIndicator;
use crate::swing::{SwingDetector, SwingIndicator};
use crate::traits::{same_series, Calculate, Indicator, SharedIndicator};

/// Direction of the current ZigZag leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ZigZagTrend {
    /// No move from the first bar yet.
    Undefined,
    /// Rising leg.
    Up,
    /// Falling leg.
    Down,
}

/// A price at a bar index.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ZigZagPivot {
    /// Bar index.
    pub index: usize,
    /// Price at `index`.
    pub price: f64,
}

/// ZigZag state after a bar.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ZigZagState {
    /// Latest confirmed swing high.
    pub last_high: Option<ZigZagPivot>,
    /// Latest confirmed swing low.
    pub last_low: Option<ZigZagPivot>,
    /// Current leg.
    pub trend: ZigZagTrend,
    /// Extreme of the current leg, not yet confirmed.
    pub extreme: ZigZagPivot,
}

impl ZigZagState {
    /// State at the first bar.
    #[must_use]
    pub fn start(index: usize, price: f64) -> Self {
        Self {
            last_high: None,
            last_low: None,
            trend: ZigZagTrend::Undefined,
            extreme: ZigZagPivot { index, price },
        }
    }

    /// State after the bar at `index` closes at `price`.
    ///
    /// A NaN price or reversal never extends a leg nor confirms a swing.
    #[must_use]
    pub fn advance(self, index: usize, price: f64, reversal: f64) -> Self {
        let here = ZigZagPivot { index, price };
        let extreme = self.extreme.price;
        let mut next = self;
        match self.trend {
            ZigZagTrend::Undefined => {
                if price > extreme {
                    next.trend = ZigZagTrend::Up;
                    next.extreme = here;
                } else if price < extreme {
                    next.trend = ZigZagTrend::Down;
                    next.extreme = here;
                } else if extreme.is_nan() {
                    // undefined leading prices
                    next.extreme = here;
                }
            }
            ZigZagTrend::Up => {
                if price > extreme {
                    next.extreme = here;
                } else if extreme - price >= reversal {
                    next.last_high = Some(self.extreme);
                    next.trend = ZigZagTrend::Down;
                    next.extreme = here;
                }
            }
            ZigZagTrend::Down => {
                if price < extreme {
                    next.extreme = here;
                } else if price - extreme >= reversal {
                    next.last_low = Some(self.extreme);
                    next.trend = ZigZagTrend::Up;
                    next.extreme = here;
                }
            }
        }
        next
    }

    /// Latest confirmed swing in `direction`.
    #[must_use]
    pub fn last_swing(&self, direction: PivotDirection) -> Option<ZigZagPivot> {
        match direction {
            PivotDirection::High => self.last_high,
            PivotDirection::Low => self.last_low,
        }
    }
}

/// ZigZag state formula over a price and a reversal amount.
pub struct ZigZag {
    price: SharedIndicator,
    reversal: SharedIndicator,
}

impl std::fmt::Debug for ZigZag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZigZag")
            .field("price", &self.price.name())
            .field("reversal", &self.reversal.name())
            .finish()
    }
}

impl ZigZag {
    /// Creates a recursion-safe ZigZag state with a per-bar reversal amount
    /// (e.g. a multiple of ATR).
    ///
    /// # Errors
    /// Returns `IndicatorError::SeriesMismatch` if `price` and `reversal`
    /// read different series.
    pub fn indicator(
        price: SharedIndicator,
        reversal: SharedIndicator,
    ) -> Result<RecursiveIndicator<Self>, IndicatorError> {
        if !same_series(price.series(), reversal.series()) {
            return Err(IndicatorError::SeriesMismatch(format!(
                "ZigZag price reads '{}', reversal reads '{}'",
                price.series().name(),
                reversal.series().name()
            )));
        }
        let series: SharedSeries = price.series().clone();
        RecursiveIndicator::new(series, Self { price, reversal })
    }

    /// ZigZag state with the same reversal amount at every bar.
    ///
    /// # Errors
    /// Returns `IndicatorError::ParamOutOfRange` if `amount` is negative or
    /// not finite.
    pub fn with_fixed_reversal(
        price: SharedIndicator,
        amount: f64,
    ) -> Result<RecursiveIndicator<Self>, IndicatorError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(IndicatorError::param_out_of_range(
                "reversal",
                amount,
                0.0,
                f64::INFINITY,
            ));
        }
        let series: SharedSeries = price.series().clone();
        let reversal: SharedIndicator = Arc::new(ConstantIndicator::new(series, amount));
        Self::indicator(price, reversal)
    }

    /// Price the legs follow.
    #[must_use]
    pub fn price(&self) -> &SharedIndicator {
        &self.price
    }
}

impl Calculate for ZigZag {
    type Output = ZigZagState;

    fn calculate(&self, this: &dyn Indicator<Output = ZigZagState>, index: usize) -> ZigZagState {
        let begin = this.series().begin_index();
        if index <= begin {
            return ZigZagState::start(begin, self.price.value(begin));
        }
        let prev = this.value(index - 1);
        prev.advance(index, self.price.value(index), self.reversal.value(index))
    }

    fn name(&self) -> &str {
        "ZigZagState"
    }

    fn warmup_periods(&self) -> usize {
        0
    }
}

/// Swing detector reading confirmed pivots off a shared ZigZag state.
pub struct ZigZagSwingDetector {
    state: Arc<RecursiveIndicator<ZigZag>>,
    price: SharedIndicator,
    direction: PivotDirection,
}

impl ZigZagSwingDetector {
    /// Creates a detector; highs and lows may share one `state`.
    #[must_use]
    pub fn new(state: Arc<RecursiveIndicator<ZigZag>>, direction: PivotDirection) -> Self {
        let price = Arc::clone(state.cached().calculator().price());
        Self {
            state,
            price,
            direction,
        }
    }

    /// Pivot direction.
    #[must_use]
    pub fn direction(&self) -> PivotDirection {
        self.direction
    }
}

impl SwingDetector for ZigZagSwingDetector {
    fn detect_latest_swing_index(&self, index: usize) -> Option<usize> {
        self.state
            .value(index)
            .last_swing(self.direction)
            .map(|pivot| pivot.index)
    }

    fn price_indicator(&self) -> &SharedIndicator {
        &self.price
    }

    fn name(&self) -> &str {
        match self.direction {
            PivotDirection::High => "RecentZigZagSwingHigh",
            PivotDirection::Low => "RecentZigZagSwingLow",
        }
    }

    fn warmup_periods(&self) -> usize {
        0
    }
}

/// Swing indicator driven by ZigZag reversals.
pub type RecentZigZagSwingIndicator = SwingIndicator<ZigZagSwingDetector>;

impl SwingIndicator<ZigZagSwingDetector> {
    /// Latest swing high confirmed by `state`.
    ///
    /// # Errors
    /// Returns `IndicatorError::Config` if the series capacity cannot be mapped
    /// onto the cache.
    pub fn recent_zigzag_swing_high(
        state: Arc<RecursiveIndicator<ZigZag>>,
    ) -> Result<Self, IndicatorError> {
        Self::new(ZigZagSwingDetector::new(state, PivotDirection::High))
    }

    /// Latest swing low confirmed by `state`.
    ///
    /// # Errors
    /// Returns `IndicatorError::Config` if the series capacity cannot be mapped
    /// onto the cache.
    pub fn recent_zigzag_swing_low(
        state: Arc<RecursiveIndicator<ZigZag>>,
    ) -> Result<Self, IndicatorError> {
        Self::new(ZigZagSwingDetector::new(state, PivotDirection::Low))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_::price::PriceIndicator;
    use crate::swing::SwingPoints;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use ridgeline_types::{BaseBarSeries, Candle};

    const MINUTE_NS: i64 = 60_000_000_000;

    fn series_of(closes: &[f64]) -> SharedSeries {
        let series = BaseBarSeries::new("zigzag");
        for (minute, close) in closes.iter().enumerate() {
            let ts = minute as i64 * MINUTE_NS;
            series
                .add_candle(Candle::from_ohlcv(ts, MINUTE_NS, *close, *close, *close, *close, 1.0))
                .unwrap();
        }
        series.into_shared()
    }

    fn state_of(closes: &[f64], reversal: f64) -> Arc<RecursiveIndicator<ZigZag>> {
        let close: SharedIndicator = Arc::new(PriceIndicator::close(series_of(closes)));
        Arc::new(ZigZag::with_fixed_reversal(close, reversal).unwrap())
    }

    fn swing_high(closes: &[f64]) -> RecentZigZagSwingIndicator {
        SwingIndicator::recent_zigzag_swing_high(state_of(closes, 5.0)).unwrap()
    }

    #[test]
    fn test_no_reversal_no_swing() {
        let indicator = swing_high(&[100.0, 102.0, 103.0]);

        for index in 0..3 {
            assert!(indicator.value(index).is_nan());
        }
        assert_eq!(indicator.latest_swing_index(2), None);
    }

    #[test]
    fn test_reversal_confirms_high() {
        let indicator = swing_high(&[100.0, 105.0, 110.0, 108.0, 103.0]);

        for index in 0..4 {
            assert!(indicator.value(index).is_nan(), "index {index}");
        }
        assert_eq!(indicator.value(4), 110.0);
        assert_eq!(indicator.latest_swing_index(4), Some(2));
    }

    #[test]
    fn test_higher_high_replaces_previous() {
        let indicator = swing_high(&[100.0, 110.0, 105.0, 95.0, 115.0, 110.0]);

        assert_eq!(indicator.value(2), 110.0);
        assert_eq!(indicator.latest_swing_index(2), Some(1));
        assert_eq!(indicator.value(3), 110.0);
        assert_eq!(indicator.value(5), 115.0);
        assert_eq!(indicator.latest_swing_index(5), Some(4));
    }

    #[test]
    fn test_alternating_legs() {
        let closes = [100.0, 110.0, 105.0, 120.0, 115.0, 125.0, 120.0];
        let state = state_of(&closes, 5.0);
        let highs = SwingIndicator::recent_zigzag_swing_high(Arc::clone(&state)).unwrap();
        let lows = SwingIndicator::recent_zigzag_swing_low(state).unwrap();

        assert_eq!(highs.value(2), 110.0);
        assert_eq!(highs.value(4), 120.0);
        assert_eq!(highs.value(6), 125.0);
        assert_eq!(highs.latest_swing_index(6), Some(5));
        assert_eq!(highs.swing_point_indexes(), vec![1, 3, 5]);

        assert_eq!(lows.latest_swing_index(2), None);
        assert_eq!(lows.value(3), 105.0);
        assert_eq!(lows.swing_point_indexes(), vec![2, 4]);
    }

    #[test]
    fn test_reversal_confirms_low() {
        let state = state_of(&[100.0, 95.0, 90.0, 92.0, 97.0], 5.0);
        let lows = SwingIndicator::recent_zigzag_swing_low(state).unwrap();

        assert!(lows.value(3).is_nan());
        assert_eq!(lows.value(4), 90.0);
        assert_eq!(lows.latest_swing_index(4), Some(2));
    }

    #[test]
    fn test_swing_waits_for_reversal() {
        let indicator = swing_high(&[100.0, 110.0, 105.0]);

        assert_eq!(indicator.latest_swing_index(0), None);
        assert_eq!(indicator.latest_swing_index(1), None);
        assert!(indicator.value(1).is_nan());
        assert_eq!(indicator.latest_swing_index(2), Some(1));
        assert_eq!(indicator.value(2), 110.0);
    }

    #[test]
    fn test_advance_ignores_nan_price() {
        let state = ZigZagState::start(0, 100.0)
            .advance(1, 110.0, 5.0)
            .advance(2, f64::NAN, 5.0);

        assert_eq!(state.trend, ZigZagTrend::Up);
        assert_eq!(state.extreme, ZigZagPivot { index: 1, price: 110.0 });
        assert_eq!(state.last_high, None);
    }

    #[test]
    fn test_undefined_start_adopts_first_price() {
        let state = ZigZagState::start(0, f64::NAN)
            .advance(1, 100.0, 5.0)
            .advance(2, 94.0, 5.0);

        assert_eq!(state.trend, ZigZagTrend::Down);
        assert_eq!(state.extreme, ZigZagPivot { index: 2, price: 94.0 });
    }

    #[test]
    fn test_deep_first_read_matches_iterative_state() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let closes: Vec<f64> = (0..20_000).map(|_| rng.gen_range(90.0..110.0)).collect();
        let state = state_of(&closes, 4.0);

        let mut expected = ZigZagState::start(0, closes[0]);
        for (index, close) in closes.iter().enumerate().skip(1) {
            expected = expected.advance(index, *close, 4.0);
        }

        assert_eq!(state.value(closes.len() - 1), expected);
    }

    #[test]
    fn test_rejects_invalid_reversal() {
        let close: SharedIndicator = Arc::new(PriceIndicator::close(series_of(&[1.0, 2.0])));

        assert!(ZigZag::with_fixed_reversal(Arc::clone(&close), -1.0).is_err());
        assert!(ZigZag::with_fixed_reversal(Arc::clone(&close), f64::NAN).is_err());
        assert!(ZigZag::with_fixed_reversal(close, 0.0).is_ok());
    }

    #[test]
    fn test_reversal_from_other_series_rejected() {
        let close: SharedIndicator = Arc::new(PriceIndicator::close(series_of(&[1.0, 2.0])));
        let other: SharedIndicator = Arc::new(ConstantIndicator::new(series_of(&[1.0, 2.0]), 1.0));

        let err = ZigZag::indicator(close, other).unwrap_err();
        assert!(matches!(err, IndicatorError::SeriesMismatch(_)));
    }

    #[test]
    fn test_warmup_and_name() {
        let state = state_of(&[1.0, 2.0], 1.0);
        let high = SwingIndicator::recent_zigzag_swing_high(Arc::clone(&state)).unwrap();
        let low = SwingIndicator::recent_zigzag_swing_low(Arc::clone(&state)).unwrap();

        assert_eq!(state.name(), "ZigZagState");
        assert_eq!(high.warmup_periods(), 0);
        assert_eq!(high.name(), "RecentZigZagSwingHigh");
        assert_eq!(low.name(), "RecentZigZagSwingLow");
    }
}
