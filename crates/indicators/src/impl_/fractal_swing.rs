//! Recent fractal swing high / low indicators.
//!
//! A swing high at `i` is a bar whose high strictly exceeds the
//! `preceding_bars` highs before it and the `following_bars` highs after it
//! (plateaus up to `allowed_equal_bars` wide are accepted). Confirmation waits
//! for the following bars, so the value at index `t` never looks ahead of `t`.

use crate::error::IndicatorError;
use crate::fractal::{find_latest_confirmed_pivot, PivotDirection, PivotWindow};
use crate::swing::{SwingDetector, SwingIndicator};
use crate::traits::SharedIndicator;

/// Fractal swing detector over a price indicator.
pub struct FractalSwingDetector {
    price: SharedIndicator,
    window: PivotWindow,
    direction: PivotDirection,
}

impl FractalSwingDetector {
    /// Creates a detector.
    ///
    /// # Errors
    /// Returns `IndicatorError::ParamOutOfRange` if `window.preceding_bars` is 0.
    pub fn new(
        price: SharedIndicator,
        window: PivotWindow,
        direction: PivotDirection,
    ) -> Result<Self, IndicatorError> {
        window.validate()?;
        Ok(Self {
            price,
            window,
            direction,
        })
    }

    /// Pivot window.
    #[must_use]
    pub fn window(&self) -> PivotWindow {
        self.window
    }

    /// Pivot direction.
    #[must_use]
    pub fn direction(&self) -> PivotDirection {
        self.direction
    }
}

impl SwingDetector for FractalSwingDetector {
    fn detect_latest_swing_index(&self, index: usize) -> Option<usize> {
        find_latest_confirmed_pivot(self.price.as_ref(), index, self.window, self.direction)
    }

    // A plateau that outgrows its tolerance invalidates earlier swings.
    fn purge_on_negative_detection(&self) -> bool {
        true
    }

    fn price_indicator(&self) -> &SharedIndicator {
        &self.price
    }

    fn name(&self) -> &str {
        match self.direction {
            PivotDirection::High => "RecentFractalSwingHigh",
            PivotDirection::Low => "RecentFractalSwingLow",
        }
    }

    fn warmup_periods(&self) -> usize {
        self.window.span()
    }
}

/// Swing indicator driven by fractal detection.
pub type RecentFractalSwingIndicator = SwingIndicator<FractalSwingDetector>;

impl SwingIndicator<FractalSwingDetector> {
    /// Latest confirmed fractal swing high of `price` (usually the high price).
    ///
    /// # Errors
    /// Returns `IndicatorError::ParamOutOfRange` if `window.preceding_bars` is 0.
    pub fn recent_fractal_swing_high(
        price: SharedIndicator,
        window: PivotWindow,
    ) -> Result<Self, IndicatorError> {
        Self::new(FractalSwingDetector::new(price, window, PivotDirection::High)?)
    }

    /// Latest confirmed fractal swing low of `price` (usually the low price).
    ///
    /// # Errors
    /// Returns `IndicatorError::ParamOutOfRange` if `window.preceding_bars` is 0.
    pub fn recent_fractal_swing_low(
        price: SharedIndicator,
        window: PivotWindow,
    ) -> Result<Self, IndicatorError> {
        Self::new(FractalSwingDetector::new(price, window, PivotDirection::Low)?)
    }
}
