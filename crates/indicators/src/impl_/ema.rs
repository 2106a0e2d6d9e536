//! Exponential Moving Average (EMA) indicator

use ridgeline_types::SharedSeries;

use crate::error::IndicatorError;
use crate::recursive::RecursiveIndicator;
use crate::traits::{Calculate, Indicator, SharedIndicator};

/// Exponential Moving Average
///
/// Matches pandas `ewm(span=period, adjust=False).mean()` semantics.
/// Multiplier = 2 / (period + 1). Each value reads the previous one through
/// the owning indicator, so deep first reads are backfilled iteratively.
pub struct EMA {
    source: SharedIndicator,
    /// Number of periods for the EMA
    pub period: usize,
}

impl EMA {
    /// Creates a recursion-safe EMA over `source`.
    ///
    /// # Errors
    /// Returns `IndicatorError::ParamOutOfRange` if `period` is 0.
    pub fn indicator(
        source: SharedIndicator,
        period: usize,
    ) -> Result<RecursiveIndicator<Self>, IndicatorError> {
        if period == 0 {
            return Err(IndicatorError::param_out_of_range("period", 0.0, 1.0, f64::INFINITY));
        }
        let series: SharedSeries = source.series().clone();
        RecursiveIndicator::new(series, Self { source, period })
    }

    /// Calculates the EMA multiplier (smoothing factor).
    #[allow(clippy::cast_precision_loss)]
    fn multiplier(&self) -> f64 {
        2.0 / (self.period as f64 + 1.0)
    }
}

impl Calculate for EMA {
    type Output = f64;

    fn calculate(&self, this: &dyn Indicator<Output = f64>, index: usize) -> f64 {
        let value = self.source.value(index);
        if index == 0 {
            return value;
        }

        let prev = this.value(index - 1);
        if !value.is_finite() {
            return prev;
        }
        if !prev.is_finite() {
            return value;
        }
        let alpha = self.multiplier();
        alpha * value + (1.0 - alpha) * prev
    }

    fn name(&self) -> &str {
        "EMA"
    }

    fn warmup_periods(&self) -> usize {
        self.source.warmup_periods() + 1
    }
}
