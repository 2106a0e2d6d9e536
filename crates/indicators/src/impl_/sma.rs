//! Simple Moving Average (SMA) indicator

use ridgeline_types::SharedSeries;

use crate::cached::CachedIndicator;
use crate::error::IndicatorError;
use crate::traits::{Calculate, Indicator, SharedIndicator};

/// Simple Moving Average
///
/// Arithmetic mean of the last N source values. Indices before the first
/// full window are NaN.
pub struct SMA {
    source: SharedIndicator,
    /// Number of periods for the moving average
    pub period: usize,
}

impl SMA {
    /// Creates a memoized SMA over `source`.
    ///
    /// # Errors
    /// Returns `IndicatorError::ParamOutOfRange` if `period` is 0.
    pub fn indicator(
        source: SharedIndicator,
        period: usize,
    ) -> Result<CachedIndicator<Self>, IndicatorError> {
        if period == 0 {
            return Err(IndicatorError::param_out_of_range("period", 0.0, 1.0, f64::INFINITY));
        }
        let series: SharedSeries = source.series().clone();
        CachedIndicator::new(series, Self { source, period })
    }
}

impl Calculate for SMA {
    type Output = f64;

    #[allow(clippy::cast_precision_loss)]
    fn calculate(&self, _this: &dyn Indicator<Output = f64>, index: usize) -> f64 {
        if index + 1 < self.period {
            return f64::NAN;
        }
        let first = index + 1 - self.period;
        let sum: f64 = (first..=index).map(|i| self.source.value(i)).sum();
        sum / self.period as f64
    }

    fn name(&self) -> &str {
        "SMA"
    }

    fn warmup_periods(&self) -> usize {
        self.source.warmup_periods() + self.period
    }
}
