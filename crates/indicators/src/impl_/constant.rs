//! Constant value provider.

use ridgeline_types::SharedSeries;

use crate::traits::Indicator;

/// Same value at every index, e.g. a fixed reversal amount.
pub struct ConstantIndicator {
    series: SharedSeries,
    value: f64,
}

impl ConstantIndicator {
    /// Creates a constant bound to `series`.
    #[must_use]
    pub fn new(series: SharedSeries, value: f64) -> Self {
        Self { series, value }
    }
}

impl Indicator for ConstantIndicator {
    type Output = f64;

    fn value(&self, _index: usize) -> f64 {
        self.value
    }

    fn name(&self) -> &str {
        "Constant"
    }

    fn warmup_periods(&self) -> usize {
        0
    }

    fn series(&self) -> &SharedSeries {
        &self.series
    }
}

impl std::fmt::Debug for ConstantIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstantIndicator")
            .field("series", &self.series.name())
            .field("value", &self.value)
            .finish()
    }
}
