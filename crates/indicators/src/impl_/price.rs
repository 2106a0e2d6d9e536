//! Price field providers.
//!
//! Plain reads from the series; no cache, since a bar lookup is already O(1).

use ridgeline_types::{Candle, SharedSeries};

use crate::traits::Indicator;

/// OHLCV field selected by a [`PriceIndicator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    /// Open price
    Open,
    /// High price
    High,
    /// Low price
    Low,
    /// Close price
    Close,
    /// Volume
    Volume,
}

impl PriceField {
    /// Reads the field from a bar.
    #[must_use]
    pub fn of(self, candle: &Candle) -> f64 {
        match self {
            PriceField::Open => candle.open,
            PriceField::High => candle.high,
            PriceField::Low => candle.low,
            PriceField::Close => candle.close,
            PriceField::Volume => candle.volume,
        }
    }

    fn name(self) -> &'static str {
        match self {
            PriceField::Open => "OpenPrice",
            PriceField::High => "HighPrice",
            PriceField::Low => "LowPrice",
            PriceField::Close => "ClosePrice",
            PriceField::Volume => "Volume",
        }
    }
}

/// One price field of each bar; NaN past the end of the series.
#[derive(Clone)]
pub struct PriceIndicator {
    series: SharedSeries,
    field: PriceField,
}

impl PriceIndicator {
    /// Creates a provider for `field`.
    #[must_use]
    pub fn new(series: SharedSeries, field: PriceField) -> Self {
        Self { series, field }
    }

    /// Open prices.
    #[must_use]
    pub fn open(series: SharedSeries) -> Self {
        Self::new(series, PriceField::Open)
    }

    /// High prices.
    #[must_use]
    pub fn high(series: SharedSeries) -> Self {
        Self::new(series, PriceField::High)
    }

    /// Low prices.
    #[must_use]
    pub fn low(series: SharedSeries) -> Self {
        Self::new(series, PriceField::Low)
    }

    /// Close prices.
    #[must_use]
    pub fn close(series: SharedSeries) -> Self {
        Self::new(series, PriceField::Close)
    }

    /// Selected field.
    #[must_use]
    pub fn field(&self) -> PriceField {
        self.field
    }
}

impl Indicator for PriceIndicator {
    type Output = f64;

    fn value(&self, index: usize) -> f64 {
        self.series
            .bar(index)
            .map_or(f64::NAN, |candle| self.field.of(&candle))
    }

    fn name(&self) -> &str {
        self.field.name()
    }

    fn warmup_periods(&self) -> usize {
        0
    }

    fn series(&self) -> &SharedSeries {
        &self.series
    }
}

impl std::fmt::Debug for PriceIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceIndicator")
            .field("series", &self.series.name())
            .field("field", &self.field)
            .finish()
    }
}
