//! Swing point marker.
//!
//! Overlay that carries the price only at confirmed swing indices and NaN
//! everywhere else, for plotting swing points as dots.

use std::sync::Arc;

use ridgeline_types::SharedSeries;

use crate::cached::CachedIndicator;
use crate::error::IndicatorError;
use crate::swing::SwingPoints;
use crate::traits::{same_series, Calculate, Indicator, SharedIndicator};

/// Formula behind the marker indicator.
pub struct SwingPointMarker {
    swings: Arc<dyn SwingPoints>,
}

impl SwingPointMarker {
    /// Creates a memoized marker over `swings`.
    ///
    /// # Errors
    /// Returns `IndicatorError::SeriesMismatch` if `swings` reads from a
    /// different series than `series`.
    pub fn indicator(
        series: SharedSeries,
        swings: Arc<dyn SwingPoints>,
    ) -> Result<CachedIndicator<Self>, IndicatorError> {
        if !same_series(&series, swings.series()) {
            return Err(IndicatorError::SeriesMismatch(format!(
                "swing indicator {} reads series '{}', marker reads '{}'",
                swings.name(),
                swings.series().name(),
                series.name()
            )));
        }
        CachedIndicator::new(series, Self { swings })
    }

    /// The swing indicator being marked.
    #[must_use]
    pub fn swing_indicator(&self) -> &Arc<dyn SwingPoints> {
        &self.swings
    }

    /// Price read at swing indices.
    #[must_use]
    pub fn price_indicator(&self) -> &SharedIndicator {
        self.swings.price_indicator()
    }

    /// Confirmed swing indices up to the end of the series.
    #[must_use]
    pub fn swing_point_indexes(&self) -> Vec<usize> {
        self.swings.swing_point_indexes()
    }
}

impl Calculate for SwingPointMarker {
    type Output = f64;

    fn calculate(&self, _this: &dyn Indicator<Output = f64>, index: usize) -> f64 {
        // earlier swings stay marked, so membership rather than "latest == index"
        if self
            .swings
            .swing_point_indexes_up_to(index)
            .binary_search(&index)
            .is_ok()
        {
            self.swings.price_indicator().value(index)
        } else {
            f64::NAN
        }
    }

    fn name(&self) -> &str {
        "SwingPointMarker"
    }

    fn warmup_periods(&self) -> usize {
        self.swings.warmup_periods()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_::price::PriceIndicator;
    use crate::swing::{SwingDetector, SwingIndicator};
    use ridgeline_types::{BaseBarSeries, Candle};

    const MINUTE_NS: i64 = 60_000_000_000;

    /// Replays a fixed list of detections.
    struct FixedDetector {
        price: SharedIndicator,
        latest: Vec<Option<usize>>,
    }

    impl SwingDetector for FixedDetector {
        fn detect_latest_swing_index(&self, index: usize) -> Option<usize> {
            self.latest.get(index).copied().flatten()
        }

        fn price_indicator(&self) -> &SharedIndicator {
            &self.price
        }

        fn name(&self) -> &str {
            "Fixed"
        }

        fn warmup_periods(&self) -> usize {
            0
        }
    }

    fn closes(values: &[f64]) -> SharedSeries {
        let series = BaseBarSeries::new("marker");
        for (minute, close) in values.iter().enumerate() {
            let ts = minute as i64 * MINUTE_NS;
            series
                .add_candle(Candle::from_ohlcv(ts, MINUTE_NS, *close, *close, *close, *close, 0.0))
                .unwrap();
        }
        series.into_shared()
    }

    fn fixed_swings(series: &SharedSeries, latest: Vec<Option<usize>>) -> Arc<dyn SwingPoints> {
        let price: SharedIndicator = Arc::new(PriceIndicator::close(series.clone()));
        Arc::new(SwingIndicator::new(FixedDetector { price, latest }).unwrap())
    }

    #[test]
    fn test_price_only_at_swing_indexes() {
        let series = closes(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        let swings = fixed_swings(
            &series,
            vec![None, None, Some(2), Some(2), Some(2), Some(5), Some(5)],
        );
        let marker = SwingPointMarker::indicator(series, swings).unwrap();

        assert_eq!(marker.calculator().swing_point_indexes(), vec![2, 5]);
        assert_eq!(marker.value(2), 3.0);
        assert!(marker.value(3).is_nan());
        assert_eq!(marker.value(5), 6.0);
        assert!(marker.value(6).is_nan());
    }

    #[test]
    fn test_earlier_swings_keep_their_price() {
        let series = closes(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        let swings = fixed_swings(
            &series,
            vec![None, None, Some(2), Some(2), Some(2), Some(5), Some(5), Some(5), Some(8)],
        );
        let marker = SwingPointMarker::indicator(series, swings).unwrap();

        assert_eq!(marker.calculator().swing_point_indexes(), vec![2, 5, 8]);
        // read the newest swing first; earlier ones must still be marked
        assert_eq!(marker.value(8), 9.0);
        assert_eq!(marker.value(2), 3.0);
        assert_eq!(marker.value(5), 6.0);
        for index in [0, 1, 3, 4, 6, 7] {
            assert!(marker.value(index).is_nan(), "index {index}");
        }
    }

    #[test]
    fn test_exposes_underlying_indicators() {
        let series = closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let swings = fixed_swings(&series, vec![None, None, Some(2), Some(2), Some(2)]);
        let marker = SwingPointMarker::indicator(series, Arc::clone(&swings)).unwrap();

        assert!(Arc::ptr_eq(marker.calculator().swing_indicator(), &swings));
        assert!(Arc::ptr_eq(
            marker.calculator().price_indicator(),
            swings.price_indicator()
        ));
    }

    #[test]
    fn test_rejects_swings_on_other_series() {
        let series = closes(&[1.0, 2.0, 3.0]);
        let other = closes(&[1.0, 2.0, 3.0]);
        let swings = fixed_swings(&other, vec![None, None, None]);

        let err = SwingPointMarker::indicator(series, swings).unwrap_err();
        assert!(matches!(err, IndicatorError::SeriesMismatch(_)));
    }
}
