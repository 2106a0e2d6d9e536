//! Window-dominance (fractal) pivot detection.
//!
//! A candidate is a confirmed pivot when it strictly dominates
//! `preceding_bars` values before it and `following_bars` values after it.
//! Up to `allowed_equal_bars` equal neighbours on each side are absorbed into
//! a plateau; the dominance checks then start at the plateau edges. Undefined
//! (NaN) values never confirm anything.

use crate::error::IndicatorError;
use crate::traits::Indicator;

/// Which extreme a pivot is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PivotDirection {
    /// Local maximum
    High,
    /// Local minimum
    Low,
}

impl PivotDirection {
    /// Returns `true` if `candidate` strictly dominates `other`.
    #[must_use]
    pub fn dominates(self, candidate: f64, other: f64) -> bool {
        match self {
            PivotDirection::High => candidate > other,
            PivotDirection::Low => candidate < other,
        }
    }
}

/// Look-back, look-forward and plateau tolerance of a pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PivotWindow {
    /// Bars before the plateau that must be dominated
    pub preceding_bars: usize,
    /// Bars after the plateau that must be dominated
    pub following_bars: usize,
    /// Equal bars tolerated on each side of the candidate
    #[serde(default)]
    pub allowed_equal_bars: usize,
}

impl PivotWindow {
    /// Creates a window.
    ///
    /// # Errors
    /// Returns `IndicatorError::ParamOutOfRange` if `preceding_bars` is 0.
    pub fn new(
        preceding_bars: usize,
        following_bars: usize,
        allowed_equal_bars: usize,
    ) -> Result<Self, IndicatorError> {
        let window = Self {
            preceding_bars,
            following_bars,
            allowed_equal_bars,
        };
        window.validate()?;
        Ok(window)
    }

    /// Symmetric window without plateau tolerance.
    ///
    /// # Errors
    /// Returns `IndicatorError::ParamOutOfRange` if `bars` is 0.
    pub fn symmetric(bars: usize) -> Result<Self, IndicatorError> {
        Self::new(bars, bars, 0)
    }

    /// Checks the window can confirm anything.
    ///
    /// # Errors
    /// Returns `IndicatorError::ParamOutOfRange` if `preceding_bars` is 0.
    #[allow(clippy::cast_precision_loss)]
    pub fn validate(&self) -> Result<(), IndicatorError> {
        if self.preceding_bars == 0 {
            return Err(IndicatorError::param_out_of_range(
                "preceding_bars",
                self.preceding_bars as f64,
                1.0,
                f64::INFINITY,
            ));
        }
        Ok(())
    }

    /// Bars needed before the first pivot can be confirmed.
    #[must_use]
    pub fn span(&self) -> usize {
        self.preceding_bars + self.following_bars
    }
}

/// Decides whether `candidate` is a confirmed pivot using only values up to
/// `max_available`.
#[must_use]
pub fn is_confirmed_pivot(
    values: &dyn Indicator<Output = f64>,
    candidate: usize,
    max_available: usize,
    window: PivotWindow,
    direction: PivotDirection,
) -> bool {
    let series = values.series();
    let Some(end) = series.end_index() else {
        return false;
    };
    let begin = series.begin_index();
    if candidate < begin || candidate > max_available || candidate > end {
        return false;
    }

    let value = values.value(candidate);
    if value.is_nan() {
        return false;
    }

    let Some(plateau_start) =
        plateau_start(values, begin, candidate, value, window.allowed_equal_bars)
    else {
        return false;
    };
    let Some(plateau_end) =
        plateau_end(values, candidate, max_available, value, window.allowed_equal_bars)
    else {
        return false;
    };

    preceding_dominated(values, begin, plateau_start, window.preceding_bars, value, direction)
        && following_dominated(
            values,
            plateau_end,
            max_available,
            window.following_bars,
            value,
            direction,
        )
}

/// Latest pivot confirmable with the values up to `max_available`.
///
/// Candidates are scanned from `max_available - following_bars` down to
/// `begin_index + preceding_bars`.
#[must_use]
pub fn find_latest_confirmed_pivot(
    values: &dyn Indicator<Output = f64>,
    max_available: usize,
    window: PivotWindow,
    direction: PivotDirection,
) -> Option<usize> {
    let series = values.series();
    let end = series.end_index()?;
    let begin = series.begin_index();
    if max_available < begin || max_available > end {
        return None;
    }

    let latest = max_available.checked_sub(window.following_bars)?;
    let earliest = begin + window.preceding_bars;
    if latest < earliest {
        return None;
    }

    (earliest..=latest)
        .rev()
        .find(|&candidate| is_confirmed_pivot(values, candidate, max_available, window, direction))
}

#[allow(clippy::float_cmp)]
fn plateau_start(
    values: &dyn Indicator<Output = f64>,
    begin: usize,
    candidate: usize,
    value: f64,
    allowed_equal_bars: usize,
) -> Option<usize> {
    let mut index = candidate;
    let mut equals_used = 0;
    while index > begin && equals_used < allowed_equal_bars {
        let previous = values.value(index - 1);
        if previous.is_nan() {
            return None;
        }
        if previous != value {
            break;
        }
        equals_used += 1;
        index -= 1;
    }
    if index > begin && values.value(index - 1) == value {
        return None;
    }
    Some(index)
}

#[allow(clippy::float_cmp)]
fn plateau_end(
    values: &dyn Indicator<Output = f64>,
    candidate: usize,
    max_available: usize,
    value: f64,
    allowed_equal_bars: usize,
) -> Option<usize> {
    let mut index = candidate;
    let mut equals_used = 0;
    while index < max_available && equals_used < allowed_equal_bars {
        let next = values.value(index + 1);
        if next.is_nan() {
            return None;
        }
        if next != value {
            break;
        }
        equals_used += 1;
        index += 1;
    }
    if index < max_available && values.value(index + 1) == value {
        return None;
    }
    Some(index)
}

fn preceding_dominated(
    values: &dyn Indicator<Output = f64>,
    begin: usize,
    plateau_start: usize,
    preceding_bars: usize,
    value: f64,
    direction: PivotDirection,
) -> bool {
    if preceding_bars == 0 {
        return true;
    }
    match plateau_start.checked_sub(preceding_bars) {
        Some(first) if first >= begin => (first..plateau_start).all(|i| {
            let other = values.value(i);
            !other.is_nan() && direction.dominates(value, other)
        }),
        _ => false,
    }
}

fn following_dominated(
    values: &dyn Indicator<Output = f64>,
    plateau_end: usize,
    max_available: usize,
    following_bars: usize,
    value: f64,
    direction: PivotDirection,
) -> bool {
    if following_bars == 0 {
        return true;
    }
    if max_available - plateau_end < following_bars {
        return false;
    }
    (plateau_end + 1..=plateau_end + following_bars).all(|i| {
        let other = values.value(i);
        !other.is_nan() && direction.dominates(value, other)
    })
}
