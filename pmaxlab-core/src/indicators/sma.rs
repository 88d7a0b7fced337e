//! Simple Moving Average (SMA).
//!
//! Trailing arithmetic mean over a lookback window.
//! Lookback: period - 1 (first valid value at index period-1).

use crate::components::indicator::IndicatorSeries;

use super::atr::rolling_mean;

/// SMA of an arbitrary series.
///
/// A window containing NaN yields an undefined value. Windows are summed
/// afresh, so a constant input yields a bit-identical constant output.
pub fn sma_of_series(values: &[f64], period: usize) -> IndicatorSeries {
    rolling_mean(values, period)
}
