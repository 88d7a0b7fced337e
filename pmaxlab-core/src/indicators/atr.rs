//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|), with
//! TR[0] = high[0] - low[0].
//! ATR is the simple rolling mean of TR over `period` bars.
//! Lookback: period - 1.

use crate::components::indicator::{Indicator, IndicatorSeries};
use crate::domain::Bar;

use super::{check_len, check_period, IndicatorError};

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period("atr_period", period)?;
        Ok(Self {
            period,
            name: format!("atr_{period}"),
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

/// Compute the True Range series.
/// TR[0] = high[0] - low[0] (no previous close).
/// TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
///
/// Callers guarantee equal lengths; NaN inputs produce NaN.
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    let n = high.len();
    let mut tr = vec![f64::NAN; n];

    if n == 0 {
        return tr;
    }

    tr[0] = high[0] - low[0];

    for i in 1..n {
        let (h, l, pc) = (high[i], low[i], close[i - 1]);
        if h.is_nan() || l.is_nan() || pc.is_nan() {
            continue;
        }
        tr[i] = (h - l).max((h - pc).abs()).max((l - pc).abs());
    }

    tr
}

/// Average True Range as the simple rolling mean of true range.
///
/// The first `period - 1` entries are undefined. Each window is summed
/// afresh, so identical windows give bit-identical results.
pub fn average_true_range(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    period: usize,
) -> Result<IndicatorSeries, IndicatorError> {
    check_period("atr_period", period)?;
    check_len("low", high.len(), low.len())?;
    check_len("close", high.len(), close.len())?;

    let tr = true_range(high, low, close);
    Ok(rolling_mean(&tr, period))
}

/// Trailing mean over `period` values; undefined where the window is short
/// or contains NaN.
pub(crate) fn rolling_mean(values: &[f64], period: usize) -> IndicatorSeries {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return IndicatorSeries::from_values(result);
    }

    for i in (period - 1)..n {
        let window = &values[(i + 1 - period)..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = window.iter().sum::<f64>() / period as f64;
    }

    IndicatorSeries::from_values(result)
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> IndicatorSeries {
        let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let low: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let tr = true_range(&high, &low, &close);
        rolling_mean(&tr, self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};
    use chrono::NaiveDate;

    fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        data.iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| Bar {
                timestamp: base + chrono::Duration::days(i as i64),
                open,
                high,
                low,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn true_range_basic() {
        let high = [105.0, 108.0, 107.0];
        let low = [95.0, 100.0, 98.0];
        let close = [102.0, 106.0, 99.0];
        let tr = true_range(&high, &low, &close);
        assert_approx(tr[0], 10.0, DEFAULT_EPSILON);
        assert_approx(tr[1], 8.0, DEFAULT_EPSILON);
        assert_approx(tr[2], 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        // prev close 100, current bar 108..115 → |115-100| = 15
        let tr = true_range(&[102.0, 115.0], &[97.0, 108.0], &[100.0, 112.0]);
        assert_approx(tr[1], 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_period_3_simple_mean() {
        let bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),  // TR = 10
            (102.0, 108.0, 100.0, 106.0), // TR = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = 9
            (99.0, 103.0, 97.0, 101.0),   // TR = 6
            (101.0, 106.0, 100.0, 105.0), // TR = 6
        ]);
        let result = Atr::new(3).unwrap().compute(&bars);

        assert_eq!(result.get(0), None);
        assert_eq!(result.get(1), None);
        assert_approx(result.get(2).unwrap(), 9.0, DEFAULT_EPSILON);
        assert_approx(result.get(3).unwrap(), 23.0 / 3.0, DEFAULT_EPSILON);
        assert_approx(result.get(4).unwrap(), 7.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_period_1_is_true_range() {
        let result = average_true_range(&[105.0, 108.0], &[95.0, 100.0], &[102.0, 106.0], 1)
            .unwrap();
        assert_eq!(result.get(0), Some(10.0));
        assert_eq!(result.get(1), Some(8.0));
    }

    #[test]
    fn atr_flat_bars_is_zero() {
        let flat = vec![50.0; 12];
        let result = average_true_range(&flat, &flat, &flat, 5).unwrap();
        for i in 4..12 {
            assert_eq!(result.get(i), Some(0.0));
        }
    }

    #[test]
    fn atr_nan_window_is_undefined() {
        let mut high = vec![105.0; 6];
        let low = vec![95.0; 6];
        let close = vec![100.0; 6];
        high[2] = f64::NAN;
        let result = average_true_range(&high, &low, &close, 2).unwrap();
        assert_eq!(result.get(1), Some(10.0));
        assert_eq!(result.get(2), None);
        assert_eq!(result.get(3), None);
        assert_eq!(result.get(4), Some(10.0));
    }

    #[test]
    fn atr_rejects_zero_period() {
        let err = average_true_range(&[1.0], &[1.0], &[1.0], 0).unwrap_err();
        assert!(matches!(
            err,
            IndicatorError::InvalidParameter {
                name: "atr_period",
                ..
            }
        ));
        assert!(Atr::new(0).is_err());
    }

    #[test]
    fn atr_rejects_mismatched_lengths() {
        let err = average_true_range(&[1.0, 2.0], &[1.0], &[1.0, 2.0], 1).unwrap_err();
        assert!(matches!(err, IndicatorError::InvalidParameter { name: "low", .. }));
    }

    #[test]
    fn atr_too_few_bars() {
        let result = average_true_range(&[2.0, 3.0], &[1.0, 2.0], &[1.5, 2.5], 5).unwrap();
        assert_eq!(result.first_defined(), None);
    }

    #[test]
    fn atr_lookback() {
        assert_eq!(Atr::new(14).unwrap().lookback(), 13);
    }
}
