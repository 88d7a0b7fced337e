//! Rate of Change (ROC).
//!
//! Percentage price change over N bars.
//! ROC[t] = (close[t] - close[t-period]) / close[t-period] * 100
//! Lookback: period.

use crate::components::indicator::{Indicator, IndicatorSeries};
use crate::domain::Bar;

use super::{check_period, IndicatorError};

#[derive(Debug, Clone)]
pub struct Roc {
    period: usize,
    name: String,
}

impl Roc {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period("roc_period", period)?;
        Ok(Self {
            period,
            name: format!("roc_{period}"),
        })
    }
}

/// ROC of an arbitrary series. Undefined where either end is NaN or the
/// earlier value is zero.
pub fn roc_of_series(values: &[f64], period: usize) -> IndicatorSeries {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 {
        return IndicatorSeries::from_values(result);
    }

    for i in period..n {
        let prev = values[i - period];
        let curr = values[i];
        if prev.is_nan() || curr.is_nan() || prev == 0.0 {
            continue;
        }
        result[i] = (curr - prev) / prev * 100.0;
    }

    IndicatorSeries::from_values(result)
}

impl Indicator for Roc {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> IndicatorSeries {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        roc_of_series(&closes, self.period)
    }
}
