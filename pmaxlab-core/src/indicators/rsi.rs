//! Relative Strength Index (RSI).
//!
//! Uses Wilder smoothing of average gains and average losses.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period.
//! Edge cases: avg_loss == 0 → RSI = 100; avg_gain == 0 → RSI = 0; no
//! movement at all → 50.

use crate::components::indicator::{Indicator, IndicatorSeries};
use crate::domain::Bar;

use super::{check_period, IndicatorError};

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period("rsi_period", period)?;
        Ok(Self {
            period,
            name: format!("rsi_{period}"),
        })
    }
}

/// RSI of an arbitrary series.
///
/// A NaN in the seed window leaves the whole series undefined; a NaN after
/// the seed makes the rest undefined.
pub fn rsi_of_series(values: &[f64], period: usize) -> IndicatorSeries {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period + 1 {
        return IndicatorSeries::from_values(result);
    }

    let changes: Vec<f64> = std::iter::once(f64::NAN)
        .chain(values.windows(2).map(|w| w[1] - w[0]))
        .collect();

    // Seed: average gain and average loss over the first `period` changes
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for &ch in &changes[1..=period] {
        if ch.is_nan() {
            return IndicatorSeries::from_values(result);
        }
        if ch > 0.0 {
            avg_gain += ch;
        } else {
            avg_loss -= ch;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;

    result[period] = compute_rsi(avg_gain, avg_loss);

    let alpha = 1.0 / period as f64;
    for i in (period + 1)..n {
        let ch = changes[i];
        if ch.is_nan() {
            break;
        }

        let gain = ch.max(0.0);
        let loss = (-ch).max(0.0);

        avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
        avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;

        result[i] = compute_rsi(avg_gain, avg_loss);
    }

    IndicatorSeries::from_values(result)
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0 // no movement
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> IndicatorSeries {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        rsi_of_series(&closes, self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};

    #[test]
    fn rsi_all_gains() {
        let bars = make_bars(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        let result = Rsi::new(3).unwrap().compute(&bars);
        assert_approx(result.get(3).unwrap(), 100.0, 1e-6);
    }

    #[test]
    fn rsi_all_losses() {
        let bars = make_bars(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0]);
        let result = Rsi::new(3).unwrap().compute(&bars);
        assert_approx(result.get(3).unwrap(), 0.0, 1e-6);
    }

    #[test]
    fn rsi_mixed_seed_value() {
        // Changes: +0.34, -0.25, -0.48
        // avg_gain = 0.34/3, avg_loss = 0.73/3
        // RSI[3] = 100 - 100/(1 + 0.34/0.73) ≈ 31.7757
        let result = rsi_of_series(&[44.0, 44.34, 44.09, 43.61, 44.33], 3);

        assert_eq!(result.get(0), None);
        assert_eq!(result.get(1), None);
        assert_eq!(result.get(2), None);
        assert_approx(result.get(3).unwrap(), 100.0 - 100.0 / (1.0 + 0.34 / 0.73), 1e-9);
    }

    #[test]
    fn rsi_flat_is_fifty() {
        let result = rsi_of_series(&[10.0; 8], 3);
        for i in 3..8 {
            assert_eq!(result.get(i), Some(50.0));
        }
    }

    #[test]
    fn rsi_bounds() {
        let result = rsi_of_series(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0], 3);
        for (i, v) in result.iter().enumerate() {
            if let Some(v) = v {
                assert!((0.0..=100.0).contains(&v), "RSI out of bounds at bar {i}: {v}");
            }
        }
    }

    #[test]
    fn rsi_nan_in_seed() {
        let mut bars = make_bars(&[100.0, 101.0, 102.0, 103.0, 104.0]);
        bars[2].close = f64::NAN;
        let result = Rsi::new(3).unwrap().compute(&bars);
        assert_eq!(result.first_defined(), None);
    }

    #[test]
    fn rsi_lookback_and_validation() {
        assert_eq!(Rsi::new(14).unwrap().lookback(), 14);
        assert!(Rsi::new(0).is_err());
    }
}
