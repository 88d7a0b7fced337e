//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = k * x[t] + (1 - k) * EMA[t-1], k = 2 / (period + 1).
//! Seed: EMA[period-1] = SMA of the first `period` values.
//! Lookback: period - 1, the same warm-up boundary as SMA.

use crate::components::indicator::IndicatorSeries;

/// EMA of an arbitrary series.
///
/// The recurrence is evaluated as `prev + k * (x - prev)`, so a value equal
/// to the previous EMA leaves it unchanged. A NaN in the seed window leaves
/// the whole series undefined; a NaN after the seed makes the rest undefined.
pub fn ema_of_series(values: &[f64], period: usize) -> IndicatorSeries {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return IndicatorSeries::from_values(result);
    }

    let k = 2.0 / (period as f64 + 1.0);

    let seed_window = &values[..period];
    if seed_window.iter().any(|v| v.is_nan()) {
        return IndicatorSeries::from_values(result);
    }
    let seed = seed_window.iter().sum::<f64>() / period as f64;
    result[period - 1] = seed;

    let mut prev = seed;
    for i in period..n {
        let x = values[i];
        if x.is_nan() {
            break;
        }
        let ema = prev + k * (x - prev);
        result[i] = ema;
        prev = ema;
    }

    IndicatorSeries::from_values(result)
}
