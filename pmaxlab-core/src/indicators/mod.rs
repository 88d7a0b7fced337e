//! Concrete indicator implementations.
//!
//! The trend pipeline is ATR → moving average → PMax bands. RSI and ROC feed
//! the entry confirmation filters. Every indicator implements the `Indicator`
//! trait from `components::indicator` and also exposes a slice-level function
//! so the band state machine can be driven from arbitrary series.

pub mod atr;
pub mod ema;
pub mod ma;
pub mod pmax;
pub mod roc;
pub mod rsi;
pub mod sma;

pub use atr::{average_true_range, true_range, Atr};
pub use ma::{moving_average, MaMethod, MovingAverage};
pub use pmax::{
    band_states, trend_series, BandParams, BandReference, BandState, BandStateMachine, Direction,
    Pmax, SeriesSource,
};
pub use roc::{roc_of_series, Roc};
pub use rsi::{rsi_of_series, Rsi};

/// Errors raised when an indicator is configured or fed incorrectly.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IndicatorError {
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Reject a zero period.
pub(crate) fn check_period(name: &'static str, period: usize) -> Result<(), IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidParameter {
            name,
            reason: "period must be > 0".into(),
        });
    }
    Ok(())
}

/// Reject input slices whose lengths differ from `expected`.
pub(crate) fn check_len(
    name: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), IndicatorError> {
    if expected != actual {
        return Err(IndicatorError::InvalidParameter {
            name,
            reason: format!("length mismatch: expected {expected}, got {actual}"),
        });
    }
    Ok(())
}

/// Reject multipliers that are non-positive or non-finite.
pub(crate) fn check_multiplier(name: &'static str, value: f64) -> Result<(), IndicatorError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(IndicatorError::InvalidParameter {
            name,
            reason: format!("must be finite and > 0, got {value}"),
        });
    }
    Ok(())
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
