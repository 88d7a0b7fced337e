//! Volatility filter: gates entries by ATR-based volatility level.
//!
//! Passes entries when volatility (ATR as % of close) is within the
//! configured range. Rejects in extremely low-vol (no movement) or
//! extremely high-vol (erratic) environments.

use crate::components::indicator::{Indicator, IndicatorValues};
use crate::components::signal::{FilterVerdict, SignalEvaluation, SignalEvent};
use crate::domain::Bar;
use crate::indicators::{Atr, IndicatorError};
use std::collections::HashMap;

use super::{pass_through, SignalFilter};

/// ATR-based volatility filter.
///
/// Computes `volatility_pct = (atr / close) * 100` and passes entries when
/// the value falls within `[min_pct, max_pct]`.
#[derive(Debug, Clone)]
pub struct VolatilityFilter {
    pub min_pct: f64,
    pub max_pct: f64,
    atr: Atr,
}

impl VolatilityFilter {
    pub fn new(atr_period: usize, min_pct: f64, max_pct: f64) -> Result<Self, IndicatorError> {
        if !min_pct.is_finite() || min_pct < 0.0 {
            return Err(IndicatorError::InvalidParameter {
                name: "min_atr_pct",
                reason: format!("must be finite and >= 0, got {min_pct}"),
            });
        }
        if !max_pct.is_finite() || max_pct < min_pct {
            return Err(IndicatorError::InvalidParameter {
                name: "max_atr_pct",
                reason: format!("must be finite and >= min_atr_pct, got {max_pct}"),
            });
        }
        Ok(Self {
            min_pct,
            max_pct,
            atr: Atr::new(atr_period)?,
        })
    }
}

impl SignalFilter for VolatilityFilter {
    fn name(&self) -> &str {
        "volatility_filter"
    }

    fn indicators(&self) -> Vec<&dyn Indicator> {
        vec![&self.atr as &dyn Indicator]
    }

    fn evaluate(
        &self,
        signal: &SignalEvent,
        bars: &[Bar],
        indicators: &IndicatorValues,
    ) -> SignalEvaluation {
        if signal.kind.is_exit() {
            return pass_through(signal, self.name());
        }

        let close = bars.get(signal.bar_index).map(|b| b.close);
        let atr_value = indicators.get(self.atr.name(), signal.bar_index);

        let (verdict, filter_state) = match (atr_value, close) {
            (Some(atr), Some(close)) if close > 0.0 => {
                let vol_pct = (atr / close) * 100.0;
                let state = HashMap::from([
                    ("atr_value".to_string(), atr),
                    ("close".to_string(), close),
                    ("volatility_pct".to_string(), vol_pct),
                ]);
                if vol_pct >= self.min_pct && vol_pct <= self.max_pct {
                    (FilterVerdict::Passed, state)
                } else {
                    (FilterVerdict::FilteredByVolatility, state)
                }
            }
            _ => (FilterVerdict::Undefined, HashMap::new()),
        };

        SignalEvaluation {
            bar_index: signal.bar_index,
            kind: signal.kind,
            filter_name: self.name().to_string(),
            verdict,
            filter_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{signal, single_value};
    use super::*;
    use crate::components::signal::SignalKind;
    use crate::indicators::make_bars;

    #[test]
    fn passes_within_range() {
        let filter = VolatilityFilter::new(14, 0.5, 5.0).unwrap();
        let bars = make_bars(&[100.0; 10]);
        // atr=2.0, close=100.0 -> vol_pct=2.0%
        let iv = single_value("atr_14", 10, 5, 2.0);
        let eval = filter.evaluate(&signal(5, SignalKind::EnterLong), &bars, &iv);
        assert!(eval.verdict.is_passed());
        assert_eq!(eval.filter_state["volatility_pct"], 2.0);
    }

    #[test]
    fn rejects_outside_range() {
        let filter = VolatilityFilter::new(14, 0.5, 5.0).unwrap();
        let bars = make_bars(&[100.0; 10]);
        for atr in [0.1, 10.0] {
            let iv = single_value("atr_14", 10, 5, atr);
            let eval = filter.evaluate(&signal(5, SignalKind::EnterShort), &bars, &iv);
            assert_eq!(eval.verdict, FilterVerdict::FilteredByVolatility);
        }
    }

    #[test]
    fn passes_at_boundaries() {
        let filter = VolatilityFilter::new(14, 0.5, 5.0).unwrap();
        let bars = make_bars(&[100.0; 10]);
        for atr in [0.5, 5.0] {
            let iv = single_value("atr_14", 10, 5, atr);
            assert!(filter.evaluate(&signal(5, SignalKind::EnterLong), &bars, &iv).verdict.is_passed());
        }
    }

    #[test]
    fn zero_atr_is_zero_pct() {
        let filter = VolatilityFilter::new(14, 0.0, 5.0).unwrap();
        let bars = make_bars(&[100.0; 10]);
        let iv = single_value("atr_14", 10, 5, 0.0);
        assert!(filter.evaluate(&signal(5, SignalKind::EnterLong), &bars, &iv).verdict.is_passed());
    }

    #[test]
    fn non_positive_close_never_divides() {
        let filter = VolatilityFilter::new(14, 0.0, 5.0).unwrap();
        let mut bars = make_bars(&[100.0; 10]);
        bars[5].close = 0.0;
        let iv = single_value("atr_14", 10, 5, 1.0);
        let eval = filter.evaluate(&signal(5, SignalKind::EnterLong), &bars, &iv);
        assert_eq!(eval.verdict, FilterVerdict::Undefined);
    }

    #[test]
    fn missing_indicator_rejects() {
        let filter = VolatilityFilter::new(14, 0.5, 5.0).unwrap();
        let bars = make_bars(&[100.0; 10]);
        let eval = filter.evaluate(&signal(5, SignalKind::EnterLong), &bars, &IndicatorValues::new());
        assert!(!eval.verdict.is_passed());
    }

    #[test]
    fn rejects_inverted_range() {
        assert!(VolatilityFilter::new(14, 5.0, 0.5).is_err());
        assert!(VolatilityFilter::new(14, -1.0, 0.5).is_err());
    }
}
