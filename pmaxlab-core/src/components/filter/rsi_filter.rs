//! RSI confirmation filter.
//!
//! Long entries need RSI >= `long_min`; short entries need RSI <= `short_max`.

use crate::components::indicator::{Indicator, IndicatorValues};
use crate::components::signal::{FilterVerdict, SignalEvaluation, SignalEvent, SignalKind};
use crate::domain::Bar;
use crate::indicators::{IndicatorError, Rsi};
use std::collections::HashMap;

use super::{pass_through, SignalFilter};

#[derive(Debug, Clone)]
pub struct RsiFilter {
    pub long_min: f64,
    pub short_max: f64,
    rsi: Rsi,
}

impl RsiFilter {
    pub fn new(period: usize, long_min: f64, short_max: f64) -> Result<Self, IndicatorError> {
        for (name, value) in [("long_min", long_min), ("short_max", short_max)] {
            if !(0.0..=100.0).contains(&value) {
                return Err(IndicatorError::InvalidParameter {
                    name,
                    reason: format!("must be within [0, 100], got {value}"),
                });
            }
        }
        Ok(Self {
            long_min,
            short_max,
            rsi: Rsi::new(period)?,
        })
    }
}

impl SignalFilter for RsiFilter {
    fn name(&self) -> &str {
        "rsi_filter"
    }

    fn indicators(&self) -> Vec<&dyn Indicator> {
        vec![&self.rsi as &dyn Indicator]
    }

    fn evaluate(
        &self,
        signal: &SignalEvent,
        _bars: &[Bar],
        indicators: &IndicatorValues,
    ) -> SignalEvaluation {
        if signal.kind.is_exit() {
            return pass_through(signal, self.name());
        }

        let (verdict, filter_state) = match indicators.get(self.rsi.name(), signal.bar_index) {
            Some(rsi) => {
                let state = HashMap::from([("rsi_value".to_string(), rsi)]);
                let passed = match signal.kind {
                    SignalKind::EnterLong => rsi >= self.long_min,
                    _ => rsi <= self.short_max,
                };
                if passed {
                    (FilterVerdict::Passed, state)
                } else {
                    (FilterVerdict::FilteredByRsi, state)
                }
            }
            None => (FilterVerdict::Undefined, HashMap::new()),
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
    use crate::indicators::make_bars;

    #[test]
    fn long_needs_rsi_at_or_above_min() {
        let filter = RsiFilter::new(14, 55.0, 45.0).unwrap();
        let bars = make_bars(&[100.0; 10]);
        let pass = filter.evaluate(&signal(5, SignalKind::EnterLong), &bars, &single_value("rsi_14", 10, 5, 55.0));
        assert!(pass.verdict.is_passed());
        assert_eq!(pass.filter_state["rsi_value"], 55.0);

        let fail = filter.evaluate(&signal(5, SignalKind::EnterLong), &bars, &single_value("rsi_14", 10, 5, 54.9));
        assert_eq!(fail.verdict, FilterVerdict::FilteredByRsi);
    }

    #[test]
    fn short_needs_rsi_at_or_below_max() {
        let filter = RsiFilter::new(14, 55.0, 45.0).unwrap();
        let bars = make_bars(&[100.0; 10]);
        let iv = single_value("rsi_14", 10, 5, 30.0);
        assert!(filter.evaluate(&signal(5, SignalKind::EnterShort), &bars, &iv).verdict.is_passed());
        let iv = single_value("rsi_14", 10, 5, 45.5);
        assert!(!filter.evaluate(&signal(5, SignalKind::EnterShort), &bars, &iv).verdict.is_passed());
    }

    #[test]
    fn undefined_rsi_rejects() {
        let filter = RsiFilter::new(14, 50.0, 50.0).unwrap();
        let bars = make_bars(&[100.0; 10]);
        let eval = filter.evaluate(&signal(5, SignalKind::EnterLong), &bars, &IndicatorValues::new());
        assert_eq!(eval.verdict, FilterVerdict::Undefined);
    }

    #[test]
    fn exits_are_never_gated() {
        let filter = RsiFilter::new(14, 99.0, 1.0).unwrap();
        let bars = make_bars(&[100.0; 10]);
        let eval = filter.evaluate(&signal(5, SignalKind::ExitLong), &bars, &IndicatorValues::new());
        assert!(eval.verdict.is_passed());
    }

    #[test]
    fn rejects_out_of_range_thresholds() {
        assert!(RsiFilter::new(14, 120.0, 50.0).is_err());
        assert!(RsiFilter::new(14, 50.0, -1.0).is_err());
        assert!(RsiFilter::new(0, 50.0, 50.0).is_err());
    }
}
