//! ROC momentum confirmation filter.
//!
//! Long entries need ROC >= `threshold_pct`; short entries need
//! ROC <= -`threshold_pct`.

use crate::components::indicator::{Indicator, IndicatorValues};
use crate::components::signal::{FilterVerdict, SignalEvaluation, SignalEvent, SignalKind};
use crate::domain::Bar;
use crate::indicators::{IndicatorError, Roc};
use std::collections::HashMap;

use super::{pass_through, SignalFilter};

#[derive(Debug, Clone)]
pub struct RocFilter {
    pub threshold_pct: f64,
    roc: Roc,
}

impl RocFilter {
    pub fn new(period: usize, threshold_pct: f64) -> Result<Self, IndicatorError> {
        if !threshold_pct.is_finite() || threshold_pct < 0.0 {
            return Err(IndicatorError::InvalidParameter {
                name: "threshold_pct",
                reason: format!("must be finite and >= 0, got {threshold_pct}"),
            });
        }
        Ok(Self {
            threshold_pct,
            roc: Roc::new(period)?,
        })
    }
}

impl SignalFilter for RocFilter {
    fn name(&self) -> &str {
        "roc_filter"
    }

    fn indicators(&self) -> Vec<&dyn Indicator> {
        vec![&self.roc as &dyn Indicator]
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

        let (verdict, filter_state) = match indicators.get(self.roc.name(), signal.bar_index) {
            Some(roc) => {
                let state = HashMap::from([("roc_pct".to_string(), roc)]);
                let passed = match signal.kind {
                    SignalKind::EnterLong => roc >= self.threshold_pct,
                    _ => roc <= -self.threshold_pct,
                };
                if passed {
                    (FilterVerdict::Passed, state)
                } else {
                    (FilterVerdict::FilteredByRoc, state)
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
