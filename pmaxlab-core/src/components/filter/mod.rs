//! Confirmation filters: gate entry signals on the same bar's indicator
//! values.
//!
//! Filters are pure predicates. They see the signal, the bars and the
//! precomputed indicators, never position state, and they gate entries
//! only. Exit signals always pass.

pub mod roc_filter;
pub mod rsi_filter;
pub mod volatility;

use crate::domain::Bar;
use std::collections::HashMap;

use super::indicator::{Indicator, IndicatorValues};
use super::signal::{FilterVerdict, SignalEvaluation, SignalEvent};

pub use roc_filter::RocFilter;
pub use rsi_filter::RsiFilter;
pub use volatility::VolatilityFilter;

/// Trait for confirmation filters.
///
/// # Architecture invariant
/// Filters must not reference position state; they evaluate market
/// conditions only, using values at `signal.bar_index`.
pub trait SignalFilter: Send + Sync {
    /// Human-readable name (e.g., "rsi_filter").
    fn name(&self) -> &str;

    /// Indicators this filter reads; precomputed before the bar loop under
    /// their own names.
    fn indicators(&self) -> Vec<&dyn Indicator>;

    /// Evaluate whether an entry signal should be allowed through.
    fn evaluate(
        &self,
        signal: &SignalEvent,
        bars: &[Bar],
        indicators: &IndicatorValues,
    ) -> SignalEvaluation;
}

/// Evaluation record for a signal the filter does not gate.
pub(crate) fn pass_through(signal: &SignalEvent, filter_name: &str) -> SignalEvaluation {
    SignalEvaluation {
        bar_index: signal.bar_index,
        kind: signal.kind,
        filter_name: filter_name.to_string(),
        verdict: FilterVerdict::Passed,
        filter_state: HashMap::new(),
    }
}

/// All filters must pass. An empty chain passes everything.
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn SignalFilter>>,
}

/// Result of running a signal through a [`FilterChain`].
#[derive(Debug, Clone, Default)]
pub struct ChainOutcome {
    pub evaluations: Vec<SignalEvaluation>,
}

impl ChainOutcome {
    pub fn is_passed(&self) -> bool {
        self.evaluations.iter().all(|e| e.verdict.is_passed())
    }

    /// Evaluations that rejected the signal.
    pub fn rejections(&self) -> impl Iterator<Item = &SignalEvaluation> {
        self.evaluations.iter().filter(|e| !e.verdict.is_passed())
    }
}

impl FilterChain {
    pub fn new(filters: Vec<Box<dyn SignalFilter>>) -> Self {
        Self { filters }
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Every indicator any filter in the chain reads.
    pub fn indicators(&self) -> Vec<&dyn Indicator> {
        self.filters.iter().flat_map(|f| f.indicators()).collect()
    }

    /// Run every filter; each one is recorded even after a rejection.
    pub fn evaluate(
        &self,
        signal: &SignalEvent,
        bars: &[Bar],
        indicators: &IndicatorValues,
    ) -> ChainOutcome {
        ChainOutcome {
            evaluations: self
                .filters
                .iter()
                .map(|f| f.evaluate(signal, bars, indicators))
                .collect(),
        }
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.names())
            .finish()
    }
}
