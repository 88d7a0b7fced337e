//! Signal detection: crossovers of a reference series over the PMax trend
//! line.
//!
//! Signals are portfolio-agnostic: the detector reads two precomputed series
//! and never sees position state. Signal events are immutable once emitted;
//! they describe a market event, not a downstream decision.
//!
//! - Cross up at `i`: `ref[i-1] <= trend[i-1]` and `ref[i] > trend[i]`
//! - Cross down at `i`: `ref[i-1] >= trend[i-1]` and `ref[i] < trend[i]`
//!
//! Non-strict on the "from" side, strict on the "to" side.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::domain::PositionSide;
use crate::indicators::{check_len, IndicatorError};

use super::indicator::IndicatorSeries;

/// What a signal asks the position manager to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    EnterLong,
    ExitLong,
    EnterShort,
    ExitShort,
}

impl SignalKind {
    pub fn is_entry(self) -> bool {
        matches!(self, Self::EnterLong | Self::EnterShort)
    }

    pub fn is_exit(self) -> bool {
        !self.is_entry()
    }

    /// The position side this signal opens or closes.
    pub fn side(self) -> PositionSide {
        match self {
            Self::EnterLong | Self::ExitLong => PositionSide::Long,
            Self::EnterShort | Self::ExitShort => PositionSide::Short,
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::EnterLong => "enter_long",
            Self::ExitLong => "exit_long",
            Self::EnterShort => "enter_short",
            Self::ExitShort => "exit_short",
        };
        f.write_str(s)
    }
}

/// An immutable market event emitted by the crossover detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub bar_index: usize,
    pub kind: SignalKind,
    pub trend_value: f64,
    pub reference_value: f64,
}

/// Direction of a reference/trend crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossing {
    Up,
    Down,
}

/// Detects reference-over-trend crossings.
#[derive(Debug, Clone, Copy)]
pub struct CrossoverDetector<'a> {
    trend: &'a IndicatorSeries,
    reference: &'a IndicatorSeries,
}

impl<'a> CrossoverDetector<'a> {
    pub fn new(
        trend: &'a IndicatorSeries,
        reference: &'a IndicatorSeries,
    ) -> Result<Self, IndicatorError> {
        check_len("reference", trend.len(), reference.len())?;
        Ok(Self { trend, reference })
    }

    pub fn len(&self) -> usize {
        self.trend.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trend.is_empty()
    }

    /// Crossing at `bar_index`, if any. Any undefined value among the four
    /// inputs means no crossing.
    pub fn crossing_at(&self, bar_index: usize) -> Option<Crossing> {
        if bar_index == 0 {
            return None;
        }
        let trend_prev = self.trend.get(bar_index - 1)?;
        let ref_prev = self.reference.get(bar_index - 1)?;
        let trend_cur = self.trend.get(bar_index)?;
        let ref_cur = self.reference.get(bar_index)?;

        if ref_prev <= trend_prev && ref_cur > trend_cur {
            Some(Crossing::Up)
        } else if ref_prev >= trend_prev && ref_cur < trend_cur {
            Some(Crossing::Down)
        } else {
            None
        }
    }

    /// Lazy, forward-only event stream from bar 0. Call again to restart.
    pub fn events(&self) -> SignalEvents<'a> {
        SignalEvents {
            detector: *self,
            next_bar: 0,
            pending: None,
        }
    }
}

/// Iterator over signal events in bar order. Within a bar the exit event is
/// yielded before the entry event.
#[derive(Debug, Clone)]
pub struct SignalEvents<'a> {
    detector: CrossoverDetector<'a>,
    next_bar: usize,
    pending: Option<SignalEvent>,
}

impl Iterator for SignalEvents<'_> {
    type Item = SignalEvent;

    fn next(&mut self) -> Option<SignalEvent> {
        if let Some(event) = self.pending.take() {
            return Some(event);
        }

        while self.next_bar < self.detector.len() {
            let i = self.next_bar;
            self.next_bar += 1;

            let Some(crossing) = self.detector.crossing_at(i) else {
                continue;
            };
            // Both series are defined here, crossing_at checked them.
            let make = |kind| SignalEvent {
                bar_index: i,
                kind,
                trend_value: self.detector.trend.get(i).unwrap_or(f64::NAN),
                reference_value: self.detector.reference.get(i).unwrap_or(f64::NAN),
            };
            let (exit, entry) = match crossing {
                Crossing::Up => (make(SignalKind::ExitShort), make(SignalKind::EnterLong)),
                Crossing::Down => (make(SignalKind::ExitLong), make(SignalKind::EnterShort)),
            };
            self.pending = Some(entry);
            return Some(exit);
        }

        None
    }
}

impl std::iter::FusedIterator for SignalEvents<'_> {}

// ── Filter evaluation records ──

/// Record of a confirmation filter evaluating an entry signal.
///
/// Kept separate from `SignalEvent` to preserve signal immutability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalEvaluation {
    pub bar_index: usize,
    pub kind: SignalKind,
    pub filter_name: String,
    pub verdict: FilterVerdict,
    /// Snapshot of the filter's inputs at evaluation time (e.g. the RSI value).
    pub filter_state: HashMap<String, f64>,
}

/// Outcome of a filter evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterVerdict {
    Passed,
    FilteredByRsi,
    FilteredByRoc,
    FilteredByVolatility,
    /// The filter's indicator was undefined at this bar.
    Undefined,
}

impl FilterVerdict {
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> IndicatorSeries {
        IndicatorSeries::from_values(values.to_vec())
    }

    fn kinds(trend: &[f64], reference: &[f64]) -> Vec<(usize, SignalKind)> {
        let trend = series(trend);
        let reference = series(reference);
        CrossoverDetector::new(&trend, &reference)
            .unwrap()
            .events()
            .map(|e| (e.bar_index, e.kind))
            .collect()
    }

    #[test]
    fn cross_up_yields_exit_short_then_enter_long() {
        let events = kinds(&[10.0, 10.0, 10.0], &[9.0, 9.5, 10.5]);
        assert_eq!(
            events,
            vec![(2, SignalKind::ExitShort), (2, SignalKind::EnterLong)]
        );
    }

    #[test]
    fn cross_down_yields_exit_long_then_enter_short() {
        let events = kinds(&[10.0, 10.0, 10.0], &[11.0, 10.5, 9.5]);
        assert_eq!(
            events,
            vec![(2, SignalKind::ExitLong), (2, SignalKind::EnterShort)]
        );
    }

    #[test]
    fn equality_counts_on_from_side_only() {
        // touching then crossing fires
        assert_eq!(kinds(&[10.0, 10.0], &[10.0, 10.1]).len(), 2);
        // crossing onto equality does not
        assert!(kinds(&[10.0, 10.0], &[9.0, 10.0]).is_empty());
        assert!(kinds(&[10.0, 10.0], &[11.0, 10.0]).is_empty());
    }

    #[test]
    fn undefined_inputs_produce_no_event() {
        let nan = f64::NAN;
        assert!(kinds(&[nan, 10.0], &[9.0, 11.0]).is_empty());
        assert!(kinds(&[10.0, 10.0], &[9.0, nan]).is_empty());
        assert!(kinds(&[10.0, nan, 10.0], &[9.0, 11.0, 9.0]).is_empty());
    }

    #[test]
    fn event_carries_values_at_bar() {
        let trend = series(&[10.0, 10.25]);
        let reference = series(&[9.0, 11.5]);
        let detector = CrossoverDetector::new(&trend, &reference).unwrap();
        let event = detector.events().next().unwrap();
        assert_eq!(event.trend_value, 10.25);
        assert_eq!(event.reference_value, 11.5);
    }

    #[test]
    fn alternating_crosses() {
        let events = kinds(&[10.0; 5], &[9.0, 11.0, 9.0, 11.0, 12.0]);
        let entries: Vec<SignalKind> = events
            .iter()
            .map(|&(_, k)| k)
            .filter(|k| k.is_entry())
            .collect();
        assert_eq!(
            entries,
            vec![
                SignalKind::EnterLong,
                SignalKind::EnterShort,
                SignalKind::EnterLong
            ]
        );
    }

    #[test]
    fn events_restart_from_bar_zero() {
        let trend = series(&[10.0; 4]);
        let reference = series(&[9.0, 11.0, 9.0, 11.0]);
        let detector = CrossoverDetector::new(&trend, &reference).unwrap();
        let mut first = detector.events();
        first.next();
        first.next();
        let again: Vec<_> = detector.events().collect();
        assert_eq!(again.len(), 6);
        assert_eq!(again[0].bar_index, 1);
    }

    #[test]
    fn iterator_is_fused() {
        let trend = series(&[10.0, 10.0]);
        let reference = series(&[9.0, 11.0]);
        let detector = CrossoverDetector::new(&trend, &reference).unwrap();
        let mut events = detector.events();
        assert_eq!(events.by_ref().count(), 2);
        assert!(events.next().is_none());
        assert!(events.next().is_none());
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let trend = series(&[1.0, 2.0]);
        let reference = series(&[1.0]);
        assert!(CrossoverDetector::new(&trend, &reference).is_err());
    }

    #[test]
    fn kind_sides() {
        assert_eq!(SignalKind::EnterLong.side(), PositionSide::Long);
        assert_eq!(SignalKind::ExitShort.side(), PositionSide::Short);
        assert!(SignalKind::ExitLong.is_exit());
        assert_eq!(SignalKind::EnterShort.to_string(), "enter_short");
    }

    #[test]
    fn filter_verdict_is_passed() {
        assert!(FilterVerdict::Passed.is_passed());
        assert!(!FilterVerdict::FilteredByRsi.is_passed());
        assert!(!FilterVerdict::Undefined.is_passed());
    }
}
