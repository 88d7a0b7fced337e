//! Indicator trait, indicator series and the precomputed values container.
//!
//! Indicators are pure functions: bar history in, numeric series out.
//! They are precomputed once before the bar loop and read by bar index
//! during the loop. No recomputation on each bar.

use crate::domain::Bar;
use std::collections::HashMap;

/// Trait for single-series indicators.
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
/// Every indicator must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "atr_14").
    fn name(&self) -> &str;

    /// Number of leading bars that are undefined (warm-up).
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns a series of the same length as `bars`.
    fn compute(&self, bars: &[Bar]) -> IndicatorSeries;
}

/// A same-length-as-input series where each value is either defined or
/// undefined (warm-up, or a NaN somewhere in the input window).
///
/// Undefined values are stored as NaN, but every read goes through
/// [`IndicatorSeries::get`], which returns `None` for them.
#[derive(Debug, Clone, Default)]
pub struct IndicatorSeries {
    values: Vec<f64>,
}

impl IndicatorSeries {
    /// A series of `len` undefined values.
    pub fn undefined(len: usize) -> Self {
        Self {
            values: vec![f64::NAN; len],
        }
    }

    /// Wrap raw values; NaN marks an undefined position.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Wrap optional values; `None` marks an undefined position.
    pub fn from_options(values: impl IntoIterator<Item = Option<f64>>) -> Self {
        Self {
            values: values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect(),
        }
    }

    /// Value at `index`, or `None` when out of range or undefined.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().filter(|v| !v.is_nan())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Index of the first defined value (the warm-up boundary).
    pub fn first_defined(&self) -> Option<usize> {
        self.values.iter().position(|v| !v.is_nan())
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.values
            .iter()
            .map(|&v| if v.is_nan() { None } else { Some(v) })
    }

    /// Defined values as `Option`s, for serialization or inspection.
    pub fn to_options(&self) -> Vec<Option<f64>> {
        self.iter().collect()
    }
}

/// Container for precomputed indicator series.
///
/// Built once before the bar loop, then queried by bar index during the loop.
#[derive(Debug, Clone, Default)]
pub struct IndicatorValues {
    series: HashMap<String, IndicatorSeries>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a named indicator series.
    pub fn insert(&mut self, name: impl Into<String>, values: IndicatorSeries) {
        self.series.insert(name.into(), values);
    }

    /// Get the indicator value at a specific bar index.
    ///
    /// `None` if the series is missing, the index is out of range, or the
    /// value is undefined.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series.get(name).and_then(|s| s.get(bar_index))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.series.contains_key(name)
    }

    /// Number of indicator series stored.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
