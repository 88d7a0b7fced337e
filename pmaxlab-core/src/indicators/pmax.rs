//! PMax: SuperTrend-family band/trend state machine centred on a moving
//! average.
//!
//! Inherently sequential: each bar's final bands and direction depend on the
//! previous bar's final bands and direction, so the computation is an
//! explicit fold carrying `(final_upper, final_lower, direction, prev_base)`.
//!
//! Per bar, with `ref` the band centre and `base` the direction series:
//! - basic_upper = ref + long_multiplier * atr
//! - basic_lower = ref - short_multiplier * atr
//! - final_upper = basic_upper if basic_upper < prev_upper || prev_base > prev_upper,
//!   else prev_upper
//! - final_lower = basic_lower if basic_lower > prev_lower || prev_base < prev_lower,
//!   else prev_lower
//! - Down → Up when base > prev_upper; Up → Down when base < prev_lower
//! - trend = final_lower when Up, final_upper when Down
//!
//! Lookback: max(atr warm-up, ma warm-up).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::components::indicator::{Indicator, IndicatorSeries};
use crate::domain::Bar;

use super::atr::average_true_range;
use super::ma::{moving_average, MaMethod};
use super::{check_len, check_multiplier, check_period, IndicatorError};

/// Trend direction carried across bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// Price the bands are centred on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandReference {
    /// The moving average (PMax).
    #[default]
    Ma,
    /// High/low midpoint (classic SuperTrend).
    Hl2,
    Close,
}

/// A per-bar series derived from the bars or the moving average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesSource {
    #[default]
    Ma,
    Close,
}

/// Band state for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandState {
    pub upper_band: f64,
    pub lower_band: f64,
    pub trend_value: f64,
    pub direction: Direction,
}

/// Multipliers and seed convention for the band state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandParams {
    pub long_multiplier: f64,
    pub short_multiplier: f64,
    /// Direction assigned on the first defined bar. Not derivable from data.
    pub seed_direction: Direction,
}

impl BandParams {
    pub fn new(long_multiplier: f64, short_multiplier: f64) -> Result<Self, IndicatorError> {
        check_multiplier("long_multiplier", long_multiplier)?;
        check_multiplier("short_multiplier", short_multiplier)?;
        Ok(Self {
            long_multiplier,
            short_multiplier,
            seed_direction: Direction::Up,
        })
    }

    pub fn with_seed_direction(mut self, direction: Direction) -> Self {
        self.seed_direction = direction;
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct Carried {
    upper: f64,
    lower: f64,
    direction: Direction,
    base: f64,
}

/// Single-instrument rolling state of the band machine.
///
/// Feed defined inputs in bar order with [`BandStateMachine::step`]; the
/// first call seeds the state.
#[derive(Debug, Clone)]
pub struct BandStateMachine {
    params: BandParams,
    carried: Option<Carried>,
}

impl BandStateMachine {
    pub fn new(params: BandParams) -> Self {
        Self {
            params,
            carried: None,
        }
    }

    pub fn is_seeded(&self) -> bool {
        self.carried.is_some()
    }

    /// Current direction, if seeded.
    pub fn direction(&self) -> Option<Direction> {
        self.carried.map(|c| c.direction)
    }

    /// Advance one bar.
    pub fn step(&mut self, reference: f64, atr: f64, base: f64) -> BandState {
        let basic_upper = reference + self.params.long_multiplier * atr;
        let basic_lower = reference - self.params.short_multiplier * atr;

        let next = match self.carried {
            None => Carried {
                upper: basic_upper,
                lower: basic_lower,
                direction: self.params.seed_direction,
                base,
            },
            Some(prev) => {
                let upper = if basic_upper < prev.upper || prev.base > prev.upper {
                    basic_upper
                } else {
                    prev.upper
                };
                let lower = if basic_lower > prev.lower || prev.base < prev.lower {
                    basic_lower
                } else {
                    prev.lower
                };
                // Flips compare against the previous bar's final bands.
                let direction = match prev.direction {
                    Direction::Down if base > prev.upper => Direction::Up,
                    Direction::Up if base < prev.lower => Direction::Down,
                    kept => kept,
                };
                Carried {
                    upper,
                    lower,
                    direction,
                    base,
                }
            }
        };

        self.carried = Some(next);

        BandState {
            upper_band: next.upper,
            lower_band: next.lower,
            trend_value: match next.direction {
                Direction::Up => next.lower,
                Direction::Down => next.upper,
            },
            direction: next.direction,
        }
    }
}

/// Run the band machine over whole series.
///
/// Bars before all three inputs are defined stay `None`. After the seed, a
/// bar with any undefined input is `None` and the carried state is left
/// untouched for the next defined bar.
pub fn band_states(
    reference: &IndicatorSeries,
    atr: &IndicatorSeries,
    base: &IndicatorSeries,
    params: &BandParams,
) -> Result<Vec<Option<BandState>>, IndicatorError> {
    check_multiplier("long_multiplier", params.long_multiplier)?;
    check_multiplier("short_multiplier", params.short_multiplier)?;
    check_len("atr", reference.len(), atr.len())?;
    check_len("base", reference.len(), base.len())?;

    let mut machine = BandStateMachine::new(*params);
    let states = (0..reference.len())
        .map(|i| match (reference.get(i), atr.get(i), base.get(i)) {
            (Some(r), Some(a), Some(b)) => Some(machine.step(r, a, b)),
            _ => None,
        })
        .collect();

    Ok(states)
}

/// Trend line of a band-state arena as an indicator series.
pub fn trend_series(states: &[Option<BandState>]) -> IndicatorSeries {
    IndicatorSeries::from_options(states.iter().map(|s| s.map(|s| s.trend_value)))
}

/// PMax indicator: ATR and moving average computed from bars, then the band
/// machine. As an `Indicator` it outputs the trend line.
#[derive(Debug, Clone)]
pub struct Pmax {
    atr_period: usize,
    ma_period: usize,
    ma_method: MaMethod,
    params: BandParams,
    band_reference: BandReference,
    base_series: SeriesSource,
    name: String,
}

impl Pmax {
    pub fn new(
        atr_period: usize,
        ma_period: usize,
        ma_method: MaMethod,
        params: BandParams,
    ) -> Result<Self, IndicatorError> {
        check_period("atr_period", atr_period)?;
        check_period("ma_period", ma_period)?;
        check_multiplier("long_multiplier", params.long_multiplier)?;
        check_multiplier("short_multiplier", params.short_multiplier)?;
        Ok(Self {
            atr_period,
            ma_period,
            ma_method,
            params,
            band_reference: BandReference::default(),
            base_series: SeriesSource::default(),
            name: format!(
                "pmax_{atr_period}_{ma_method}{ma_period}_{}_{}",
                params.long_multiplier, params.short_multiplier
            ),
        })
    }

    pub fn with_band_reference(mut self, reference: BandReference) -> Self {
        self.band_reference = reference;
        self
    }

    pub fn with_base_series(mut self, base: SeriesSource) -> Self {
        self.base_series = base;
        self
    }

    /// Full per-bar band states.
    pub fn bands(&self, bars: &[Bar]) -> Result<Vec<Option<BandState>>, IndicatorError> {
        let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let low: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let close: Vec<f64> = bars.iter().map(|b| b.close).collect();

        let atr = average_true_range(&high, &low, &close, self.atr_period)?;
        let ma = moving_average(&close, self.ma_period, self.ma_method)?;

        let reference = match self.band_reference {
            BandReference::Ma => ma.clone(),
            BandReference::Hl2 => {
                IndicatorSeries::from_values(bars.iter().map(Bar::hl2).collect())
            }
            BandReference::Close => IndicatorSeries::from_values(close.clone()),
        };
        let base = match self.base_series {
            SeriesSource::Ma => ma,
            SeriesSource::Close => IndicatorSeries::from_values(close),
        };

        band_states(&reference, &atr, &base, &self.params)
    }
}

impl Indicator for Pmax {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        (self.atr_period - 1).max(self.ma_period - 1)
    }

    fn compute(&self, bars: &[Bar]) -> IndicatorSeries {
        match self.bands(bars) {
            Ok(states) => trend_series(&states),
            Err(_) => IndicatorSeries::undefined(bars.len()),
        }
    }
}
