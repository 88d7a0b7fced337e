//! Trend average: the configurable moving average PMax uses as its price
//! reference.
//!
//! SMA and EMA share the same warm-up boundary (index period-1), so every
//! downstream component has one notion of "ready".

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::components::indicator::{Indicator, IndicatorSeries};
use crate::domain::Bar;

use super::ema::ema_of_series;
use super::sma::sma_of_series;
use super::{check_period, IndicatorError};

/// Moving average method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaMethod {
    #[default]
    Sma,
    Ema,
}

impl fmt::Display for MaMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sma => write!(f, "sma"),
            Self::Ema => write!(f, "ema"),
        }
    }
}

/// Moving average of an arbitrary series.
pub fn moving_average(
    values: &[f64],
    period: usize,
    method: MaMethod,
) -> Result<IndicatorSeries, IndicatorError> {
    check_period("ma_period", period)?;
    Ok(match method {
        MaMethod::Sma => sma_of_series(values, period),
        MaMethod::Ema => ema_of_series(values, period),
    })
}

/// Moving average of close prices.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    period: usize,
    method: MaMethod,
    name: String,
}

impl MovingAverage {
    pub fn new(period: usize, method: MaMethod) -> Result<Self, IndicatorError> {
        check_period("ma_period", period)?;
        Ok(Self {
            period,
            method,
            name: format!("{method}_{period}"),
        })
    }

    pub fn method(&self) -> MaMethod {
        self.method
    }
}

impl Indicator for MovingAverage {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> IndicatorSeries {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        match self.method {
            MaMethod::Sma => sma_of_series(&closes, self.period),
            MaMethod::Ema => ema_of_series(&closes, self.period),
        }
    }
}
