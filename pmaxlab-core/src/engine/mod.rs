//! Backtesting engine: the per-bar driver wiring indicators, signals,
//! filters and the trailing-stop manager together.
//!
//! 1. Validate the config and the bar ordering
//! 2. Precompute ATR, MA, band arena and filter indicators
//! 3. Walk the bars once, consuming the signal stream in lockstep

pub mod loop_runner;
pub mod precompute;
pub mod state;

pub use loop_runner::run_backtest;
pub use precompute::{precompute, precompute_indicators, Precomputed, TREND_KEY};
pub use state::RunResult;

use crate::components::pm::PositionError;
use crate::config::ConfigError;
use crate::indicators::IndicatorError;

/// Anything that stops a single instrument's run.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Indicator(#[from] IndicatorError),

    #[error(transparent)]
    Position(#[from] PositionError),

    #[error("bar timestamps not strictly increasing at index {index}")]
    UnorderedBars { index: usize },

    #[error("no bars to process")]
    Empty,
}
