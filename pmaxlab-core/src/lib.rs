//! PMaxLab Core: bars, indicators, signals, trailing stops, bar loop.
//!
//! This crate contains the trend-state engine:
//! - Domain types (bars, positions, trades)
//! - ATR and moving averages feeding the PMax band state machine
//! - Crossover signal detection over the PMax trend line
//! - RSI/ROC/volatility confirmation filters
//! - Adaptive trailing-stop position manager
//! - Strategy configuration and the single-pass bar loop

pub mod components;
pub mod config;
pub mod domain;
pub mod engine;
pub mod indicators;

pub use config::{ConfigError, FilterConfig, StrategyConfig, TradingMode};
pub use engine::{run_backtest, EngineError, RunResult};
