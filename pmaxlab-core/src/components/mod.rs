//! Strategy components around the indicator pipeline.
//!
//! - Signal detector: crossovers of a reference series over the trend line
//! - Confirmation filters: gate entry signals on same-bar indicator values
//! - Position manager: the adaptive trailing-stop state machine
//!
//! Plus the indicator trait for precomputed numeric series.

pub mod filter;
pub mod indicator;
pub mod pm;
pub mod signal;

pub use filter::{ChainOutcome, FilterChain, SignalFilter};
pub use indicator::{Indicator, IndicatorSeries, IndicatorValues};
pub use pm::{PositionError, StopConfig, TrailingStopManager};
pub use signal::{
    CrossoverDetector, Crossing, FilterVerdict, SignalEvaluation, SignalEvent, SignalEvents,
    SignalKind,
};
