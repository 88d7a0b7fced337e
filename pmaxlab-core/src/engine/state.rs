//! Run result of a single backtest.

use serde::{Deserialize, Serialize};

use crate::components::signal::{SignalEvaluation, SignalEvent, SignalKind};
use crate::domain::{ExitReason, Position, Trade};
use crate::indicators::BandState;

/// Output of [`run_backtest`](super::run_backtest) for one bar stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Every detected signal event, in bar order, whether acted on or not.
    pub signals: Vec<SignalEvent>,
    pub trades: Vec<Trade>,
    /// Filter evaluations that blocked an entry.
    pub rejected: Vec<SignalEvaluation>,
    pub bands: Vec<Option<BandState>>,
    /// Position still open after the last bar. Not force-closed.
    pub open_position: Option<Position>,
    pub warmup_bars: usize,
    pub bar_count: usize,
    pub config_hash: String,
}

impl RunResult {
    pub fn count(&self, kind: SignalKind) -> usize {
        self.signals.iter().filter(|s| s.kind == kind).count()
    }

    pub fn stop_outs(&self) -> usize {
        self.trades
            .iter()
            .filter(|t| t.exit_reason == ExitReason::StopLoss)
            .count()
    }
}
