//! Trade: a completed Flat → Long/Short → Flat round trip.

use super::position::PositionSide;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    /// Exit or opposing crossover signal, filled at the bar's close.
    Signal,
    /// Trailing stop hit, filled at the stop level.
    StopLoss,
}

/// A complete round-trip trade record: entry → exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub side: PositionSide,

    // ── Entry ──
    pub entry_bar: usize,
    pub entry_timestamp: NaiveDateTime,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_bar: usize,
    pub exit_timestamp: NaiveDateTime,
    pub exit_price: f64,
    pub exit_reason: ExitReason,
}

impl Trade {
    /// Return on the trade as a fraction of entry price, signed by side.
    pub fn return_pct(&self) -> f64 {
        if self.entry_price == 0.0 {
            return 0.0;
        }
        match self.side {
            PositionSide::Long => (self.exit_price - self.entry_price) / self.entry_price,
            PositionSide::Short => (self.entry_price - self.exit_price) / self.entry_price,
            PositionSide::Flat => 0.0,
        }
    }

    pub fn bars_held(&self) -> usize {
        self.exit_bar.saturating_sub(self.entry_bar)
    }

    pub fn is_winner(&self) -> bool {
        self.return_pct() > 0.0
    }
}
