//! Position management: the adaptive trailing-stop state machine.
//!
//! States are `Flat | Long | Short`, starting `Flat`. Signals open and close
//! positions at the bar's close; [`TrailingStopManager::on_bar`] checks the
//! stop in force at the start of the bar, then ratchets it. Stops may
//! tighten but never loosen.

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, ExitReason, Position, PositionSide, Trade};

use super::signal::{SignalEvent, SignalKind};

/// Errors raised by the position manager.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PositionError {
    #[error("bar {bar_index}: {event} is not valid while {state}")]
    InvalidState {
        state: PositionSide,
        event: SignalKind,
        bar_index: usize,
    },
    #[error("invalid stop parameter '{name}': {reason}")]
    InvalidStop { name: &'static str, reason: String },
}

/// Stop distances as fractions of price (0.05 = 5%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopConfig {
    pub initial_stop_pct: f64,
    pub trailing_stop_pct: f64,
}

impl StopConfig {
    pub fn new(initial_stop_pct: f64, trailing_stop_pct: f64) -> Result<Self, PositionError> {
        let config = Self {
            initial_stop_pct,
            trailing_stop_pct,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PositionError> {
        for (name, value) in [
            ("initial_stop_pct", self.initial_stop_pct),
            ("trailing_stop_pct", self.trailing_stop_pct),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(PositionError::InvalidStop {
                    name,
                    reason: format!("must be within (0, 1), got {value}"),
                });
            }
        }
        Ok(())
    }
}

/// Owns the single open position, if any.
#[derive(Debug, Clone)]
pub struct TrailingStopManager {
    config: StopConfig,
    position: Option<Position>,
}

impl TrailingStopManager {
    pub fn new(config: StopConfig) -> Self {
        Self {
            config,
            position: None,
        }
    }

    pub fn config(&self) -> &StopConfig {
        &self.config
    }

    pub fn state(&self) -> PositionSide {
        self.position
            .as_ref()
            .map_or(PositionSide::Flat, |p| p.side)
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    /// Consume the manager, returning the position still open.
    pub fn into_position(self) -> Option<Position> {
        self.position
    }

    /// Apply an entry or exit signal at `bar`'s close.
    ///
    /// Entering while not flat, exiting while flat, or exiting the other
    /// side are state errors. An exit returns the closed trade.
    pub fn apply_signal(
        &mut self,
        event: &SignalEvent,
        bar: &Bar,
    ) -> Result<Option<Trade>, PositionError> {
        let invalid = || PositionError::InvalidState {
            state: self.state(),
            event: event.kind,
            bar_index: event.bar_index,
        };

        if event.kind.is_entry() {
            if self.position.is_some() {
                return Err(invalid());
            }
            let entry = bar.close;
            self.position = Some(match event.kind {
                SignalKind::EnterLong => Position::new_long(
                    entry,
                    entry * (1.0 - self.config.initial_stop_pct),
                    event.bar_index,
                    bar.timestamp,
                ),
                _ => Position::new_short(
                    entry,
                    entry * (1.0 + self.config.initial_stop_pct),
                    event.bar_index,
                    bar.timestamp,
                ),
            });
            return Ok(None);
        }

        match &self.position {
            Some(p) if p.side == event.kind.side() => {}
            _ => return Err(invalid()),
        }
        Ok(self.close(event.bar_index, bar, bar.close, ExitReason::Signal))
    }

    /// Per-bar stop maintenance for bars after the entry bar.
    ///
    /// 1. Stop check against the stop in force at the start of the bar,
    ///    filled at the stop level.
    /// 2. Otherwise, on a new favourable extreme, tighten the stop from the
    ///    close.
    pub fn on_bar(&mut self, bar_index: usize, bar: &Bar) -> Option<Trade> {
        let trail = self.config.trailing_stop_pct;
        let position = self.position.as_mut()?;
        if bar_index <= position.open_bar_index {
            return None;
        }

        let stop = position.current_stop_price;
        match position.side {
            PositionSide::Long => {
                if bar.low <= stop {
                    return self.close(bar_index, bar, stop, ExitReason::StopLoss);
                }
                if bar.high > position.favorable_extreme {
                    position.favorable_extreme = bar.high;
                    position.current_stop_price = stop.max(bar.close * (1.0 - trail));
                }
            }
            PositionSide::Short => {
                if bar.high >= stop {
                    return self.close(bar_index, bar, stop, ExitReason::StopLoss);
                }
                if bar.low < position.favorable_extreme {
                    position.favorable_extreme = bar.low;
                    position.current_stop_price = stop.min(bar.close * (1.0 + trail));
                }
            }
            PositionSide::Flat => {}
        }
        None
    }

    fn close(
        &mut self,
        bar_index: usize,
        bar: &Bar,
        exit_price: f64,
        exit_reason: ExitReason,
    ) -> Option<Trade> {
        let position = self.position.take()?;
        Some(Trade {
            side: position.side,
            entry_bar: position.open_bar_index,
            entry_timestamp: position.entry_timestamp,
            entry_price: position.entry_price,
            exit_bar: bar_index,
            exit_timestamp: bar.timestamp,
            exit_price,
            exit_reason,
        })
    }
}
