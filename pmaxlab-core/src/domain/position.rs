//! Position: the single open position owned by the trailing-stop manager.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position side. `Flat` doubles as the manager's idle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionSide {
    Flat,
    Long,
    Short,
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flat => write!(f, "flat"),
            Self::Long => write!(f, "long"),
            Self::Short => write!(f, "short"),
        }
    }
}

/// An open position with its adaptive stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: PositionSide,
    pub entry_price: f64,
    /// Stop level in force. Only ever moves in the position's favour.
    pub current_stop_price: f64,
    /// Highest high since entry for longs, lowest low for shorts.
    pub favorable_extreme: f64,
    pub open_bar_index: usize,
    pub entry_timestamp: NaiveDateTime,
}

impl Position {
    pub fn new_long(
        entry_price: f64,
        stop_price: f64,
        open_bar_index: usize,
        entry_timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            side: PositionSide::Long,
            entry_price,
            current_stop_price: stop_price,
            favorable_extreme: entry_price,
            open_bar_index,
            entry_timestamp,
        }
    }

    pub fn new_short(
        entry_price: f64,
        stop_price: f64,
        open_bar_index: usize,
        entry_timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            side: PositionSide::Short,
            entry_price,
            current_stop_price: stop_price,
            favorable_extreme: entry_price,
            open_bar_index,
            entry_timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn new_long_starts_extreme_at_entry() {
        let pos = Position::new_long(100.0, 95.0, 3, ts());
        assert_eq!(pos.side, PositionSide::Long);
        assert_eq!(pos.favorable_extreme, 100.0);
        assert_eq!(pos.current_stop_price, 95.0);
    }

    #[test]
    fn new_short_starts_extreme_at_entry() {
        let pos = Position::new_short(100.0, 105.0, 0, ts());
        assert_eq!(pos.side, PositionSide::Short);
        assert_eq!(pos.favorable_extreme, 100.0);
    }

    #[test]
    fn side_display() {
        assert_eq!(PositionSide::Long.to_string(), "long");
        assert_eq!(PositionSide::Flat.to_string(), "flat");
    }
}
