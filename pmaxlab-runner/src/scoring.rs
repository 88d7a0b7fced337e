//! Weighted score and letter grade over a boundary score record.
//!
//! ```text
//! score = 0.30*T(win_rate) + 0.25*T((profit_factor-1)*50)
//!       + 0.15*T(total_trades/2) + 0.30*T(net_profit_pct/2)
//! ```
//!
//! `T` clamps each term to [0, 100]; a NaN term counts as 0.

use serde::{Deserialize, Serialize};

/// Boundary record produced by an external aggregator, or from
/// [`PerformanceMetrics`](crate::metrics::PerformanceMetrics). Absent
/// fields deserialize to 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreRecord {
    pub win_rate: f64,
    pub profit_factor: f64,
    pub total_trades: f64,
    pub net_profit_pct: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
}

impl ScoreRecord {
    pub fn score(&self) -> f64 {
        weighted_score(self)
    }

    pub fn grade(&self) -> Grade {
        Grade::from_score(self.score())
    }
}

/// Letter grade for a weighted score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// `<50 F`, `[50,60) D`, `[60,70) C`, `[70,80) B`, `>=80 A`.
    /// A NaN score grades F.
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::A
        } else if score >= 70.0 {
            Self::B
        } else if score >= 60.0 {
            Self::C
        } else if score >= 50.0 {
            Self::D
        } else {
            Self::F
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        };
        f.write_str(s)
    }
}

const WIN_RATE_WEIGHT: f64 = 0.30;
const PROFIT_FACTOR_WEIGHT: f64 = 0.25;
const TRADES_WEIGHT: f64 = 0.15;
const NET_PROFIT_WEIGHT: f64 = 0.30;

pub fn weighted_score(record: &ScoreRecord) -> f64 {
    WIN_RATE_WEIGHT * term(record.win_rate)
        + PROFIT_FACTOR_WEIGHT * term((record.profit_factor - 1.0) * 50.0)
        + TRADES_WEIGHT * term(record.total_trades / 2.0)
        + NET_PROFIT_WEIGHT * term(record.net_profit_pct / 2.0)
}

fn term(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}
