//! Performance metrics: pure functions over a closed-trade list.
//!
//! Every metric is a pure function: trade list in, scalar out. The equity
//! curve is the compounded per-trade return path starting at 1.0, so the
//! metrics need no capital or sizing assumptions.

use serde::{Deserialize, Serialize};

use pmaxlab_core::domain::Trade;

use crate::scoring::ScoreRecord;

/// Aggregate performance metrics for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Winning trades as a percentage (0–100).
    pub win_rate: f64,
    pub profit_factor: f64,
    pub total_trades: usize,
    /// Compounded net return in percent.
    pub net_profit_pct: f64,
    /// Largest peak-to-trough decline of the trade equity curve, in percent
    /// (positive number).
    pub max_drawdown: f64,
    /// Mean over standard deviation of per-trade returns, not annualised.
    pub sharpe_ratio: f64,
}

impl PerformanceMetrics {
    pub fn compute(trades: &[Trade]) -> Self {
        let curve = equity_curve(trades);
        Self {
            win_rate: win_rate(trades) * 100.0,
            profit_factor: profit_factor(trades),
            total_trades: trades.len(),
            net_profit_pct: net_profit_pct(&curve),
            max_drawdown: -max_drawdown(&curve) * 100.0,
            sharpe_ratio: sharpe_ratio(trades),
        }
    }

    /// The boundary record consumed by the weighted score.
    pub fn to_score_record(&self) -> ScoreRecord {
        ScoreRecord {
            win_rate: self.win_rate,
            profit_factor: self.profit_factor,
            total_trades: self.total_trades as f64,
            net_profit_pct: self.net_profit_pct,
            max_drawdown: self.max_drawdown,
            sharpe_ratio: self.sharpe_ratio,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Compounded equity after each trade, starting at 1.0.
pub fn equity_curve(trades: &[Trade]) -> Vec<f64> {
    let mut equity = 1.0;
    let mut curve = Vec::with_capacity(trades.len() + 1);
    curve.push(equity);
    for trade in trades {
        equity *= 1.0 + trade.return_pct();
        curve.push(equity);
    }
    curve
}

/// Net return of the equity curve in percent.
pub fn net_profit_pct(curve: &[f64]) -> f64 {
    match (curve.first(), curve.last()) {
        (Some(&first), Some(&last)) if first > 0.0 => (last - first) / first * 100.0,
        _ => 0.0,
    }
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
///
/// Returns 0.0 if equity is constant or monotonically increasing.
pub fn max_drawdown(curve: &[f64]) -> f64 {
    let Some(&first) = curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for &eq in curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (eq - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Win rate: fraction of trades that were winners.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Profit factor: sum of winning returns / sum of losing returns.
///
/// Capped at 100.0 for edge cases (all winners, zero losses).
pub fn profit_factor(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = trades
        .iter()
        .map(Trade::return_pct)
        .filter(|r| *r > 0.0)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .map(Trade::return_pct)
        .filter(|r| *r < 0.0)
        .map(f64::abs)
        .sum();

    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

/// Sharpe ratio of per-trade returns with a zero risk-free rate.
///
/// Returns 0.0 with fewer than two trades or zero variance.
pub fn sharpe_ratio(trades: &[Trade]) -> f64 {
    let returns: Vec<f64> = trades.iter().map(Trade::return_pct).collect();
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    mean_f64(&returns) / std
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
