//! Bar-by-bar loop.
//!
//! Per bar, in order:
//! 1. An exit signal for the open side closes the position at the close;
//!    otherwise the trailing stop is checked, then ratcheted.
//! 2. If flat, an entry signal allowed by the trading mode runs through the
//!    filter chain and, if it passes, opens a position at the close.
//!
//! A same-bar signal exit therefore takes precedence over the stop.

use tracing::{debug, info};

use crate::components::pm::TrailingStopManager;
use crate::components::signal::{CrossoverDetector, SignalEvent};
use crate::config::StrategyConfig;
use crate::domain::Bar;

use super::precompute::precompute;
use super::state::RunResult;
use super::EngineError;

/// Run one strategy over one bar stream.
pub fn run_backtest(bars: &[Bar], config: &StrategyConfig) -> Result<RunResult, EngineError> {
    config.validate()?;
    check_bars(bars)?;

    let filters = config.filter_chain()?;
    let pre = precompute(bars, config, &filters)?;
    let detector = CrossoverDetector::new(&pre.trend, &pre.signal_reference)?;
    let mut events = detector.events().peekable();

    let mut pm = TrailingStopManager::new(config.stop_config());
    let mut signals = Vec::new();
    let mut trades = Vec::new();
    let mut rejected = Vec::new();
    let mut bar_events: Vec<SignalEvent> = Vec::with_capacity(2);

    for (i, bar) in bars.iter().enumerate() {
        bar_events.clear();
        while let Some(event) = events.next_if(|e| e.bar_index == i) {
            bar_events.push(event);
        }
        signals.extend_from_slice(&bar_events);

        let exit = bar_events
            .iter()
            .find(|e| e.kind.is_exit() && e.kind.side() == pm.state());
        let closed = match exit {
            Some(exit) => pm.apply_signal(exit, bar)?,
            None => pm.on_bar(i, bar),
        };
        if let Some(trade) = closed {
            debug!(
                bar = i,
                side = %trade.side,
                exit_price = trade.exit_price,
                reason = ?trade.exit_reason,
                "position closed"
            );
            trades.push(trade);
        }

        if !pm.is_flat() {
            continue;
        }
        let Some(entry) = bar_events
            .iter()
            .find(|e| e.kind.is_entry() && config.trading_mode.allows(e.kind))
        else {
            continue;
        };

        let outcome = filters.evaluate(entry, bars, &pre.values);
        if outcome.is_passed() {
            pm.apply_signal(entry, bar)?;
            debug!(bar = i, kind = %entry.kind, price = bar.close, "position opened");
        } else {
            debug!(bar = i, kind = %entry.kind, "entry filtered");
            rejected.extend(outcome.rejections().cloned());
        }
    }

    info!(
        bars = bars.len(),
        signals = signals.len(),
        trades = trades.len(),
        rejected = rejected.len(),
        "backtest complete"
    );

    Ok(RunResult {
        signals,
        trades,
        rejected,
        bands: pre.bands,
        open_position: pm.into_position(),
        warmup_bars: config.warmup_bars(),
        bar_count: bars.len(),
        config_hash: config.full_hash(),
    })
}

/// Bars must be non-empty with strictly increasing timestamps.
fn check_bars(bars: &[Bar]) -> Result<(), EngineError> {
    if bars.is_empty() {
        return Err(EngineError::Empty);
    }
    match bars
        .windows(2)
        .position(|w| w[1].timestamp <= w[0].timestamp)
    {
        Some(i) => Err(EngineError::UnorderedBars { index: i + 1 }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::signal::SignalKind;
    use crate::config::{FilterConfig, TradingMode};
    use crate::domain::{ExitReason, PositionSide};
    use crate::indicators::{make_bars, MaMethod};

    /// Up, then down, then up again.
    fn zigzag() -> Vec<Bar> {
        let mut closes = Vec::new();
        for i in 0..30 {
            closes.push(100.0 + i as f64);
        }
        for i in 0..30 {
            closes.push(129.0 - 1.5 * i as f64);
        }
        for i in 0..30 {
            closes.push(85.5 + 2.0 * i as f64);
        }
        make_bars(&closes)
    }

    fn config() -> StrategyConfig {
        StrategyConfig {
            atr_period: 5,
            ma_method: MaMethod::Sma,
            ma_period: 5,
            long_multiplier: 1.0,
            short_multiplier: 1.0,
            initial_stop_pct: 0.2,
            trailing_stop_pct: 0.2,
            ..Default::default()
        }
    }

    #[test]
    fn empty_bars_rejected() {
        assert!(matches!(
            run_backtest(&[], &StrategyConfig::default()),
            Err(EngineError::Empty)
        ));
    }

    #[test]
    fn unordered_bars_rejected() {
        let mut bars = make_bars(&[1.0, 2.0, 3.0, 4.0]);
        bars[2].timestamp = bars[1].timestamp;
        match run_backtest(&bars, &StrategyConfig::default()) {
            Err(EngineError::UnorderedBars { index }) => assert_eq!(index, 2),
            other => panic!("expected UnorderedBars, got {other:?}"),
        }
    }

    #[test]
    fn invalid_config_fails_before_bars() {
        let config = StrategyConfig {
            ma_period: 0,
            ..Default::default()
        };
        assert!(matches!(
            run_backtest(&[], &config),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn trades_alternate_and_never_overlap() {
        let result = run_backtest(&zigzag(), &config()).unwrap();
        assert!(!result.trades.is_empty());
        for pair in result.trades.windows(2) {
            assert!(pair[1].entry_bar >= pair[0].exit_bar);
        }
        if let Some(open) = &result.open_position {
            let last_exit = result.trades.last().map_or(0, |t| t.exit_bar);
            assert!(open.open_bar_index >= last_exit);
        }
    }

    #[test]
    fn signal_exits_fill_at_close() {
        let bars = zigzag();
        let result = run_backtest(&bars, &config()).unwrap();
        for trade in result
            .trades
            .iter()
            .filter(|t| t.exit_reason == ExitReason::Signal)
        {
            assert_eq!(trade.exit_price, bars[trade.exit_bar].close);
        }
    }

    #[test]
    fn long_only_never_shorts() {
        let config = StrategyConfig {
            trading_mode: TradingMode::LongOnly,
            ..config()
        };
        let result = run_backtest(&zigzag(), &config).unwrap();
        assert!(result.count(SignalKind::EnterShort) > 0);
        assert!(result.trades.iter().all(|t| t.side == PositionSide::Long));
        assert!(result
            .open_position
            .iter()
            .all(|p| p.side == PositionSide::Long));
    }

    #[test]
    fn impossible_filter_blocks_every_entry() {
        let config = StrategyConfig {
            confirmation_filters: vec![FilterConfig::Volatility {
                min_atr_pct: 90.0,
                max_atr_pct: 100.0,
            }],
            ..config()
        };
        let result = run_backtest(&zigzag(), &config).unwrap();
        assert!(result.trades.is_empty());
        assert!(result.open_position.is_none());
        assert!(!result.rejected.is_empty());
        assert!(result.rejected.iter().all(|r| r.kind.is_entry()));
    }

    #[test]
    fn result_records_run_metadata() {
        let bars = zigzag();
        let config = config();
        let result = run_backtest(&bars, &config).unwrap();
        assert_eq!(result.bar_count, bars.len());
        assert_eq!(result.bands.len(), bars.len());
        assert_eq!(result.warmup_bars, 4);
        assert_eq!(result.config_hash, config.full_hash());
    }
}
