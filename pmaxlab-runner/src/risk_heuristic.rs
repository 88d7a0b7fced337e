//! Lexical risk heuristic over raw strategy script text.
//!
//! A case-insensitive substring scan for stop-loss, take-profit and
//! trailing-stop keywords. It says what words a script contains, not what the
//! script does: a commented-out `stop` counts, a stop built from an
//! unusual identifier does not. Results are never reconciled with a
//! [`StrategyConfig`](pmaxlab_core::StrategyConfig) and the two may disagree.

use serde::{Deserialize, Serialize};

const STOP_KEYWORDS: &[&str] = &["stop", "sl="];
const TAKE_PROFIT_KEYWORDS: &[&str] = &["take", "profit", "tp="];
const TRAILING_KEYWORDS: &[&str] = &["trail"];

/// Keyword hits for one script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskHints {
    pub stop_loss: bool,
    pub take_profit: bool,
    pub trailing_stop: bool,
    /// Keywords that matched, in table order.
    pub matched: Vec<String>,
}

impl RiskHints {
    /// True if any risk keyword appeared.
    pub fn mentions_risk(&self) -> bool {
        self.stop_loss || self.take_profit || self.trailing_stop
    }
}

pub fn scan_script(text: &str) -> RiskHints {
    let haystack = text.to_lowercase();
    let mut matched = Vec::new();
    let mut hit = |keywords: &[&str]| {
        let before = matched.len();
        matched.extend(
            keywords
                .iter()
                .filter(|k| haystack.contains(**k))
                .map(|k| k.to_string()),
        );
        matched.len() > before
    };

    let stop_loss = hit(STOP_KEYWORDS);
    let take_profit = hit(TAKE_PROFIT_KEYWORDS);
    let trailing_stop = hit(TRAILING_KEYWORDS);

    RiskHints {
        stop_loss,
        take_profit,
        trailing_stop,
        matched,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pine_style_exit_detected() {
        let script = r#"strategy.exit("x", "long", stop=low*0.95, limit=high*1.1, trail_points=50)"#;
        let hints = scan_script(script);
        assert!(hints.stop_loss);
        assert!(hints.trailing_stop);
        assert!(!hints.take_profit);
        assert_eq!(hints.matched, vec!["stop", "trail"]);
    }

    #[test]
    fn case_insensitive() {
        let hints = scan_script("// Take Profit at 2R\nSL=1.5");
        assert!(hints.take_profit);
        assert!(hints.stop_loss);
        assert!(hints.mentions_risk());
    }

    #[test]
    fn plain_script_has_no_hints() {
        let hints = scan_script("plot(ta.sma(close, 20))");
        assert_eq!(hints, RiskHints::default());
        assert!(!hints.mentions_risk());
    }

    #[test]
    fn comments_count_as_hits() {
        let hints = scan_script("// no stop here, we never exit");
        assert!(hints.stop_loss);
    }
}
