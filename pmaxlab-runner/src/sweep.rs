//! Parameter grids: strategy variants around a base configuration.

use serde::{Deserialize, Serialize};

use pmaxlab_core::indicators::MaMethod;
use pmaxlab_core::{ConfigError, StrategyConfig};

/// Values to sweep for each parameter. An empty list keeps the base value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParamGrid {
    pub atr_periods: Vec<usize>,
    pub ma_methods: Vec<MaMethod>,
    pub ma_periods: Vec<usize>,
    pub long_multipliers: Vec<f64>,
    pub short_multipliers: Vec<f64>,
    pub trailing_stop_pcts: Vec<f64>,
}

impl ParamGrid {
    /// Number of combinations.
    pub fn size(&self) -> usize {
        fn n<T>(values: &[T]) -> usize {
            values.len().max(1)
        }
        n(&self.atr_periods)
            * n(&self.ma_methods)
            * n(&self.ma_periods)
            * n(&self.long_multipliers)
            * n(&self.short_multipliers)
            * n(&self.trailing_stop_pcts)
    }

    /// Every combination, in nested-loop order (ATR period outermost).
    /// The first invalid combination fails the whole grid.
    pub fn generate_configs(
        &self,
        base: &StrategyConfig,
    ) -> Result<Vec<StrategyConfig>, ConfigError> {
        fn or_base<T: Copy>(values: &[T], base: T) -> Vec<T> {
            if values.is_empty() {
                vec![base]
            } else {
                values.to_vec()
            }
        }

        let mut configs = Vec::with_capacity(self.size());
        for atr_period in or_base(&self.atr_periods, base.atr_period) {
            for ma_method in or_base(&self.ma_methods, base.ma_method) {
                for ma_period in or_base(&self.ma_periods, base.ma_period) {
                    for long_multiplier in or_base(&self.long_multipliers, base.long_multiplier) {
                        for short_multiplier in
                            or_base(&self.short_multipliers, base.short_multiplier)
                        {
                            for trailing_stop_pct in
                                or_base(&self.trailing_stop_pcts, base.trailing_stop_pct)
                            {
                                let config = StrategyConfig {
                                    atr_period,
                                    ma_method,
                                    ma_period,
                                    long_multiplier,
                                    short_multiplier,
                                    trailing_stop_pct,
                                    ..base.clone()
                                };
                                config.validate()?;
                                configs.push(config);
                            }
                        }
                    }
                }
            }
        }
        Ok(configs)
    }
}
