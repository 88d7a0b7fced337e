//! Strategy configuration: every tunable of the indicator pipeline, the
//! confirmation filters and the trailing stop, passed explicitly into the
//! engine. No process-wide state.
//!
//! Loaded from TOML; validated before the first bar is processed.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::components::filter::{FilterChain, RocFilter, RsiFilter, SignalFilter, VolatilityFilter};
use crate::components::pm::{PositionError, StopConfig};
use crate::components::signal::SignalKind;
use crate::indicators::{
    BandParams, BandReference, Direction, IndicatorError, MaMethod, SeriesSource,
};

/// Errors raised while loading or validating a configuration. Fatal before
/// the first bar.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config field '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<IndicatorError> for ConfigError {
    fn from(err: IndicatorError) -> Self {
        match err {
            IndicatorError::InvalidParameter { name, reason } => Self::Invalid {
                field: name,
                reason,
            },
        }
    }
}

impl From<PositionError> for ConfigError {
    fn from(err: PositionError) -> Self {
        match err {
            PositionError::InvalidStop { name, reason } => Self::Invalid {
                field: name,
                reason,
            },
            other => Self::Invalid {
                field: "position",
                reason: other.to_string(),
            },
        }
    }
}

/// Which directions the engine may open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradingMode {
    LongOnly,
    ShortOnly,
    #[default]
    LongShort,
}

impl TradingMode {
    /// Whether an entry of this kind is allowed. Exits are always allowed.
    pub fn allows(self, kind: SignalKind) -> bool {
        match (self, kind) {
            (_, SignalKind::ExitLong | SignalKind::ExitShort) => true,
            (Self::LongShort, _) => true,
            (Self::LongOnly, SignalKind::EnterLong) => true,
            (Self::ShortOnly, SignalKind::EnterShort) => true,
            _ => false,
        }
    }
}

/// One confirmation filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterConfig {
    Rsi {
        period: usize,
        long_min: f64,
        short_max: f64,
    },
    Roc {
        period: usize,
        threshold_pct: f64,
    },
    /// ATR as % of close, using the strategy's ATR period.
    Volatility { min_atr_pct: f64, max_atr_pct: f64 },
}

impl FilterConfig {
    pub fn build(&self, atr_period: usize) -> Result<Box<dyn SignalFilter>, IndicatorError> {
        let filter: Box<dyn SignalFilter> = match *self {
            Self::Rsi {
                period,
                long_min,
                short_max,
            } => Box::new(RsiFilter::new(period, long_min, short_max)?),
            Self::Roc {
                period,
                threshold_pct,
            } => Box::new(RocFilter::new(period, threshold_pct)?),
            Self::Volatility {
                min_atr_pct,
                max_atr_pct,
            } => Box::new(VolatilityFilter::new(atr_period, min_atr_pct, max_atr_pct)?),
        };
        Ok(filter)
    }
}

/// Complete strategy configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategyConfig {
    // ── Indicator pipeline ──
    pub atr_period: usize,
    pub ma_method: MaMethod,
    pub ma_period: usize,
    pub long_multiplier: f64,
    pub short_multiplier: f64,
    pub band_reference: BandReference,
    pub base_series: SeriesSource,
    /// Series crossed against the trend line to produce signals.
    pub signal_reference: SeriesSource,
    pub seed_direction: Direction,

    // ── Position management ──
    pub initial_stop_pct: f64,
    pub trailing_stop_pct: f64,
    pub trading_mode: TradingMode,

    // ── Entry confirmation ──
    pub confirmation_filters: Vec<FilterConfig>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            atr_period: 10,
            ma_method: MaMethod::Ema,
            ma_period: 10,
            long_multiplier: 3.0,
            short_multiplier: 3.0,
            band_reference: BandReference::Ma,
            base_series: SeriesSource::Ma,
            signal_reference: SeriesSource::Ma,
            seed_direction: Direction::Up,
            initial_stop_pct: 0.05,
            trailing_stop_pct: 0.03,
            trading_mode: TradingMode::LongShort,
            confirmation_filters: Vec::new(),
        }
    }
}

impl StrategyConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check every field. Runs before any bar is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.atr_period == 0 {
            return Err(invalid("atr_period", "must be > 0"));
        }
        if self.ma_period == 0 {
            return Err(invalid("ma_period", "must be > 0"));
        }
        self.band_params()?;
        self.stop_config().validate()?;
        self.filter_chain()?;
        Ok(())
    }

    pub fn band_params(&self) -> Result<BandParams, IndicatorError> {
        Ok(BandParams::new(self.long_multiplier, self.short_multiplier)?
            .with_seed_direction(self.seed_direction))
    }

    pub fn stop_config(&self) -> StopConfig {
        StopConfig {
            initial_stop_pct: self.initial_stop_pct,
            trailing_stop_pct: self.trailing_stop_pct,
        }
    }

    pub fn filter_chain(&self) -> Result<FilterChain, IndicatorError> {
        let filters = self
            .confirmation_filters
            .iter()
            .map(|f| f.build(self.atr_period))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FilterChain::new(filters))
    }

    /// Bars before both ATR and MA are defined.
    pub fn warmup_bars(&self) -> usize {
        self.atr_period.max(self.ma_period).saturating_sub(1)
    }

    /// BLAKE3 fingerprint of all parameter values, hex-encoded.
    pub fn full_hash(&self) -> String {
        // serde_json keeps struct field order, so the encoding is canonical.
        let canonical =
            serde_json::to_vec(self).unwrap_or_else(|_| format!("{self:?}").into_bytes());
        blake3::hash(&canonical).to_hex().to_string()
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
