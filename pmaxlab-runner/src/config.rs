//! Run configuration: strategy, data sources, output and execution settings.
//!
//! ```toml
//! [strategy]
//! atr_period = 10
//! ma_method = "ema"
//!
//! [data]
//! dir = "data"
//! files = ["extra/ETHUSDT_1h.csv"]
//!
//! [output]
//! dir = "results"
//!
//! [execution]
//! parallel = true
//!
//! [grid]
//! long_multipliers = [2.0, 3.0]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pmaxlab_core::StrategyConfig;

use crate::data_loader::{discover_csv_files, LoadError};
use crate::sweep::ParamGrid;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Strategy(#[from] pmaxlab_core::ConfigError),
}

/// Where bars come from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Every `*.csv` in this directory is one job.
    pub dir: Option<PathBuf>,
    /// Additional individual files.
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory for per-job JSON results. Nothing is written when unset.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutionConfig {
    /// Run independent jobs on the rayon pool.
    pub parallel: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// A complete run: one strategy (or grid of variants) over many bar files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub strategy: StrategyConfig,
    pub data: DataConfig,
    pub output: OutputConfig,
    pub execution: ExecutionConfig,
    pub grid: Option<ParamGrid>,
}

impl RunConfig {
    /// Parse and validate. Relative data and output paths stay relative
    /// to the working directory.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.strategy.validate()?;
        if let Some(grid) = &config.grid {
            grid.generate_configs(&config.strategy)?;
        }
        Ok(config)
    }

    /// Parse and validate a file. Relative data and output paths resolve
    /// against the file's directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        if let Some(dir) = self.data.dir.as_mut() {
            resolve(dir);
        }
        self.data.files.iter_mut().for_each(resolve);
        if let Some(dir) = self.output.dir.as_mut() {
            resolve(dir);
        }
    }

    /// Directory files first (sorted), then the explicit list, deduplicated.
    pub fn data_files(&self) -> Result<Vec<PathBuf>, LoadError> {
        let mut files = match &self.data.dir {
            Some(dir) => discover_csv_files(dir)?,
            None => Vec::new(),
        };
        for file in &self.data.files {
            if !files.contains(file) {
                files.push(file.clone());
            }
        }
        Ok(files)
    }

    /// Strategy variants to run: the grid expansion, or just the base strategy.
    pub fn strategies(&self) -> Result<Vec<StrategyConfig>, ConfigError> {
        match &self.grid {
            Some(grid) => Ok(grid.generate_configs(&self.strategy)?),
            None => Ok(vec![self.strategy.clone()]),
        }
    }

    /// Deterministic BLAKE3 id of the whole run configuration.
    pub fn run_id(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_else(|_| format!("{self:?}").into_bytes());
        blake3::hash(&bytes).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmaxlab_core::indicators::MaMethod;

    #[test]
    fn empty_document_uses_defaults() {
        let config = RunConfig::from_toml_str("").unwrap();
        assert_eq!(config.strategy, StrategyConfig::default());
        assert!(config.execution.parallel);
        assert!(config.grid.is_none());
        assert!(config.data.files.is_empty());
    }

    #[test]
    fn full_document_parses() {
        let config = RunConfig::from_toml_str(
            r#"
            [strategy]
            atr_period = 14
            ma_method = "sma"
            ma_period = 20

            [data]
            dir = "data"
            files = ["more/ETH_1h.csv"]

            [output]
            dir = "out"

            [execution]
            parallel = false

            [grid]
            long_multipliers = [2.0, 3.0]
            "#,
        )
        .unwrap();

        assert_eq!(config.strategy.atr_period, 14);
        assert_eq!(config.strategy.ma_method, MaMethod::Sma);
        assert_eq!(config.data.dir, Some(PathBuf::from("data")));
        assert_eq!(config.output.dir, Some(PathBuf::from("out")));
        assert!(!config.execution.parallel);
        assert_eq!(config.strategies().unwrap().len(), 2);
    }

    #[test]
    fn invalid_strategy_rejected() {
        let err = RunConfig::from_toml_str("[strategy]\natr_period = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Strategy(_)));
    }

    #[test]
    fn invalid_grid_value_rejected_at_parse() {
        let err = RunConfig::from_toml_str("[grid]\nma_periods = [0, 10]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Strategy(_)));

        let err = RunConfig::from_toml_str("[grid]\ntrailing_stop_pcts = [0.03, 1.5]\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Strategy(_)));
    }

    #[test]
    fn unknown_section_rejected() {
        let err = RunConfig::from_toml_str("[backtest]\nsymbol = \"SPY\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn from_file_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(&path, "[data]\ndir = \"bars\"\n[output]\ndir = \"/abs/out\"\n").unwrap();

        let config = RunConfig::from_file(&path).unwrap();
        assert_eq!(config.data.dir, Some(dir.path().join("bars")));
        assert_eq!(config.output.dir, Some(PathBuf::from("/abs/out")));
    }

    #[test]
    fn run_id_is_deterministic_and_sensitive() {
        let a = RunConfig::default();
        let mut b = a.clone();
        assert_eq!(a.run_id(), b.run_id());
        b.strategy.ma_period = 21;
        assert_ne!(a.run_id(), b.run_id());
    }
}
