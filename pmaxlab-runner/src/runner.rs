//! Backtest runner: wires loaded bars, the core engine, metrics and scoring.
//!
//! Two entry points:
//! - `run_job()`: takes pre-loaded bars. Used by batches and sweeps.
//! - `run_file()`: loads a CSV file, then runs.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, info_span};

use pmaxlab_core::{run_backtest, EngineError, RunResult, StrategyConfig};

use crate::data_loader::{load_csv, LoadError, LoadedBars};
use crate::metrics::PerformanceMetrics;
use crate::scoring::{Grade, ScoreRecord};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("data error: {0}")]
    Load(#[from] LoadError),

    #[error("{symbol} {timeframe}: {source}")]
    Engine {
        symbol: String,
        timeframe: String,
        #[source]
        source: EngineError,
    },
}

/// Current schema version for persisted results.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of one (symbol, timeframe, strategy) job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub timeframe: String,
    pub config: StrategyConfig,
    pub config_hash: String,
    pub dataset_hash: String,
    pub synthetic: bool,
    pub start: String,
    pub end: String,
    pub metrics: PerformanceMetrics,
    pub score: ScoreRecord,
    pub weighted_score: f64,
    pub grade: Grade,
    pub run: RunResult,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl JobResult {
    /// `SYMBOL_TIMEFRAME_<hash8>`, unique per data file and strategy variant.
    pub fn file_stem(&self) -> String {
        let short: String = self.config_hash.chars().take(8).collect();
        format!("{}_{}_{short}", self.symbol, self.timeframe)
    }
}

/// Run one strategy over pre-loaded bars. No I/O.
pub fn run_job(data: &LoadedBars, config: &StrategyConfig) -> Result<JobResult, RunError> {
    let span = info_span!("job", symbol = %data.symbol, timeframe = %data.timeframe);
    let _guard = span.enter();

    let run = run_backtest(&data.bars, config).map_err(|source| RunError::Engine {
        symbol: data.symbol.clone(),
        timeframe: data.timeframe.clone(),
        source,
    })?;

    let metrics = PerformanceMetrics::compute(&run.trades);
    let score = metrics.to_score_record();
    let weighted_score = score.score();
    let grade = score.grade();

    info!(
        trades = metrics.total_trades,
        net_profit_pct = metrics.net_profit_pct,
        score = weighted_score,
        %grade,
        "job complete"
    );

    let timestamp_at = |i: Option<usize>| {
        i.and_then(|i| data.bars.get(i))
            .map(|b| b.timestamp.to_string())
            .unwrap_or_default()
    };

    Ok(JobResult {
        schema_version: SCHEMA_VERSION,
        symbol: data.symbol.clone(),
        timeframe: data.timeframe.clone(),
        config: config.clone(),
        config_hash: run.config_hash.clone(),
        dataset_hash: data.dataset_hash.clone(),
        synthetic: data.synthetic,
        start: timestamp_at(Some(0)),
        end: timestamp_at(data.bars.len().checked_sub(1)),
        metrics,
        score,
        weighted_score,
        grade,
        run,
    })
}

/// Load a `SYMBOL_TIMEFRAME.csv` file and run one strategy over it.
pub fn run_file(path: impl AsRef<Path>, config: &StrategyConfig) -> Result<JobResult, RunError> {
    let data = load_csv(path)?;
    run_job(&data, config)
}
