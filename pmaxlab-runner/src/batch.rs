//! Batch execution of independent jobs, optionally in parallel.
//!
//! Each (data set, strategy) pair is its own job with its own engine
//! instance. Results come back in input order whether or not the rayon pool
//! was used, and one job's failure never stops the others.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use pmaxlab_core::StrategyConfig;

use crate::data_loader::LoadedBars;
use crate::runner::{run_job, JobResult, RunError};

/// A job that failed, with enough context to report it.
#[derive(Debug, Clone, Serialize)]
pub struct JobFailure {
    pub symbol: String,
    pub timeframe: String,
    pub config_hash: String,
    pub error: String,
}

/// Outcome of a batch, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<JobResult>,
    pub failures: Vec<JobFailure>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.results.len() + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Results sorted by weighted score, best first.
    pub fn ranked(&self) -> Vec<&JobResult> {
        let mut sorted: Vec<_> = self.results.iter().collect();
        sorted.sort_by(|a, b| b.weighted_score.total_cmp(&a.weighted_score));
        sorted
    }

    pub fn best(&self) -> Option<&JobResult> {
        self.ranked().into_iter().next()
    }
}

/// Batch executor over data sets × strategy variants.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    parallel: bool,
}

impl Default for BatchRunner {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl BatchRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run every strategy over every data set. Order: data set outermost.
    pub fn run(&self, data: &[LoadedBars], strategies: &[StrategyConfig]) -> BatchReport {
        let jobs: Vec<(&LoadedBars, &StrategyConfig)> = data
            .iter()
            .flat_map(|d| strategies.iter().map(move |s| (d, s)))
            .collect();

        info!(
            jobs = jobs.len(),
            parallel = self.parallel,
            "batch starting"
        );

        let outcomes: Vec<Result<JobResult, RunError>> = if self.parallel {
            // Parallel execution using Rayon
            jobs.par_iter().map(|(d, s)| run_job(d, s)).collect()
        } else {
            jobs.iter().map(|(d, s)| run_job(d, s)).collect()
        };

        let mut report = BatchReport::default();
        for ((data, strategy), outcome) in jobs.iter().zip(outcomes) {
            match outcome {
                Ok(result) => report.results.push(result),
                Err(e) => {
                    warn!(symbol = %data.symbol, timeframe = %data.timeframe, error = %e, "job failed");
                    report.failures.push(JobFailure {
                        symbol: data.symbol.clone(),
                        timeframe: data.timeframe.clone(),
                        config_hash: strategy.full_hash(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            succeeded = report.results.len(),
            failed = report.failures.len(),
            "batch complete"
        );
        report
    }
}
