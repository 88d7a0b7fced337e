//! PMaxLab Runner: orchestration around the core engine.
//!
//! This crate builds on `pmaxlab-core` to provide:
//! - CSV bar loading and seeded synthetic bars
//! - Single-job runner with metrics, score and grade
//! - Parallel batches over data sets and strategy variants
//! - Parameter grids
//! - Run configuration files
//! - A lexical risk heuristic over strategy script text

pub mod batch;
pub mod config;
pub mod data_loader;
pub mod metrics;
pub mod risk_heuristic;
pub mod runner;
pub mod scoring;
pub mod sweep;

pub use batch::{BatchReport, BatchRunner, JobFailure};
pub use config::{ConfigError, RunConfig};
pub use data_loader::{load_csv, load_synthetic, LoadError, LoadedBars};
pub use metrics::PerformanceMetrics;
pub use risk_heuristic::{scan_script, RiskHints};
pub use runner::{run_file, run_job, JobResult, RunError};
pub use scoring::{weighted_score, Grade, ScoreRecord};
pub use sweep::ParamGrid;
