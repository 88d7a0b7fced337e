//! PMaxLab CLI: backtest, synthetic, scoring and risk-hint commands.
//!
//! Commands:
//! - `run`: execute a run config (data files × strategy variants)
//! - `synthetic`: run one strategy over seeded synthetic bars
//! - `score`: weighted score and grade for a score record
//! - `risk-hints`: lexical stop/take-profit/trailing scan of a script
//!
//! Logs go to stderr; results go to stdout or the output directory.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

use pmaxlab_core::StrategyConfig;
use pmaxlab_runner::{
    load_csv, load_synthetic, run_job, scan_script, BatchReport, BatchRunner, JobResult,
    RunConfig, ScoreRecord,
};

#[derive(Parser)]
#[command(name = "pmaxlab", about = "PMaxLab CLI: PMax trend-state backtesting")]
struct Cli {
    /// Debug-level logging (RUST_LOG overrides).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a run config: every data file against every strategy variant.
    Run {
        /// Path to a TOML run config.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for result JSON. Overrides `[output] dir`.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Run jobs one at a time even if the config enables parallelism.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
    /// Run one strategy over seeded synthetic daily bars.
    Synthetic {
        /// Symbol name; also seeds the random walk.
        #[arg(long, default_value = "SYNTH")]
        symbol: String,

        /// Number of bars to generate.
        #[arg(long, default_value_t = 500)]
        bars: usize,

        /// First bar date (YYYY-MM-DD).
        #[arg(long, default_value = "2020-01-01")]
        start: String,

        /// Strategy TOML file. Defaults to the built-in strategy.
        #[arg(long)]
        strategy: Option<PathBuf>,

        /// Print the full result as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Weighted score and grade for a score record.
    Score {
        /// JSON file holding a score record. Missing fields count as 0.
        #[arg(long)]
        file: Option<PathBuf>,

        #[arg(long)]
        win_rate: Option<f64>,

        #[arg(long)]
        profit_factor: Option<f64>,

        #[arg(long)]
        total_trades: Option<f64>,

        #[arg(long)]
        net_profit_pct: Option<f64>,
    },
    /// Lexical scan of a strategy script for risk-management keywords.
    RiskHints {
        /// Script file to scan.
        script: PathBuf,
    },
}

fn init_tracing(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing: {err}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Run {
            config,
            output_dir,
            sequential,
        } => run_cmd(&config, output_dir, sequential),
        Commands::Synthetic {
            symbol,
            bars,
            start,
            strategy,
            json,
        } => synthetic_cmd(&symbol, bars, &start, strategy.as_deref(), json),
        Commands::Score {
            file,
            win_rate,
            profit_factor,
            total_trades,
            net_profit_pct,
        } => {
            let mut record = match file {
                Some(path) => read_score_record(&path)?,
                None => ScoreRecord::default(),
            };
            // Flags override file values
            record.win_rate = win_rate.unwrap_or(record.win_rate);
            record.profit_factor = profit_factor.unwrap_or(record.profit_factor);
            record.total_trades = total_trades.unwrap_or(record.total_trades);
            record.net_profit_pct = net_profit_pct.unwrap_or(record.net_profit_pct);
            score_cmd(&record)
        }
        Commands::RiskHints { script } => risk_hints_cmd(&script),
    }
}

fn run_cmd(config_path: &Path, output_dir: Option<PathBuf>, sequential: bool) -> Result<()> {
    let config = RunConfig::from_file(config_path)
        .with_context(|| format!("loading run config {}", config_path.display()))?;

    let files = config.data_files().context("listing data files")?;
    if files.is_empty() {
        bail!("no data files: set [data] dir or [data] files");
    }

    let data = files
        .iter()
        .map(|path| load_csv(path).with_context(|| format!("loading {}", path.display())))
        .collect::<Result<Vec<_>>>()?;

    let strategies = config.strategies().context("expanding the parameter grid")?;
    info!(
        run_id = %config.run_id(),
        files = data.len(),
        strategies = strategies.len(),
        "run starting"
    );

    let report = BatchRunner::new()
        .with_parallelism(config.execution.parallel && !sequential)
        .run(&data, &strategies);

    print_table(&report);

    if let Some(dir) = output_dir.or(config.output.dir) {
        save_report(&report, &dir)?;
        println!("Results saved to: {}", dir.display());
    }

    if !report.failures.is_empty() {
        for failure in &report.failures {
            eprintln!("Error for {} {}: {}", failure.symbol, failure.timeframe, failure.error);
        }
        bail!("{} of {} jobs failed", report.failures.len(), report.len());
    }
    Ok(())
}

fn synthetic_cmd(
    symbol: &str,
    bars: usize,
    start: &str,
    strategy: Option<&Path>,
    json: bool,
) -> Result<()> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d")
        .with_context(|| format!("invalid --start '{start}', expected YYYY-MM-DD"))?;
    let config = match strategy {
        Some(path) => StrategyConfig::from_file(path)
            .with_context(|| format!("loading strategy {}", path.display()))?,
        None => StrategyConfig::default(),
    };

    let data = load_synthetic(symbol, start, bars);
    let result = run_job(&data, &config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }
    Ok(())
}

fn read_score_record(path: &Path) -> Result<ScoreRecord> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn score_cmd(record: &ScoreRecord) -> Result<()> {
    let out = serde_json::json!({
        "record": record,
        "score": record.score(),
        "grade": record.grade().to_string(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn risk_hints_cmd(script: &Path) -> Result<()> {
    let text = std::fs::read_to_string(script)
        .with_context(|| format!("reading {}", script.display()))?;
    let hints = scan_script(&text);
    let out = serde_json::json!({
        "heuristic": "lexical",
        "script": script.display().to_string(),
        "hints": hints,
        "mentions_risk": hints.mentions_risk(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn save_report(report: &BatchReport, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    for result in &report.results {
        let path = dir.join(format!("{}.json", result.file_stem()));
        let json = serde_json::to_string_pretty(result)?;
        std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    }
    if !report.failures.is_empty() {
        let path = dir.join("failures.json");
        std::fs::write(&path, serde_json::to_string_pretty(&report.failures)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

fn print_table(report: &BatchReport) {
    println!();
    println!(
        "{:<12} {:<6} {:<10} {:>7} {:>8} {:>7} {:>9} {:>8} {:>7} {:>5}",
        "Symbol", "TF", "Config", "Trades", "Win %", "PF", "Net %", "MaxDD %", "Score", "Grade"
    );
    println!("{}", "-".repeat(89));
    for r in report.ranked() {
        let short: String = r.config_hash.chars().take(8).collect();
        println!(
            "{:<12} {:<6} {:<10} {:>7} {:>8.1} {:>7.2} {:>9.2} {:>8.2} {:>7.2} {:>5}",
            r.symbol,
            r.timeframe,
            short,
            r.metrics.total_trades,
            r.metrics.win_rate,
            r.metrics.profit_factor,
            r.metrics.net_profit_pct,
            r.metrics.max_drawdown,
            r.weighted_score,
            r.grade.to_string(),
        );
    }
    println!();
}

fn print_summary(result: &JobResult) {
    let run = &result.run;
    println!();
    println!("=== Backtest Result ===");
    println!("Symbol:         {} ({})", result.symbol, result.timeframe);
    println!("Period:         {} to {}", result.start, result.end);
    println!("Bars:           {} ({} warmup)", run.bar_count, run.warmup_bars);
    println!("Signals:        {}", run.signals.len());
    println!("Filtered:       {}", run.rejected.len());
    println!("Trades:         {}", result.metrics.total_trades);
    println!("Stop-outs:      {}", run.stop_outs());
    if let Some(open) = &run.open_position {
        println!(
            "Open position:  {} from bar {} at {:.4} (stop {:.4})",
            open.side, open.open_bar_index, open.entry_price, open.current_stop_price
        );
    }
    println!();
    println!("--- Performance ---");
    println!("Net Profit:     {:.2}%", result.metrics.net_profit_pct);
    println!("Max Drawdown:   {:.2}%", result.metrics.max_drawdown);
    println!("Win Rate:       {:.1}%", result.metrics.win_rate);
    println!("Profit Factor:  {:.2}", result.metrics.profit_factor);
    println!("Sharpe (trade): {:.3}", result.metrics.sharpe_ratio);
    println!("Score:          {:.2} ({})", result.weighted_score, result.grade);
    if result.synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();
}
