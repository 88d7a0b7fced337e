//! Integration tests for the runner's data pipeline.
//!
//! CSV files are written into a temp directory next to a run config, then
//! discovered, loaded and run through a batch exactly as the CLI does.

use std::fmt::Write as _;
use std::path::Path;

use chrono::NaiveDate;
use pmaxlab_core::domain::Bar;
use pmaxlab_runner::data_loader::{generate_synthetic_bars, load_csv, LoadError};
use pmaxlab_runner::{BatchRunner, RunConfig};

fn write_bars(dir: &Path, name: &str, bars: &[Bar], epoch_ms: bool) {
    let mut body = String::from("timestamp,open,high,low,close,volume\n");
    for bar in bars {
        let ts = if epoch_ms {
            bar.timestamp.and_utc().timestamp_millis().to_string()
        } else {
            bar.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
        };
        writeln!(
            body,
            "{ts},{},{},{},{},{}",
            bar.open, bar.high, bar.low, bar.close, bar.volume
        )
        .unwrap();
    }
    std::fs::write(dir.join(name), body).unwrap();
}

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
}

#[test]
fn csv_round_trip_preserves_bars() {
    let dir = tempfile::tempdir().unwrap();
    let bars = generate_synthetic_bars("SPY", start(), 120);
    write_bars(dir.path(), "SPY_1d.csv", &bars, false);

    let loaded = load_csv(dir.path().join("SPY_1d.csv")).unwrap();
    assert_eq!(loaded.symbol, "SPY");
    assert_eq!(loaded.bars.len(), 120);
    for (a, b) in loaded.bars.iter().zip(&bars) {
        assert_eq!(a.timestamp, b.timestamp);
        // Rust's float Display is round-trip exact
        assert_eq!(a.close, b.close);
    }
}

#[test]
fn epoch_millisecond_files_load() {
    let dir = tempfile::tempdir().unwrap();
    let bars = generate_synthetic_bars("BTCUSDT", start(), 50);
    write_bars(dir.path(), "BTCUSDT_4h.csv", &bars, true);

    let loaded = load_csv(dir.path().join("BTCUSDT_4h.csv")).unwrap();
    assert_eq!(loaded.timeframe, "4h");
    assert_eq!(loaded.bars[49].timestamp, bars[49].timestamp);
}

#[test]
fn run_config_drives_a_batch_over_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("bars");
    std::fs::create_dir(&data_dir).unwrap();
    for symbol in ["SPY", "QQQ"] {
        let bars = generate_synthetic_bars(symbol, start(), 200);
        write_bars(&data_dir, &format!("{symbol}_1d.csv"), &bars, false);
    }

    let config_path = dir.path().join("run.toml");
    std::fs::write(
        &config_path,
        r#"
[strategy]
atr_period = 10
ma_method = "sma"
ma_period = 10

[data]
dir = "bars"

[execution]
parallel = false

[grid]
long_multipliers = [2.0, 3.0]
"#,
    )
    .unwrap();

    let config = RunConfig::from_file(&config_path).unwrap();
    let files = config.data_files().unwrap();
    assert_eq!(files.len(), 2);

    let data = files
        .iter()
        .map(load_csv)
        .collect::<Result<Vec<_>, LoadError>>()
        .unwrap();
    let report = BatchRunner::new()
        .with_parallelism(config.execution.parallel)
        .run(&data, &config.strategies().unwrap());

    assert_eq!(report.results.len(), 4);
    assert!(report.failures.is_empty());
    // Directory files are sorted: QQQ before SPY
    assert_eq!(report.results[0].symbol, "QQQ");
    assert_eq!(report.results[2].symbol, "SPY");
}

#[test]
fn unordered_file_fails_only_its_own_job() {
    let dir = tempfile::tempdir().unwrap();
    let good = generate_synthetic_bars("SPY", start(), 80);
    let mut bad = generate_synthetic_bars("QQQ", start(), 80);
    bad.swap(20, 21);
    write_bars(dir.path(), "SPY_1d.csv", &good, false);
    write_bars(dir.path(), "QQQ_1d.csv", &bad, false);

    let data = vec![
        load_csv(dir.path().join("QQQ_1d.csv")).unwrap(),
        load_csv(dir.path().join("SPY_1d.csv")).unwrap(),
    ];
    let report = BatchRunner::new().run(&data, &[Default::default()]);
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].error.contains("QQQ"));
}

#[test]
fn malformed_rows_surface_as_csv_errors() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("SPY_1d.csv"),
        "timestamp,open,high,low,close,volume\n2024-01-02,abc,1,1,1,1\n",
    )
    .unwrap();
    assert!(matches!(
        load_csv(dir.path().join("SPY_1d.csv")),
        Err(LoadError::Csv { .. })
    ));
}
