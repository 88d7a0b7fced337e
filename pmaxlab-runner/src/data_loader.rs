//! Bar loading for the runner.
//!
//! Two sources:
//! 1. CSV files named `SYMBOL_TIMEFRAME.csv` with a
//!    `timestamp,open,high,low,close,volume` header
//! 2. Synthetic bars from a random walk seeded by the symbol name
//!
//! Rows are kept in file order. Ordering is validated by the engine, which
//! rejects a non-increasing stream before the first bar is processed.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use pmaxlab_core::domain::Bar;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path} row {row}: unrecognised timestamp '{value}'")]
    Timestamp {
        path: PathBuf,
        row: usize,
        value: String,
    },

    #[error("file name '{name}' is not SYMBOL_TIMEFRAME")]
    FileName { name: String },

    #[error("{path} contains no bars")]
    Empty { path: PathBuf },
}

/// Bars for one (symbol, timeframe) pair.
#[derive(Debug, Clone)]
pub struct LoadedBars {
    pub symbol: String,
    pub timeframe: String,
    pub bars: Vec<Bar>,
    /// BLAKE3 over every timestamp and OHLCV value.
    pub dataset_hash: String,
    pub synthetic: bool,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

/// Load one CSV file. Symbol and timeframe come from the file stem.
pub fn load_csv(path: impl AsRef<Path>) -> Result<LoadedBars, LoadError> {
    let path = path.as_ref();
    let (symbol, timeframe) = parse_file_stem(path)?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    let mut bars = Vec::new();
    for (row_idx, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| LoadError::Timestamp {
            path: path.to_path_buf(),
            // +2 for 1-indexed and header row
            row: row_idx + 2,
            value: row.timestamp.clone(),
        })?;
        bars.push(Bar {
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }

    if bars.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }

    let insane = bars.iter().filter(|b| !b.is_sane()).count();
    if insane > 0 {
        warn!(
            file = %path.display(),
            insane,
            total = bars.len(),
            "bars failing OHLC sanity checks"
        );
    }
    debug!(%symbol, %timeframe, bars = bars.len(), "loaded CSV");

    let dataset_hash = compute_dataset_hash(&bars);
    Ok(LoadedBars {
        symbol,
        timeframe,
        bars,
        dataset_hash,
        synthetic: false,
    })
}

/// Every `*.csv` file directly inside `dir`, sorted by name.
pub fn discover_csv_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, LoadError> {
    let dir = dir.as_ref();
    let io_err = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if path.is_file() && is_csv {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Split `BTCUSDT_4h.csv` into `("BTCUSDT", "4h")`.
///
/// The timeframe is everything after the last underscore, so symbols may
/// themselves contain underscores.
pub fn parse_file_stem(path: &Path) -> Result<(String, String), LoadError> {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.rsplit_once('_') {
        Some((symbol, timeframe)) if !symbol.is_empty() && !timeframe.is_empty() => {
            Ok((symbol.to_string(), timeframe.to_string()))
        }
        _ => Err(LoadError::FileName { name }),
    }
}

/// Parse a timestamp in any of the accepted formats:
/// RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD`, or an integer epoch
/// (13+ digits are milliseconds, fewer are seconds). Zoned values are
/// converted to UTC.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(ndt);
    }
    if let Ok(nd) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return nd.and_hms_opt(0, 0, 0);
    }

    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let epoch: i64 = raw.parse().ok()?;
    let dt = if digits.len() >= 13 {
        DateTime::from_timestamp_millis(epoch)?
    } else {
        DateTime::from_timestamp(epoch, 0)?
    };
    Some(dt.naive_utc())
}

/// Compute a deterministic BLAKE3 hash over all bar data.
pub fn compute_dataset_hash(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(bar.timestamp.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Generate `count` synthetic daily bars for testing/development.
///
/// A random walk from 100.0 with daily returns within ±3%. The RNG is
/// seeded from the symbol name, so the same symbol always yields the
/// same bars.
pub fn generate_synthetic_bars(symbol: &str, start: NaiveDate, count: usize) -> Vec<Bar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let Some(origin) = start.and_hms_opt(0, 0, 0) else {
        return Vec::new();
    };
    let mut price = 100.0_f64;

    (0..count)
        .map(|i| {
            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000..5_000_000u64) as f64;
            price = close;

            Bar {
                timestamp: origin + chrono::Duration::days(i as i64),
                open,
                high,
                low,
                close,
                volume,
            }
        })
        .collect()
}

/// Synthetic bars wrapped with provenance, timeframe `1d`.
pub fn load_synthetic(symbol: &str, start: NaiveDate, count: usize) -> LoadedBars {
    let bars = generate_synthetic_bars(symbol, start, count);
    let dataset_hash = compute_dataset_hash(&bars);
    LoadedBars {
        symbol: symbol.to_string(),
        timeframe: "1d".to_string(),
        bars,
        dataset_hash,
        synthetic: true,
    }
}
