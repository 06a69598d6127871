//! ro-logging: NDJSON events + tracing setup.
//!
//! Calculation summaries and per-combination records are appended as one JSON
//! object per line so a run can be inspected after the fact.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use ro_core::{CombinationRecord, Coverage, FinishOrder, ProbabilityTable};
use serde::Serialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Event schema version.
pub const EVENT_SCHEMA_VERSION: u32 = 1;

pub fn now_ms() -> u64 {
    let d = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    d.as_millis() as u64
}

/// Stable content hash for a scenario or config file.
pub fn hash_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Summary of one finished calculation.
#[derive(Debug, Clone, Serialize)]
pub struct CalcEventV1 {
    pub event: &'static str,
    pub v: u32,
    pub ts_ms: u64,

    pub scenario_hash: Option<String>,
    pub coverage: Coverage,
    pub combinations: u64,
    pub elapsed_ms: u64,

    pub leader_order: Option<FinishOrder>,
    pub leader_percent: Option<f64>,
}

impl CalcEventV1 {
    pub fn from_table(
        table: &ProbabilityTable,
        scenario_hash: Option<String>,
        elapsed_ms: u64,
    ) -> Self {
        let best = table.most_likely();
        Self {
            event: "calc_done",
            v: EVENT_SCHEMA_VERSION,
            ts_ms: now_ms(),
            scenario_hash,
            coverage: table.coverage,
            combinations: table.combinations,
            elapsed_ms,
            leader_order: best.map(|o| o.order.clone()),
            leader_percent: best.map(|o| o.percent),
        }
    }
}

/// One played-out combination.
#[derive(Debug, Clone, Serialize)]
pub struct CombinationEventV1<'a> {
    pub event: &'static str,
    #[serde(flatten)]
    pub record: &'a CombinationRecord,
}

impl<'a> CombinationEventV1<'a> {
    pub fn new(record: &'a CombinationRecord) -> Self {
        Self {
            event: "combination",
            record,
        }
    }
}

#[derive(Debug, Error)]
pub enum NdjsonError {
    #[error("ndjson io: {0}")]
    Io(#[from] io::Error),
    #[error("ndjson encode: {0}")]
    Json(#[from] serde_json::Error),
}

/// Append-only NDJSON writer.
///
/// Contract: each call writes exactly one JSON object followed by a newline.
pub struct NdjsonWriter {
    w: BufWriter<File>,
    lines_since_flush: u64,
    flush_every_lines: u64,
}

impl NdjsonWriter {
    /// Open a file for append. Creates it if it doesn't exist.
    pub fn open_append(path: impl AsRef<Path>) -> Result<Self, NdjsonError> {
        Self::open_append_with_flush(path, 0)
    }

    /// `flush_every_lines=0` disables periodic flushing.
    pub fn open_append_with_flush(
        path: impl AsRef<Path>,
        flush_every_lines: u64,
    ) -> Result<Self, NdjsonError> {
        let f = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            w: BufWriter::new(f),
            lines_since_flush: 0,
            flush_every_lines,
        })
    }

    /// Create or truncate a file for a single run's output.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, NdjsonError> {
        Ok(Self {
            w: BufWriter::new(File::create(path)?),
            lines_since_flush: 0,
            flush_every_lines: 0,
        })
    }

    pub fn write_event<T: Serialize>(&mut self, event: &T) -> Result<(), NdjsonError> {
        let mut buf = serde_json::to_vec(event)?;
        buf.push(b'\n');
        self.w.write_all(&buf)?;
        self.lines_since_flush += 1;
        if self.flush_every_lines > 0 && self.lines_since_flush >= self.flush_every_lines {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), NdjsonError> {
        self.w.flush()?;
        self.lines_since_flush = 0;
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum TracingInitError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("tracing subscriber already installed: {0}")]
    Install(String),
}

/// Install a stderr fmt subscriber. `RUST_LOG` overrides `default_filter`.
pub fn init_tracing(default_filter: &str) -> Result<(), TracingInitError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(default_filter)?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| TracingInitError::Install(e.to_string()))
}
