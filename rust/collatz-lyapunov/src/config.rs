//! Command-line configuration.
//!
//! Options are `--key=value` pairs (or bare `--flag`), e.g.
//!
//! ```text
//! collatz-lyapunov --mode=batch --start=1 --end=100000 --output=out.csv
//! collatz-lyapunov --mode=batch --start=1 --end=100000 --format=jsonl --sequential
//! collatz-lyapunov --mode=trace --n=27
//! ```

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::batch::BatchConfig;
use crate::engine::{parse_start, CollatzEngine};
use crate::error::CollatzError;

pub const DEFAULT_START: u64 = 9_500_001;
pub const DEFAULT_END: u64 = 10_000_000;
pub const DEFAULT_OUTPUT: &str = "collatz_analysis.csv";
pub const DEFAULT_PROGRESS_EVERY: u64 = 1000;

const KNOWN_KEYS: &[&str] = &[
    "mode",
    "start",
    "end",
    "output",
    "format",
    "progress-every",
    "sequential",
    "step-cap",
    "n",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    JsonLines,
}

#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub batch: BatchConfig,
    pub output: PathBuf,
    pub format: OutputFormat,
}

#[derive(Debug, Clone)]
pub struct TraceSettings {
    pub n: BigUint,
    pub engine: CollatzEngine,
}

#[derive(Debug, Clone)]
pub enum RunConfig {
    Batch(BatchSettings),
    Trace(TraceSettings),
}

impl RunConfig {
    pub fn from_args(args: &[String]) -> Result<Self, CollatzError> {
        let opts = parse_args(args);
        for key in opts.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                tracing::warn!(key = %key, "Ignoring unknown option");
            }
        }

        let engine = CollatzEngine::new().with_step_cap(parse_optional_u64(&opts, "step-cap")?);

        match opts.get("mode").map(|s| s.as_str()).unwrap_or("batch") {
            "batch" => {
                let batch = BatchConfig {
                    start: parse_bound(&opts, "start", DEFAULT_START)?,
                    end: parse_bound(&opts, "end", DEFAULT_END)?,
                    chunk_size: parse_u64(&opts, "progress-every", DEFAULT_PROGRESS_EVERY)?,
                    parallel: !opts.contains_key("sequential"),
                    engine,
                };
                if batch.chunk_size == 0 {
                    return Err(invalid("progress-every", "0"));
                }
                batch.validate()?;

                let format = match opts.get("format").map(|s| s.as_str()).unwrap_or("csv") {
                    "csv" => OutputFormat::Csv,
                    "jsonl" | "json" => OutputFormat::JsonLines,
                    other => return Err(invalid("format", other)),
                };
                let output = opts
                    .get("output")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

                Ok(RunConfig::Batch(BatchSettings {
                    batch,
                    output,
                    format,
                }))
            }
            "trace" => {
                let n = match opts.get("n") {
                    Some(v) => parse_start(v)?,
                    None => BigUint::from(DEFAULT_START),
                };
                Ok(RunConfig::Trace(TraceSettings { n, engine }))
            }
            other => Err(invalid("mode", other)),
        }
    }
}

fn invalid(key: &str, value: &str) -> CollatzError {
    CollatzError::InvalidArgument {
        key: key.to_string(),
        value: value.to_string(),
    }
}

pub fn parse_args(args: &[String]) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for arg in args {
        if let Some(kv) = arg.strip_prefix("--") {
            if let Some((k, v)) = kv.split_once('=') {
                map.insert(k.to_string(), v.to_string());
            } else {
                map.insert(kv.to_string(), "true".to_string());
            }
        }
    }
    map
}

fn parse_u64(
    opts: &HashMap<String, String>,
    key: &str,
    default: u64,
) -> Result<u64, CollatzError> {
    Ok(parse_optional_u64(opts, key)?.unwrap_or(default))
}

fn parse_optional_u64(
    opts: &HashMap<String, String>,
    key: &str,
) -> Result<Option<u64>, CollatzError> {
    opts.get(key)
        .map(|v| v.trim().parse::<u64>().map_err(|_| invalid(key, v)))
        .transpose()
}

/// A range endpoint: a positive integer that fits in a u64.
fn parse_bound(
    opts: &HashMap<String, String>,
    key: &str,
    default: u64,
) -> Result<u64, CollatzError> {
    match opts.get(key) {
        Some(v) => parse_start(v)?.to_u64().ok_or_else(|| invalid(key, v)),
        None => Ok(default),
    }
}
