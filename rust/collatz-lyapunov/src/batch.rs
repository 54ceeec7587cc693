//! Range driver: one [`SequenceStatistics`] row per starting number.
//!
//! Numbers are processed in chunks. Each chunk is analyzed in parallel with
//! rayon (trajectories share nothing), then written in increasing start order
//! through an injected [`RecordSink`]. Progress goes to an injected
//! [`ProgressReporter`] after every chunk.

use num_bigint::BigUint;
use rayon::prelude::*;
use std::io::Write;
use std::time::{Duration, Instant};

use crate::engine::CollatzEngine;
use crate::error::CollatzError;
use crate::stats::SequenceStatistics;

/// Column order of the tabular output.
pub const CSV_HEADERS: [&str; 9] = [
    "start_number",
    "total_steps",
    "odd_steps",
    "max_omega_R",
    "lyapunov_exponent",
    "omega_R_increase_count",
    "omega_R_decrease_count",
    "omega_R_neutral_count",
    "total_omega_R_transitions",
];

/// Destination for batch rows.
pub trait RecordSink {
    fn write_header(&mut self) -> Result<(), CollatzError>;
    fn write_record(&mut self, stats: &SequenceStatistics) -> Result<(), CollatzError>;
    fn finish(&mut self) -> Result<(), CollatzError>;
}

/// Comma-separated rows under a header line.
///
/// The exponent column is `0` when no transition qualified and `{:?}` of the
/// mean otherwise, so a genuine zero mean prints as `0.0`.
pub struct CsvSink<W: Write> {
    writer: W,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        CsvSink { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn write_header(&mut self) -> Result<(), CollatzError> {
        writeln!(self.writer, "{}", CSV_HEADERS.join(","))?;
        Ok(())
    }

    fn write_record(&mut self, s: &SequenceStatistics) -> Result<(), CollatzError> {
        // `0` marks "no data"; a real mean always carries a decimal point.
        let exponent = match s.lyapunov() {
            Some(value) => format!("{:?}", value),
            None => "0".to_string(),
        };
        writeln!(
            self.writer,
            "{},{},{},{},{},{},{},{},{}",
            s.start_number,
            s.total_steps,
            s.odd_steps,
            s.max_omega_r,
            exponent,
            s.increase_count,
            s.decrease_count,
            s.neutral_count,
            s.total_transitions,
        )?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), CollatzError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// One JSON object per line, keyed like the CSV columns plus `lyapunov_samples`.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesSink { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn write_header(&mut self) -> Result<(), CollatzError> {
        Ok(())
    }

    fn write_record(&mut self, stats: &SequenceStatistics) -> Result<(), CollatzError> {
        serde_json::to_writer(&mut self.writer, stats)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), CollatzError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Receives progress after each chunk.
pub trait ProgressReporter {
    fn report(&mut self, processed: u64, current: u64, end: u64);
}

/// Progress as `tracing` events.
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report(&mut self, processed: u64, current: u64, end: u64) {
        tracing::info!(processed, "Processing number {} of {}...", current, end);
    }
}

pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn report(&mut self, _processed: u64, _current: u64, _end: u64) {}
}

/// Inclusive range and execution settings for a batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub start: u64,
    pub end: u64,
    /// Numbers per chunk; progress is reported once per chunk
    pub chunk_size: u64,
    /// Analyze each chunk with rayon
    pub parallel: bool,
    pub engine: CollatzEngine,
}

impl BatchConfig {
    pub fn new(start: u64, end: u64) -> Self {
        BatchConfig {
            start,
            end,
            chunk_size: 1000,
            parallel: true,
            engine: CollatzEngine::new(),
        }
    }

    pub fn validate(&self) -> Result<(), CollatzError> {
        if self.start == 0 || self.start > self.end {
            return Err(CollatzError::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }
}

/// Aggregate view of a finished batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub processed: u64,
    pub elapsed: Duration,
    /// (start, total_steps) of the longest trajectory; first one wins ties
    pub longest: Option<(u64, u64)>,
    /// (start, max_omega_R) of the highest Ω_R peak; first one wins ties
    pub highest_max_omega: Option<(u64, u32)>,
    /// Rows whose exponent is the "no data" sentinel
    pub undefined_exponents: u64,
}

impl BatchSummary {
    fn observe(&mut self, start: u64, stats: &SequenceStatistics) {
        self.processed += 1;
        if self.longest.map_or(true, |(_, steps)| stats.total_steps > steps) {
            self.longest = Some((start, stats.total_steps));
        }
        if self
            .highest_max_omega
            .map_or(true, |(_, omega)| stats.max_omega_r > omega)
        {
            self.highest_max_omega = Some((start, stats.max_omega_r));
        }
        if stats.lyapunov().is_none() {
            self.undefined_exponents += 1;
        }
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Batch Summary")?;
        writeln!(f, "  Numbers analyzed: {}", self.processed)?;
        if let Some((start, steps)) = self.longest {
            writeln!(f, "  Longest trajectory: {} ({} steps)", start, steps)?;
        }
        if let Some((start, omega)) = self.highest_max_omega {
            writeln!(f, "  Highest max Ω_R: {} (Ω_R={})", start, omega)?;
        }
        writeln!(
            f,
            "  Undefined exponents: {} (reported as 0)",
            self.undefined_exponents
        )?;
        writeln!(f, "  Total time taken: {:.3}s", self.elapsed.as_secs_f64())?;
        Ok(())
    }
}

fn analyze_chunk(
    engine: &CollatzEngine,
    lo: u64,
    hi: u64,
    parallel: bool,
) -> Result<Vec<SequenceStatistics>, CollatzError> {
    if parallel {
        (lo..=hi)
            .into_par_iter()
            .map(|n| engine.analyze(&BigUint::from(n)))
            .collect()
    } else {
        (lo..=hi)
            .map(|n| engine.analyze(&BigUint::from(n)))
            .collect()
    }
}

/// Analyze every number in `[config.start, config.end]` and write one row each.
///
/// Rows reach the sink in increasing start order regardless of `parallel`.
/// A step-cap violation aborts the run with the offending start number.
pub fn run_batch<S, P>(
    config: &BatchConfig,
    sink: &mut S,
    progress: &mut P,
) -> Result<BatchSummary, CollatzError>
where
    S: RecordSink + ?Sized,
    P: ProgressReporter + ?Sized,
{
    config.validate()?;
    let timer = Instant::now();
    let chunk_size = config.chunk_size.max(1);

    tracing::info!(
        start = config.start,
        end = config.end,
        parallel = config.parallel,
        step_cap = ?config.engine.step_cap(),
        "Starting analysis for the range {} to {}...",
        config.start,
        config.end
    );

    sink.write_header()?;
    let mut summary = BatchSummary::default();
    let mut lo = config.start;
    loop {
        let hi = lo.saturating_add(chunk_size - 1).min(config.end);
        let rows = analyze_chunk(&config.engine, lo, hi, config.parallel)?;
        tracing::debug!(lo, hi, rows = rows.len(), "Chunk analyzed");

        for (start, row) in (lo..=hi).zip(&rows) {
            sink.write_record(row)?;
            summary.observe(start, row);
        }
        progress.report(summary.processed, hi, config.end);

        if hi == config.end {
            break;
        }
        lo = hi + 1;
    }
    sink.finish()?;

    summary.elapsed = timer.elapsed();
    tracing::info!(
        processed = summary.processed,
        elapsed_secs = summary.elapsed.as_secs_f64(),
        "Analysis complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingProgress {
        calls: Vec<(u64, u64)>,
    }

    impl ProgressReporter for CountingProgress {
        fn report(&mut self, processed: u64, current: u64, _end: u64) {
            self.calls.push((processed, current));
        }
    }

    fn csv_for(config: &BatchConfig) -> String {
        let mut sink = CsvSink::new(Vec::new());
        run_batch(config, &mut sink, &mut SilentProgress).unwrap();
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn test_single_row_for_one() {
        let csv = csv_for(&BatchConfig::new(1, 1));
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], CSV_HEADERS.join(","));
        assert_eq!(lines[1], "1,0,0,0,0,0,0,0,0");
    }

    #[test]
    fn test_rows_for_small_range() {
        let csv = csv_for(&BatchConfig::new(1, 10));
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 11);
        assert_eq!(lines[3], "3,7,2,0,0,0,0,1,1");
        assert_eq!(lines[7], "7,16,5,1,0.0,1,2,1,4");
        let starts: Vec<u64> = lines[1..]
            .iter()
            .map(|l| l.split(',').next().unwrap().parse().unwrap())
            .collect();
        assert_eq!(starts, (1..=10).collect::<Vec<u64>>());
    }

    #[test]
    fn test_exponent_column_marks_missing_data() {
        let row = |n: u64| {
            let csv = csv_for(&BatchConfig::new(n, n));
            csv.lines().nth(1).unwrap().split(',').nth(4).unwrap().to_string()
        };
        // 3 -> 5 -> 1 has no qualifying transition
        assert_eq!(row(3), "0");
        // 7 has one qualifying transition with ln(1/1) = 0
        assert_eq!(row(7), "0.0");
        let exponent: f64 = row(27).parse().unwrap();
        assert!((exponent - 0.01777300462974218).abs() < 1e-12);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut parallel = BatchConfig::new(1, 2000);
        parallel.chunk_size = 137;
        let mut sequential = parallel.clone();
        sequential.parallel = false;
        assert_eq!(csv_for(&parallel), csv_for(&sequential));
    }

    #[test]
    fn test_invalid_ranges() {
        let mut sink = CsvSink::new(Vec::new());
        for (start, end) in [(0, 5), (10, 9)] {
            let err = run_batch(&BatchConfig::new(start, end), &mut sink, &mut SilentProgress)
                .unwrap_err();
            assert!(matches!(err, CollatzError::InvalidRange { .. }));
        }
        assert!(sink.into_inner().is_empty());
    }

    #[test]
    fn test_progress_once_per_chunk() {
        let mut config = BatchConfig::new(1, 10);
        config.chunk_size = 3;
        let mut progress = CountingProgress { calls: Vec::new() };
        let mut sink = CsvSink::new(Vec::new());
        run_batch(&config, &mut sink, &mut progress).unwrap();
        assert_eq!(progress.calls, vec![(3, 3), (6, 6), (9, 9), (10, 10)]);
    }

    #[test]
    fn test_summary() {
        let mut sink = CsvSink::new(Vec::new());
        let summary = run_batch(&BatchConfig::new(1, 30), &mut sink, &mut SilentProgress).unwrap();
        assert_eq!(summary.processed, 30);
        // 27 has the longest trajectory below 31
        assert_eq!(summary.longest, Some((27, 111)));
        // 27 is also the first start below 31 to reach Ω_R = 4
        assert_eq!(summary.highest_max_omega, Some((27, 4)));
        assert!(summary.undefined_exponents > 0);
        assert!(summary.to_string().contains("Numbers analyzed: 30"));
    }

    #[test]
    fn test_step_cap_aborts_batch() {
        let mut config = BatchConfig::new(20, 30);
        config.engine = CollatzEngine::new().with_step_cap(Some(100));
        let mut sink = CsvSink::new(Vec::new());
        let err = run_batch(&config, &mut sink, &mut SilentProgress).unwrap_err();
        assert!(matches!(err, CollatzError::StepCapExceeded { .. }));
    }

    #[test]
    fn test_json_lines() {
        let mut sink = JsonLinesSink::new(Vec::new());
        run_batch(&BatchConfig::new(6, 8), &mut sink, &mut SilentProgress).unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        let rows: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1]["start_number"], 7);
        assert_eq!(rows[1]["total_steps"], 16);
        assert_eq!(rows[1]["lyapunov_samples"], 1);
    }
}
