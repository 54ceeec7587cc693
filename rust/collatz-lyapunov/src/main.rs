//! collatz-lyapunov CLI: Ω_R trend statistics over Collatz trajectories.
//!
//! Modes:
//!   --mode=batch --start=N --end=M      One row per starting number (default)
//!   --mode=trace --n=N                  Hop-by-hop report for one number
//!
//! Options:
//!   --output=<path>          Batch output file (default: collatz_analysis.csv)
//!   --format=csv|jsonl       Batch output format (default: csv)
//!   --progress-every=<K>     Numbers per progress report (default: 1000)
//!   --sequential             Analyze without rayon
//!   --step-cap=<S>           Abort any trajectory longer than S steps
//!
//! Logging goes to stderr and is controlled by RUST_LOG
//! (default: collatz_lyapunov=info).

use std::fs::File;
use std::io::{BufWriter, Write};

use tracing_subscriber::EnvFilter;

use collatz_lyapunov::batch::{self, CsvSink, JsonLinesSink, LogProgress, RecordSink};
use collatz_lyapunov::config::{BatchSettings, OutputFormat, RunConfig, TraceSettings};
use collatz_lyapunov::trace::write_trace;
use collatz_lyapunov::CollatzError;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("collatz_lyapunov=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(&args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> Result<(), CollatzError> {
    match RunConfig::from_args(args)? {
        RunConfig::Batch(settings) => run_batch_mode(settings),
        RunConfig::Trace(settings) => run_trace_mode(settings),
    }
}

fn run_batch_mode(settings: BatchSettings) -> Result<(), CollatzError> {
    if let Some(parent) = settings.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let writer = BufWriter::new(File::create(&settings.output)?);
    let mut sink: Box<dyn RecordSink> = match settings.format {
        OutputFormat::Csv => Box::new(CsvSink::new(writer)),
        OutputFormat::JsonLines => Box::new(JsonLinesSink::new(writer)),
    };

    let summary = batch::run_batch(&settings.batch, sink.as_mut(), &mut LogProgress)?;
    tracing::info!(path = %settings.output.display(), "Data written");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write!(out, "{}", summary)?;
    Ok(())
}

fn run_trace_mode(settings: TraceSettings) -> Result<(), CollatzError> {
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    write_trace(&settings.engine, &settings.n, &mut out)?;
    writeln!(out, "\nAnalysis complete.")?;
    out.flush()?;
    Ok(())
}
