//! Range scaling measurements.
//!
//! Runs a fixed-size window of consecutive starting numbers at increasing
//! magnitudes, sequentially and with rayon, and reports time per number
//! alongside the mean trajectory statistics of each window.

use num_bigint::BigUint;
use std::time::{Duration, Instant};

use collatz_lyapunov::batch::{run_batch, BatchConfig, CsvSink, SilentProgress};
use collatz_lyapunov::CollatzEngine;

/// Consecutive starting numbers per window.
const WINDOW: u64 = 2000;

struct WindowStats {
    mean_total_steps: f64,
    mean_odd_steps: f64,
    mean_exponent: f64,
    undefined: u64,
}

fn window_stats(start: u64) -> WindowStats {
    let engine = CollatzEngine::new();
    let (mut total, mut odd, mut undefined) = (0u64, 0u64, 0u64);
    let (mut exp_sum, mut exp_count) = (0.0f64, 0u64);
    for n in start..start + WINDOW {
        let Ok(stats) = engine.analyze(&BigUint::from(n)) else {
            continue;
        };
        total += stats.total_steps;
        odd += stats.odd_steps;
        match stats.lyapunov() {
            Some(e) => {
                exp_sum += e;
                exp_count += 1;
            }
            None => undefined += 1,
        }
    }
    WindowStats {
        mean_total_steps: total as f64 / WINDOW as f64,
        mean_odd_steps: odd as f64 / WINDOW as f64,
        mean_exponent: if exp_count > 0 { exp_sum / exp_count as f64 } else { 0.0 },
        undefined,
    }
}

fn time_window(start: u64, parallel: bool) -> Option<Duration> {
    let mut config = BatchConfig::new(start, start + WINDOW - 1);
    config.parallel = parallel;
    let mut sink = CsvSink::new(std::io::sink());
    let timer = Instant::now();
    match run_batch(&config, &mut sink, &mut SilentProgress) {
        Ok(_) => Some(timer.elapsed()),
        Err(e) => {
            eprintln!("Window at {} failed: {}", start, e);
            None
        }
    }
}

fn main() {
    println!("================================================================");
    println!("  SCALING: Ω_R trajectory analysis vs starting magnitude");
    println!("================================================================\n");

    println!(
        "{:>12} | {:>10} | {:>10} | {:>9} | {:>9} | {:>10} | {:>9}",
        "start", "seq µs/n", "par µs/n", "steps", "odd", "exponent", "undefined"
    );
    println!("{}", "-".repeat(86));

    for exp in 3..=7u32 {
        let start = 10u64.pow(exp) + 1;
        let (Some(seq), Some(par)) = (time_window(start, false), time_window(start, true)) else {
            continue;
        };
        let stats = window_stats(start);
        println!(
            "{:>12} | {:>10.2} | {:>10.2} | {:>9.1} | {:>9.1} | {:>+10.5} | {:>9}",
            start,
            seq.as_secs_f64() * 1e6 / WINDOW as f64,
            par.as_secs_f64() * 1e6 / WINDOW as f64,
            stats.mean_total_steps,
            stats.mean_odd_steps,
            stats.mean_exponent,
            stats.undefined
        );
    }
}
