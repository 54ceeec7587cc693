//! Human-readable, hop-by-hop report for a single starting number.

use num_bigint::BigUint;
use std::io::Write;

use crate::engine::{CollatzEngine, OddHop};
use crate::error::CollatzError;
use crate::stats::{SequenceStatistics, StatsAccumulator};

/// Write the per-hop trace of `start` to `out` and return its statistics.
///
/// The statistics come from the same hops that were printed, so they equal
/// `engine.analyze(start)`.
pub fn write_trace<W: Write>(
    engine: &CollatzEngine,
    start: &BigUint,
    out: &mut W,
) -> Result<SequenceStatistics, CollatzError> {
    let mut trajectory = engine.trajectory(start)?;
    writeln!(out, "--- Analysis for starting number: {} ---", start)?;

    let mut acc = StatsAccumulator::default();
    for hop in trajectory.by_ref() {
        let hop = hop?;
        write_hop(out, &hop)?;
        acc.record(&hop);
    }
    let stats = acc.finish(start.clone(), trajectory.steps_taken());

    writeln!(out, "\n--- Sequence reached 1. ---")?;
    write_summary(out, &stats)?;
    Ok(stats)
}

fn write_hop<W: Write>(out: &mut W, hop: &OddHop) -> Result<(), CollatzError> {
    writeln!(
        out,
        "\nStep{}: Current odd number (n): {} (Ω_R={})",
        hop.step, hop.current.n, hop.current.omega
    )?;
    writeln!(out, "  - Decomposition of n: {}", hop.current)?;
    writeln!(
        out,
        "  - Next odd number (n'): {} (Ω_R={})",
        hop.next.n, hop.next.omega
    )?;
    match hop.trend {
        Some(trend) => writeln!(out, "  - Ω_R trend: {}", trend)?,
        None => writeln!(out, "  - Ω_R trend: Terminal")?,
    }
    match hop.log_ratio {
        Some(ratio) => writeln!(out, "  - ln(Ω_R'/Ω_R): {:.4}", ratio)?,
        None => writeln!(out, "  - ln(Ω_R'/Ω_R): undefined (zero Ω_R)")?,
    }
    Ok(())
}

fn write_summary<W: Write>(out: &mut W, stats: &SequenceStatistics) -> Result<(), CollatzError> {
    match stats.lyapunov() {
        Some(exponent) => {
            writeln!(out, "\n--- Lyapunov Exponent Calculation Summary ---")?;
            writeln!(
                out,
                "Qualifying transitions: {} of {}",
                stats.lyapunov_samples, stats.total_transitions
            )?;
            writeln!(
                out,
                "For the sequence starting at {}, the average exponent is: {:.4}",
                stats.start_number, exponent
            )?;
        }
        None if stats.odd_steps == 0 => {
            writeln!(out, "\nNo odd steps for {} (already 1 reached).", stats.start_number)?;
        }
        None => {
            writeln!(
                out,
                "\nNo transitions with nonzero Ω_R on both sides for {}; the exponent is undefined.",
                stats.start_number
            )?;
        }
    }
    Ok(())
}
