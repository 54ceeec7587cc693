//! collatz-lyapunov: Collatz trajectories annotated with the Ω_R metric.
//!
//! For each odd term of a trajectory, Ω_R counts the prime factors of the
//! term minus its largest power of two. The engine follows Ω_R across every
//! odd-to-odd hop, classifies the trend, and averages ln(Ω_R'/Ω_R) into a
//! Lyapunov-like exponent. Results come out either as one summary row per
//! starting number (batch) or as a hop-by-hop report (trace).

pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod stats;
pub mod trace;

pub use engine::{CollatzEngine, OddHop, Trajectory};
pub use error::CollatzError;
pub use stats::{SequenceStatistics, Trend};

// Re-export BigUint for convenience
pub use num_bigint::BigUint;
