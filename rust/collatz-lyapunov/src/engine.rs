//! Odd-to-odd traversal of the Collatz map.
//!
//! A [`Trajectory`] walks one starting number down to 1, yielding one
//! [`OddHop`] per 3n+1 application: the odd term, the next odd term after
//! all halvings, both Ω_R decompositions, the trend and the log-ratio.
//! Batch statistics are a fold over the same iterator, so the trace and the
//! tabular output can never disagree.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};
use omega_core::OmegaDecomposition;
use std::iter::FusedIterator;

use crate::error::CollatzError;
use crate::stats::{SequenceStatistics, StatsAccumulator, Trend};

/// One odd-to-odd hop `c -> (3c + 1) / 2^k`.
#[derive(Debug, Clone, PartialEq)]
pub struct OddHop {
    /// 1-based position of the hop in the trajectory
    pub step: u64,
    pub current: OmegaDecomposition,
    pub next: OmegaDecomposition,
    /// Halvings that collapse 3c+1 to its odd core
    pub halvings: u64,
    /// `None` for the terminal hop into 1, which is not a transition between odd terms
    pub trend: Option<Trend>,
    /// ln(Ω_R(next) / Ω_R(current)) when both are nonzero
    pub log_ratio: Option<f64>,
}

impl OddHop {
    pub fn is_terminal(&self) -> bool {
        self.next.n.is_one()
    }

    /// Collatz map applications covered by this hop.
    pub fn map_steps(&self) -> u64 {
        1 + self.halvings
    }
}

/// Next odd term after `c` and the number of halvings taken to reach it.
pub fn next_odd(c: &BigUint) -> (BigUint, u64) {
    let mut next = c * 3u32 + 1u32;
    let halvings = next.trailing_zeros().unwrap_or(0);
    next >>= halvings;
    (next, halvings)
}

/// ln(next / current), defined only when both Ω_R values are positive.
pub fn log_ratio(current: u32, next: u32) -> Option<f64> {
    (current > 0 && next > 0).then(|| (next as f64 / current as f64).ln())
}

/// Parse a starting number, rejecting zero, negatives and garbage.
pub fn parse_start(text: &str) -> Result<BigUint, CollatzError> {
    let trimmed = text.trim();
    match trimmed.parse::<BigUint>() {
        Ok(n) if !n.is_zero() => Ok(n),
        _ => Err(CollatzError::NonPositiveStart(trimmed.to_string())),
    }
}

/// Entry point for trajectories and their statistics.
///
/// Holds no per-number state; one engine can be shared across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollatzEngine {
    step_cap: Option<u64>,
}

impl CollatzEngine {
    /// Engine without a step cap. Trajectories run until they reach 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort any trajectory whose `total_steps` would exceed `cap`.
    pub fn with_step_cap(mut self, cap: Option<u64>) -> Self {
        self.step_cap = cap;
        self
    }

    pub fn step_cap(&self) -> Option<u64> {
        self.step_cap
    }

    /// Lazy per-hop view of the trajectory starting at `start`.
    pub fn trajectory(&self, start: &BigUint) -> Result<Trajectory, CollatzError> {
        if start.is_zero() {
            return Err(CollatzError::NonPositiveStart(start.to_string()));
        }
        Ok(Trajectory {
            start: start.clone(),
            current: start.clone(),
            pending: None,
            steps: 0,
            hops: 0,
            step_cap: self.step_cap,
            finished: false,
        })
    }

    /// Full statistics for `start`.
    pub fn analyze(&self, start: &BigUint) -> Result<SequenceStatistics, CollatzError> {
        let mut trajectory = self.trajectory(start)?;
        let mut acc = StatsAccumulator::default();
        for hop in trajectory.by_ref() {
            acc.record(&hop?);
        }
        Ok(acc.finish(start.clone(), trajectory.steps_taken()))
    }
}

/// Finite, non-restartable sequence of [`OddHop`]s for one starting number.
///
/// Yields `Err(StepCapExceeded)` once and then stops if a step cap is set and
/// crossed.
#[derive(Debug)]
pub struct Trajectory {
    start: BigUint,
    current: BigUint,
    /// Decomposition of `current`, carried over from the previous hop
    pending: Option<OmegaDecomposition>,
    steps: u64,
    hops: u64,
    step_cap: Option<u64>,
    finished: bool,
}

impl Trajectory {
    pub fn start(&self) -> &BigUint {
        &self.start
    }

    /// Collatz map applications performed so far.
    pub fn steps_taken(&self) -> u64 {
        self.steps
    }

    /// 3n+1 applications performed so far.
    pub fn hops_taken(&self) -> u64 {
        self.hops
    }

    fn over_cap(&mut self) -> Option<CollatzError> {
        match self.step_cap {
            Some(cap) if self.steps > cap => {
                self.finished = true;
                Some(CollatzError::StepCapExceeded {
                    start: self.start.clone(),
                    cap,
                })
            }
            _ => None,
        }
    }
}

impl Iterator for Trajectory {
    type Item = Result<OddHop, CollatzError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        // Only the leading even run of the start can land here; every hop ends odd.
        if self.current.is_even() {
            let twos = self.current.trailing_zeros().unwrap_or(0);
            self.current >>= twos;
            self.steps += twos;
            if let Some(err) = self.over_cap() {
                return Some(Err(err));
            }
        }

        if self.current.is_one() {
            self.finished = true;
            return None;
        }

        let current = match self.pending.take() {
            Some(decomposition) if decomposition.n == self.current => decomposition,
            _ => OmegaDecomposition::of(&self.current),
        };
        let (next_value, halvings) = next_odd(&self.current);
        let next = OmegaDecomposition::of(&next_value);

        self.hops += 1;
        self.steps += 1 + halvings;

        let trend = if next_value.is_one() {
            None
        } else {
            Some(Trend::classify(current.omega, next.omega))
        };
        let hop = OddHop {
            step: self.hops,
            log_ratio: log_ratio(current.omega, next.omega),
            current,
            next: next.clone(),
            halvings,
            trend,
        };

        self.pending = Some(next);
        self.current = next_value;

        if let Some(err) = self.over_cap() {
            return Some(Err(err));
        }
        Some(Ok(hop))
    }
}

impl FusedIterator for Trajectory {}
