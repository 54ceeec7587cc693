//! Per-start aggregate of an Ω_R trajectory.

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::engine::OddHop;

/// Direction of Ω_R across one odd-to-odd transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trend {
    Increase,
    Decrease,
    Neutral,
}

impl Trend {
    pub fn classify(current: u32, next: u32) -> Self {
        match next.cmp(&current) {
            std::cmp::Ordering::Greater => Trend::Increase,
            std::cmp::Ordering::Less => Trend::Decrease,
            std::cmp::Ordering::Equal => Trend::Neutral,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Increase => write!(f, "Upward"),
            Trend::Decrease => write!(f, "Downward"),
            Trend::Neutral => write!(f, "Neutral"),
        }
    }
}

/// Summary of one trajectory. Created fresh per starting number and never
/// mutated after [`StatsAccumulator::finish`].
///
/// Serialized field names match the tabular output columns.
///
/// The terminal hop into 1 is counted in `odd_steps` but not in the trend
/// counts, so `increase + decrease + neutral == total_transitions`. Counting
/// that hop as well would add one neutral (0 -> 0) or one decrease per start.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceStatistics {
    #[serde(serialize_with = "serialize_start")]
    pub start_number: BigUint,
    /// Applications of the Collatz map (halvings and 3n+1 alike) until 1
    pub total_steps: u64,
    /// Applications of 3n+1, i.e. odd-to-odd hops
    pub odd_steps: u64,
    #[serde(rename = "max_omega_R")]
    pub max_omega_r: u32,
    /// Mean of ln(Ω_R(next) / Ω_R(current)) over qualifying transitions.
    /// Exactly 0 when there were none; see [`SequenceStatistics::lyapunov`].
    pub lyapunov_exponent: f64,
    #[serde(rename = "omega_R_increase_count")]
    pub increase_count: u64,
    #[serde(rename = "omega_R_decrease_count")]
    pub decrease_count: u64,
    #[serde(rename = "omega_R_neutral_count")]
    pub neutral_count: u64,
    #[serde(rename = "total_omega_R_transitions")]
    pub total_transitions: u64,
    /// Transitions where both Ω_R values were nonzero
    pub lyapunov_samples: u64,
}

impl SequenceStatistics {
    /// The exponent, or `None` when no transition qualified and
    /// `lyapunov_exponent` holds the 0 "no data" sentinel.
    pub fn lyapunov(&self) -> Option<f64> {
        (self.lyapunov_samples > 0).then_some(self.lyapunov_exponent)
    }
}

fn serialize_start<S: Serializer>(n: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
    match n.to_u64() {
        Some(v) => serializer.serialize_u64(v),
        None => serializer.collect_str(n),
    }
}

/// Running fold over the hops of a single trajectory.
#[derive(Debug, Clone, Default)]
pub struct StatsAccumulator {
    odd_steps: u64,
    max_omega_r: u32,
    increase_count: u64,
    decrease_count: u64,
    neutral_count: u64,
    log_ratio_sum: f64,
    log_ratio_count: u64,
}

impl StatsAccumulator {
    pub fn record(&mut self, hop: &OddHop) {
        self.odd_steps += 1;
        self.max_omega_r = self.max_omega_r.max(hop.current.omega);

        match hop.trend {
            Some(Trend::Increase) => self.increase_count += 1,
            Some(Trend::Decrease) => self.decrease_count += 1,
            Some(Trend::Neutral) => self.neutral_count += 1,
            // terminal hop into 1
            None => {}
        }

        if let Some(ratio) = hop.log_ratio {
            self.log_ratio_sum += ratio;
            self.log_ratio_count += 1;
        }
    }

    pub fn finish(self, start_number: BigUint, total_steps: u64) -> SequenceStatistics {
        let lyapunov_exponent = if self.log_ratio_count > 0 {
            self.log_ratio_sum / self.log_ratio_count as f64
        } else {
            0.0
        };

        SequenceStatistics {
            start_number,
            total_steps,
            odd_steps: self.odd_steps,
            max_omega_r: self.max_omega_r,
            lyapunov_exponent,
            increase_count: self.increase_count,
            decrease_count: self.decrease_count,
            neutral_count: self.neutral_count,
            total_transitions: self.odd_steps.saturating_sub(1),
            lyapunov_samples: self.log_ratio_count,
        }
    }
}
