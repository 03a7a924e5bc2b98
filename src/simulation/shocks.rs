//! Shock Sampler: correlated per-unit errors for one trial.
//!
//! ```text
//! z(u)     = sqrt(ρ) · z_nat + sqrt(1 − ρ) · z_unit(u)      z_nat, z_unit ~ N(0, 1)
//! shock(u) = z(u) · σ(u)
//! ```
//!
//! `Var(shock(u)) = σ(u)²` for every ρ, and two units with equal σ have
//! correlation exactly ρ. Draw order is fixed: the national draw first, then one
//! draw per unit in registry order.

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::error::{ForecastError, ForecastResult};
use crate::types::VotingUnit;

/// Validated square-root weights for the variance decomposition.
#[derive(Clone, Copy, Debug)]
pub struct ShockSampler {
    correlation: f64,
    national_weight: f64,
    unit_weight: f64,
}

impl ShockSampler {
    pub fn new(correlation: f64) -> ForecastResult<Self> {
        if !(correlation.is_finite() && (0.0..=1.0).contains(&correlation)) {
            return Err(ForecastError::InvalidCorrelation(correlation));
        }
        Ok(Self {
            correlation,
            national_weight: correlation.sqrt(),
            unit_weight: (1.0 - correlation).sqrt(),
        })
    }

    pub fn correlation(&self) -> f64 {
        self.correlation
    }

    /// Fill `out[i]` with the shock for `units[i]`.
    pub fn sample_into<R: Rng>(&self, rng: &mut R, units: &[VotingUnit], out: &mut [f64]) {
        debug_assert_eq!(units.len(), out.len());
        let z_nat: f64 = StandardNormal.sample(rng);
        for (unit, shock) in units.iter().zip(out.iter_mut()) {
            let z_unit: f64 = StandardNormal.sample(rng);
            let z = self.national_weight * z_nat + self.unit_weight * z_unit;
            *shock = z * unit.stddev;
        }
    }
}
