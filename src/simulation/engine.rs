//! Simulation Orchestrator: runs N seeded trials and aggregates them.
//!
//! Trial `i` draws every random number from its own RNG, seeded by
//! [`derive_trial_seed`](super::prng::derive_trial_seed)`(seed, i)`. Trials share
//! nothing mutable, so [`run_simulation`] can spread them over the rayon pool and
//! still return exactly what [`run_simulation_sequential`] returns.
//!
//! ## Recording mode
//!
//! [`simulate_trials`] keeps every [`TrialOutcome`] for offline analysis;
//! [`aggregate_outcomes`] folds such a slice into the same result.

use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{ForecastError, ForecastResult};
use crate::registry::StateModelRegistry;
use crate::scenario::{resolve_scenario, EffectiveModel, ScenarioAdjustment};

use super::aggregate::{SimulationResult, Tally};
use super::prng::trial_rng;
use super::shocks::ShockSampler;
use super::trial::{resolve_outcome, resolve_trial, NationalOutcome, TrialOutcome};

/// Run parameters other than the registry and scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub trials: usize,
    pub seed: u64,
    /// Share of each unit's variance carried by the national shock, in [0, 1].
    pub correlation: f64,
    pub histogram_bin_width: u32,
    pub battleground_count: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            seed: DEFAULT_SEED,
            correlation: DEFAULT_CORRELATION,
            histogram_bin_width: DEFAULT_HISTOGRAM_BIN_WIDTH,
            battleground_count: DEFAULT_BATTLEGROUND_COUNT,
        }
    }
}

impl SimulationConfig {
    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_correlation(mut self, correlation: f64) -> Self {
        self.correlation = correlation;
        self
    }

    pub fn validate(&self) -> ForecastResult<()> {
        if self.trials == 0 {
            return Err(ForecastError::InvalidTrialCount(0.0));
        }
        ShockSampler::new(self.correlation)?;
        if self.histogram_bin_width == 0 {
            return Err(ForecastError::InvalidConfig(
                "histogram_bin_width must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Convert a caller-supplied trial count, rejecting non-positive values.
pub fn trial_count_from_raw(raw: i64) -> ForecastResult<usize> {
    if raw <= 0 {
        return Err(ForecastError::InvalidTrialCount(raw as f64));
    }
    usize::try_from(raw).map_err(|_| ForecastError::InvalidTrialCount(raw as f64))
}

/// Convert a JSON trial count. Integral floats (`2000.0`) are accepted; fractions,
/// non-positive values, and anything non-finite are not. Counts past `usize::MAX`
/// saturate and are left to the caller's limit.
pub fn trial_count_from_json(value: &serde_json::Number) -> ForecastResult<usize> {
    if let Some(raw) = value.as_i64() {
        return trial_count_from_raw(raw);
    }
    if let Some(raw) = value.as_u64() {
        return Ok(usize::try_from(raw).unwrap_or(usize::MAX));
    }
    match value.as_f64() {
        Some(raw) if raw.is_finite() && raw >= 1.0 && raw.fract() == 0.0 => Ok(raw as usize),
        Some(raw) => Err(ForecastError::InvalidTrialCount(raw)),
        None => Err(ForecastError::InvalidTrialCount(f64::NAN)),
    }
}

/// Resolve and validate everything before the first trial.
fn prepare<'a>(
    registry: &'a StateModelRegistry,
    scenario: &ScenarioAdjustment,
    config: &SimulationConfig,
) -> ForecastResult<(EffectiveModel<'a>, ShockSampler)> {
    config.validate()?;
    let sampler = ShockSampler::new(config.correlation)?;
    let model = resolve_scenario(registry, scenario)?;
    Ok((model, sampler))
}

/// Play trial `index` of a run seeded with `seed`.
pub fn simulate_trial(
    model: &EffectiveModel,
    sampler: &ShockSampler,
    seed: u64,
    index: u64,
) -> TrialOutcome {
    let mut rng = trial_rng(seed, index);
    let mut shocks = vec![0.0f64; model.len()];
    sampler.sample_into(&mut rng, model.registry.units(), &mut shocks);
    resolve_trial(model, &shocks)
}

/// Run the full simulation in parallel over the rayon pool.
pub fn run_simulation(
    registry: &StateModelRegistry,
    scenario: &ScenarioAdjustment,
    config: &SimulationConfig,
) -> ForecastResult<SimulationResult> {
    let (model, sampler) = prepare(registry, scenario, config)?;
    let start = Instant::now();
    tracing::info!(
        trials = config.trials,
        seed = config.seed,
        correlation = sampler.correlation(),
        units = model.len(),
        "starting simulation"
    );

    let num_units = model.len();
    let tally = (0..config.trials as u64)
        .into_par_iter()
        .fold(
            || Tally::new(num_units),
            |mut tally, i| {
                tally.record(&simulate_trial(&model, &sampler, config.seed, i));
                tally
            },
        )
        .reduce(|| Tally::new(num_units), Tally::merge);

    let result = tally.finish(registry, config);
    tracing::info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        win_probability_dem = result.win_probability_dem,
        "simulation complete"
    );
    Ok(result)
}

/// Single-threaded equivalent of [`run_simulation`].
pub fn run_simulation_sequential(
    registry: &StateModelRegistry,
    scenario: &ScenarioAdjustment,
    config: &SimulationConfig,
) -> ForecastResult<SimulationResult> {
    let (model, sampler) = prepare(registry, scenario, config)?;
    let mut tally = Tally::new(model.len());
    for i in 0..config.trials as u64 {
        tally.record(&simulate_trial(&model, &sampler, config.seed, i));
    }
    Ok(tally.finish(registry, config))
}

/// Simulate every trial in parallel and keep the outcomes, in trial order.
pub fn simulate_trials(
    registry: &StateModelRegistry,
    scenario: &ScenarioAdjustment,
    config: &SimulationConfig,
) -> ForecastResult<Vec<TrialOutcome>> {
    let (model, sampler) = prepare(registry, scenario, config)?;
    Ok((0..config.trials as u64)
        .into_par_iter()
        .map(|i| simulate_trial(&model, &sampler, config.seed, i))
        .collect())
}

/// Fold recorded outcomes into a result.
pub fn aggregate_outcomes(
    registry: &StateModelRegistry,
    outcomes: &[TrialOutcome],
    config: &SimulationConfig,
) -> ForecastResult<SimulationResult> {
    if outcomes.is_empty() {
        return Err(ForecastError::InvalidTrialCount(0.0));
    }
    for (i, outcome) in outcomes.iter().enumerate() {
        check_outcome(registry, i, outcome)?;
    }
    let mut tally = Tally::new(registry.len());
    for outcome in outcomes {
        tally.record(outcome);
    }
    Ok(tally.finish(registry, config))
}

/// Recorded outcomes must fit the registry and the 0..=538 count slots.
fn check_outcome(
    registry: &StateModelRegistry,
    index: usize,
    outcome: &TrialOutcome,
) -> ForecastResult<()> {
    let fail = |msg: String| {
        Err(ForecastError::InvalidConfig(format!("outcome {}: {}", index, msg)))
    };
    if outcome.unit_winners.len() != registry.len() {
        return fail(format!(
            "covers {} units, registry has {}",
            outcome.unit_winners.len(),
            registry.len()
        ));
    }
    if outcome.tipping_point >= registry.len() {
        return fail(format!("tipping point index {} out of range", outcome.tipping_point));
    }
    if outcome.dem_ev > TOTAL_EV || outcome.rep_ev != TOTAL_EV - outcome.dem_ev {
        return fail(format!(
            "EV totals {} + {} do not sum to {}",
            outcome.dem_ev, outcome.rep_ev, TOTAL_EV
        ));
    }
    Ok(())
}

/// Shock-free national outcome of a scenario.
pub fn baseline_outcome(
    registry: &StateModelRegistry,
    scenario: &ScenarioAdjustment,
) -> ForecastResult<NationalOutcome> {
    let model = resolve_scenario(registry, scenario)?;
    Ok(resolve_outcome(&model))
}
