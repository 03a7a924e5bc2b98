//! Monte Carlo simulation and aggregation.
//!
//! - [`prng`]: Per-trial sub-seed derivation
//! - [`shocks`]: Correlated national + unit shocks for one trial
//! - [`trial`]: Resolve one trial's units, EV totals, popular vote, and tipping point
//! - [`aggregate`]: Mergeable counters and the final [`SimulationResult`]
//! - [`engine`]: Orchestration over N trials (parallel, sequential, recording)

pub mod aggregate;
pub mod engine;
pub mod prng;
pub mod shocks;
pub mod trial;

// Re-export commonly used items
pub use aggregate::{
    EvPercentiles, HistogramBin, PercentileBand, SimulationResult, Tally, TippingPointEntry,
    UnitProbability,
};
pub use engine::{
    aggregate_outcomes, baseline_outcome, run_simulation, run_simulation_sequential,
    simulate_trial, simulate_trials, trial_count_from_json, trial_count_from_raw,
    SimulationConfig,
};
pub use shocks::ShockSampler;
pub use trial::{resolve_outcome, resolve_trial, NationalOutcome, TrialOutcome, WinningPath};
