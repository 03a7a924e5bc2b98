//! # Electoral Forecast: Monte Carlo Electoral College simulator
//!
//! Forecasts a two-party Electoral College outcome by running seeded randomized
//! trials over per-unit vote-share models with correlated national and
//! unit-level error, then aggregating the trials into win probabilities,
//! percentile bands, a histogram, and tipping-point/battleground rankings.
//!
//! ## Pipeline
//!
//! | Stage | Rust module | Description |
//! |-------|-------------|-------------|
//! | Registry | [`registry`] | Baseline share, stddev, EV, and turnout per voting unit (538 EV) |
//! | Scenario | [`scenario`] | National shifts, turnout, per-unit absolute/shift overrides → effective model |
//! | Shocks | [`simulation::shocks`] | `sqrt(ρ)·z_nat + sqrt(1−ρ)·z_unit`, scaled by each unit's stddev |
//! | Trial | [`simulation::trial`] | Winners, EV and popular-vote totals, tipping point |
//! | Aggregate | [`simulation::aggregate`] | Integer tallies → probabilities, percentiles, histogram, rankings |
//! | Orchestrate | [`simulation::engine`] | Per-trial sub-seeds, rayon fold/reduce, recording mode |
//!
//! ## Reproducibility
//!
//! `(registry, scenario, seed, trials)` fully determines the result. Each trial
//! seeds its own RNG from `(seed, trial index)`, and the aggregation is an
//! integer-only commutative merge, so thread count and scheduling never change
//! a single bit of the output.
//!
//! ## Split-allocation states
//!
//! Maine and Nebraska are an at-large unit (the statewide share, two electors)
//! plus one unit per congressional district (one elector each). Every unit is
//! resolved independently, which gives the at-large/district split for free.
//!
//! The core does no I/O. [`server`] and the binaries are thin boundaries.

pub mod constants;
pub mod env_config;
pub mod error;
pub mod registry;
pub mod scenario;
pub mod server;
pub mod simulation;
pub mod types;

pub use error::{ForecastError, ForecastResult};
pub use registry::StateModelRegistry;
pub use scenario::{ScenarioAdjustment, UnitOverride};
pub use simulation::{run_simulation, SimulationConfig, SimulationResult};
