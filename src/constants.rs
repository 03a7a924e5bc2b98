//! Electoral College constants and simulation defaults.
//!
//! - [`TOTAL_EV`] = 538 electors (435 House + 100 Senate + 3 for DC)
//! - [`EV_TO_WIN`] = 270, a strict majority of 538
//! - [`WIN_THRESHOLD`] = 0.5: a unit is Democratic iff its share is strictly above it
//!
//! EV totals live in `[0, TOTAL_EV]`, so distributions over them are stored as
//! dense count arrays of length [`EV_SLOTS`] instead of per-trial vectors.

/// Total electoral votes across all units.
pub const TOTAL_EV: u32 = 538;

/// Electoral votes needed for an outright majority.
pub const EV_TO_WIN: u32 = 270;

/// Number of distinct EV totals a party can hold: 0..=538.
pub const EV_SLOTS: usize = TOTAL_EV as usize + 1;

/// Electors a split state awards to its statewide winner.
pub const AT_LARGE_EV: u32 = 2;

/// Electors per congressional district in a split state.
pub const DISTRICT_EV: u32 = 1;

/// Two-party share a Democratic win must strictly exceed.
/// A share of exactly 0.5 resolves Republican.
pub const WIN_THRESHOLD: f64 = 0.5;

/// Seed used when the caller does not supply one.
pub const DEFAULT_SEED: u64 = 2024;

/// Default number of Monte Carlo trials.
pub const DEFAULT_TRIALS: usize = 10_000;

/// Default share of per-unit variance carried by the national shock.
pub const DEFAULT_CORRELATION: f64 = 0.6;

/// Default histogram bin width in electoral votes.
pub const DEFAULT_HISTOGRAM_BIN_WIDTH: u32 = 10;

/// Default length of the battleground ranking.
pub const DEFAULT_BATTLEGROUND_COUNT: usize = 10;

/// Clamp a two-party share into `[0, 1]`.
#[inline(always)]
pub fn clamp_share(share: f64) -> f64 {
    share.clamp(0.0, 1.0)
}
