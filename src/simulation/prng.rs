//! Counter-based per-trial seed derivation.
//!
//! Every trial owns its own RNG, seeded by a pure function of the master seed
//! and the trial index. No stream is shared between trials, so results do not
//! depend on which worker runs which trial or in what order.
//!
//! The mixer is SplitMix64: one u64 of state, a Weyl increment, and a 64-bit
//! finaliser. Seeding `SplitMix64` at `master + index * GAMMA` and taking one
//! output lands on the `index + 1`-th element of the master's own sequence.

use rand::rngs::SmallRng;
use rand::SeedableRng;

const GAMMA: u64 = 0x9e3779b97f4a7c15;

/// SplitMix64 PRNG with a single u64 state.
#[derive(Clone)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    #[inline(always)]
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    #[inline(always)]
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(GAMMA);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        z ^ (z >> 31)
    }
}

/// Sub-seed for trial `index` of a run seeded with `master`.
#[inline(always)]
pub fn derive_trial_seed(master: u64, index: u64) -> u64 {
    SplitMix64::new(master.wrapping_add(index.wrapping_mul(GAMMA))).next_u64()
}

/// Fresh RNG for one trial.
#[inline(always)]
pub fn trial_rng(master: u64, index: u64) -> SmallRng {
    SmallRng::seed_from_u64(derive_trial_seed(master, index))
}
