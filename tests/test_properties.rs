//! Property-based tests for trial resolution and aggregation.

use proptest::prelude::*;

use electoral_forecast::constants::*;
use electoral_forecast::registry::StateModelRegistry;
use electoral_forecast::scenario::{resolve_scenario, ScenarioAdjustment, UnitOverride};
use electoral_forecast::simulation::aggregate::{histogram, percentile_from_counts};
use electoral_forecast::simulation::{
    resolve_trial, simulate_trials, SimulationConfig, Tally, TrialOutcome,
};
use electoral_forecast::types::Party;

static REGISTRY: std::sync::OnceLock<StateModelRegistry> = std::sync::OnceLock::new();

fn registry() -> &'static StateModelRegistry {
    REGISTRY.get_or_init(StateModelRegistry::baseline)
}

/// Strategy: one shock per baseline unit, wide enough to hit both clamps.
fn shocks_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.8..0.8f64, registry().len())
}

/// Strategy: a count-encoded EV sample with at least one observation.
fn counts_strategy() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0..20u64, EV_SLOTS).prop_filter("non-empty", |c| c.iter().sum::<u64>() > 0)
}

fn outcomes(seed: u64, trials: usize) -> Vec<TrialOutcome> {
    let config = SimulationConfig::default().with_trials(trials).with_seed(seed);
    simulate_trials(registry(), &ScenarioAdjustment::default(), &config).unwrap()
}

fn tally_of(outcomes: &[TrialOutcome]) -> Tally {
    let mut tally = Tally::new(registry().len());
    for outcome in outcomes {
        tally.record(outcome);
    }
    tally
}

proptest! {
    // 1. Every trial allocates exactly 538 EV and names a consistent winner
    #[test]
    fn ev_sum_is_total(shocks in shocks_strategy()) {
        let model = resolve_scenario(registry(), &ScenarioAdjustment::default()).unwrap();
        let outcome = resolve_trial(&model, &shocks);
        prop_assert_eq!(outcome.dem_ev + outcome.rep_ev, TOTAL_EV);
        let expected = if outcome.dem_ev >= EV_TO_WIN { Party::Dem } else { Party::Rep };
        prop_assert_eq!(outcome.winner, expected);
    }

    // 2. The tipping point is the winner's unit that crosses the target,
    //    walking from the least to the most decisive win
    #[test]
    fn tipping_point_crosses_target(shocks in shocks_strategy()) {
        let model = resolve_scenario(registry(), &ScenarioAdjustment::default()).unwrap();
        let outcome = resolve_trial(&model, &shocks);
        let units = registry().units();
        let tp = outcome.tipping_point;
        prop_assert_eq!(outcome.unit_winners[tp], outcome.winner);

        let margin = |i: usize| (clamp_share(model.shares[i] + shocks[i]) - WIN_THRESHOLD).abs();
        let beyond = |i: usize| {
            margin(i) > margin(tp) || (margin(i) == margin(tp) && units[i].id > units[tp].id)
        };
        let remaining: u32 = (0..units.len())
            .filter(|&i| outcome.unit_winners[i] == outcome.winner && beyond(i))
            .map(|i| units[i].electoral_votes)
            .sum();
        let target = EV_TO_WIN.min(outcome.winner_ev());
        prop_assert!(remaining < target);
        prop_assert!(remaining + units[tp].electoral_votes >= target);
    }

    // 3. Shares never leave [0, 1], whatever the override and shock
    #[test]
    fn shares_clamped(value in 0.0..=1.0f64, shift in -1.0..=1.0f64) {
        let scenario = ScenarioAdjustment::default()
            .with_dem_shift(shift)
            .with_override("OH", UnitOverride::Absolute(value));
        let model = resolve_scenario(registry(), &scenario).unwrap();
        for &share in &model.shares {
            prop_assert!((0.0..=1.0).contains(&share));
        }
    }

    // 4. Percentiles are ordered and stay within the observed range
    #[test]
    fn percentiles_monotone(counts in counts_strategy(), a in 0.0..=100.0f64, b in 0.0..=100.0f64) {
        let total: u64 = counts.iter().sum();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let p_lo = percentile_from_counts(&counts, total, lo);
        let p_hi = percentile_from_counts(&counts, total, hi);
        prop_assert!(p_lo <= p_hi, "p{lo}={p_lo} > p{hi}={p_hi}");
        let min = counts.iter().position(|&c| c > 0).unwrap() as f64;
        let max = counts.iter().rposition(|&c| c > 0).unwrap() as f64;
        prop_assert!(p_lo >= min && p_hi <= max);
    }

    // 5. Histogram bins tile [0, 538] and keep every observation
    #[test]
    fn histogram_covers_range(counts in counts_strategy(), width in 1..=600u32) {
        let bins = histogram(&counts, width);
        prop_assert_eq!(bins.iter().map(|b| b.count).sum::<u64>(), counts.iter().sum::<u64>());
        prop_assert_eq!(bins[0].lower, 0);
        prop_assert_eq!(bins.last().unwrap().upper, TOTAL_EV);
        for pair in bins.windows(2) {
            prop_assert_eq!(pair[0].upper + 1, pair[1].lower);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    // 6. Merging partial tallies is order-independent
    #[test]
    fn merge_commutes(seed in any::<u64>(), split in 0..60usize) {
        let all = outcomes(seed, 60);
        let (left, right) = all.split_at(split);
        let ab = tally_of(left).merge(tally_of(right));
        let ba = tally_of(right).merge(tally_of(left));
        prop_assert_eq!(&ab, &ba);
        prop_assert_eq!(&ab, &tally_of(&all));
    }
}

#[test]
fn empty_sample_percentile_is_zero() {
    assert_eq!(percentile_from_counts(&vec![0; EV_SLOTS], 0, 50.0), 0.0);
}
