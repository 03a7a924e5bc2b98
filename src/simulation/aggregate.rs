//! Aggregator: folds trial outcomes into a [`SimulationResult`].
//!
//! All running state lives in a [`Tally`] of integer counters. EV totals are
//! bounded by 538, so the full EV distribution is a 539-slot count array rather
//! than a per-trial vector, and percentiles are still exact. Integer counters
//! make [`Tally::merge`] commutative and associative, so a sequential fold and
//! any rayon reduction tree produce bit-identical results.
//!
//! ## Percentiles
//!
//! Linear interpolation between adjacent order statistics (Hyndman–Fan type 7):
//! for `n` trials and percentile `p`, rank `h = p/100 · (n − 1)`, and the value
//! is `x[⌊h⌋] + (h − ⌊h⌋) · (x[⌈h⌉] − x[⌊h⌋])` over the sorted EV totals.

use serde::Serialize;

use crate::constants::{EV_SLOTS, EV_TO_WIN, TOTAL_EV, WIN_THRESHOLD};
use crate::registry::StateModelRegistry;
use crate::types::Party;

use super::engine::SimulationConfig;
use super::trial::TrialOutcome;

// ── Running statistics ──────────────────────────────────────────────

/// Mergeable counters over any number of trials.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tally {
    pub trials: u64,
    pub dem_wins: u64,
    pub dem_popular_wins: u64,
    /// Trials where the popular-vote winner lost the Electoral College.
    pub split_outcomes: u64,
    pub dem_ev_sum: u64,
    /// `dem_ev_counts[ev]` = trials in which Democrats won exactly `ev`.
    pub dem_ev_counts: Vec<u64>,
    pub unit_dem_wins: Vec<u64>,
    pub tipping_counts: Vec<u64>,
}

impl Tally {
    pub fn new(num_units: usize) -> Self {
        Self {
            trials: 0,
            dem_wins: 0,
            dem_popular_wins: 0,
            split_outcomes: 0,
            dem_ev_sum: 0,
            dem_ev_counts: vec![0; EV_SLOTS],
            unit_dem_wins: vec![0; num_units],
            tipping_counts: vec![0; num_units],
        }
    }

    /// Fold one outcome in. The outcome must come from a registry of
    /// `num_units` units and carry `dem_ev <= TOTAL_EV`; see
    /// [`aggregate_outcomes`](super::engine::aggregate_outcomes) for the checked path.
    pub fn record(&mut self, outcome: &TrialOutcome) {
        self.trials += 1;
        if outcome.winner == Party::Dem {
            self.dem_wins += 1;
        }
        let popular = outcome.popular_winner();
        if popular == Party::Dem {
            self.dem_popular_wins += 1;
        }
        if popular != outcome.winner {
            self.split_outcomes += 1;
        }
        self.dem_ev_sum += outcome.dem_ev as u64;
        self.dem_ev_counts[outcome.dem_ev as usize] += 1;
        for (wins, side) in self.unit_dem_wins.iter_mut().zip(&outcome.unit_winners) {
            if *side == Party::Dem {
                *wins += 1;
            }
        }
        self.tipping_counts[outcome.tipping_point] += 1;
    }

    /// Combine two partial tallies.
    pub fn merge(mut self, other: Tally) -> Tally {
        self.trials += other.trials;
        self.dem_wins += other.dem_wins;
        self.dem_popular_wins += other.dem_popular_wins;
        self.split_outcomes += other.split_outcomes;
        self.dem_ev_sum += other.dem_ev_sum;
        add_into(&mut self.dem_ev_counts, &other.dem_ev_counts);
        add_into(&mut self.unit_dem_wins, &other.unit_dem_wins);
        add_into(&mut self.tipping_counts, &other.tipping_counts);
        self
    }

    /// Turn the counters into the final result. Requires at least one trial.
    pub fn finish(
        &self,
        registry: &StateModelRegistry,
        config: &SimulationConfig,
    ) -> SimulationResult {
        let n = self.trials.max(1) as f64;
        let fraction = |count: u64| count as f64 / n;

        let rep_ev_counts: Vec<u64> = self.dem_ev_counts.iter().rev().copied().collect();

        let units: Vec<UnitProbability> = registry
            .units()
            .iter()
            .enumerate()
            .map(|(i, unit)| UnitProbability {
                id: unit.id.clone(),
                name: unit.name.clone(),
                electoral_votes: unit.electoral_votes,
                dem_win_probability: fraction(self.unit_dem_wins[i]),
                rep_win_probability: fraction(self.trials - self.unit_dem_wins[i]),
                tipping_point_frequency: fraction(self.tipping_counts[i]),
            })
            .collect();

        let mut battlegrounds = units.clone();
        battlegrounds.sort_by(|a, b| {
            (a.dem_win_probability - WIN_THRESHOLD)
                .abs()
                .total_cmp(&(b.dem_win_probability - WIN_THRESHOLD).abs())
                .then_with(|| a.id.cmp(&b.id))
        });
        battlegrounds.truncate(config.battleground_count);

        let mut tipping_points: Vec<TippingPointEntry> = units
            .iter()
            .zip(&self.tipping_counts)
            .filter(|(_, count)| **count > 0)
            .map(|(unit, &count)| TippingPointEntry {
                id: unit.id.clone(),
                count,
                frequency: fraction(count),
            })
            .collect();
        tipping_points.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.id.cmp(&b.id)));

        SimulationResult {
            trials: self.trials,
            seed: config.seed,
            correlation: config.correlation,
            total_ev: TOTAL_EV,
            ev_to_win: EV_TO_WIN,
            win_probability_dem: fraction(self.dem_wins),
            win_probability_rep: fraction(self.trials - self.dem_wins),
            popular_win_probability_dem: fraction(self.dem_popular_wins),
            popular_win_probability_rep: fraction(self.trials - self.dem_popular_wins),
            split_probability: fraction(self.split_outcomes),
            mean_dem_ev: self.dem_ev_sum as f64 / n,
            ev_percentiles: EvPercentiles {
                dem: PercentileBand::from_counts(&self.dem_ev_counts, self.trials),
                rep: PercentileBand::from_counts(&rep_ev_counts, self.trials),
            },
            histogram: histogram(&self.dem_ev_counts, config.histogram_bin_width),
            units,
            battlegrounds,
            tipping_points,
        }
    }
}

fn add_into(acc: &mut [u64], other: &[u64]) {
    for (a, b) in acc.iter_mut().zip(other) {
        *a += *b;
    }
}

// ── Result types ────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationResult {
    pub trials: u64,
    pub seed: u64,
    pub correlation: f64,
    pub total_ev: u32,
    pub ev_to_win: u32,
    pub win_probability_dem: f64,
    pub win_probability_rep: f64,
    pub popular_win_probability_dem: f64,
    pub popular_win_probability_rep: f64,
    /// P(popular-vote winner loses the Electoral College).
    pub split_probability: f64,
    pub mean_dem_ev: f64,
    pub ev_percentiles: EvPercentiles,
    /// Democratic EV distribution.
    pub histogram: Vec<HistogramBin>,
    /// Every unit, in registry order.
    pub units: Vec<UnitProbability>,
    /// Closest contests by win probability, closest first.
    pub battlegrounds: Vec<UnitProbability>,
    /// Units that were ever the tipping point, most frequent first.
    pub tipping_points: Vec<TippingPointEntry>,
}

impl SimulationResult {
    pub fn unit(&self, id: &str) -> Option<&UnitProbability> {
        self.units.iter().find(|u| u.id == id)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EvPercentiles {
    pub dem: PercentileBand,
    pub rep: PercentileBand,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PercentileBand {
    pub p5: f64,
    pub p50: f64,
    pub p95: f64,
}

impl PercentileBand {
    fn from_counts(counts: &[u64], total: u64) -> Self {
        Self {
            p5: percentile_from_counts(counts, total, 5.0),
            p50: percentile_from_counts(counts, total, 50.0),
            p95: percentile_from_counts(counts, total, 95.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: u32,
    /// Inclusive.
    pub upper: u32,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UnitProbability {
    pub id: String,
    pub name: String,
    pub electoral_votes: u32,
    pub dem_win_probability: f64,
    pub rep_win_probability: f64,
    pub tipping_point_frequency: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TippingPointEntry {
    pub id: String,
    pub count: u64,
    pub frequency: f64,
}

// ── Distribution helpers ────────────────────────────────────────────

/// The `k`-th smallest value (0-based) of the multiset described by `counts`.
fn order_statistic(counts: &[u64], k: u64) -> u32 {
    let mut seen = 0u64;
    for (value, &count) in counts.iter().enumerate() {
        seen += count;
        if seen > k {
            return value as u32;
        }
    }
    counts.len().saturating_sub(1) as u32
}

/// Type-7 percentile over a count-encoded sample. Returns 0 for an empty sample.
pub fn percentile_from_counts(counts: &[u64], total: u64, pct: f64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let h = (pct / 100.0).clamp(0.0, 1.0) * (total - 1) as f64;
    let lo = h.floor();
    let lower = order_statistic(counts, lo as u64) as f64;
    let upper = order_statistic(counts, h.ceil() as u64) as f64;
    lower + (h - lo) * (upper - lower)
}

/// Fixed-width bins over `[0, 538]`; the last bin is truncated at 538.
pub fn histogram(counts: &[u64], bin_width: u32) -> Vec<HistogramBin> {
    let width = bin_width.max(1) as usize;
    counts
        .chunks(width)
        .enumerate()
        .map(|(i, chunk)| {
            let lower = (i * width) as u32;
            HistogramBin {
                lower,
                upper: lower + chunk.len() as u32 - 1,
                count: chunk.iter().sum(),
            }
        })
        .collect()
}
