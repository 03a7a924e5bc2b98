//! Trial Resolver: turns one set of shocks into a [`TrialOutcome`].
//!
//! ## Per-unit resolution
//!
//! `adjusted(u) = clamp(effective(u) + shock(u), 0, 1)`; the unit is Democratic
//! iff `adjusted(u) > 0.5`. Split states need no special casing here: the
//! at-large unit carries the statewide share and the at-large electors, and each
//! district unit carries its own share and one elector.
//!
//! ## National winner
//!
//! Democratic iff `dem_ev >= 270`. A 269–269 tie resolves Republican, matching
//! the share tie-break.
//!
//! ## Tipping point
//!
//! Units won by the national winner are ordered by `|adjusted − 0.5|` ascending,
//! ties broken by unit id. Walking that order, each unit's baseline is the
//! winner's EV from every unit after it (the safer ones). The tipping point is
//! the first unit whose baseline is short of the target while baseline plus its
//! own EV reaches it: the closest contest that was still decisive. The target is
//! 270, or the winner's total in a 269–269 tie.

use serde::Serialize;

use crate::constants::{clamp_share, EV_TO_WIN, WIN_THRESHOLD};
use crate::scenario::EffectiveModel;
use crate::types::{Party, UnitKind, VotingUnit};

/// Result of one simulated election. Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrialOutcome {
    pub dem_ev: u32,
    pub rep_ev: u32,
    pub popular_dem: f64,
    pub popular_rep: f64,
    pub winner: Party,
    /// Winner of each unit, in registry order.
    pub unit_winners: Vec<Party>,
    /// Registry index of the tipping-point unit.
    pub tipping_point: usize,
}

impl TrialOutcome {
    pub fn winner_ev(&self) -> u32 {
        match self.winner {
            Party::Dem => self.dem_ev,
            Party::Rep => self.rep_ev,
        }
    }

    /// Side with more popular votes. An exact tie goes Republican.
    pub fn popular_winner(&self) -> Party {
        if self.popular_dem > self.popular_rep {
            Party::Dem
        } else {
            Party::Rep
        }
    }
}

/// Resolve one trial from the effective model and this trial's shocks.
pub fn resolve_trial(model: &EffectiveModel, shocks: &[f64]) -> TrialOutcome {
    debug_assert_eq!(model.len(), shocks.len());
    let adjusted: Vec<f64> = model
        .shares
        .iter()
        .zip(shocks)
        .map(|(&share, &shock)| clamp_share(share + shock))
        .collect();
    tally_units(model, adjusted)
}

fn tally_units(model: &EffectiveModel, adjusted: Vec<f64>) -> TrialOutcome {
    let units = model.registry.units();
    let mut dem_ev = 0u32;
    let mut rep_ev = 0u32;
    let mut popular_dem = 0.0f64;
    let mut popular_rep = 0.0f64;
    let mut unit_winners = Vec::with_capacity(units.len());

    for ((unit, &share), &weight) in units.iter().zip(&adjusted).zip(&model.voter_weights) {
        let side = Party::from_share(share);
        match side {
            Party::Dem => dem_ev += unit.electoral_votes,
            Party::Rep => rep_ev += unit.electoral_votes,
        }
        popular_dem += share * weight;
        popular_rep += (1.0 - share) * weight;
        unit_winners.push(side);
    }

    let winner = if dem_ev >= EV_TO_WIN {
        Party::Dem
    } else {
        Party::Rep
    };
    let winner_ev = if winner == Party::Dem { dem_ev } else { rep_ev };
    let tipping_point = find_tipping_point(units, &adjusted, &unit_winners, winner, winner_ev);

    TrialOutcome {
        dem_ev,
        rep_ev,
        popular_dem,
        popular_rep,
        winner,
        unit_winners,
        tipping_point,
    }
}

/// Closest-first walk over the winner's units; see the module docs.
pub fn find_tipping_point(
    units: &[VotingUnit],
    adjusted: &[f64],
    unit_winners: &[Party],
    winner: Party,
    winner_ev: u32,
) -> usize {
    let target = EV_TO_WIN.min(winner_ev);
    let margin = |i: usize| (adjusted[i] - WIN_THRESHOLD).abs();

    let mut order: Vec<usize> = (0..units.len())
        .filter(|&i| unit_winners[i] == winner)
        .collect();
    order.sort_by(|&a, &b| {
        margin(a)
            .total_cmp(&margin(b))
            .then_with(|| units[a].id.cmp(&units[b].id))
    });

    let mut baseline = winner_ev;
    for &i in &order {
        baseline -= units[i].electoral_votes;
        if baseline < target {
            return i;
        }
    }
    // Only reachable with an empty order, which a 538-EV registry rules out.
    order.last().copied().unwrap_or(0)
}

// ── Deterministic outcome ───────────────────────────────────────────

/// One unit's resolution in a shock-free outcome.
#[derive(Clone, Debug, Serialize)]
pub struct UnitResult {
    pub id: String,
    pub name: String,
    pub kind: UnitKind,
    pub dem_share: f64,
    pub winner: Party,
    pub electoral_votes: u32,
    pub popular_dem: f64,
    pub popular_rep: f64,
}

/// How the winner got there.
#[derive(Clone, Debug, Serialize)]
pub struct WinningPath {
    pub winner: Party,
    /// Democratic EV minus Republican EV.
    pub ev_margin: i64,
    /// Ids of units carried by the winner, in registry order.
    pub units_won: Vec<String>,
    /// EV the winner is still short of 270 (non-zero only in a 269–269 tie).
    pub ev_short_of_majority: u32,
    pub tipping_point: String,
}

/// National result of the effective model with every shock at zero.
#[derive(Clone, Debug, Serialize)]
pub struct NationalOutcome {
    pub dem_ev: u32,
    pub rep_ev: u32,
    pub popular_dem: f64,
    pub popular_rep: f64,
    pub winner: Party,
    pub units: Vec<UnitResult>,
    pub path: WinningPath,
}

/// Resolve the effective model without uncertainty.
pub fn resolve_outcome(model: &EffectiveModel) -> NationalOutcome {
    let outcome = tally_units(model, model.shares.clone());
    let registry_units = model.registry.units();

    let units: Vec<UnitResult> = registry_units
        .iter()
        .enumerate()
        .map(|(i, unit)| {
            let share = model.shares[i];
            let weight = model.voter_weights[i];
            UnitResult {
                id: unit.id.clone(),
                name: unit.name.clone(),
                kind: unit.kind,
                dem_share: share,
                winner: outcome.unit_winners[i],
                electoral_votes: unit.electoral_votes,
                popular_dem: share * weight,
                popular_rep: (1.0 - share) * weight,
            }
        })
        .collect();

    let path = WinningPath {
        winner: outcome.winner,
        ev_margin: outcome.dem_ev as i64 - outcome.rep_ev as i64,
        units_won: units
            .iter()
            .filter(|u| u.winner == outcome.winner)
            .map(|u| u.id.clone())
            .collect(),
        ev_short_of_majority: EV_TO_WIN.saturating_sub(outcome.winner_ev()),
        tipping_point: registry_units[outcome.tipping_point].id.clone(),
    };

    NationalOutcome {
        dem_ev: outcome.dem_ev,
        rep_ev: outcome.rep_ev,
        popular_dem: outcome.popular_dem,
        popular_rep: outcome.popular_rep,
        winner: outcome.winner,
        units,
        path,
    }
}
