//! Scenario Resolver: merges a registry with caller adjustments into an
//! [`EffectiveModel`] for one simulation run.
//!
//! ```text
//! effective_share(u) = clamp(base(u) + national_dem_shift - national_rep_shift
//!                            + state_shift(u) + shift(u), 0, 1)
//! ```
//!
//! where `base(u)` is the registry share, or the override value when the unit has a
//! [`UnitOverride::Absolute`] entry, and `shift(u)` is the delta of a
//! [`UnitOverride::Shift`] entry (0 otherwise). A district also inherits the delta
//! of a `Shift` on its split state's at-large id, applied before its own override.
//! An `Absolute` on the at-large id, and any district override, touch only the unit
//! they name.
//!
//! Turnout only scales popular-vote weights. Win/loss is decided on shares alone.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::clamp_share;
use crate::error::{ForecastError, ForecastResult};
use crate::registry::StateModelRegistry;
use crate::types::VotingUnit;

/// Per-unit share adjustment. The kind decides replace-versus-add semantics.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum UnitOverride {
    /// Replace the baseline share. Must lie in [0, 1].
    Absolute(f64),
    /// Add a delta to the baseline share. Must lie in [-1, 1].
    Shift(f64),
}

/// Caller-supplied adjustments. The default is the unmodified baseline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioAdjustment {
    pub national_dem_shift: f64,
    pub national_rep_shift: f64,
    /// Scales every unit's popular-vote weight.
    pub turnout_multiplier: f64,
    pub unit_overrides: BTreeMap<String, UnitOverride>,
    /// Per-unit turnout multipliers, applied on top of `turnout_multiplier`.
    pub unit_turnout: BTreeMap<String, f64>,
}

impl Default for ScenarioAdjustment {
    fn default() -> Self {
        Self {
            national_dem_shift: 0.0,
            national_rep_shift: 0.0,
            turnout_multiplier: 1.0,
            unit_overrides: BTreeMap::new(),
            unit_turnout: BTreeMap::new(),
        }
    }
}

impl ScenarioAdjustment {
    pub fn with_dem_shift(mut self, shift: f64) -> Self {
        self.national_dem_shift = shift;
        self
    }

    pub fn with_rep_shift(mut self, shift: f64) -> Self {
        self.national_rep_shift = shift;
        self
    }

    pub fn with_turnout(mut self, multiplier: f64) -> Self {
        self.turnout_multiplier = multiplier;
        self
    }

    pub fn with_override(mut self, id: &str, adjustment: UnitOverride) -> Self {
        self.unit_overrides.insert(id.to_string(), adjustment);
        self
    }

    pub fn with_unit_turnout(mut self, id: &str, multiplier: f64) -> Self {
        self.unit_turnout.insert(id.to_string(), multiplier);
        self
    }

    /// True if this scenario changes nothing.
    pub fn is_baseline(&self) -> bool {
        *self == Self::default()
    }
}

/// Per-unit effective parameters for one run, aligned with the registry's unit order.
#[derive(Clone, Debug)]
pub struct EffectiveModel<'a> {
    pub registry: &'a StateModelRegistry,
    /// Effective Democratic share per unit, already clamped.
    pub shares: Vec<f64>,
    /// Popular-vote weight per unit: baseline turnout times turnout multipliers.
    pub voter_weights: Vec<f64>,
}

impl EffectiveModel<'_> {
    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }
}

/// Validate `scenario` against `registry` and produce the effective model.
pub fn resolve_scenario<'a>(
    registry: &'a StateModelRegistry,
    scenario: &ScenarioAdjustment,
) -> ForecastResult<EffectiveModel<'a>> {
    validate_scenario(registry, scenario)?;

    let national = scenario.national_dem_shift - scenario.national_rep_shift;
    let mut shares = Vec::with_capacity(registry.len());
    let mut voter_weights = Vec::with_capacity(registry.len());

    for unit in registry.units() {
        let (base, shift) = match scenario.unit_overrides.get(&unit.id) {
            Some(UnitOverride::Absolute(share)) => (*share, 0.0),
            Some(UnitOverride::Shift(delta)) => (unit.dem_share, *delta),
            None => (unit.dem_share, 0.0),
        };
        shares.push(clamp_share(base + national + state_shift(scenario, unit) + shift));

        let unit_turnout = scenario.unit_turnout.get(&unit.id).copied().unwrap_or(1.0);
        voter_weights
            .push(unit.baseline_turnout as f64 * scenario.turnout_multiplier * unit_turnout);
    }

    tracing::debug!(
        units = shares.len(),
        national_shift = national,
        overrides = scenario.unit_overrides.len(),
        "resolved scenario"
    );

    Ok(EffectiveModel {
        registry,
        shares,
        voter_weights,
    })
}

/// Shift a district inherits from a `Shift` override on its at-large parent.
fn state_shift(scenario: &ScenarioAdjustment, unit: &VotingUnit) -> f64 {
    if !unit.is_district() {
        return 0.0;
    }
    match scenario.unit_overrides.get(unit.state_code()) {
        Some(UnitOverride::Shift(delta)) => *delta,
        _ => 0.0,
    }
}

fn validate_scenario(
    registry: &StateModelRegistry,
    scenario: &ScenarioAdjustment,
) -> ForecastResult<()> {
    check_range("national_dem_shift", scenario.national_dem_shift, -1.0, 1.0)?;
    check_range("national_rep_shift", scenario.national_rep_shift, -1.0, 1.0)?;
    check_multiplier("turnout_multiplier", scenario.turnout_multiplier)?;

    for (id, adjustment) in &scenario.unit_overrides {
        check_unit_id(registry, id)?;
        match *adjustment {
            UnitOverride::Absolute(share) => {
                check_range(&format!("override for '{}'", id), share, 0.0, 1.0)?
            }
            UnitOverride::Shift(delta) => {
                check_range(&format!("shift for '{}'", id), delta, -1.0, 1.0)?
            }
        }
    }

    for (id, multiplier) in &scenario.unit_turnout {
        check_unit_id(registry, id)?;
        check_multiplier(&format!("turnout for '{}'", id), *multiplier)?;
    }
    Ok(())
}

/// Unknown identifiers fail. A district-style id (`"TX-5"`) under a state that
/// exists but is not split gets a dedicated message.
fn check_unit_id(registry: &StateModelRegistry, id: &str) -> ForecastResult<()> {
    if registry.get(id).is_some() {
        return Ok(());
    }
    if let Some((state, _)) = id.split_once('-') {
        if registry.get(state).is_some() && !registry.is_split_state(state) {
            return Err(ForecastError::InvalidScenario(format!(
                "district override '{}' for non-split state '{}'",
                id, state
            )));
        }
    }
    Err(ForecastError::InvalidScenario(format!(
        "unknown unit '{}'",
        id
    )))
}

fn check_range(what: &str, value: f64, low: f64, high: f64) -> ForecastResult<()> {
    if value.is_finite() && (low..=high).contains(&value) {
        Ok(())
    } else {
        Err(ForecastError::InvalidScenario(format!(
            "{} = {} outside [{}, {}]",
            what, value, low, high
        )))
    }
}

fn check_multiplier(what: &str, value: f64) -> ForecastResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ForecastError::InvalidScenario(format!(
            "{} = {} must be finite and >= 0",
            what, value
        )))
    }
}
