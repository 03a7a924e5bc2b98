//! StateModel Registry: compiled-in baseline parameters for every voting unit.
//!
//! The baseline is a 2020-era two-party scenario: 48 winner-take-all states plus
//! DC, and Maine/Nebraska split into an at-large unit and one unit per
//! congressional district. Raw table values are percentages of the total vote;
//! they are normalised to a two-party Democratic share in [0, 1] on load.
//!
//! A registry is validated once at construction and is immutable afterwards.

use std::collections::HashMap;

use crate::constants::{AT_LARGE_EV, DISTRICT_EV, TOTAL_EV};
use crate::error::{ForecastError, ForecastResult};
use crate::types::{UnitKind, VotingUnit};

/// (code, name, EV, dem %, rep %, baseline turnout, uncertainty in points).
///
/// For split states the EV column is the at-large count only.
const STATE_TABLE: [(&str, &str, u32, f64, f64, u64, f64); 51] = [
    ("AL", "Alabama", 9, 36.6, 62.0, 2_320_000, 2.0),
    ("AK", "Alaska", 3, 42.8, 52.8, 360_000, 3.0),
    ("AZ", "Arizona", 11, 49.4, 49.1, 3_387_000, 2.5),
    ("AR", "Arkansas", 6, 34.8, 62.4, 1_219_000, 2.0),
    ("CA", "California", 54, 63.5, 34.3, 17_500_000, 1.5),
    ("CO", "Colorado", 10, 55.4, 41.9, 3_296_000, 1.8),
    ("CT", "Connecticut", 7, 59.3, 39.2, 1_820_000, 1.5),
    ("DE", "Delaware", 3, 58.8, 39.8, 510_000, 1.8),
    ("DC", "District of Columbia", 3, 92.1, 5.4, 345_000, 1.0),
    ("FL", "Florida", 30, 47.9, 51.2, 11_140_000, 2.8),
    ("GA", "Georgia", 16, 49.5, 49.3, 5_000_000, 2.6),
    ("HI", "Hawaii", 4, 63.7, 34.3, 580_000, 2.0),
    ("ID", "Idaho", 4, 33.1, 63.8, 880_000, 1.8),
    ("IL", "Illinois", 19, 57.5, 40.6, 6_034_000, 1.6),
    ("IN", "Indiana", 11, 41.0, 57.0, 3_030_000, 2.0),
    ("IA", "Iowa", 6, 44.9, 53.1, 1_700_000, 2.2),
    ("KS", "Kansas", 6, 41.5, 56.2, 1_370_000, 2.0),
    ("KY", "Kentucky", 8, 36.2, 62.1, 2_130_000, 1.8),
    ("LA", "Louisiana", 8, 39.9, 58.5, 2_150_000, 2.2),
    ("ME", "Maine", 2, 53.1, 44.0, 820_000, 2.4),
    ("MD", "Maryland", 10, 65.4, 32.1, 3_030_000, 1.6),
    ("MA", "Massachusetts", 11, 65.6, 32.1, 3_630_000, 1.5),
    ("MI", "Michigan", 15, 50.6, 47.8, 5_540_000, 2.4),
    ("MN", "Minnesota", 10, 52.4, 45.3, 3_280_000, 2.0),
    ("MS", "Mississippi", 6, 41.1, 57.6, 1_310_000, 2.1),
    ("MO", "Missouri", 10, 41.4, 56.8, 3_020_000, 2.0),
    ("MT", "Montana", 4, 40.5, 56.9, 610_000, 2.0),
    ("NE", "Nebraska", 2, 39.2, 58.2, 970_000, 2.4),
    ("NV", "Nevada", 6, 50.1, 47.7, 1_405_000, 2.7),
    ("NH", "New Hampshire", 4, 52.7, 45.4, 815_000, 2.4),
    ("NJ", "New Jersey", 14, 57.3, 41.4, 4_600_000, 1.7),
    ("NM", "New Mexico", 5, 54.3, 43.5, 930_000, 2.0),
    ("NY", "New York", 28, 60.9, 37.7, 8_600_000, 1.8),
    ("NC", "North Carolina", 16, 48.6, 50.1, 5_520_000, 2.5),
    ("ND", "North Dakota", 3, 31.8, 65.1, 370_000, 1.8),
    ("OH", "Ohio", 17, 45.2, 53.3, 5_900_000, 2.1),
    ("OK", "Oklahoma", 7, 32.3, 65.4, 1_570_000, 1.7),
    ("OR", "Oregon", 8, 56.5, 40.4, 2_400_000, 1.9),
    ("PA", "Pennsylvania", 19, 50.0, 48.8, 6_915_000, 2.6),
    ("RI", "Rhode Island", 4, 59.5, 38.7, 520_000, 1.8),
    ("SC", "South Carolina", 9, 43.4, 55.1, 2_520_000, 2.1),
    ("SD", "South Dakota", 3, 35.6, 61.8, 430_000, 1.9),
    ("TN", "Tennessee", 11, 37.4, 60.7, 3_050_000, 2.0),
    ("TX", "Texas", 40, 46.5, 52.1, 11_320_000, 2.4),
    ("UT", "Utah", 6, 37.7, 58.1, 1_460_000, 2.0),
    ("VT", "Vermont", 3, 66.1, 30.7, 370_000, 1.4),
    ("VA", "Virginia", 13, 54.1, 44.0, 4_500_000, 2.0),
    ("WA", "Washington", 12, 58.2, 38.8, 4_100_000, 1.8),
    ("WV", "West Virginia", 4, 29.7, 68.6, 790_000, 1.6),
    ("WI", "Wisconsin", 10, 49.6, 48.9, 3_300_000, 2.4),
    ("WY", "Wyoming", 3, 26.6, 70.4, 280_000, 1.5),
];

/// (district id, parent code, name, dem %, rep %). One elector each.
const DISTRICT_TABLE: [(&str, &str, &str, f64, f64); 5] = [
    ("ME-1", "ME", "Maine 1st District", 60.0, 38.0),
    ("ME-2", "ME", "Maine 2nd District", 45.0, 53.0),
    ("NE-1", "NE", "Nebraska 1st District", 45.0, 53.0),
    ("NE-2", "NE", "Nebraska 2nd District", 52.0, 46.0),
    ("NE-3", "NE", "Nebraska 3rd District", 25.0, 73.0),
];

/// Normalise raw vote percentages to a two-party Democratic share.
/// Degenerate input (both non-positive) is an even race.
pub fn two_party_share(dem_pct: f64, rep_pct: f64) -> f64 {
    let dem = dem_pct.clamp(0.0, 100.0);
    let rep = rep_pct.clamp(0.0, 100.0);
    let total = dem + rep;
    if total <= 0.0 {
        0.5
    } else {
        dem / total
    }
}

/// Validated, immutable collection of voting units.
#[derive(Clone, Debug)]
pub struct StateModelRegistry {
    units: Vec<VotingUnit>,
    index: HashMap<String, usize>,
}

impl StateModelRegistry {
    /// Build a registry, validating every unit and the EV invariants.
    pub fn new(units: Vec<VotingUnit>) -> ForecastResult<Self> {
        if units.is_empty() {
            return Err(ForecastError::InvalidRegistry(
                "registry has no units".to_string(),
            ));
        }

        let mut index = HashMap::with_capacity(units.len());
        for (i, unit) in units.iter().enumerate() {
            validate_unit(unit)?;
            if index.insert(unit.id.clone(), i).is_some() {
                return Err(ForecastError::InvalidRegistry(format!(
                    "duplicate unit id '{}'",
                    unit.id
                )));
            }
        }

        // District parents must be at-large units, and every at-large unit needs districts.
        for unit in &units {
            match unit.kind {
                UnitKind::District => {
                    if unit.electoral_votes != DISTRICT_EV {
                        return Err(ForecastError::InvalidRegistry(format!(
                            "district '{}' carries {} EV, expected {}",
                            unit.id, unit.electoral_votes, DISTRICT_EV
                        )));
                    }
                    let parent = unit.parent.as_deref().unwrap_or_default();
                    match index.get(parent).map(|&i| units[i].kind) {
                        Some(UnitKind::AtLarge) => {}
                        _ => {
                            return Err(ForecastError::InvalidRegistry(format!(
                                "district '{}' has no at-large parent '{}'",
                                unit.id, parent
                            )))
                        }
                    }
                }
                UnitKind::AtLarge => {
                    if unit.electoral_votes != AT_LARGE_EV {
                        return Err(ForecastError::InvalidRegistry(format!(
                            "split state '{}' carries {} at-large EV, expected {}",
                            unit.id, unit.electoral_votes, AT_LARGE_EV
                        )));
                    }
                    let has_districts = units
                        .iter()
                        .any(|u| u.is_district() && u.parent.as_deref() == Some(&unit.id));
                    if !has_districts {
                        return Err(ForecastError::InvalidRegistry(format!(
                            "split state '{}' has no districts",
                            unit.id
                        )));
                    }
                }
                UnitKind::Statewide => {}
            }
        }

        let total: u32 = units.iter().map(|u| u.electoral_votes).sum();
        if total != TOTAL_EV {
            return Err(ForecastError::InvalidRegistry(format!(
                "units total {} EV, expected {}",
                total, TOTAL_EV
            )));
        }

        Ok(Self { units, index })
    }

    /// The compiled-in 2020-era baseline: 51 jurisdictions, 56 voting units.
    pub fn baseline() -> Self {
        let mut units = Vec::with_capacity(STATE_TABLE.len() + DISTRICT_TABLE.len());
        for &(code, name, ev, dem, rep, turnout, uncertainty) in STATE_TABLE.iter() {
            let is_split = DISTRICT_TABLE.iter().any(|d| d.1 == code);
            units.push(VotingUnit {
                id: code.to_string(),
                name: name.to_string(),
                kind: if is_split {
                    UnitKind::AtLarge
                } else {
                    UnitKind::Statewide
                },
                parent: None,
                dem_share: two_party_share(dem, rep),
                stddev: uncertainty / 100.0,
                electoral_votes: ev,
                baseline_turnout: turnout,
            });
            for &(id, _, district_name, d_dem, d_rep) in
                DISTRICT_TABLE.iter().filter(|d| d.1 == code)
            {
                units.push(VotingUnit {
                    id: id.to_string(),
                    name: district_name.to_string(),
                    kind: UnitKind::District,
                    parent: Some(code.to_string()),
                    dem_share: two_party_share(d_dem, d_rep),
                    stddev: uncertainty / 100.0,
                    electoral_votes: 1,
                    baseline_turnout: 0,
                });
            }
        }
        Self::new(units).expect("compiled-in baseline registry is valid")
    }

    pub fn units(&self) -> &[VotingUnit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&VotingUnit> {
        self.index_of(id).map(|i| &self.units[i])
    }

    /// True if `code` names a split-allocation state.
    pub fn is_split_state(&self, code: &str) -> bool {
        matches!(self.get(code), Some(u) if u.kind == UnitKind::AtLarge)
    }

    /// Total EV a state controls: the unit itself plus any districts under it.
    pub fn state_electoral_votes(&self, code: &str) -> u32 {
        self.units
            .iter()
            .filter(|u| u.state_code() == code)
            .map(|u| u.electoral_votes)
            .sum()
    }
}

fn validate_unit(unit: &VotingUnit) -> ForecastResult<()> {
    let fail = |msg: String| Err(ForecastError::InvalidRegistry(msg));
    if unit.id.is_empty() {
        return fail("unit id is required".to_string());
    }
    if !(unit.dem_share.is_finite() && (0.0..=1.0).contains(&unit.dem_share)) {
        return fail(format!("{}: dem_share {} outside [0, 1]", unit.id, unit.dem_share));
    }
    if !(unit.stddev.is_finite() && unit.stddev >= 0.0) {
        return fail(format!("{}: stddev {} must be >= 0", unit.id, unit.stddev));
    }
    if unit.electoral_votes == 0 {
        return fail(format!("{}: electoral_votes must be >= 1", unit.id));
    }
    match (unit.kind, unit.parent.is_some()) {
        (UnitKind::District, false) => fail(format!("{}: district without parent", unit.id)),
        (UnitKind::Statewide | UnitKind::AtLarge, true) => {
            fail(format!("{}: only districts may have a parent", unit.id))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_totals_538() {
        let registry = StateModelRegistry::baseline();
        let total: u32 = registry.units().iter().map(|u| u.electoral_votes).sum();
        assert_eq!(total, TOTAL_EV);
        assert_eq!(registry.len(), 56);
    }

    #[test]
    fn test_baseline_includes_dc_and_split_states() {
        let registry = StateModelRegistry::baseline();
        assert!(registry.get("DC").is_some());
        assert!(registry.is_split_state("ME"));
        assert!(registry.is_split_state("NE"));
        assert!(!registry.is_split_state("PA"));
        assert_eq!(registry.state_electoral_votes("ME"), 4);
        assert_eq!(registry.state_electoral_votes("NE"), 5);
        assert_eq!(registry.state_electoral_votes("CA"), 54);
        let jurisdictions = registry.units().iter().filter(|u| !u.is_district()).count();
        assert_eq!(jurisdictions, 51);
    }

    #[test]
    fn test_two_party_share() {
        assert!((two_party_share(60.0, 40.0) - 0.6).abs() < 1e-12);
        assert_eq!(two_party_share(0.0, 0.0), 0.5);
        assert!((two_party_share(50.0, 48.8) - 50.0 / 98.8).abs() < 1e-12);
    }

    #[test]
    fn test_districts_carry_no_turnout() {
        let registry = StateModelRegistry::baseline();
        for unit in registry.units().iter().filter(|u| u.is_district()) {
            assert_eq!(unit.baseline_turnout, 0, "{}", unit.id);
            assert_eq!(unit.electoral_votes, 1);
        }
    }

    #[test]
    fn test_rejects_wrong_total() {
        let units = vec![VotingUnit::statewide("A", "A", 100, 0.5, 0.02)];
        let err = StateModelRegistry::new(units).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidRegistry(_)));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let units = vec![
            VotingUnit::statewide("A", "A", 269, 0.5, 0.02),
            VotingUnit::statewide("A", "A again", 269, 0.5, 0.02),
        ];
        let err = StateModelRegistry::new(units).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_rejects_orphan_district() {
        let mut district = VotingUnit::statewide("X-1", "X 1st", 1, 0.5, 0.02);
        district.kind = UnitKind::District;
        district.parent = Some("X".to_string());
        let units = vec![VotingUnit::statewide("A", "A", 537, 0.5, 0.02), district];
        assert!(StateModelRegistry::new(units).is_err());
    }

    fn split_state(at_large_ev: u32, district_ev: u32) -> Vec<VotingUnit> {
        let mut at_large = VotingUnit::statewide("X", "X", at_large_ev, 0.5, 0.02);
        at_large.kind = UnitKind::AtLarge;
        let mut district = VotingUnit::statewide("X-1", "X 1st", district_ev, 0.5, 0.02);
        district.kind = UnitKind::District;
        district.parent = Some("X".to_string());
        let rest = TOTAL_EV - at_large_ev - district_ev;
        vec![VotingUnit::statewide("A", "A", rest, 0.5, 0.02), at_large, district]
    }

    #[test]
    fn test_accepts_well_formed_split_state() {
        let registry = StateModelRegistry::new(split_state(2, 1)).unwrap();
        assert!(registry.is_split_state("X"));
        assert_eq!(registry.state_electoral_votes("X"), 3);
    }

    #[test]
    fn test_rejects_split_state_ev_mismatch() {
        let err = StateModelRegistry::new(split_state(3, 1)).unwrap_err();
        assert!(err.to_string().contains("at-large EV"), "{}", err);
        let err = StateModelRegistry::new(split_state(2, 2)).unwrap_err();
        assert!(err.to_string().contains("district 'X-1' carries 2 EV"), "{}", err);
    }

    #[test]
    fn test_rejects_out_of_range_share() {
        let units = vec![VotingUnit::statewide("A", "A", 538, 1.2, 0.02)];
        assert!(StateModelRegistry::new(units).is_err());
    }
}
