//! Core data structures: parties, voting units, and unit kinds.
//!
//! A [`VotingUnit`] is the atom of EV allocation. Winner-take-all states are a
//! single [`UnitKind::Statewide`] unit. Split-allocation states (Maine, Nebraska)
//! are modelled as one [`UnitKind::AtLarge`] unit carrying the statewide share
//! and the two at-large electors, plus one [`UnitKind::District`] unit per
//! congressional district worth one elector each.

use serde::{Deserialize, Serialize};

use crate::constants::WIN_THRESHOLD;

/// One side of the two-party contest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    Dem,
    Rep,
}

impl Party {
    /// Resolve a two-party Democratic share. Exactly 0.5 goes Republican.
    #[inline(always)]
    pub fn from_share(dem_share: f64) -> Self {
        if dem_share > WIN_THRESHOLD {
            Party::Dem
        } else {
            Party::Rep
        }
    }
}

/// How a unit's electors are allocated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// All of a winner-take-all state's electors.
    Statewide,
    /// The at-large electors of a split state, decided by the statewide share.
    AtLarge,
    /// One congressional district of a split state.
    District,
}

/// A state, or a district/at-large component of a split-allocation state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VotingUnit {
    /// Postal code for states and at-large units (`"PA"`, `"ME"`), `"ME-2"` for districts.
    pub id: String,
    pub name: String,
    pub kind: UnitKind,
    /// Parent state code for districts; `None` otherwise.
    pub parent: Option<String>,
    /// Expected Democratic two-party share in [0, 1].
    pub dem_share: f64,
    /// Standard deviation of the share, in share units.
    pub stddev: f64,
    pub electoral_votes: u32,
    /// Baseline two-party voters counted toward the popular vote.
    /// Districts carry 0: their voters are already in the at-large unit.
    pub baseline_turnout: u64,
}

impl VotingUnit {
    /// Winner-take-all state.
    pub fn statewide(id: &str, name: &str, electoral_votes: u32, dem_share: f64, stddev: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind: UnitKind::Statewide,
            parent: None,
            dem_share,
            stddev,
            electoral_votes,
            baseline_turnout: 0,
        }
    }

    /// Builder-style turnout setter.
    pub fn with_turnout(mut self, turnout: u64) -> Self {
        self.baseline_turnout = turnout;
        self
    }

    /// The state this unit belongs to: its parent for districts, itself otherwise.
    pub fn state_code(&self) -> &str {
        self.parent.as_deref().unwrap_or(&self.id)
    }

    pub fn is_district(&self) -> bool {
        self.kind == UnitKind::District
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_half_is_republican() {
        assert_eq!(Party::from_share(0.5), Party::Rep);
        assert_eq!(Party::from_share(0.500_000_1), Party::Dem);
        assert_eq!(Party::from_share(0.0), Party::Rep);
        assert_eq!(Party::from_share(1.0), Party::Dem);
    }

    #[test]
    fn test_state_code() {
        let pa = VotingUnit::statewide("PA", "Pennsylvania", 19, 0.5, 0.02);
        assert_eq!(pa.state_code(), "PA");
        let district = VotingUnit {
            id: "NE-2".to_string(),
            name: "Nebraska 2nd".to_string(),
            kind: UnitKind::District,
            parent: Some("NE".to_string()),
            dem_share: 0.53,
            stddev: 0.024,
            electoral_votes: 1,
            baseline_turnout: 0,
        };
        assert_eq!(district.state_code(), "NE");
        assert!(district.is_district());
    }
}
