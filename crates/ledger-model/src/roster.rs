//! Team roster: one contribution slot per team.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Ordered list of contributing teams.
///
/// Slot `i` of every row's contribution vector belongs to `teams[i]`, for the
/// whole lifetime of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamRoster {
    teams: Vec<String>,
}

impl TeamRoster {
    pub fn new<I, S>(teams: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let teams: Vec<String> = teams
            .into_iter()
            .map(|team| team.into().trim().to_string())
            .collect();
        if teams.is_empty() {
            return Err(ModelError::EmptyRoster);
        }
        Ok(Self { teams })
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn teams(&self) -> &[String] {
        &self.teams
    }

    /// Team name for a slot; unnamed teams fall back to `team-<n>` (1-based).
    pub fn name(&self, slot: usize) -> String {
        match self.teams.get(slot) {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("team-{}", slot + 1),
        }
    }

    /// Slot of a team, matched case-insensitively.
    pub fn slot_of(&self, team: &str) -> Option<usize> {
        let team = team.trim();
        self.teams
            .iter()
            .position(|name| name.eq_ignore_ascii_case(team))
    }

    pub fn check_slot(&self, slot: usize) -> Result<()> {
        if slot < self.teams.len() {
            Ok(())
        } else {
            Err(ModelError::SlotOutOfRange {
                slot,
                len: self.teams.len(),
            })
        }
    }
}
