//! Team affiliation shared by agents, projectiles and damage events.
//!
//! Team `0` is the non-combatant sentinel: it is never hostile to anyone
//! and never accepts damage.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub u8);

impl TeamId {
    pub const UNKNOWN: Self = Self(0);

    pub const fn is_known(self) -> bool {
        self.0 != Self::UNKNOWN.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_known() {
            write!(f, "team {}", self.0)
        } else {
            f.write_str("unknown team")
        }
    }
}

/// Anything that can answer "which side are you on".
pub trait Affiliated {
    fn team(&self) -> TeamId;
}

/// Both sides are combatants and they differ.
pub const fn on_enemy_team(a: TeamId, b: TeamId) -> bool {
    a.is_known() && b.is_known() && a.0 != b.0
}

/// Hit filter applied before any damage is resolved: a target on the
/// instigator's own team, or on no team at all, is immune.
pub const fn accepts_damage_from(target: TeamId, instigator: TeamId) -> bool {
    target.is_known() && target.0 != instigator.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_team_is_never_hostile() {
        assert!(!on_enemy_team(TeamId::UNKNOWN, TeamId(1)));
        assert!(!on_enemy_team(TeamId(2), TeamId::UNKNOWN));
        assert!(on_enemy_team(TeamId(1), TeamId(2)));
        assert!(!on_enemy_team(TeamId(1), TeamId(1)));
    }

    #[test]
    fn neutral_targets_and_teammates_are_immune() {
        assert!(!accepts_damage_from(TeamId::UNKNOWN, TeamId(1)));
        assert!(!accepts_damage_from(TeamId(1), TeamId(1)));
        assert!(accepts_damage_from(TeamId(1), TeamId(2)));
        // Environmental damage has no team but still lands on combatants.
        assert!(accepts_damage_from(TeamId(1), TeamId::UNKNOWN));
    }
}
