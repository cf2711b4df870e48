//! Health-bearing combat entities and the data they carry between ticks.

use std::time::Duration;

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::buffs::{ActiveBuffs, StatModifiers};
use crate::claims::ClaimSet;
use crate::error::CombatError;
use crate::team::{Affiliated, TeamId};

new_key_type! {
    /// Generation-checked handle to an agent. A handle to a removed agent
    /// never resolves again, even after its slot is reused.
    pub struct AgentId;
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentStats {
    pub max_health: f32,
    pub armor: f32,
    pub attack_damage: f32,
    pub attack_range: f32,
    /// Seconds between two attacks.
    pub attack_cooldown: f32,
    pub move_speed: f32,
    /// Health per second; negative values drain health.
    pub health_regen: f32,
}

impl Default for AgentStats {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            armor: 0.0,
            attack_damage: 10.0,
            attack_range: 60.0,
            attack_cooldown: 1.0,
            move_speed: 120.0,
            health_regen: 0.0,
        }
    }
}

impl AgentStats {
    /// Base stats with buff deltas folded in.
    pub fn modified(&self, modifiers: &StatModifiers) -> Self {
        Self {
            armor: (self.armor + modifiers.armor).max(0.0),
            attack_damage: (self.attack_damage + modifiers.attack_damage).max(0.0),
            health_regen: self.health_regen + modifiers.health_regen,
            move_speed: (self.move_speed + modifiers.move_speed).max(0.0),
            ..*self
        }
    }

    pub(crate) fn validate(&self) -> Result<(), CombatError> {
        if !(self.max_health.is_finite() && self.max_health > 0.0) {
            return Err(CombatError::InvalidStats {
                field: "max_health",
                value: self.max_health,
            });
        }
        for (field, value) in [
            ("armor", self.armor),
            ("attack_damage", self.attack_damage),
            ("attack_range", self.attack_range),
            ("attack_cooldown", self.attack_cooldown),
            ("move_speed", self.move_speed),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(CombatError::InvalidStats { field, value });
            }
        }
        if !self.health_regen.is_finite() {
            return Err(CombatError::InvalidStats {
                field: "health_regen",
                value: self.health_regen,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifeState {
    Alive,
    /// Waiting for the death sequence to finish before removal.
    Dying { since: Duration },
}

/// Everything needed to put a new agent into a [`CombatWorld`](crate::CombatWorld).
#[derive(Clone, Debug, PartialEq)]
pub struct AgentSpec {
    pub team: TeamId,
    pub stats: AgentStats,
    pub position: Vec2,
    /// Starting health; defaults to `stats.max_health`.
    pub health: Option<f32>,
    pub bounty: u32,
    pub hidden: bool,
}

impl AgentSpec {
    pub fn new(team: TeamId, stats: AgentStats) -> Self {
        Self {
            team,
            stats,
            position: Vec2::ZERO,
            health: None,
            bounty: 0,
            hidden: false,
        }
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_health(mut self, health: f32) -> Self {
        self.health = Some(health);
        self
    }

    pub fn with_bounty(mut self, bounty: u32) -> Self {
        self.bounty = bounty;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }
}

#[derive(Clone, Debug)]
pub struct Agent {
    team: TeamId,
    health: f32,
    stats: AgentStats,
    life: LifeState,
    pub(crate) position: Vec2,
    hidden: bool,
    bounty: u32,
    logic_enabled: bool,
    pub(crate) claimed_by: ClaimSet,
    pub(crate) target: Option<AgentId>,
    pub(crate) known_targets: Vec<AgentId>,
    pub(crate) buffs: ActiveBuffs,
}

impl Agent {
    pub(crate) fn from_spec(spec: AgentSpec) -> Result<Self, CombatError> {
        spec.stats.validate()?;
        let health = spec
            .health
            .unwrap_or(spec.stats.max_health)
            .clamp(0.0, spec.stats.max_health);
        Ok(Self {
            team: spec.team,
            health,
            stats: spec.stats,
            life: LifeState::Alive,
            position: spec.position,
            hidden: spec.hidden,
            bounty: spec.bounty,
            logic_enabled: true,
            claimed_by: ClaimSet::default(),
            target: None,
            known_targets: Vec::new(),
            buffs: ActiveBuffs::default(),
        })
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_health(&self) -> f32 {
        self.stats.max_health
    }

    /// Sets health, clamped to `[0, max_health]`. Does not trigger death on
    /// its own; that only happens through damage resolution or `kill`.
    pub fn set_health(&mut self, health: f32) {
        self.health = health.clamp(0.0, self.stats.max_health);
    }

    pub fn base_stats(&self) -> &AgentStats {
        &self.stats
    }

    pub fn effective_stats(&self) -> AgentStats {
        self.stats.modified(&self.buffs.total())
    }

    pub fn buffs(&self) -> &ActiveBuffs {
        &self.buffs
    }

    pub fn life(&self) -> LifeState {
        self.life
    }

    pub(crate) fn set_life(&mut self, life: LifeState) {
        self.life = life;
    }

    pub fn is_dying(&self) -> bool {
        matches!(self.life, LifeState::Dying { .. })
    }

    /// Still in the fight: not dying and has health left.
    pub fn is_alive(&self) -> bool {
        !self.is_dying() && self.health > 0.0
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn bounty(&self) -> u32 {
        self.bounty
    }

    /// Master switch for decision making.
    pub fn is_logic_enabled(&self) -> bool {
        self.logic_enabled
    }

    pub fn enable_logic(&mut self, enable: bool) {
        self.logic_enabled = enable;
    }

    pub fn current_target(&self) -> Option<AgentId> {
        self.target
    }

    pub fn claimed_by(&self) -> &ClaimSet {
        &self.claimed_by
    }

    pub fn known_targets(&self) -> &[AgentId] {
        &self.known_targets
    }

    pub fn set_team(&mut self, team: TeamId) {
        self.team = team;
    }
}

impl Affiliated for Agent {
    fn team(&self) -> TeamId {
        self.team
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_health_is_clamped_to_max() {
        let spec = AgentSpec::new(TeamId(1), AgentStats::default()).with_health(500.0);
        let agent = Agent::from_spec(spec).unwrap();
        assert_eq!(agent.health(), 100.0);
        assert!(agent.is_alive());
    }

    #[test]
    fn rejects_non_positive_max_health() {
        let stats = AgentStats {
            max_health: 0.0,
            ..Default::default()
        };
        let err = Agent::from_spec(AgentSpec::new(TeamId(1), stats)).unwrap_err();
        assert!(matches!(err, CombatError::InvalidStats { field: "max_health", .. }));
    }

    #[test]
    fn modifiers_never_push_stats_negative() {
        let stats = AgentStats {
            armor: 2.0,
            ..Default::default()
        };
        let modified = stats.modified(&StatModifiers {
            armor: -5.0,
            move_speed: -1000.0,
            health_regen: -3.0,
            ..Default::default()
        });
        assert_eq!(modified.armor, 0.0);
        assert_eq!(modified.move_speed, 0.0);
        assert_eq!(modified.health_regen, -3.0);
    }
}
