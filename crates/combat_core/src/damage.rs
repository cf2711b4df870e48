//! Damage resolution: health loss, penetration budget and the death trigger.
//!
//! A [`DamageEvent`] carries the nominal amount plus the attacker's
//! remaining `pending_damage`. In [`DamageMode::Consumable`] the budget
//! shrinks by the health the target actually lost, so overkill does not
//! waste it and a nearly dead target does not let a projectile pass
//! through for free. [`DamageMode::Constant`] never touches it.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::agent::{Agent, AgentId};
use crate::team::{accepts_damage_from, Affiliated, TeamId};
use crate::world::CombatWorld;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageMode {
    /// Penetrating hits: pending damage is consumed by what they hurt.
    #[default]
    Consumable,
    /// Area and over-time effects: pending damage is left untouched.
    Constant,
}

/// Where the hit landed. Only passed through to the outcome.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Impact {
    pub point: Vec2,
    pub normal: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageEvent {
    pub target: AgentId,
    pub source: Option<AgentId>,
    pub instigator_team: TeamId,
    pub amount: f32,
    pub pending_damage: i32,
    pub mode: DamageMode,
    /// Skips the world's damage model, so armor does not apply. Set for
    /// per-tick damage over time, where a flat reduction on every slice
    /// would make the total depend on the tick length.
    pub unmitigated: bool,
    pub impact: Impact,
}

impl DamageEvent {
    pub fn new(target: AgentId, amount: f32, instigator_team: TeamId) -> Self {
        Self {
            target,
            source: None,
            instigator_team,
            amount,
            pending_damage: 0,
            mode: DamageMode::Consumable,
            unmitigated: false,
            impact: Impact::default(),
        }
    }

    pub fn from_source(mut self, source: AgentId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_pending(mut self, pending_damage: i32) -> Self {
        self.pending_damage = pending_damage;
        self
    }

    pub fn constant(mut self) -> Self {
        self.mode = DamageMode::Constant;
        self
    }

    pub fn unmitigated(mut self) -> Self {
        self.unmitigated = true;
        self
    }

    pub fn with_impact(mut self, impact: Impact) -> Self {
        self.impact = impact;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageDisposition {
    Applied,
    /// Target is on the instigator's team.
    FriendlyFire,
    /// Target belongs to no team.
    Neutral,
    /// Target was already in its death sequence.
    AlreadyDying,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageOutcome {
    pub target: AgentId,
    pub disposition: DamageDisposition,
    pub previous_health: f32,
    pub new_health: f32,
    /// The target is dying after this event, whether or not it caused it.
    pub died: bool,
    /// This event triggered the death transition.
    pub killed: bool,
    pub pending_damage: i32,
    pub impact: Impact,
}

impl DamageOutcome {
    pub fn health_lost(&self) -> f32 {
        self.previous_health - self.new_health
    }

    /// The penetration budget is exhausted.
    pub fn is_spent(&self) -> bool {
        self.pending_damage <= 0
    }

    fn unchanged(event: &DamageEvent, health: f32, disposition: DamageDisposition) -> Self {
        Self {
            target: event.target,
            disposition,
            previous_health: health,
            new_health: health,
            died: disposition == DamageDisposition::AlreadyDying,
            killed: false,
            pending_damage: event.pending_damage,
            impact: event.impact,
        }
    }
}

/// Turns a nominal amount into actual health loss (armor, resistances).
pub trait DamageModel {
    /// Applies `amount` to `target` and returns the health it lost.
    fn apply_damage(&mut self, target: &mut Agent, amount: f32) -> f32;
}

/// Flat armor reduction, never below zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArmorDamageModel;

impl DamageModel for ArmorDamageModel {
    fn apply_damage(&mut self, target: &mut Agent, amount: f32) -> f32 {
        let armor = target.effective_stats().armor;
        let reduced = (amount - armor).max(0.0);
        let before = target.health();
        target.set_health(before - reduced);
        before - target.health()
    }
}

/// Applies the nominal amount as-is.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawDamageModel;

impl DamageModel for RawDamageModel {
    fn apply_damage(&mut self, target: &mut Agent, amount: f32) -> f32 {
        let before = target.health();
        target.set_health(before - amount.max(0.0));
        before - target.health()
    }
}

impl CombatWorld {
    /// Applies one damage event. Returns `None` when the target no longer
    /// exists; the event is then dropped without effect.
    pub fn resolve_damage_event(&mut self, event: &DamageEvent) -> Option<DamageOutcome> {
        let Some(agent) = self.agents.get_mut(event.target) else {
            trace!(target: "combat.damage", victim = ?event.target, "damage on missing target skipped");
            return None;
        };

        let previous_health = agent.health();
        if agent.is_dying() {
            return Some(DamageOutcome::unchanged(
                event,
                previous_health,
                DamageDisposition::AlreadyDying,
            ));
        }
        if !agent.team().is_known() {
            return Some(DamageOutcome::unchanged(
                event,
                previous_health,
                DamageDisposition::Neutral,
            ));
        }
        if !accepts_damage_from(agent.team(), event.instigator_team) {
            return Some(DamageOutcome::unchanged(
                event,
                previous_health,
                DamageDisposition::FriendlyFire,
            ));
        }

        if event.unmitigated {
            RawDamageModel.apply_damage(agent, event.amount);
        } else {
            self.damage_model.apply_damage(agent, event.amount);
        }
        let new_health = agent.health();

        let mut pending_damage = event.pending_damage;
        if event.mode == DamageMode::Consumable {
            // Truncation toward zero: 9.9 health lost consumes 9.
            let consumed = (previous_health - new_health).trunc() as i32;
            pending_damage = pending_damage.saturating_sub(consumed);
        }

        debug!(
            target: "combat.damage",
            victim = ?event.target,
            source = ?event.source,
            amount = event.amount,
            previous_health,
            new_health,
            pending_damage,
            "damage applied"
        );

        let killed = new_health <= 0.0
            && self.begin_dying(event.target, event.source, event.instigator_team);
        let died = self
            .agents
            .get(event.target)
            .is_some_and(|agent| agent.is_dying());

        Some(DamageOutcome {
            target: event.target,
            disposition: DamageDisposition::Applied,
            previous_health,
            new_health,
            died,
            killed,
            pending_damage,
            impact: event.impact,
        })
    }
}
