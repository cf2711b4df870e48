//! Penetrating projectiles.
//!
//! A projectile carries its remaining damage as the penetration budget.
//! Each overlap spends the health the target actually lost, and the
//! projectile retires once nothing is left.

use std::time::Duration;

use bevy::math::Vec2;
use tracing::trace;

use crate::agent::AgentId;
use crate::damage::{DamageEvent, DamageMode, DamageOutcome, Impact};
use crate::team::{Affiliated, TeamId};
use crate::world::CombatWorld;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectileFate {
    Flying,
    /// Penetration budget exhausted.
    Spent,
    /// Lifespan ran out.
    Expired,
}

#[derive(Clone, Debug)]
pub struct Projectile {
    pub source: Option<AgentId>,
    team: TeamId,
    remaining_damage: i32,
    mode: DamageMode,
    position: Vec2,
    velocity: Vec2,
    radius: f32,
    expires_at: Duration,
    hits: Vec<AgentId>,
    retired: bool,
}

impl Projectile {
    pub fn new(team: TeamId, damage: i32, position: Vec2, velocity: Vec2) -> Self {
        Self {
            source: None,
            team,
            remaining_damage: damage,
            mode: DamageMode::Consumable,
            position,
            velocity,
            radius: 0.0,
            expires_at: Duration::MAX,
            hits: Vec::new(),
            retired: damage <= 0,
        }
    }

    pub fn fired_by(mut self, source: AgentId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_mode(mut self, mode: DamageMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    /// Expires at `now + lifespan`.
    pub fn with_lifespan(mut self, now: Duration, lifespan: Duration) -> Self {
        self.expires_at = now.saturating_add(lifespan);
        self
    }

    pub fn remaining_damage(&self) -> i32 {
        self.remaining_damage
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn is_retired(&self) -> bool {
        self.retired
    }

    pub fn has_hit(&self, agent: AgentId) -> bool {
        self.hits.contains(&agent)
    }

    /// Handles one overlap with `target`. Every agent is considered at most
    /// once, whether or not the hit landed.
    pub fn on_overlap(
        &mut self,
        world: &mut CombatWorld,
        target: AgentId,
    ) -> Option<DamageOutcome> {
        if self.retired || self.has_hit(target) {
            return None;
        }
        self.hits.push(target);

        let target_team = world.agent(target)?.team();
        if !target_team.is_known() || target_team == self.team {
            return None;
        }

        let mut event = DamageEvent::new(target, self.remaining_damage as f32, self.team)
            .with_pending(self.remaining_damage)
            .with_impact(Impact {
                point: self.position,
                normal: -self.velocity.normalize_or_zero(),
            });
        event.source = self.source;
        event.mode = self.mode;

        let outcome = world.resolve_damage_event(&event)?;
        if self.mode == DamageMode::Consumable {
            self.remaining_damage = outcome.pending_damage;
        }
        if self.remaining_damage <= 0 {
            self.retired = true;
            trace!(target: "combat.projectiles", victim = ?target, "projectile spent");
        }
        Some(outcome)
    }
}

impl Affiliated for Projectile {
    fn team(&self) -> TeamId {
        self.team
    }
}

impl CombatWorld {
    /// Flies `projectile` for `dt`, resolving overlaps along the swept
    /// segment in the order they are reached.
    pub fn sweep_projectile(
        &mut self,
        projectile: &mut Projectile,
        dt: Duration,
    ) -> (ProjectileFate, Vec<DamageOutcome>) {
        let mut outcomes = Vec::new();
        if projectile.retired {
            return (ProjectileFate::Spent, outcomes);
        }

        let start = projectile.position;
        let end = start + projectile.velocity * dt.as_secs_f32();
        let mut touched: Vec<(f32, AgentId)> = self
            .agents
            .iter()
            .filter(|(id, _)| !projectile.has_hit(*id))
            .filter_map(|(id, agent)| {
                let (along, distance) = segment_distance(start, end, agent.position());
                (distance <= projectile.radius).then_some((along, id))
            })
            .collect();
        touched.sort_by(|a, b| a.0.total_cmp(&b.0));

        for (_, id) in touched {
            if let Some(agent) = self.agents.get(id) {
                projectile.position = agent.position();
            }
            if let Some(outcome) = projectile.on_overlap(self, id) {
                outcomes.push(outcome);
            }
            if projectile.retired {
                return (ProjectileFate::Spent, outcomes);
            }
        }
        projectile.position = end;

        if self.now() >= projectile.expires_at {
            projectile.retired = true;
            return (ProjectileFate::Expired, outcomes);
        }
        (ProjectileFate::Flying, outcomes)
    }
}

/// Position along `start..end` in `[0, 1]` closest to `point`, and the
/// distance from there.
fn segment_distance(start: Vec2, end: Vec2, point: Vec2) -> (f32, f32) {
    let span = end - start;
    let length_sq = span.length_squared();
    if length_sq <= f32::EPSILON {
        return (0.0, start.distance(point));
    }
    let along = ((point - start).dot(span) / length_sq).clamp(0.0, 1.0);
    (along, (start + span * along).distance(point))
}
