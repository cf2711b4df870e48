//! Drives a [`CombatWorld`] one fixed step at a time.
//!
//! Each step runs, in handle order: sensing, target selection, the
//! agent's action (attack or approach), the projectile sweep, and finally
//! the world clock (regeneration, buff expiry, removals).

use std::time::Duration;

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;
use tracing::{debug, info};

use crate::agent::{Agent, AgentId, AgentSpec};
use crate::claims::ClaimPolicy;
use crate::config::CombatTuning;
use crate::damage::{DamageDisposition, DamageEvent, DamageMode, DamageOutcome};
use crate::death::DeathNotice;
use crate::error::CombatError;
use crate::perception::SightPerception;
use crate::projectile::{Projectile, ProjectileFate};
use crate::rng::SimulationRng;
use crate::team::{Affiliated, TeamId};
use crate::watchdog::{MoveVerdict, MoveWatchdog};
use crate::world::CombatWorld;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Weapon {
    #[default]
    Melee,
    Ranged {
        projectile_speed: f32,
        /// Area-style shots that do not spend damage on penetration.
        #[serde(default)]
        constant: bool,
    },
}

#[derive(Clone, Debug)]
struct Brain {
    weapon: Weapon,
    ready_at: Duration,
    next_sense_at: Duration,
    watchdog: MoveWatchdog,
}

impl Brain {
    fn new(weapon: Weapon) -> Self {
        Self {
            weapon,
            ready_at: Duration::ZERO,
            next_sense_at: Duration::ZERO,
            watchdog: MoveWatchdog::default(),
        }
    }
}

/// Running totals across every step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SkirmishStats {
    pub steps: u64,
    pub hits: u64,
    pub damage_dealt: f32,
    pub kills: u64,
    pub projectiles_fired: u64,
    pub aborted_moves: u64,
}

#[derive(Clone, Debug, Default)]
pub struct StepReport {
    pub step: u64,
    /// Hits that were applied this step, melee and projectile alike.
    pub hits: Vec<DamageOutcome>,
    pub deaths: Vec<DeathNotice>,
    pub removed: Vec<AgentId>,
    pub projectiles_in_flight: usize,
}

pub struct Skirmish {
    world: CombatWorld,
    brains: SecondaryMap<AgentId, Brain>,
    projectiles: Vec<Projectile>,
    stats: SkirmishStats,
}

impl Skirmish {
    pub fn new(tuning: CombatTuning) -> Self {
        Self::with_world(CombatWorld::new(tuning))
    }

    pub fn with_world(world: CombatWorld) -> Self {
        Self {
            world,
            brains: SecondaryMap::new(),
            projectiles: Vec::new(),
            stats: SkirmishStats::default(),
        }
    }

    pub fn world(&self) -> &CombatWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut CombatWorld {
        &mut self.world
    }

    pub fn stats(&self) -> &SkirmishStats {
        &self.stats
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn spawn(&mut self, spec: AgentSpec, weapon: Weapon) -> Result<AgentId, CombatError> {
        let id = self.world.spawn(spec)?;
        self.brains.insert(id, Brain::new(weapon));
        Ok(id)
    }

    /// Removes an agent and its decision state without a death sequence.
    pub fn despawn(&mut self, id: AgentId) -> Option<Agent> {
        self.brains.remove(id);
        self.world.despawn(id)
    }

    /// Spawns `count` copies of `spec`, each offset by a random jitter of up
    /// to `spread` around its position.
    pub fn spawn_group(
        &mut self,
        spec: &AgentSpec,
        weapon: Weapon,
        count: u32,
        spread: f32,
        rng: &mut SimulationRng,
    ) -> Result<Vec<AgentId>, CombatError> {
        (0..count)
            .map(|_| {
                let offset = rng.jitter(spread);
                self.spawn(spec.clone().at(spec.position + offset), weapon)
            })
            .collect()
    }

    /// At most one team still has living agents.
    pub fn is_decided(&self) -> bool {
        self.world.surviving_teams().len() <= 1
    }

    /// The last team standing, if exactly one is left.
    pub fn winner(&self) -> Option<TeamId> {
        match self.world.surviving_teams().as_slice() {
            [team] => Some(*team),
            _ => None,
        }
    }

    pub fn step(&mut self, dt: Duration) -> StepReport {
        let tuning = self.world.tuning().clone();
        let policy = ClaimPolicy {
            max_attackers: tuning.max_attackers,
        };
        let sight = SightPerception::new(tuning.sight_radius);
        let now = self.world.now();
        let mut hits = Vec::new();

        for id in self.world.agent_ids() {
            let Some(agent) = self.world.agent(id) else {
                continue;
            };
            if !agent.is_alive() || !agent.is_logic_enabled() {
                continue;
            }
            let Some(brain) = self.brains.get_mut(id) else {
                continue;
            };

            if now >= brain.next_sense_at {
                self.world.update_sensing(id, &sight);
                brain.next_sense_at = now + tuning.sensing_interval();
            }

            match self.world.acquire_target(id, &policy) {
                Some(target) => {
                    if let Some(outcome) = self.act(id, target, now, dt, &tuning) {
                        hits.push(outcome);
                    }
                }
                None => {
                    if let Some(brain) = self.brains.get_mut(id) {
                        brain.watchdog.reset();
                    }
                }
            }
        }

        let mut flying = Vec::with_capacity(self.projectiles.len());
        for mut projectile in std::mem::take(&mut self.projectiles) {
            let (fate, outcomes) = self.world.sweep_projectile(&mut projectile, dt);
            hits.extend(outcomes);
            if fate == ProjectileFate::Flying {
                flying.push(projectile);
            }
        }
        self.projectiles = flying;

        let tick = self.world.advance(dt);
        // Also catches agents despawned through `world_mut`.
        let world = &self.world;
        self.brains.retain(|id, _| world.contains(id));

        hits.retain(|outcome| outcome.disposition == DamageDisposition::Applied);
        self.stats.steps += 1;
        self.stats.hits += hits.len() as u64;
        self.stats.damage_dealt += hits.iter().map(DamageOutcome::health_lost).sum::<f32>();
        self.stats.kills += hits.iter().filter(|outcome| outcome.killed).count() as u64;

        for notice in &tick.deaths {
            info!(
                target: "combat.skirmish",
                step = self.stats.steps,
                agent = ?notice.agent,
                killer = ?notice.killer,
                "casualty"
            );
        }

        StepReport {
            step: self.stats.steps,
            hits,
            deaths: tick.deaths,
            removed: tick.removed,
            projectiles_in_flight: self.projectiles.len(),
        }
    }

    /// Attacks `target` if it is in range, otherwise closes in on it.
    fn act(
        &mut self,
        id: AgentId,
        target: AgentId,
        now: Duration,
        dt: Duration,
        tuning: &CombatTuning,
    ) -> Option<DamageOutcome> {
        let agent = self.world.agent(id)?;
        let goal = self.world.agent(target)?.position();
        let origin = agent.position();
        let team = agent.team();
        let stats = agent.effective_stats();
        let brain = self.brains.get_mut(id)?;

        let distance = origin.distance(goal);
        if distance <= stats.attack_range {
            brain.watchdog.reset();
            if now < brain.ready_at {
                return None;
            }
            brain.ready_at = now + crate::config::secs(stats.attack_cooldown);
            return match brain.weapon {
                Weapon::Melee => {
                    let event = DamageEvent::new(target, stats.attack_damage, team)
                        .from_source(id)
                        .constant();
                    self.world.resolve_damage_event(&event)
                }
                Weapon::Ranged {
                    projectile_speed,
                    constant,
                } => {
                    let heading = (goal - origin).try_normalize().unwrap_or(Vec2::X);
                    let mode = if constant {
                        DamageMode::Constant
                    } else {
                        DamageMode::Consumable
                    };
                    let projectile = Projectile::new(
                        team,
                        stats.attack_damage.round() as i32,
                        origin,
                        heading * projectile_speed,
                    )
                    .fired_by(id)
                    .with_mode(mode)
                    .with_radius(tuning.projectile_radius)
                    .with_lifespan(now, tuning.projectile_lifespan());
                    self.projectiles.push(projectile);
                    self.stats.projectiles_fired += 1;
                    None
                }
            };
        }

        // Stop just inside attack range.
        let travel = (stats.move_speed * dt.as_secs_f32()).min(distance - stats.attack_range * 0.9);
        let is_moving = travel > f32::EPSILON;
        if is_moving {
            let next = origin + (goal - origin) / distance * travel;
            if let Some(agent) = self.world.agent_mut(id) {
                agent.set_position(next);
            }
        }
        if brain.watchdog.observe(now, is_moving, tuning.stuck_abort()) == MoveVerdict::Abort {
            brain.watchdog.reset();
            self.stats.aborted_moves += 1;
            debug!(target: "combat.skirmish", agent = ?id, victim = ?target, "move aborted");
            self.world.retarget(id, None);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentStats;
    use crate::buffs::{Buff, StatModifiers};

    const STEP: Duration = Duration::from_millis(100);

    fn melee(team: u8, x: f32) -> AgentSpec {
        AgentSpec::new(TeamId(team), AgentStats::default()).at(Vec2::new(x, 0.0))
    }

    #[test]
    fn melee_duel_ends_with_a_winner() {
        let mut skirmish = Skirmish::new(CombatTuning::default());
        let strong = AgentStats {
            attack_damage: 30.0,
            ..Default::default()
        };
        skirmish
            .spawn(AgentSpec::new(TeamId(1), strong), Weapon::Melee)
            .unwrap();
        skirmish.spawn(melee(2, 200.0), Weapon::Melee).unwrap();

        for _ in 0..200 {
            skirmish.step(STEP);
            if skirmish.is_decided() {
                break;
            }
        }
        assert_eq!(skirmish.winner(), Some(TeamId(1)));
        assert_eq!(skirmish.stats().kills, 1);
    }

    #[test]
    fn agents_close_the_distance_before_attacking() {
        let mut skirmish = Skirmish::new(CombatTuning::default());
        let a = skirmish.spawn(melee(1, 0.0), Weapon::Melee).unwrap();
        skirmish.spawn(melee(2, 1000.0), Weapon::Melee).unwrap();
        let report = skirmish.step(STEP);
        assert!(report.hits.is_empty());
        let moved = skirmish.world().agent(a).unwrap().position().x;
        assert!(moved > 0.0 && moved <= 12.0 + f32::EPSILON);
    }

    #[test]
    fn ranged_units_fire_projectiles() {
        let mut skirmish = Skirmish::new(CombatTuning::default());
        let archer = AgentStats {
            attack_range: 400.0,
            ..Default::default()
        };
        skirmish
            .spawn(
                AgentSpec::new(TeamId(1), archer),
                Weapon::Ranged {
                    projectile_speed: 1000.0,
                    constant: false,
                },
            )
            .unwrap();
        let target = skirmish.spawn(melee(2, 300.0), Weapon::Melee).unwrap();

        let first = skirmish.step(STEP);
        assert_eq!(first.projectiles_in_flight, 1);
        let mut total_hits = first.hits.len();
        for _ in 0..5 {
            total_hits += skirmish.step(STEP).hits.len();
        }
        assert!(total_hits >= 1);
        assert!(skirmish.world().agent(target).unwrap().health() < 100.0);
        assert_eq!(skirmish.stats().projectiles_fired, 1);
    }

    #[test]
    fn rooted_agents_give_up_their_move() {
        let tuning = CombatTuning {
            stuck_abort_secs: 0.5,
            ..Default::default()
        };
        let mut skirmish = Skirmish::new(tuning);
        let rooted = skirmish.spawn(melee(1, 0.0), Weapon::Melee).unwrap();
        let target = skirmish.spawn(melee(2, 1000.0), Weapon::Melee).unwrap();
        skirmish.world_mut().apply_buff(
            rooted,
            Buff::new(
                "root",
                StatModifiers {
                    move_speed: -1000.0,
                    ..Default::default()
                },
            ),
        );
        // The target walks over eventually; stop it too.
        skirmish.world_mut().apply_buff(
            target,
            Buff::new(
                "root",
                StatModifiers {
                    move_speed: -1000.0,
                    ..Default::default()
                },
            ),
        );

        for _ in 0..8 {
            skirmish.step(STEP);
        }
        assert!(skirmish.stats().aborted_moves >= 1);
    }

    #[test]
    fn removed_agents_lose_their_brain() {
        let tuning = CombatTuning {
            death_removal_delay_secs: 0.0,
            ..Default::default()
        };
        let mut skirmish = Skirmish::new(tuning);
        let doomed = skirmish.spawn(melee(1, 0.0), Weapon::Melee).unwrap();
        skirmish.world_mut().kill(doomed, None);
        let report = skirmish.step(STEP);
        assert_eq!(report.removed, vec![doomed]);
        assert_eq!(report.deaths.len(), 1);
        assert!(!skirmish.brains.contains_key(doomed));
    }

    #[test]
    fn despawned_agents_lose_their_brain() {
        let mut skirmish = Skirmish::new(CombatTuning::default());
        let direct = skirmish.spawn(melee(1, 0.0), Weapon::Melee).unwrap();
        let via_world = skirmish.spawn(melee(2, 500.0), Weapon::Melee).unwrap();

        assert!(skirmish.despawn(direct).is_some());
        assert!(!skirmish.brains.contains_key(direct));
        assert!(!skirmish.world().contains(direct));

        skirmish.world_mut().despawn(via_world);
        assert!(skirmish.brains.contains_key(via_world));
        skirmish.step(STEP);
        assert!(!skirmish.brains.contains_key(via_world));
    }

    #[test]
    fn spawn_groups_are_reproducible() {
        let positions = |seed| {
            let mut skirmish = Skirmish::new(CombatTuning::default());
            let mut rng = SimulationRng::new(seed);
            let ids = skirmish
                .spawn_group(&melee(1, 0.0), Weapon::Melee, 4, 50.0, &mut rng)
                .unwrap();
            ids.into_iter()
                .map(|id| skirmish.world().agent(id).unwrap().position())
                .collect::<Vec<_>>()
        };
        assert_eq!(positions(3), positions(3));
        assert_ne!(positions(3), positions(4));
    }
}
