//! Sensing: which enemies an agent knows about.

use tracing::trace;

use crate::agent::{Agent, AgentId};
use crate::team::{on_enemy_team, Affiliated};
use crate::world::CombatWorld;

/// Line-of-sight stand-in. Implementations only answer the geometric
/// question; team and life filtering happen in [`CombatWorld::update_sensing`].
pub trait Perception {
    fn can_see(&self, observer: &Agent, candidate: &Agent) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SightPerception {
    pub radius: f32,
}

impl SightPerception {
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }
}

impl Perception for SightPerception {
    fn can_see(&self, observer: &Agent, candidate: &Agent) -> bool {
        observer.position().distance_squared(candidate.position()) <= self.radius * self.radius
    }
}

impl CombatWorld {
    /// Refreshes `observer`'s known targets: stale handles are forgotten and
    /// every visible, living, unhidden enemy is remembered. Returns the
    /// number of newly learned targets.
    pub fn update_sensing(&mut self, observer: AgentId, perception: &impl Perception) -> usize {
        let Some(agent) = self.agents.get(observer) else {
            return 0;
        };
        if !agent.is_logic_enabled() {
            return 0;
        }

        let seen: Vec<AgentId> = self
            .agents
            .iter()
            .filter(|(id, candidate)| {
                *id != observer
                    && candidate.is_alive()
                    && !candidate.is_hidden()
                    && on_enemy_team(agent.team(), candidate.team())
                    && perception.can_see(agent, candidate)
            })
            .map(|(id, _)| id)
            .collect();

        let live: Vec<bool> = agent
            .known_targets
            .iter()
            .map(|id| self.agents.contains_key(*id))
            .collect();
        let Some(agent) = self.agents.get_mut(observer) else {
            return 0;
        };
        let mut live = live.into_iter();
        agent.known_targets.retain(|_| live.next().unwrap_or(false));

        let mut learned = 0;
        for id in seen {
            if !agent.known_targets.contains(&id) {
                agent.known_targets.push(id);
                learned += 1;
            }
        }
        if learned > 0 {
            trace!(
                target: "combat.sensing",
                ?observer,
                learned,
                known = agent.known_targets.len(),
                "targets sensed"
            );
        }
        learned
    }
}

#[cfg(test)]
mod tests {
    use bevy::math::Vec2;

    use super::*;
    use crate::agent::{AgentSpec, AgentStats};
    use crate::config::CombatTuning;
    use crate::team::TeamId;

    fn spawn(world: &mut CombatWorld, team: u8, x: f32) -> AgentId {
        world
            .spawn(AgentSpec::new(TeamId(team), AgentStats::default()).at(Vec2::new(x, 0.0)))
            .unwrap()
    }

    #[test]
    fn only_visible_enemies_are_learned() {
        let mut world = CombatWorld::new(CombatTuning::default());
        let observer = spawn(&mut world, 1, 0.0);
        let near_enemy = spawn(&mut world, 2, 100.0);
        let _far_enemy = spawn(&mut world, 2, 5000.0);
        let _friend = spawn(&mut world, 1, 50.0);
        let _neutral = spawn(&mut world, 0, 50.0);

        let learned = world.update_sensing(observer, &SightPerception::new(1000.0));
        assert_eq!(learned, 1);
        assert_eq!(world.agent(observer).unwrap().known_targets(), &[near_enemy]);
    }

    #[test]
    fn hidden_and_dying_enemies_are_ignored() {
        let mut world = CombatWorld::new(CombatTuning::default());
        let observer = spawn(&mut world, 1, 0.0);
        let hidden = spawn(&mut world, 2, 10.0);
        let dying = spawn(&mut world, 2, 20.0);
        world.agent_mut(hidden).unwrap().set_hidden(true);
        world.kill(dying, None);

        assert_eq!(world.update_sensing(observer, &SightPerception::new(1000.0)), 0);
        assert!(world.agent(observer).unwrap().known_targets().is_empty());
    }

    #[test]
    fn removed_targets_are_forgotten() {
        let mut world = CombatWorld::new(CombatTuning::default());
        let observer = spawn(&mut world, 1, 0.0);
        let enemy = spawn(&mut world, 2, 10.0);
        let sight = SightPerception::new(1000.0);
        world.update_sensing(observer, &sight);
        world.despawn(enemy);
        world.update_sensing(observer, &sight);
        assert!(world.agent(observer).unwrap().known_targets().is_empty());
    }

    #[test]
    fn sensing_again_does_not_duplicate() {
        let mut world = CombatWorld::new(CombatTuning::default());
        let observer = spawn(&mut world, 1, 0.0);
        spawn(&mut world, 2, 10.0);
        let sight = SightPerception::new(1000.0);
        assert_eq!(world.update_sensing(observer, &sight), 1);
        assert_eq!(world.update_sensing(observer, &sight), 0);
        assert_eq!(world.agent(observer).unwrap().known_targets().len(), 1);
    }
}
