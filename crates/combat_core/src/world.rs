//! Owner of every agent and the simulation clock.

use std::time::Duration;

use slotmap::SlotMap;
use tracing::{debug, trace};

use crate::agent::{Agent, AgentId, AgentSpec};
use crate::buffs::Buff;
use crate::config::CombatTuning;
use crate::damage::{ArmorDamageModel, DamageEvent, DamageModel};
use crate::death::{DeathNotice, DeathQueue};
use crate::error::CombatError;
use crate::team::{Affiliated, TeamId};

/// What changed while the clock moved forward.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Agents whose death sequence finished; their handles are now stale.
    pub removed: Vec<AgentId>,
    /// Agents that started dying since the last report.
    pub deaths: Vec<DeathNotice>,
    pub expired_buffs: Vec<(AgentId, String)>,
}

pub struct CombatWorld {
    pub(crate) agents: SlotMap<AgentId, Agent>,
    pub(crate) clock: Duration,
    pub(crate) deaths: DeathQueue,
    pub(crate) notices: Vec<DeathNotice>,
    pub(crate) damage_model: Box<dyn DamageModel + Send + Sync>,
    tuning: CombatTuning,
}

impl CombatWorld {
    pub fn new(tuning: CombatTuning) -> Self {
        Self {
            agents: SlotMap::with_key(),
            clock: Duration::ZERO,
            deaths: DeathQueue::default(),
            notices: Vec::new(),
            damage_model: Box::new(ArmorDamageModel),
            tuning,
        }
    }

    /// Replaces the armor-aware default used by damage resolution.
    pub fn with_damage_model(mut self, model: impl DamageModel + Send + Sync + 'static) -> Self {
        self.damage_model = Box::new(model);
        self
    }

    pub fn tuning(&self) -> &CombatTuning {
        &self.tuning
    }

    pub fn now(&self) -> Duration {
        self.clock
    }

    pub fn spawn(&mut self, spec: AgentSpec) -> Result<AgentId, CombatError> {
        let agent = Agent::from_spec(spec)?;
        let team = agent.team();
        let id = self.agents.insert(agent);
        debug!(target: "combat.world", ?id, %team, "agent spawned");
        Ok(id)
    }

    /// Removes an agent immediately, without a death sequence. Claims that
    /// point at it become stale and are pruned lazily.
    pub fn despawn(&mut self, id: AgentId) -> Option<Agent> {
        let agent = self.agents.remove(id)?;
        if let Some(target) = agent.target {
            self.unclaim_as_target(target, id);
        }
        debug!(target: "combat.world", ?id, "agent despawned");
        Some(agent)
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.contains_key(id)
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(id)
    }

    pub fn agents(&self) -> impl Iterator<Item = (AgentId, &Agent)> {
        self.agents.iter()
    }

    pub fn agent_ids(&self) -> Vec<AgentId> {
        self.agents.keys().collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Teams that still have at least one living agent, in ascending order.
    pub fn surviving_teams(&self) -> Vec<TeamId> {
        let mut teams: Vec<TeamId> = self
            .agents
            .values()
            .filter(|agent| agent.is_alive())
            .map(|agent| agent.team())
            .filter(|team| team.is_known())
            .collect();
        teams.sort();
        teams.dedup();
        teams
    }

    /// Adds or refreshes a buff. Dying and missing agents are ignored.
    pub fn apply_buff(&mut self, id: AgentId, buff: Buff) {
        let now = self.clock;
        if let Some(agent) = self.agents.get_mut(id).filter(|agent| !agent.is_dying()) {
            trace!(target: "combat.buffs", ?id, name = %buff.name, "buff applied");
            agent.buffs.apply(buff, now);
        }
    }

    /// Moves the clock forward by `dt`: expires buffs, applies health
    /// regeneration or decay, and removes agents whose death sequence ran
    /// out.
    pub fn advance(&mut self, dt: Duration) -> TickReport {
        self.clock += dt;
        let now = self.clock;
        let dt_secs = dt.as_secs_f32();

        let mut report = TickReport::default();
        let mut decaying = Vec::new();
        for (id, agent) in self.agents.iter_mut() {
            for name in agent.buffs.expire(now) {
                trace!(target: "combat.buffs", ?id, %name, "buff expired");
                report.expired_buffs.push((id, name));
            }
            if !agent.is_alive() {
                continue;
            }
            let regen = agent.effective_stats().health_regen * dt_secs;
            if regen > 0.0 {
                let healed = agent.health() + regen;
                agent.set_health(healed);
            } else if regen < 0.0 {
                decaying.push((id, -regen));
            }
        }

        for (id, amount) in decaying {
            let event = DamageEvent::new(id, amount, TeamId::UNKNOWN)
                .constant()
                .unmitigated();
            self.resolve_damage_event(&event);
        }

        report.removed = self.poll_removals();
        report.deaths = self.take_death_notices();
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentStats;
    use crate::buffs::StatModifiers;

    fn stats(health_regen: f32) -> AgentStats {
        AgentStats {
            health_regen,
            ..Default::default()
        }
    }

    #[test]
    fn regeneration_heals_up_to_max() {
        let mut world = CombatWorld::new(CombatTuning::default());
        let id = world
            .spawn(AgentSpec::new(TeamId(1), stats(10.0)).with_health(95.0))
            .unwrap();
        world.advance(Duration::from_secs(1));
        assert_eq!(world.agent(id).unwrap().health(), 100.0);
    }

    #[test]
    fn decay_kills_through_the_death_transition() {
        let mut world = CombatWorld::new(CombatTuning::default());
        let id = world
            .spawn(AgentSpec::new(TeamId(1), stats(-10.0)).with_health(15.0))
            .unwrap();
        let first = world.advance(Duration::from_secs(1));
        assert!(first.deaths.is_empty());
        let second = world.advance(Duration::from_secs(1));
        assert_eq!(second.deaths.len(), 1);
        assert_eq!(second.deaths[0].killer, None);
        assert!(world.agent(id).unwrap().is_dying());
    }

    #[test]
    fn decay_does_not_depend_on_tick_length() {
        let decayed = |ticks: u32| {
            let mut world = CombatWorld::new(CombatTuning::default());
            let stats = AgentStats {
                armor: 1.0,
                ..stats(-10.0)
            };
            let id = world.spawn(AgentSpec::new(TeamId(1), stats)).unwrap();
            let slice = Duration::from_secs(1) / ticks;
            for _ in 0..ticks {
                world.advance(slice);
            }
            world.agent(id).unwrap().health()
        };
        let coarse = decayed(2);
        let fine = decayed(20);
        assert!((coarse - 90.0).abs() < 1e-3, "coarse = {coarse}");
        assert!((coarse - fine).abs() < 1e-3, "coarse = {coarse}, fine = {fine}");
    }

    #[test]
    fn decay_ignores_neutral_agents() {
        let mut world = CombatWorld::new(CombatTuning::default());
        let id = world
            .spawn(AgentSpec::new(TeamId::UNKNOWN, stats(-50.0)))
            .unwrap();
        world.advance(Duration::from_secs(1));
        assert_eq!(world.agent(id).unwrap().health(), 100.0);
    }

    #[test]
    fn buffs_expire_as_the_clock_advances() {
        let mut world = CombatWorld::new(CombatTuning::default());
        let id = world
            .spawn(AgentSpec::new(TeamId(1), AgentStats::default()))
            .unwrap();
        let haste = Buff::new(
            "haste",
            StatModifiers {
                move_speed: 40.0,
                ..Default::default()
            },
        )
        .lasting(0.5);
        world.apply_buff(id, haste);
        assert_eq!(world.agent(id).unwrap().effective_stats().move_speed, 160.0);

        let report = world.advance(Duration::from_secs(1));
        assert_eq!(report.expired_buffs, vec![(id, "haste".to_owned())]);
        assert_eq!(world.agent(id).unwrap().effective_stats().move_speed, 120.0);
    }

    #[test]
    fn surviving_teams_skip_dying_and_neutral_agents() {
        let mut world = CombatWorld::new(CombatTuning::default());
        let red = world
            .spawn(AgentSpec::new(TeamId(1), AgentStats::default()))
            .unwrap();
        world
            .spawn(AgentSpec::new(TeamId(2), AgentStats::default()))
            .unwrap();
        world
            .spawn(AgentSpec::new(TeamId::UNKNOWN, AgentStats::default()))
            .unwrap();
        assert_eq!(world.surviving_teams(), vec![TeamId(1), TeamId(2)]);
        world.kill(red, None);
        assert_eq!(world.surviving_teams(), vec![TeamId(2)]);
    }
}
