//! `Alive -> Dying -> Removed`.
//!
//! The first time an agent drops to zero health it starts dying: logic is
//! switched off, every claim it made or received is dropped, and its
//! removal is scheduled on the [`DeathQueue`]. Removal happens when the
//! world clock passes the scheduled time.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Duration;

use tracing::{debug, info};

use crate::agent::{AgentId, LifeState};
use crate::team::{Affiliated, TeamId};
use crate::world::CombatWorld;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeathNotice {
    pub agent: AgentId,
    pub killer: Option<AgentId>,
    /// Side credited with the kill, captured when the death starts so it
    /// survives the killer's own removal.
    pub killer_team: Option<TeamId>,
    pub team: TeamId,
    /// Resources the killer's side collects.
    pub bounty: u32,
    pub at: Duration,
}

/// Pending removals ordered by due time, then by scheduling order.
#[derive(Debug, Default)]
pub struct DeathQueue {
    heap: BinaryHeap<Reverse<(Duration, u64, AgentId)>>,
    sequence: u64,
}

impl DeathQueue {
    pub fn schedule(&mut self, agent: AgentId, due: Duration) {
        self.heap.push(Reverse((due, self.sequence, agent)));
        self.sequence += 1;
    }

    /// Pops every entry due at or before `now`.
    pub fn drain_due(&mut self, now: Duration) -> Vec<AgentId> {
        let mut due = Vec::new();
        while let Some(Reverse((at, _, agent))) = self.heap.peek().copied() {
            if at > now {
                break;
            }
            self.heap.pop();
            due.push(agent);
        }
        due
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl CombatWorld {
    /// Forces the death transition, e.g. for an agent that left the map.
    /// Returns `false` if the agent is missing or already dying.
    pub fn kill(&mut self, agent: AgentId, killer: Option<AgentId>) -> bool {
        let killer_team = killer
            .and_then(|killer| self.agents.get(killer))
            .map_or(TeamId::UNKNOWN, |killer| killer.team());
        if let Some(target) = self.agents.get_mut(agent) {
            target.set_health(0.0);
        }
        self.begin_dying(agent, killer, killer_team)
    }

    pub(crate) fn begin_dying(
        &mut self,
        id: AgentId,
        killer: Option<AgentId>,
        killer_team: TeamId,
    ) -> bool {
        let now = self.clock;
        let due = now + self.tuning().death_removal_delay();
        let Some(agent) = self.agents.get_mut(id) else {
            return false;
        };
        if agent.is_dying() {
            return false;
        }

        agent.set_life(LifeState::Dying { since: now });
        agent.enable_logic(false);
        let outbound = agent.target.take();
        let inbound = agent.claimed_by.take();
        agent.known_targets.clear();
        let notice = DeathNotice {
            agent: id,
            killer,
            killer_team: Some(killer_team).filter(|team| team.is_known()),
            team: agent.team(),
            bounty: agent.bounty(),
            at: now,
        };

        if let Some(target) = outbound {
            self.unclaim_as_target(target, id);
        }
        for claimant in inbound {
            if let Some(attacker) = self.agents.get_mut(claimant) {
                if attacker.target == Some(id) {
                    attacker.target = None;
                }
            }
        }

        self.deaths.schedule(id, due);
        self.notices.push(notice);
        info!(
            target: "combat.death",
            agent = ?id,
            ?killer,
            team = %notice.team,
            bounty = notice.bounty,
            "agent dying"
        );
        true
    }

    /// Removes every agent whose death sequence has finished.
    pub(crate) fn poll_removals(&mut self) -> Vec<AgentId> {
        let due = self.deaths.drain_due(self.clock);
        let mut removed = Vec::with_capacity(due.len());
        for id in due {
            if self.agents.remove(id).is_some() {
                debug!(target: "combat.death", agent = ?id, "agent removed");
                removed.push(id);
            }
        }
        removed
    }

    /// Deaths that happened since the last call.
    pub fn take_death_notices(&mut self) -> Vec<DeathNotice> {
        std::mem::take(&mut self.notices)
    }

    pub fn pending_removals(&self) -> usize {
        self.deaths.len()
    }
}
