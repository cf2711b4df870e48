//! Target claiming: which agents currently focus which target.
//!
//! The registry only records claims and answers questions about them. How
//! many attackers a target may have is a decision-layer policy passed in
//! as [`ClaimPolicy`]; the one-target-per-claimant rule is enforced by
//! [`CombatWorld::retarget`].

use tracing::{debug, trace};

use crate::agent::AgentId;
use crate::world::CombatWorld;

/// Ordered, duplicate-free list of agents claiming one target.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClaimSet {
    claimants: Vec<AgentId>,
}

impl ClaimSet {
    /// Returns `false` if `claimant` was already present.
    pub fn insert(&mut self, claimant: AgentId) -> bool {
        if self.contains(claimant) {
            return false;
        }
        self.claimants.push(claimant);
        true
    }

    pub fn remove(&mut self, claimant: AgentId) -> bool {
        let before = self.claimants.len();
        self.claimants.retain(|c| *c != claimant);
        before != self.claimants.len()
    }

    pub fn contains(&self, claimant: AgentId) -> bool {
        self.claimants.contains(&claimant)
    }

    pub fn len(&self) -> usize {
        self.claimants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.claimants.iter().copied()
    }

    /// Keeps only claimants for which `is_live` holds; returns how many
    /// were dropped.
    pub fn prune(&mut self, mut is_live: impl FnMut(AgentId) -> bool) -> usize {
        let before = self.claimants.len();
        self.claimants.retain(|c| is_live(*c));
        before - self.claimants.len()
    }

    pub(crate) fn take(&mut self) -> Vec<AgentId> {
        std::mem::take(&mut self.claimants)
    }
}

/// Decision-layer cap on how many agents may focus one target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClaimPolicy {
    pub max_attackers: Option<usize>,
}

impl ClaimPolicy {
    pub const UNLIMITED: Self = Self {
        max_attackers: None,
    };

    pub const fn capped(max_attackers: usize) -> Self {
        Self {
            max_attackers: Some(max_attackers),
        }
    }

    pub fn is_saturated(&self, attackers: usize) -> bool {
        self.max_attackers.is_some_and(|max| attackers >= max)
    }
}

impl CombatWorld {
    /// Records that `claimant` is attacking `target`. Re-claiming is a
    /// no-op, and so is claiming a target that no longer exists.
    pub fn claim_as_target(&mut self, target: AgentId, claimant: AgentId) {
        let Some(agent) = self.agents.get_mut(target) else {
            trace!(target: "combat.claims", victim = ?target, "claim on missing target skipped");
            return;
        };
        if agent.claimed_by.insert(claimant) {
            debug!(
                target: "combat.claims",
                victim = ?target,
                ?claimant,
                attackers = agent.claimed_by.len(),
                "target claimed"
            );
        }
    }

    pub fn unclaim_as_target(&mut self, target: AgentId, claimant: AgentId) {
        if let Some(agent) = self.agents.get_mut(target) {
            if agent.claimed_by.remove(claimant) {
                debug!(
                    target: "combat.claims",
                    victim = ?target,
                    ?claimant,
                    attackers = agent.claimed_by.len(),
                    "target unclaimed"
                );
            }
        }
    }

    /// A claimant whose handle no longer resolves never counts as claiming.
    pub fn is_claimed_by(&self, target: AgentId, claimant: AgentId) -> bool {
        self.agents.contains_key(claimant)
            && self
                .agents
                .get(target)
                .is_some_and(|agent| agent.claimed_by.contains(claimant))
    }

    /// Live claimants of `target`. Claimants that have been removed from
    /// the world are pruned as a side effect.
    pub fn number_of_attackers(&mut self, target: AgentId) -> usize {
        let Some(agent) = self.agents.get(target) else {
            return 0;
        };
        let stale: Vec<AgentId> = agent
            .claimed_by
            .iter()
            .filter(|claimant| !self.agents.contains_key(*claimant))
            .collect();
        let Some(agent) = self.agents.get_mut(target) else {
            return 0;
        };
        if !stale.is_empty() {
            let pruned = agent.claimed_by.prune(|claimant| !stale.contains(&claimant));
            trace!(target: "combat.claims", victim = ?target, pruned, "stale claimants pruned");
        }
        agent.claimed_by.len()
    }

    /// `candidate` exists, is alive and is not saturated under `policy`.
    pub fn is_target_valid(&mut self, candidate: AgentId, policy: &ClaimPolicy) -> bool {
        let alive = self
            .agents
            .get(candidate)
            .is_some_and(|agent| agent.is_alive());
        alive && !policy.is_saturated(self.number_of_attackers(candidate))
    }
}
