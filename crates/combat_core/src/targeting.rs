//! Target selection on top of the claim registry.
//!
//! An agent holds at most one claim at a time: [`CombatWorld::retarget`]
//! releases the old claim before recording the new one.

use tracing::debug;

use crate::agent::AgentId;
use crate::claims::ClaimPolicy;
use crate::team::{on_enemy_team, Affiliated};
use crate::world::CombatWorld;

impl CombatWorld {
    /// `candidate` is a living enemy of `seeker` that still has room for
    /// another attacker. A target the seeker already claims stays valid
    /// even when the cap is reached.
    pub fn is_valid_target_for(
        &mut self,
        seeker: AgentId,
        candidate: AgentId,
        policy: &ClaimPolicy,
    ) -> bool {
        let (Some(agent), Some(other)) = (self.agents.get(seeker), self.agents.get(candidate))
        else {
            return false;
        };
        if !other.is_alive() || !on_enemy_team(agent.team(), other.team()) {
            return false;
        }
        self.is_claimed_by(candidate, seeker) || self.is_target_valid(candidate, policy)
    }

    /// Nearest valid target among those `seeker` has sensed. Ties go to the
    /// target sensed first.
    pub fn select_target(&mut self, seeker: AgentId, policy: &ClaimPolicy) -> Option<AgentId> {
        let agent = self.agents.get(seeker)?;
        let origin = agent.position();
        let known = agent.known_targets.clone();

        let mut best: Option<(AgentId, f32)> = None;
        for candidate in known {
            if !self.is_valid_target_for(seeker, candidate, policy) {
                continue;
            }
            let Some(other) = self.agents.get(candidate) else {
                continue;
            };
            let distance = origin.distance_squared(other.position());
            if best.map_or(true, |(_, nearest)| distance < nearest) {
                best = Some((candidate, distance));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Switches `seeker` to `target`, moving its claim along. `None` drops
    /// the current target.
    pub fn retarget(&mut self, seeker: AgentId, target: Option<AgentId>) {
        let Some(agent) = self.agents.get_mut(seeker) else {
            return;
        };
        let previous = agent.target;
        agent.target = target;

        if previous != target {
            if let Some(old) = previous {
                self.unclaim_as_target(old, seeker);
            }
            debug!(target: "combat.targeting", ?seeker, ?previous, next = ?target, "retargeted");
        }
        if let Some(new) = target {
            self.claim_as_target(new, seeker);
        }
    }

    /// Selects and claims the best target for `seeker`, dropping the
    /// current one if nothing valid is left.
    pub fn acquire_target(&mut self, seeker: AgentId, policy: &ClaimPolicy) -> Option<AgentId> {
        let current = self.agents.get(seeker)?.target;
        if let Some(current) = current {
            if self.is_valid_target_for(seeker, current, policy) {
                return Some(current);
            }
        }
        let next = self.select_target(seeker, policy);
        self.retarget(seeker, next);
        next
    }
}
