//! Helpers for deterministic regression tests.

use std::time::Duration;

use combat_core::{
    AgentSpec, AgentStats, CombatTuning, CombatWorld, Projectile, SimulationRng, Skirmish,
    TeamId, Weapon,
};
use serde_json::json;

pub const DEFAULT_SEED: u64 = 42;

const ATTACKER: TeamId = TeamId(1);
const DEFENDER: TeamId = TeamId(2);

/// Fires one projectile carrying `damage` through a line of defenders with
/// the given starting healths and records what each hit did.
pub fn penetration_trace(healths: &[f32], damage: i32) -> serde_json::Value {
    let mut world = CombatWorld::new(CombatTuning::default());
    let ids: Vec<_> = healths
        .iter()
        .enumerate()
        .filter_map(|(idx, health)| {
            let spec = AgentSpec::new(DEFENDER, AgentStats::default())
                .at([100.0 * (idx as f32 + 1.0), 0.0].into())
                .with_health(*health);
            world.spawn(spec).ok()
        })
        .collect();

    let reach = 100.0 * (ids.len() as f32 + 1.0);
    let mut shot = Projectile::new(ATTACKER, damage, [0.0, 0.0].into(), [reach, 0.0].into())
        .with_radius(5.0);
    let (fate, outcomes) = world.sweep_projectile(&mut shot, Duration::from_secs(1));

    let hits: Vec<_> = outcomes
        .iter()
        .map(|outcome| {
            json!({
                "after": outcome.new_health.round() as i64,
                "before": outcome.previous_health.round() as i64,
                "killed": outcome.killed,
                "pending": outcome.pending_damage,
            })
        })
        .collect();

    json!({
        "damage": damage,
        "fate": format!("{fate:?}").to_lowercase(),
        "hits": hits,
        "remaining": shot.remaining_damage(),
    })
}

/// Runs a small two-team skirmish headlessly and returns each living
/// agent's rounded position and health, in handle order.
pub fn skirmish_fingerprint(seed: u64, steps: u32) -> Vec<(i32, i32, i32)> {
    let mut rng = SimulationRng::new(seed);
    let mut skirmish = Skirmish::new(CombatTuning::default());
    let melee = AgentSpec::new(ATTACKER, AgentStats::default());
    let ranged = AgentSpec::new(
        DEFENDER,
        AgentStats {
            attack_range: 240.0,
            ..Default::default()
        },
    )
    .at([600.0, 0.0].into());
    let bow = Weapon::Ranged {
        projectile_speed: 600.0,
        constant: false,
    };

    let groups = [(melee, Weapon::Melee), (ranged, bow)];
    for (spec, weapon) in &groups {
        if skirmish
            .spawn_group(spec, *weapon, 4, 80.0, &mut rng)
            .is_err()
        {
            return Vec::new();
        }
    }

    for _ in 0..steps {
        skirmish.step(Duration::from_millis(100));
    }

    skirmish
        .world()
        .agents()
        .filter(|(_, agent)| agent.is_alive())
        .map(|(_, agent)| {
            let position = agent.position();
            (
                position.x.round() as i32,
                position.y.round() as i32,
                agent.health().round() as i32,
            )
        })
        .collect()
}
