use bevy::prelude::*;
use bevy::time::Fixed;

use crate::agent::AgentId;
use crate::config::{CombatTuning, SimulationParams};
use crate::damage::DamageEvent;
use crate::death::DeathNotice;
use crate::rng::SimulationRng;
use crate::skirmish::{Skirmish, SkirmishStats};

/// Runs a [`Skirmish`] on the fixed timestep. Damage from outside the
/// skirmish (scripted hazards, abilities) is queued as [`DamageRequest`]
/// events and resolved at the start of the next fixed tick.
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<SimulationParams>() {
            app.insert_resource(SimulationParams::from_env());
        }
        if !app.world().contains_resource::<CombatTuning>() {
            app.insert_resource(CombatTuning::from_env());
        }

        app.init_resource::<SimulationRng>()
            .init_resource::<SkirmishState>()
            .add_event::<DamageRequest>()
            .add_event::<AgentDied>()
            .add_event::<AgentRemoved>()
            .add_systems(Startup, configure_fixed_time)
            .add_systems(
                FixedUpdate,
                (
                    apply_damage_requests,
                    step_skirmish.after(apply_damage_requests),
                ),
            );
    }
}

#[derive(Event, Clone, Copy, Debug)]
pub struct DamageRequest(pub DamageEvent);

#[derive(Event, Clone, Copy, Debug)]
pub struct AgentDied(pub DeathNotice);

#[derive(Event, Clone, Copy, Debug)]
pub struct AgentRemoved(pub AgentId);

#[derive(Resource)]
pub struct SkirmishState {
    pub skirmish: Skirmish,
    /// Damage requests resolved so far, including ones that had no effect.
    pub requests_resolved: u64,
}

impl SkirmishState {
    pub fn stats(&self) -> &SkirmishStats {
        self.skirmish.stats()
    }
}

impl FromWorld for SkirmishState {
    fn from_world(world: &mut World) -> Self {
        let tuning = world
            .get_resource::<CombatTuning>()
            .cloned()
            .unwrap_or_default();
        Self {
            skirmish: Skirmish::new(tuning),
            requests_resolved: 0,
        }
    }
}

fn configure_fixed_time(mut fixed_time: ResMut<Time<Fixed>>, params: Res<SimulationParams>) {
    fixed_time.set_timestep_seconds(params.fixed_delta);
}

fn apply_damage_requests(
    mut requests: EventReader<DamageRequest>,
    mut state: ResMut<SkirmishState>,
) {
    for DamageRequest(event) in requests.read() {
        state.skirmish.world_mut().resolve_damage_event(event);
        state.requests_resolved += 1;
    }
}

fn step_skirmish(
    time: Res<Time>,
    mut state: ResMut<SkirmishState>,
    mut died: EventWriter<AgentDied>,
    mut removed: EventWriter<AgentRemoved>,
) {
    let report = state.skirmish.step(time.delta());
    for notice in report.deaths {
        died.send(AgentDied(notice));
    }
    for id in report.removed {
        removed.send(AgentRemoved(id));
    }
}
