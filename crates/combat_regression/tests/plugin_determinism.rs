use std::time::Duration;

use bevy::app::FixedUpdate;
use bevy::prelude::*;
use bevy::time::TimePlugin;
use combat_core::{
    AgentSpec, AgentStats, CombatPlugin, CombatTuning, SimulationParams, SimulationRng,
    SkirmishState, TeamId, Weapon,
};

#[test]
fn plugin_skirmish_is_deterministic() {
    let baseline = simulate(42);
    let repeat = simulate(42);
    assert_eq!(baseline, repeat, "same seed should match");

    let different = simulate(7);
    assert_ne!(baseline, different, "different seeds should diverge");
}

#[test]
fn dead_agents_leave_the_world_after_the_delay() {
    let mut app = build_app(42, 0.5);
    let doomed = {
        let mut state = app.world_mut().resource_mut::<SkirmishState>();
        let id = state
            .skirmish
            .spawn(AgentSpec::new(TeamId(1), AgentStats::default()), Weapon::Melee)
            .unwrap();
        state.skirmish.world_mut().kill(id, None);
        id
    };

    run_fixed(&mut app, 3);
    assert!(app
        .world()
        .resource::<SkirmishState>()
        .skirmish
        .world()
        .contains(doomed));

    run_fixed(&mut app, 5);
    assert!(!app
        .world()
        .resource::<SkirmishState>()
        .skirmish
        .world()
        .contains(doomed));
}

fn build_app(seed: u64, death_delay: f32) -> App {
    let mut app = App::new();
    app.insert_resource(SimulationParams::from_seed(seed));
    app.insert_resource(CombatTuning {
        death_removal_delay_secs: death_delay,
        ..Default::default()
    });
    app.add_plugins(MinimalPlugins.set(TimePlugin::default()));
    app.add_plugins(CombatPlugin);
    app.update();
    app
}

fn run_fixed(app: &mut App, ticks: u32) {
    for _ in 0..ticks {
        {
            let mut time = app.world_mut().resource_mut::<Time>();
            time.advance_by(Duration::from_millis(100));
        }
        app.world_mut().run_schedule(FixedUpdate);
    }
}

fn simulate(seed: u64) -> Vec<(i32, i32, i32)> {
    let mut app = build_app(seed, 2.0);
    app.world_mut()
        .resource_scope(|world, mut rng: Mut<SimulationRng>| {
            let mut state = world.resource_mut::<SkirmishState>();
            let red = AgentSpec::new(TeamId(1), AgentStats::default());
            let blue = AgentSpec::new(TeamId(2), AgentStats::default()).at(Vec2::new(500.0, 0.0));
            state
                .skirmish
                .spawn_group(&red, Weapon::Melee, 5, 100.0, &mut rng)
                .unwrap();
            state
                .skirmish
                .spawn_group(&blue, Weapon::Melee, 5, 100.0, &mut rng)
                .unwrap();
        });

    run_fixed(&mut app, 120);

    let state = app.world().resource::<SkirmishState>();
    state
        .skirmish
        .world()
        .agents()
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
