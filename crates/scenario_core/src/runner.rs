//! Headless scenario execution.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use combat_core::{AgentId, Affiliated, SimulationRng, Skirmish, SkirmishStats};
use tracing::{debug, info};

use crate::config::ScenarioConfig;
use crate::error::ScenarioError;
use crate::report::{DeathRecord, Outcome, TeamSummary};

/// Everything a finished run produced, before it is stamped into a report.
#[derive(Debug, Clone)]
pub struct ScenarioRun {
    pub scenario: String,
    pub seed: u64,
    pub outcome: Outcome,
    pub winner: Option<u8>,
    pub ticks: u32,
    pub elapsed_secs: f32,
    pub teams: Vec<TeamSummary>,
    pub deaths: Vec<DeathRecord>,
    pub stats: SkirmishStats,
}

pub fn run_scenario(config: &ScenarioConfig) -> Result<ScenarioRun, ScenarioError> {
    config.validate()?;
    let seed = config.seed();
    let dt = Duration::try_from_secs_f32(config.tick_secs)
        .map_err(|_| ScenarioError::InvalidTick(config.tick_secs))?;

    let mut rng = SimulationRng::new(seed);
    let mut skirmish = Skirmish::new(config.tuning.clone());
    let mut labels: HashMap<AgentId, String> = HashMap::new();
    let mut spawned: BTreeMap<u8, u32> = BTreeMap::new();

    for unit in &config.units {
        let ids = skirmish
            .spawn_group(
                &unit.agent_spec(),
                unit.weapon,
                unit.count,
                unit.spread,
                &mut rng,
            )
            .map_err(|source| ScenarioError::Unit {
                label: unit.label.clone(),
                source,
            })?;
        for (idx, id) in ids.into_iter().enumerate() {
            for buff in &unit.buffs {
                skirmish.world_mut().apply_buff(id, buff.clone());
            }
            labels.insert(id, format!("{}#{idx}", unit.label));
        }
        *spawned.entry(unit.team).or_default() += unit.count;
    }

    info!(
        target: "scenario.runner",
        scenario = %config.name,
        seed,
        agents = labels.len(),
        "scenario started"
    );

    let mut deaths = Vec::new();
    let mut bounty: BTreeMap<u8, u32> = BTreeMap::new();
    let mut ticks = 0;
    while ticks < config.ticks && !skirmish.is_decided() {
        let report = skirmish.step(dt);
        ticks += 1;
        for notice in report.deaths {
            if let Some(team) = notice.killer_team.filter(|team| *team != notice.team) {
                *bounty.entry(team.0).or_default() += notice.bounty;
            }
            let label = labels.get(&notice.agent).cloned().unwrap_or_default();
            debug!(target: "scenario.runner", tick = ticks, %label, "unit lost");
            deaths.push(DeathRecord {
                tick: ticks,
                label,
                team: notice.team.0,
                killer: notice.killer.and_then(|killer| labels.get(&killer).cloned()),
                bounty: notice.bounty,
            });
        }
    }

    let mut survivors: BTreeMap<u8, u32> = BTreeMap::new();
    for (_, agent) in skirmish.world().agents() {
        if agent.is_alive() {
            *survivors.entry(agent.team().0).or_default() += 1;
        }
    }
    let teams = config
        .teams()
        .into_iter()
        .map(|team| TeamSummary {
            team: team.0,
            spawned: spawned.get(&team.0).copied().unwrap_or_default(),
            survivors: survivors.get(&team.0).copied().unwrap_or_default(),
            bounty_collected: bounty.get(&team.0).copied().unwrap_or_default(),
        })
        .collect();

    let standing = skirmish.world().surviving_teams();
    let (outcome, winner) = match standing.as_slice() {
        [] => (Outcome::Draw, None),
        [team] => (Outcome::Victory, Some(team.0)),
        _ => (Outcome::Timeout, None),
    };

    info!(
        target: "scenario.runner",
        scenario = %config.name,
        ?outcome,
        ?winner,
        ticks,
        "scenario finished"
    );

    Ok(ScenarioRun {
        scenario: config.name.clone(),
        seed,
        outcome,
        winner,
        ticks,
        elapsed_secs: skirmish.world().now().as_secs_f32(),
        teams,
        deaths,
        stats: *skirmish.stats(),
    })
}
