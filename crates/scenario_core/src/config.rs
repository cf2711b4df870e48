use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use combat_core::{AgentSpec, AgentStats, Buff, CombatTuning, TeamId, Weapon};
use serde::Deserialize;

use crate::error::ScenarioError;

const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Deserialize, Clone)]
pub struct ScenarioConfig {
    pub name: String,
    /// Falls back to `SIMULATION_SEED`, then to 42.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Upper bound on simulation steps; the run stops earlier once a single
    /// team is left.
    #[serde(default = "default_ticks")]
    pub ticks: u32,
    #[serde(default = "default_tick_secs")]
    pub tick_secs: f32,
    #[serde(default)]
    pub tuning: CombatTuning,
    #[serde(default)]
    pub units: Vec<UnitConfig>,
    #[serde(default)]
    pub report: Option<ReportConfig>,
}

impl ScenarioConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        let cfg: ScenarioConfig = toml::from_str(&data)
            .with_context(|| format!("failed to parse scenario {}", path.display()))?;
        Ok(cfg)
    }

    pub fn seed(&self) -> u64 {
        self.seed
            .or_else(|| {
                std::env::var("SIMULATION_SEED")
                    .ok()
                    .and_then(|val| val.parse().ok())
            })
            .unwrap_or(DEFAULT_SEED)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.units.is_empty() {
            return Err(ScenarioError::NoUnits(self.name.clone()));
        }
        if !(self.tick_secs.is_finite() && self.tick_secs > 0.0) {
            return Err(ScenarioError::InvalidTick(self.tick_secs));
        }
        self.tuning.validate()?;
        for unit in &self.units {
            if unit.count == 0 {
                return Err(ScenarioError::EmptyGroup {
                    label: unit.label.clone(),
                });
            }
        }
        let teams = self.teams();
        if teams.len() < 2 {
            return Err(ScenarioError::NotEnoughTeams(teams.len()));
        }
        Ok(())
    }

    /// Combatant teams in ascending order.
    pub fn teams(&self) -> Vec<TeamId> {
        let mut teams: Vec<TeamId> = self
            .units
            .iter()
            .map(|unit| TeamId(unit.team))
            .filter(|team| team.is_known())
            .collect();
        teams.sort();
        teams.dedup();
        teams
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UnitConfig {
    pub label: String,
    pub team: u8,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default)]
    pub position: [f32; 2],
    /// Half-width of the square the group is scattered over.
    #[serde(default)]
    pub spread: f32,
    #[serde(default)]
    pub stats: AgentStats,
    #[serde(default)]
    pub weapon: Weapon,
    #[serde(default)]
    pub health: Option<f32>,
    #[serde(default)]
    pub bounty: u32,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub buffs: Vec<Buff>,
}

impl UnitConfig {
    pub fn agent_spec(&self) -> AgentSpec {
        let mut spec = AgentSpec::new(TeamId(self.team), self.stats)
            .at(self.position.into())
            .with_bounty(self.bounty)
            .hidden(self.hidden);
        spec.health = self.health;
        spec
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    pub path: PathBuf,
}

fn default_ticks() -> u32 {
    600
}

fn default_tick_secs() -> f32 {
    1.0 / 30.0
}

fn default_count() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUEL: &str = r#"
name = "duel"
seed = 7
ticks = 100

[tuning]
max_attackers = 2

[[units]]
label = "swords"
team = 1
count = 3
position = [0.0, 0.0]
spread = 20.0
stats = { attack_damage = 12.0 }

[[units]]
label = "bows"
team = 2
position = [400.0, 0.0]
weapon = { kind = "ranged", projectile_speed = 600.0 }
buffs = [{ name = "focus", modifiers = { attack_damage = 5.0 }, duration_secs = 3.0 }]
"#;

    #[test]
    fn parses_a_full_scenario() {
        let cfg: ScenarioConfig = toml::from_str(DUEL).unwrap();
        assert_eq!(cfg.seed(), 7);
        assert_eq!(cfg.tuning.max_attackers, Some(2));
        assert_eq!(cfg.tuning.stuck_abort_secs, 2.0);
        assert_eq!(cfg.units[0].count, 3);
        assert_eq!(cfg.units[0].stats.attack_damage, 12.0);
        assert_eq!(cfg.units[0].stats.max_health, 100.0);
        assert_eq!(cfg.units[1].count, 1);
        assert_eq!(
            cfg.units[1].weapon,
            Weapon::Ranged {
                projectile_speed: 600.0,
                constant: false
            }
        );
        assert_eq!(cfg.units[1].buffs[0].duration_secs, Some(3.0));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn one_sided_scenarios_are_rejected() {
        let mut cfg: ScenarioConfig = toml::from_str(DUEL).unwrap();
        cfg.units[1].team = 1;
        assert!(matches!(cfg.validate(), Err(ScenarioError::NotEnoughTeams(1))));
    }

    #[test]
    fn empty_groups_are_rejected() {
        let mut cfg: ScenarioConfig = toml::from_str(DUEL).unwrap();
        cfg.units[0].count = 0;
        assert!(matches!(cfg.validate(), Err(ScenarioError::EmptyGroup { .. })));
    }

    #[test]
    fn scenario_without_units_is_rejected() {
        let cfg: ScenarioConfig = toml::from_str(r#"name = "empty""#).unwrap();
        assert!(matches!(cfg.validate(), Err(ScenarioError::NoUnits(_))));
    }
}
