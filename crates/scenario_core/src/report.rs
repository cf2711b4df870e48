use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use combat_core::SkirmishStats;
use serde::{Deserialize, Serialize};

use crate::runner::ScenarioRun;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub id: String,
    pub timestamp: String,
    pub scenario: String,
    pub seed: u64,
    pub summary: ReportSummary,
    pub teams: Vec<TeamSummary>,
    pub deaths: Vec<DeathRecord>,
    pub stats: SkirmishStats,
}

impl ScenarioReport {
    pub fn new(id: impl Into<String>, run: ScenarioRun) -> Self {
        Self {
            id: id.into(),
            timestamp: Utc::now().to_rfc3339(),
            scenario: run.scenario,
            seed: run.seed,
            summary: ReportSummary {
                outcome: run.outcome,
                winner: run.winner,
                ticks: run.ticks,
                elapsed_secs: run.elapsed_secs,
            },
            teams: run.teams,
            deaths: run.deaths,
            stats: run.stats,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read report {}", path.display()))?;
        let report = serde_json::from_str(&data)
            .with_context(|| format!("failed to parse report {}", path.display()))?;
        Ok(report)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        Ok(())
    }

    /// One line per team, for terminal output.
    pub fn team_lines(&self) -> Vec<String> {
        self.teams
            .iter()
            .map(|team| {
                format!(
                    "team {}: {}/{} standing, {} bounty",
                    team.team, team.survivors, team.spawned, team.bounty_collected
                )
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub outcome: Outcome,
    pub winner: Option<u8>,
    pub ticks: u32,
    pub elapsed_secs: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Exactly one team is left standing.
    Victory,
    /// Every combatant died.
    Draw,
    /// The tick budget ran out with several teams alive.
    Timeout,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamSummary {
    pub team: u8,
    pub spawned: u32,
    pub survivors: u32,
    /// Bounty from enemies this team killed.
    pub bounty_collected: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeathRecord {
    pub tick: u32,
    pub label: String,
    pub team: u8,
    pub killer: Option<String>,
    pub bounty: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_run() -> ScenarioRun {
        ScenarioRun {
            scenario: "duel".into(),
            seed: 3,
            outcome: Outcome::Victory,
            winner: Some(1),
            ticks: 40,
            elapsed_secs: 4.0,
            teams: vec![
                TeamSummary {
                    team: 1,
                    spawned: 1,
                    survivors: 1,
                    bounty_collected: 5,
                },
                TeamSummary {
                    team: 2,
                    spawned: 1,
                    survivors: 0,
                    bounty_collected: 0,
                },
            ],
            deaths: vec![DeathRecord {
                tick: 39,
                label: "grunt#0".into(),
                team: 2,
                killer: Some("hero#0".into()),
                bounty: 5,
            }],
            stats: SkirmishStats::default(),
        }
    }

    #[test]
    fn outcome_serializes_lowercase() {
        let report = ScenarioReport::new("run-1", sample_run());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["summary"]["outcome"], "victory");
        assert_eq!(json["summary"]["winner"], 1);
        assert_eq!(json["deaths"][0]["killer"], "hero#0");
    }

    #[test]
    fn reports_survive_a_trip_through_disk() {
        let dir = std::env::temp_dir().join(format!("scenario-report-{}", std::process::id()));
        let path = dir.join("nested").join("report.json");
        let report = ScenarioReport::new("run-2", sample_run());
        report.write_to(&path).unwrap();

        let loaded = ScenarioReport::from_path(&path).unwrap();
        assert_eq!(loaded.id, "run-2");
        assert_eq!(loaded.teams, report.teams);
        assert_eq!(
            loaded.team_lines(),
            vec![
                "team 1: 1/1 standing, 5 bounty".to_owned(),
                "team 2: 0/1 standing, 0 bounty".to_owned(),
            ]
        );
        fs::remove_dir_all(dir).ok();
    }
}
