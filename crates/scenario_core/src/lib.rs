pub mod config;
pub mod discover;
pub mod error;
pub mod report;
pub mod runner;

pub use config::{ReportConfig, ScenarioConfig, UnitConfig};
pub use discover::discover_scenarios;
pub use error::ScenarioError;
pub use report::{DeathRecord, Outcome, ReportSummary, ScenarioReport, TeamSummary};
pub use runner::{run_scenario, ScenarioRun};
