use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use scenario_core::{discover_scenarios, run_scenario, ScenarioConfig, ScenarioReport};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Run headless combat scenarios and inspect their reports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one scenario file and print its JSON report.
    Run(RunArgs),
    /// Run every scenario found under a directory.
    Batch(BatchArgs),
    /// Summarize an existing report.
    Report(ReportArgs),
}

#[derive(Args)]
struct RunArgs {
    #[arg(long, default_value = "scenarios/border_skirmish.toml")]
    config: PathBuf,
    #[arg(long)]
    id: Option<String>,
    /// Overrides the seed from the scenario file.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct BatchArgs {
    #[arg(long, default_value = "scenarios")]
    dir: PathBuf,
    /// Where to write one report per scenario.
    #[arg(long, default_value = "reports")]
    out_dir: PathBuf,
}

#[derive(Args)]
struct ReportArgs {
    #[arg(long)]
    input: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init()
        .ok();
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => handle_run(args),
        Commands::Batch(args) => handle_batch(args),
        Commands::Report(args) => handle_report(args),
    }
}

fn handle_run(args: RunArgs) -> Result<()> {
    let mut config = ScenarioConfig::from_path(&args.config)?;
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    let run = run_scenario(&config)
        .with_context(|| format!("scenario {} failed", args.config.display()))?;

    let run_id = args.id.unwrap_or_else(|| default_run_id(&config.name));
    let report = ScenarioReport::new(run_id, run);
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(report_cfg) = config.report.as_ref() {
        report.write_to(&report_cfg.path)?;
        println!("Report written to {}", report_cfg.path.display());
    }
    Ok(())
}

fn handle_batch(args: BatchArgs) -> Result<()> {
    let paths = discover_scenarios(&args.dir)?;
    if paths.is_empty() {
        warn!(dir = %args.dir.display(), "no scenarios found");
        return Ok(());
    }

    let mut failures = 0;
    for path in &paths {
        let outcome = ScenarioConfig::from_path(path).and_then(|config| {
            let run = run_scenario(&config)?;
            let report = ScenarioReport::new(default_run_id(&config.name), run);
            let out = args.out_dir.join(format!("{}.json", config.name));
            report.write_to(&out)?;
            Ok(report)
        });
        match outcome {
            Ok(report) => {
                info!(scenario = %report.scenario, outcome = ?report.summary.outcome, "scenario done");
                println!(
                    "{}: {:?} after {} ticks",
                    report.scenario, report.summary.outcome, report.summary.ticks
                );
            }
            Err(err) => {
                failures += 1;
                warn!(path = %path.display(), error = %err, "scenario failed");
                println!("{}: FAILED ({err:#})", path.display());
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} scenarios failed", paths.len());
    }
    Ok(())
}

fn handle_report(args: ReportArgs) -> Result<()> {
    let report = ScenarioReport::from_path(&args.input)?;
    let winner = report
        .summary
        .winner
        .map_or_else(|| "none".to_owned(), |team| format!("team {team}"));
    println!(
        "Report {} ({}) -> {:?}, winner {} after {} ticks",
        report.id, report.scenario, report.summary.outcome, winner, report.summary.ticks
    );
    for line in report.team_lines() {
        println!("  {line}");
    }
    Ok(())
}

fn default_run_id(name: &str) -> String {
    format!("{name}-{}", Utc::now().format("%Y%m%dT%H%M%S"))
}
