//! bk - single-lane bridge crossing simulator
//!
//! CLI entry point: run a traveler population, verify a recorded run, or show
//! the effective configuration.

use std::path::{Path, PathBuf};

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use tracing::{debug, info};

use bridgekeeper::cli::{Cli, Command, RunOverrides};
use bridgekeeper::config::Config;
use bridgekeeper::events::{EventLogger, narrate, read_events, verify};
use bridgekeeper::sim::{RunSummary, Simulation};
use bridgekeeper::Direction;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre!("Failed to install tracing subscriber: {}", e))?;

    debug!(?level, "Logging initialized");
    Ok(())
}

fn load_config(path: Option<&PathBuf>, overrides: &RunOverrides) -> Result<Config> {
    let mut config = Config::load(path).context("Failed to load configuration")?;
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Run { overrides, quiet } => {
            let config = load_config(cli.config.as_ref(), &overrides)?;
            cmd_run(config, quiet).await
        }
        Command::Verify { path, max_streak } => {
            let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
            cmd_verify(&path, max_streak.unwrap_or(config.lane.max_streak))
        }
        Command::Config { overrides } => {
            let config = load_config(cli.config.as_ref(), &overrides)?;
            print!("{}", config.to_yaml()?);
            Ok(())
        }
    }
}

async fn cmd_run(config: Config, quiet: bool) -> Result<()> {
    let sim = Simulation::new(config.lane.clone(), config.simulation.clone()).context("Failed to set up simulation")?;

    let logger = match &config.event_log {
        Some(path) => {
            let logger = EventLogger::create(path).context(format!("Failed to create event log {}", path.display()))?;
            Some(tokio::spawn(logger.run(sim.subscribe())))
        }
        None => None,
    };
    let narrator = (!quiet).then(|| tokio::spawn(narrate(sim.subscribe())));

    let summary = sim.run().await.context("Simulation aborted")?;

    if let Some(narrator) = narrator {
        narrator.await.context("Narrator task failed")?;
    }
    if let Some(logger) = logger {
        let written = logger.await.context("Event logger task failed")??;
        info!(written, "Event log complete");
    }

    print_summary(&summary, config.lane.max_streak);
    if let Some(path) = &config.event_log {
        println!("Events written to {}", path.display().to_string().cyan());
    }
    Ok(())
}

fn print_summary(summary: &RunSummary, max_streak: u32) {
    println!();
    println!("{} All travelers crossed", "✓".green());
    for direction in Direction::ALL {
        println!(
            "  {}: {} travelers, {} waited, peak {} on bridge",
            direction.bound(),
            summary.travelers[direction],
            summary.waited[direction],
            summary.stats.peak_occupancy[direction]
        );
    }
    println!(
        "  Hand-offs: {} (forced yields: {}), longest streak: {} (cap {})",
        summary.stats.handoffs, summary.stats.forced_yields, summary.stats.longest_streak, max_streak
    );
    println!("  Elapsed: {:.2}s", summary.elapsed.as_secs_f64());
}

fn cmd_verify(path: &Path, max_streak: u32) -> Result<()> {
    let events = read_events(path).context(format!("Failed to read event log {}", path.display()))?;
    let report = verify(&events, max_streak);

    println!("Events: {}", report.events);
    println!(
        "Admitted: {} northbound, {} southbound",
        report.admitted[Direction::North],
        report.admitted[Direction::South]
    );
    println!(
        "Longest contended streak: {} (cap {})",
        report.longest_contended_streak, max_streak
    );

    if report.is_clean() {
        println!("{} No violations", "✓".green());
        return Ok(());
    }

    for violation in &report.violations {
        println!("{} {}", "✗".red(), violation);
    }
    Err(eyre!("{} violation(s) in {}", report.violations.len(), path.display()))
}
