//! CLI argument parsing for bridgekeeper

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "bk")]
#[command(author, version, about = "Single-lane bridge crossing simulator", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run travelers in both directions across the bridge
    Run {
        #[command(flatten)]
        overrides: RunOverrides,

        /// Do not print traveler progress
        #[arg(short, long)]
        quiet: bool,
    },

    /// Replay a recorded event log and check the crossing rules
    Verify {
        /// JSONL event log written by `bk run --event-log`
        #[arg(required = true)]
        path: PathBuf,

        /// Streak cap the run was made with (default: from config)
        #[arg(short, long)]
        max_streak: Option<u32>,
    },

    /// Print the effective configuration as YAML
    Config {
        #[command(flatten)]
        overrides: RunOverrides,
    },
}

/// Command-line overrides applied on top of the config file
#[derive(Args, Debug, Default, Clone)]
pub struct RunOverrides {
    /// Travelers per direction (default: 10)
    #[arg(short = 'n', long)]
    pub travelers: Option<u32>,

    /// Max consecutive admissions while the other side waits (default: 3)
    #[arg(short, long)]
    pub max_streak: Option<u32>,

    /// Length of one crossing time unit in milliseconds (default: 1000)
    #[arg(short, long)]
    pub time_unit_ms: Option<u64>,

    /// Minimum crossing time in units
    #[arg(long)]
    pub crossing_min: Option<u64>,

    /// Maximum crossing time in units
    #[arg(long)]
    pub crossing_max: Option<u64>,

    /// Minimum delay between launches in milliseconds
    #[arg(long)]
    pub stagger_min: Option<u64>,

    /// Maximum delay between launches in milliseconds
    #[arg(long)]
    pub stagger_max: Option<u64>,

    /// Seed for crossing and stagger durations
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Write the event stream to this JSONL file
    #[arg(short, long)]
    pub event_log: Option<PathBuf>,
}

impl RunOverrides {
    /// Apply every override that was given
    pub fn apply(&self, config: &mut Config) {
        let sim = &mut config.simulation;
        if let Some(n) = self.travelers {
            sim.travelers_per_direction = n;
        }
        if let Some(k) = self.max_streak {
            config.lane.max_streak = k;
        }
        if let Some(ms) = self.time_unit_ms {
            sim.time_unit_ms = ms;
        }
        if let Some(v) = self.crossing_min {
            sim.crossing_units.min = v;
        }
        if let Some(v) = self.crossing_max {
            sim.crossing_units.max = v;
        }
        if let Some(v) = self.stagger_min {
            sim.stagger_ms.min = v;
        }
        if let Some(v) = self.stagger_max {
            sim.stagger_ms.max = v;
        }
        if self.seed.is_some() {
            sim.seed = self.seed;
        }
        if let Some(path) = &self.event_log {
            config.event_log = Some(path.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_overrides() {
        let cli = Cli::try_parse_from(["bk", "run", "-n", "4", "--max-streak", "2", "--stagger-max", "7", "-q"]).unwrap();
        let Command::Run { overrides, quiet } = cli.command else {
            panic!("expected run");
        };
        assert!(quiet);

        let mut config = Config::default();
        overrides.apply(&mut config);
        assert_eq!(config.simulation.travelers_per_direction, 4);
        assert_eq!(config.lane.max_streak, 2);
        assert_eq!(config.simulation.stagger_ms.max, 7);
        assert_eq!(config.simulation.stagger_ms.min, 50);
    }

    #[test]
    fn test_parse_verify() {
        let cli = Cli::try_parse_from(["bk", "-l", "debug", "verify", "events.jsonl"]).unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Command::Verify { max_streak: None, .. }));
    }
}
