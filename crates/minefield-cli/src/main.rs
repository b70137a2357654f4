use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use minefield_core::{BattleReport, IdMode, Minefield, MinefieldConfig};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "minefield",
    version,
    about = "Run a multi-team minefield battle until no mine has a target left"
)]
struct Cli {
    /// Master random seed.
    seed: Option<u64>,
    /// Number of targeting worker threads.
    workers: Option<usize>,
    /// Number of teams.
    teams: Option<usize>,
    /// Mines spawned per team.
    mines_per_team: Option<usize>,
    /// Values above zero derive mine ids by hashing instead of drawing them.
    hash_ids: Option<i64>,

    /// JSON config file; positional arguments override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the final report as JSON instead of text.
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn resolve_config(&self) -> Result<MinefieldConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => MinefieldConfig::default(),
        };

        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(workers) = self.workers {
            config.worker_count = workers;
        }
        if let Some(teams) = self.teams {
            config.team_count = teams;
        }
        if let Some(per_team) = self.mines_per_team {
            config.mines_per_team = per_team;
        }
        if let Some(flag) = self.hash_ids {
            config.id_mode = if flag > 0 { IdMode::Hashed } else { IdMode::Random };
        }

        Ok(config)
    }
}

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    seed: u64,
    workers: usize,
    teams: usize,
    mines_per_team: usize,
    spawned: usize,
    #[serde(flatten)]
    battle: &'a BattleReport,
    elapsed_ms: f64,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    info!(
        seed = config.seed,
        workers = config.worker_count,
        teams = config.team_count,
        mines_per_team = config.mines_per_team,
        "starting minefield"
    );

    let started = Instant::now();
    let mut field = Minefield::new(config.clone()).context("setting up the minefield")?;
    let spawned = field.populate();
    let report = field.run();
    let elapsed = started.elapsed();

    if cli.json {
        let summary = RunSummary {
            seed: config.seed,
            workers: config.worker_count,
            teams: config.team_count,
            mines_per_team: config.mines_per_team,
            spawned,
            battle: &report,
            elapsed_ms: millis(elapsed),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_report(&report, elapsed);
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn print_report(report: &BattleReport, elapsed: Duration) {
    for team in &report.survivors {
        println!("Team {} has {} mines remaining", team.team, team.mines);
    }
    println!("Team {} wins after {} rounds", report.winner, report.rounds);
    println!("Time taken: {:.3} ms", millis(elapsed));
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_arguments_override_defaults() {
        let cli = Cli::parse_from(["minefield", "7", "3", "2", "50", "1"]);
        let config = cli.resolve_config().unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.worker_count, 3);
        assert_eq!(config.team_count, 2);
        assert_eq!(config.mines_per_team, 50);
        assert_eq!(config.id_mode, IdMode::Hashed);
    }

    #[test]
    fn no_arguments_keep_defaults() {
        let cli = Cli::parse_from(["minefield"]);
        assert_eq!(cli.resolve_config().unwrap(), MinefieldConfig::default());
    }

    #[test]
    fn zero_hash_flag_means_random_ids() {
        let cli = Cli::parse_from(["minefield", "1", "1", "1", "1", "0"]);
        assert_eq!(cli.resolve_config().unwrap().id_mode, IdMode::Random);
    }

    #[test]
    fn missing_config_file_is_reported() {
        let cli = Cli::parse_from(["minefield", "--config", "/nonexistent/minefield.json"]);
        let err = cli.resolve_config().unwrap_err();
        assert!(err.to_string().contains("reading config"));
    }
}
