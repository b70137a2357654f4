//! The minefield: store, configuration and scheduler in one context object.
//!
//! # Example
//!
//! ```
//! use minefield_core::config::MinefieldConfig;
//! use minefield_core::minefield::Minefield;
//!
//! let config = MinefieldConfig {
//!     worker_count: 2,
//!     team_count: 2,
//!     mines_per_team: 20,
//!     ..MinefieldConfig::default()
//! };
//!
//! let mut field = Minefield::new(config).unwrap();
//! field.populate();
//! let report = field.run();
//!
//! assert_eq!(report.survivors.len(), 2);
//! assert!(report.rounds >= 1);
//! ```

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::info;

use crate::config::MinefieldConfig;
use crate::error::MinefieldError;
use crate::math::Vec3;
use crate::mine::{MineHandle, MineId, PoolId};
use crate::pool::{ObjectPool, PoolStore};
use crate::scheduler::{RoundPhase, RoundReport, RoundScheduler, RoundSettings};
use crate::spawn;

/// Surviving mines of one team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TeamSurvivors {
    /// Team.
    pub team: PoolId,
    /// Mines left in its pool.
    pub mines: usize,
}

/// Final state of a battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BattleReport {
    /// Survivors per team, in team order.
    pub survivors: Vec<TeamSurvivors>,
    /// Team with the most survivors. Ties go to the lowest team.
    pub winner: PoolId,
    /// Survivors of the winning team.
    pub winning_mines: usize,
    /// Rounds run, including the final round without detonations.
    pub rounds: u64,
}

/// A configured minefield ready to be populated and fought out.
#[derive(Debug)]
pub struct Minefield {
    config: MinefieldConfig,
    store: PoolStore,
    scheduler: RoundScheduler,
    rng: ChaCha8Rng,
}

impl Minefield {
    /// Validates `config`, lays out an empty store and starts the workers.
    ///
    /// # Errors
    ///
    /// Returns [`MinefieldError::Config`] for an invalid configuration and
    /// [`MinefieldError::WorkerPool`] if the workers cannot be started.
    pub fn new(config: MinefieldConfig) -> Result<Self, MinefieldError> {
        config.validate()?;

        let mut store = PoolStore::with_capacity_limit(config.capacity);
        store.init(config.team_count, config.mines_per_team);
        let scheduler = RoundScheduler::new(config.worker_count)?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);

        Ok(Self {
            config,
            store,
            scheduler,
            rng,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &MinefieldConfig {
        &self.config
    }

    /// Returns the pool store.
    #[must_use]
    pub const fn store(&self) -> &PoolStore {
        &self.store
    }

    /// Returns the pool store mutably, for manual setup.
    #[must_use]
    pub fn store_mut(&mut self) -> &mut PoolStore {
        &mut self.store
    }

    /// Returns the number of rounds run so far.
    #[must_use]
    pub const fn rounds(&self) -> u64 {
        self.scheduler.round()
    }

    /// Returns the scheduler's current phase.
    #[must_use]
    pub const fn phase(&self) -> RoundPhase {
        self.scheduler.phase()
    }

    /// Spawns every team's mines. Returns the number of successful spawns.
    pub fn populate(&mut self) -> usize {
        let spawned = spawn::populate(&mut self.store, &self.config, &mut self.rng);
        info!(
            spawned,
            live = self.store.count_total(),
            teams = self.config.team_count,
            "minefield populated"
        );
        spawned
    }

    /// Spawns a single mine from the configured profile.
    pub fn spawn_mine(&mut self, id: MineId, position: Vec3, team: PoolId) -> Option<MineHandle> {
        spawn::spawn_mine(&mut self.store, &self.config.spawn, id, position, team, &mut self.rng)
    }

    /// Runs a single round.
    pub fn step(&mut self) -> RoundReport {
        let settings = RoundSettings::from(&self.config);
        self.scheduler.run_round(&mut self.store, &settings)
    }

    /// Runs rounds until one finds no targets, then reports the outcome.
    pub fn run(&mut self) -> BattleReport {
        while self.step().found_targets() {}

        let report = self.outcome();
        info!(
            winner = report.winner.as_i32(),
            mines = report.winning_mines,
            rounds = report.rounds,
            "battle over"
        );
        report
    }

    /// Reports survivors and the current leader without running anything.
    #[must_use]
    pub fn outcome(&self) -> BattleReport {
        let survivors: Vec<TeamSurvivors> = (0..self.config.team_count)
            .map_while(|index| i32::try_from(index).ok())
            .map(|raw| {
                let team = PoolId::new(raw);
                TeamSurvivors {
                    team,
                    mines: self.store.count_in_pool(team),
                }
            })
            .collect();

        let mut winner = TeamSurvivors {
            team: PoolId::new(0),
            mines: 0,
        };
        for entry in &survivors {
            if entry.mines > winner.mines {
                winner = *entry;
            }
        }

        BattleReport {
            survivors,
            winner: winner.team,
            winning_mines: winner.mines,
            rounds: self.rounds(),
        }
    }
}
