//! # Minefield Core
//!
//! Multi-team minefield combat rounds.
//!
//! Mines belong to teams and live in a [`pool::PoolStore`]. Each round, a
//! worker pool scans every active mine's surroundings for targets; then every
//! team detonates its best-placed mine, with chain reactions resolved
//! depth-first. The battle ends with the first round in which no team finds a
//! target, and the team with the most surviving mines wins.
//!
//! ## Modules
//!
//! - [`mine`]: mine model, ids and handles
//! - [`pool`]: team-partitioned storage with absolute indexing
//! - [`targeting`]: per-mine target scans
//! - [`explosion`]: detonation and damage
//! - [`scheduler`]: the round state machine
//! - [`spawn`]: mine spawning and field population
//! - [`minefield`]: the top-level context object
//!
//! ## Usage
//!
//! ```
//! use minefield_core::{Minefield, MinefieldConfig};
//!
//! let mut field = Minefield::new(MinefieldConfig {
//!     worker_count: 2,
//!     team_count: 3,
//!     mines_per_team: 10,
//!     ..MinefieldConfig::default()
//! })
//! .unwrap();
//! field.populate();
//!
//! let report = field.run();
//! println!("team {} wins with {} mines", report.winner, report.winning_mines);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod explosion;
pub mod math;
pub mod mine;
pub mod minefield;
pub mod pool;
pub mod scheduler;
pub mod spawn;
pub mod targeting;

pub use config::{ConfigError, IdMode, MinefieldConfig, SpawnProfile};
pub use error::MinefieldError;
pub use explosion::{DamageOutcome, DetonationReport, ExplosionEngine};
pub use mine::{Mine, MineHandle, MineId, MineStatus, PoolId};
pub use minefield::{BattleReport, Minefield, TeamSurvivors};
pub use pool::{ObjectPool, PoolStore};
pub use scheduler::{RoundPhase, RoundReport, RoundScheduler, TeamPick};
pub use targeting::TargetingPolicy;

#[cfg(test)]
mod tests;
