//! Run configuration.
//!
//! [`MinefieldConfig`] carries everything a run needs: the seed, worker and
//! team counts, the spawn profile and the targeting knobs. It deserializes
//! from JSON with every field optional, so a config file only has to name
//! what it changes.
//!
//! ```
//! use minefield_core::config::MinefieldConfig;
//!
//! let config: MinefieldConfig = serde_json::from_str(r#"{ "team_count": 2 }"#).unwrap();
//! assert_eq!(config.team_count, 2);
//! assert_eq!(config.worker_count, 12);
//! assert!(config.validate().is_ok());
//! ```

use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mine::{DEFAULT_EXPLOSIVE_YIELD, DEFAULT_HEALTH};
use crate::pool::MAX_OBJECTS;
use crate::targeting::{TargetingPolicy, DEFAULT_ALLY_SPARE_CHANCE};

/// Default master seed.
pub const DEFAULT_SEED: u64 = 654_321;

/// Rounds whose detonation picks are reported at `info` level.
pub const DEFAULT_REPORT_ROUNDS: u64 = 4;

/// How spawned mines get their ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdMode {
    /// Uniform draw modulo `mines_per_team * 10`. Collisions are expected and
    /// re-spawn the earlier mine.
    #[default]
    Random,
    /// Hash of `mine index * (team index + 1)` folded to 32 bits. Equal
    /// products collide.
    Hashed,
}

/// Distributions used when a mine is spawned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnProfile {
    /// Coordinates are drawn uniformly from `[-extent, extent)` per axis.
    pub position_extent: f32,
    /// Destructive radius is drawn uniformly from this range.
    pub radius_range: Range<f32>,
    /// A mine is active iff a uniform draw is below this.
    pub active_chance: f32,
    /// A mine is invulnerable iff a uniform draw is below this.
    pub invulnerable_chance: f32,
    /// Starting health.
    pub health: f32,
    /// Explosive yield.
    pub explosive_yield: f32,
}

impl Default for SpawnProfile {
    fn default() -> Self {
        Self {
            position_extent: 1000.0,
            radius_range: 100.0..1000.0,
            active_chance: 0.95,
            invulnerable_chance: 0.1,
            health: DEFAULT_HEALTH,
            explosive_yield: DEFAULT_EXPLOSIVE_YIELD,
        }
    }
}

/// Full configuration of a minefield run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinefieldConfig {
    /// Master seed for spawning and targeting draws.
    pub seed: u64,
    /// Number of targeting workers.
    pub worker_count: usize,
    /// Number of teams.
    pub team_count: usize,
    /// Mines spawned per team. Also fixes the absolute index layout.
    pub mines_per_team: usize,
    /// Id derivation for spawned mines.
    pub id_mode: IdMode,
    /// Maximum number of live mines.
    pub capacity: usize,
    /// Chance that meeting an ally ends a target scan.
    pub ally_spare_chance: f32,
    /// Rounds `1..=report_rounds` log their picks at `info`.
    pub report_rounds: u64,
    /// Spawn distributions.
    pub spawn: SpawnProfile,
}

impl Default for MinefieldConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            worker_count: 12,
            team_count: 5,
            mines_per_team: 1500,
            id_mode: IdMode::Random,
            capacity: MAX_OBJECTS,
            ally_spare_chance: DEFAULT_ALLY_SPARE_CHANCE,
            report_rounds: DEFAULT_REPORT_ROUNDS,
            spawn: SpawnProfile::default(),
        }
    }
}

impl MinefieldConfig {
    /// Returns the targeting policy described by this config.
    #[must_use]
    pub fn targeting_policy(&self) -> TargetingPolicy {
        TargetingPolicy::new(self.ally_spare_chance)
    }

    /// Checks that the config describes a runnable minefield.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.team_count == 0 {
            return Err(ConfigError::NoTeams);
        }
        if i32::try_from(self.team_count).is_err() {
            return Err(ConfigError::TooManyTeams(self.team_count));
        }
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        probability("ally_spare_chance", self.ally_spare_chance)?;
        probability("active_chance", self.spawn.active_chance)?;
        probability("invulnerable_chance", self.spawn.invulnerable_chance)?;

        let extent = self.spawn.position_extent;
        if !(extent.is_finite() && extent > 0.0) {
            return Err(ConfigError::InvalidExtent(extent));
        }

        let Range { start, end } = self.spawn.radius_range;
        if !(start.is_finite() && end.is_finite() && start >= 0.0 && start < end) {
            return Err(ConfigError::InvalidRadiusRange { start, end });
        }

        Ok(())
    }
}

fn probability(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ProbabilityOutOfRange { name, value })
    }
}

/// Reasons a [`MinefieldConfig`] is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// `worker_count` is zero.
    #[error("worker count must be at least 1")]
    NoWorkers,
    /// `team_count` is zero.
    #[error("team count must be at least 1")]
    NoTeams,
    /// `team_count` does not fit a pool id.
    #[error("team count {0} exceeds the pool id range")]
    TooManyTeams(usize),
    /// `capacity` is zero.
    #[error("capacity must be at least 1")]
    ZeroCapacity,
    /// A probability lies outside `[0, 1]`.
    #[error("{name} must be within [0, 1], got {value}")]
    ProbabilityOutOfRange {
        /// Offending field.
        name: &'static str,
        /// Offending value.
        value: f32,
    },
    /// The spawn extent is not a positive finite number.
    #[error("position extent must be positive and finite, got {0}")]
    InvalidExtent(f32),
    /// The radius range is empty, negative or not finite.
    #[error("radius range {start}..{end} is empty or invalid")]
    InvalidRadiusRange {
        /// Range start.
        start: f32,
        /// Range end.
        end: f32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    mod default_tests {
        use super::*;

        #[test]
        fn defaults_match_reference_run() {
            let config = MinefieldConfig::default();
            assert_eq!(config.seed, 654_321);
            assert_eq!(config.worker_count, 12);
            assert_eq!(config.team_count, 5);
            assert_eq!(config.mines_per_team, 1500);
            assert_eq!(config.id_mode, IdMode::Random);
            assert_eq!(config.capacity, 1_000_000);
            assert_eq!(config.report_rounds, 4);
            assert_eq!(config.spawn.radius_range, 100.0..1000.0);
        }

        #[test]
        fn defaults_validate() {
            assert!(MinefieldConfig::default().validate().is_ok());
        }

        #[test]
        fn policy_carries_spare_chance() {
            let config = MinefieldConfig {
                ally_spare_chance: 0.5,
                ..MinefieldConfig::default()
            };
            assert_eq!(config.targeting_policy(), TargetingPolicy::new(0.5));
        }
    }

    mod validation_tests {
        use super::*;

        fn with(f: impl FnOnce(&mut MinefieldConfig)) -> Result<(), ConfigError> {
            let mut config = MinefieldConfig::default();
            f(&mut config);
            config.validate()
        }

        #[test]
        fn rejects_zero_workers() {
            assert_eq!(with(|c| c.worker_count = 0), Err(ConfigError::NoWorkers));
        }

        #[test]
        fn rejects_zero_teams() {
            assert_eq!(with(|c| c.team_count = 0), Err(ConfigError::NoTeams));
        }

        #[test]
        fn rejects_zero_capacity() {
            assert_eq!(with(|c| c.capacity = 0), Err(ConfigError::ZeroCapacity));
        }

        #[test]
        fn rejects_probability_above_one() {
            let err = with(|c| c.spawn.active_chance = 1.5).unwrap_err();
            assert!(matches!(
                err,
                ConfigError::ProbabilityOutOfRange { name: "active_chance", .. }
            ));
        }

        #[test]
        fn rejects_nan_probability() {
            assert!(with(|c| c.ally_spare_chance = f32::NAN).is_err());
        }

        #[test]
        fn rejects_inverted_radius_range() {
            let err = with(|c| c.spawn.radius_range = 500.0..100.0).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidRadiusRange { .. }));
        }

        #[test]
        fn rejects_empty_extent() {
            assert_eq!(
                with(|c| c.spawn.position_extent = 0.0),
                Err(ConfigError::InvalidExtent(0.0))
            );
        }

        #[test]
        fn zero_mines_per_team_is_allowed() {
            assert!(with(|c| c.mines_per_team = 0).is_ok());
        }

        #[test]
        fn error_messages_name_the_field() {
            let err = with(|c| c.spawn.invulnerable_chance = -0.1).unwrap_err();
            assert!(err.to_string().contains("invulnerable_chance"));
        }
    }

    mod serde_tests {
        use super::*;

        #[test]
        fn partial_json_fills_defaults() {
            let json = r#"{ "seed": 7, "id_mode": "hashed", "spawn": { "health": 250.0 } }"#;
            let config: MinefieldConfig = serde_json::from_str(json).unwrap();

            assert_eq!(config.seed, 7);
            assert_eq!(config.id_mode, IdMode::Hashed);
            assert!((config.spawn.health - 250.0).abs() < f32::EPSILON);
            assert!((config.spawn.explosive_yield - 500.0).abs() < f32::EPSILON);
            assert_eq!(config.team_count, 5);
        }

        #[test]
        fn roundtrip() {
            let config = MinefieldConfig {
                worker_count: 3,
                id_mode: IdMode::Hashed,
                ..MinefieldConfig::default()
            };
            let json = serde_json::to_string(&config).unwrap();
            let back: MinefieldConfig = serde_json::from_str(&json).unwrap();
            assert_eq!(config, back);
        }
    }
}
