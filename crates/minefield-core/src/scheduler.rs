//! Round scheduler with a parallel targeting phase and a serial detonation
//! phase.
//!
//! Every round walks the same phases:
//!
//! 1. **TARGETING**: each worker of a fixed pool repeatedly claims the next
//!    absolute index from a shared cursor and, for an active mine at that
//!    index, scans for targets. Workers only read the store; results are
//!    collected per worker.
//! 2. **BARRIER**: the coordinator waits until every worker has started and
//!    finished, then writes the collected target lists into the store.
//! 3. **DETONATION**: teams are visited in ascending order. Each team's mine
//!    with the most cached targets detonates if that count is positive.
//!
//! A round in which no team detonates ends the battle ([`RoundPhase::Terminal`]).
//!
//! # Determinism
//!
//! A mine's scan draws from its own random stream seeded by
//! `(seed, round, key)`, and the detonation phase is single-threaded. The
//! outcome of a run therefore depends on the seed and the configuration, not
//! on the number of workers or how they interleave.

use std::sync::{Mutex, PoisonError};

use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;
use tracing::{debug, info, trace};

use crate::config::{ConfigError, MinefieldConfig};
use crate::error::MinefieldError;
use crate::explosion::ExplosionEngine;
use crate::mine::{MineHandle, MineId, PoolId};
use crate::pool::{ObjectPool, PoolStore};
use crate::targeting::{scan_rng, scan_targets, TargetingPolicy};

// =============================================================================
// Round context
// =============================================================================

/// Phase of the round state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RoundPhase {
    /// Between rounds.
    #[default]
    Idle,
    /// Workers are scanning.
    Targeting,
    /// Waiting for workers and publishing their results.
    Barrier,
    /// Teams are detonating their picks.
    Detonation,
    /// The last round found no targets; the battle is over.
    Terminal,
}

#[derive(Debug, Default)]
struct CursorState {
    next_index: usize,
    active_workers: usize,
    started_workers: usize,
}

/// Shared work cursor for one targeting pass.
///
/// Hands out absolute indices `0..total` exactly once each and tracks how
/// many workers have started and are still running.
#[derive(Debug)]
pub struct RoundCursor {
    state: Mutex<CursorState>,
    total: usize,
}

impl RoundCursor {
    /// Creates a cursor over `total` indices.
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            state: Mutex::new(CursorState::default()),
            total,
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut CursorState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Registers a worker as running.
    pub fn worker_started(&self) {
        self.with_state(|state| {
            state.started_workers += 1;
            state.active_workers += 1;
        });
    }

    /// Registers a worker as done.
    pub fn worker_finished(&self) {
        self.with_state(|state| state.active_workers = state.active_workers.saturating_sub(1));
    }

    /// Claims the next unclaimed index, or `None` once all are handed out.
    pub fn claim(&self) -> Option<usize> {
        self.with_state(|state| {
            let index = state.next_index;
            state.next_index += 1;
            (index < self.total).then_some(index)
        })
    }

    /// Returns `true` once at least one worker has run and none is running.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.with_state(|state| state.active_workers == 0 && state.started_workers > 0)
    }

    /// Returns the number of workers that have started.
    #[must_use]
    pub fn started_workers(&self) -> usize {
        self.with_state(|state| state.started_workers)
    }
}

/// Per-round inputs taken from the configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundSettings {
    /// Master seed for scan streams.
    pub seed: u64,
    /// Teams `0..team_count` take part in the detonation phase.
    pub team_count: usize,
    /// Scan policy.
    pub policy: TargetingPolicy,
    /// Rounds `1..=report_rounds` log picks at `info`.
    pub report_rounds: u64,
}

impl From<&MinefieldConfig> for RoundSettings {
    fn from(config: &MinefieldConfig) -> Self {
        Self {
            seed: config.seed,
            team_count: config.team_count,
            policy: config.targeting_policy(),
            report_rounds: config.report_rounds,
        }
    }
}

// =============================================================================
// Reports
// =============================================================================

/// One team's detonation in a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamPick {
    /// Detonating team.
    pub team: PoolId,
    /// Mine that detonated.
    pub mine: MineId,
    /// Its cached target count at pick time.
    pub target_count: usize,
    /// Mines removed by the resulting chain.
    pub destroyed: usize,
}

/// Summary of one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundReport {
    /// Round number, starting at 1.
    pub round: u64,
    /// Workers that took part in targeting.
    pub workers: usize,
    /// Indices handed out by the cursor.
    pub claimed: usize,
    /// Active mines whose target lists were rebuilt.
    pub scanned: usize,
    /// Detonations in team order.
    pub picks: Vec<TeamPick>,
}

impl RoundReport {
    /// Returns `true` if any team detonated this round.
    #[must_use]
    pub fn found_targets(&self) -> bool {
        !self.picks.is_empty()
    }

    /// Returns the total number of mines removed this round.
    #[must_use]
    pub fn destroyed(&self) -> usize {
        self.picks.iter().map(|pick| pick.destroyed).sum()
    }
}

#[derive(Debug, Default)]
struct WorkerOutput {
    claimed: usize,
    scans: Vec<(MineHandle, Vec<MineHandle>)>,
}

// =============================================================================
// RoundScheduler
// =============================================================================

/// Drives rounds over a [`PoolStore`].
///
/// Owns a dedicated worker pool that is reused for every targeting pass.
#[derive(Debug)]
pub struct RoundScheduler {
    workers: ThreadPool,
    worker_count: usize,
    engine: ExplosionEngine,
    phase: RoundPhase,
    round: u64,
}

impl RoundScheduler {
    /// Starts a scheduler with `worker_count` targeting workers.
    ///
    /// # Errors
    ///
    /// Fails if `worker_count` is zero or the worker threads cannot be
    /// spawned.
    pub fn new(worker_count: usize) -> Result<Self, MinefieldError> {
        if worker_count == 0 {
            return Err(ConfigError::NoWorkers.into());
        }
        let workers = ThreadPoolBuilder::new()
            .num_threads(worker_count)
            .thread_name(|index| format!("minefield-worker-{index}"))
            .build()?;

        Ok(Self {
            workers,
            worker_count,
            engine: ExplosionEngine::new(),
            phase: RoundPhase::Idle,
            round: 0,
        })
    }

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Returns the number of rounds run so far.
    #[must_use]
    pub const fn round(&self) -> u64 {
        self.round
    }

    /// Returns the number of targeting workers.
    #[must_use]
    pub const fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Returns the explosion engine used for detonations.
    #[must_use]
    pub const fn engine(&self) -> &ExplosionEngine {
        &self.engine
    }

    /// Runs one full round.
    pub fn run_round(&mut self, store: &mut PoolStore, settings: &RoundSettings) -> RoundReport {
        self.round += 1;
        let round = self.round;

        self.enter(RoundPhase::Targeting);
        let (outputs, workers) = self.targeting_pass(store, settings, round);

        self.enter(RoundPhase::Barrier);
        let mut claimed = 0;
        let mut scanned = 0;
        for output in outputs {
            claimed += output.claimed;
            for (handle, targets) in output.scans {
                if store.set_targets(handle, targets) {
                    scanned += 1;
                }
            }
        }

        self.enter(RoundPhase::Detonation);
        let picks = self.detonation_phase(store, settings, round);

        let report = RoundReport {
            round,
            workers,
            claimed,
            scanned,
            picks,
        };
        self.enter(if report.found_targets() {
            RoundPhase::Idle
        } else {
            RoundPhase::Terminal
        });
        report
    }

    fn enter(&mut self, phase: RoundPhase) {
        trace!(round = self.round, from = ?self.phase, to = ?phase, "phase transition");
        self.phase = phase;
    }

    /// Scans every claimed index on the worker pool and returns per-worker
    /// results together with the number of workers that ran.
    fn targeting_pass(
        &self,
        store: &PoolStore,
        settings: &RoundSettings,
        round: u64,
    ) -> (Vec<WorkerOutput>, usize) {
        let cursor = RoundCursor::new(store.count_total());

        let outputs = self.workers.broadcast(|ctx| {
            cursor.worker_started();
            let output = scan_claimed(&cursor, store, settings, round);
            cursor.worker_finished();

            trace!(
                round,
                worker = ctx.index(),
                claimed = output.claimed,
                scanned = output.scans.len(),
                "targeting worker done"
            );
            output
        });

        debug_assert!(cursor.is_drained(), "targeting barrier passed with workers running");
        (outputs, cursor.started_workers())
    }

    fn detonation_phase(
        &self,
        store: &mut PoolStore,
        settings: &RoundSettings,
        round: u64,
    ) -> Vec<TeamPick> {
        let mut picks = Vec::new();

        for team_index in 0..settings.team_count {
            let Ok(raw_team) = i32::try_from(team_index) else {
                break;
            };
            let team = PoolId::new(raw_team);

            let Some((handle, mine, target_count)) = store
                .mine_with_most_targets(team)
                .map(|m| (m.handle(), m.id(), m.target_count()))
            else {
                continue;
            };
            if target_count == 0 {
                continue;
            }

            if round <= settings.report_rounds {
                info!(round, team = raw_team, mine = mine.as_u32(), targets = target_count, "detonation pick");
            } else {
                debug!(round, team = raw_team, mine = mine.as_u32(), targets = target_count, "detonation pick");
            }

            let destroyed = self
                .engine
                .detonate(store, handle)
                .map_or(0, |report| report.destroyed_count());

            picks.push(TeamPick {
                team,
                mine,
                target_count,
                destroyed,
            });
        }

        picks
    }
}

/// Worker loop: claim indices until the cursor runs dry.
fn scan_claimed(
    cursor: &RoundCursor,
    store: &PoolStore,
    settings: &RoundSettings,
    round: u64,
) -> WorkerOutput {
    let mut output = WorkerOutput::default();

    while let Some(index) = cursor.claim() {
        output.claimed += 1;
        let Some(mine) = store.get_by_index(index) else {
            continue;
        };
        let mut rng = scan_rng(settings.seed, round, mine.key());
        if let Some(targets) = scan_targets(mine, store, &settings.policy, &mut rng) {
            output.scans.push((mine.handle(), targets));
        }
    }

    output
}
