//! Detonation and chain reactions.
//!
//! A detonating mine damages every mine on its cached target list with
//! inverse-square falloff. A target driven to zero health detonates in turn,
//! depth-first, before the first blast moves on to its next target. When
//! a mine's blast is done it drops its own remaining health to zero, leaves
//! the store and is invalidated.
//!
//! # Re-entrancy
//!
//! A chain can loop back onto a mine that is still mid-blast. That mine is
//! already flagged `SELF_DESTROYED` (the flag is set before any target is
//! hit), so it does not blast a second time: a lethal hit on it removes it
//! from the store on the spot, and its own blast finishes from a snapshot of
//! its position, radius, yield and target list.
//!
//! Target lists hold [`MineHandle`]s. A handle whose mine has already been
//! removed simply does not resolve and is skipped.
//!
//! The chain runs on an explicit stack rather than by recursion, so its depth
//! is bounded by the number of mines, not by the thread's stack size.

use serde::Serialize;
use tracing::trace;

use crate::math::{falloff_damage, sqr_distance, Vec3};
use crate::mine::{Mine, MineHandle, MineId, PoolId};
use crate::pool::{ObjectPool, PoolStore};

// =============================================================================
// Reports
// =============================================================================

/// What a single detonation call did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetonationReport {
    /// Mine whose detonation started the chain.
    pub origin: MineId,
    /// Team of the origin mine.
    pub team: PoolId,
    /// Damage applications that reached a live mine.
    pub hits: usize,
    /// Every mine removed by the chain, the origin included, in removal order.
    pub destroyed: Vec<Mine>,
}

impl DetonationReport {
    fn new(origin: &Mine) -> Self {
        Self {
            origin: origin.id(),
            team: origin.team(),
            hits: 0,
            destroyed: Vec::new(),
        }
    }

    /// Returns the number of mines removed.
    #[must_use]
    pub fn destroyed_count(&self) -> usize {
        self.destroyed.len()
    }

    /// Returns the number of removed mines that belonged to `team`.
    #[must_use]
    pub fn destroyed_in(&self, team: PoolId) -> usize {
        self.destroyed.iter().filter(|mine| mine.team() == team).count()
    }
}

/// Result of [`ExplosionEngine::apply_damage`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DamageOutcome {
    /// The mine is still standing with this much health left.
    Survived {
        /// Health after the damage.
        health: f32,
    },
    /// The damage was lethal and the mine is gone.
    Destroyed(DetonationReport),
}

// =============================================================================
// Blast frames
// =============================================================================

/// Snapshot of a mine mid-blast.
#[derive(Debug)]
struct Frame {
    handle: MineHandle,
    origin: Vec3,
    radius_sq: f32,
    explosive_yield: f32,
    targets: Vec<MineHandle>,
    next: usize,
}

impl Frame {
    /// Flags `mine` as self-destroyed and captures what its blast needs.
    fn open(mine: &mut Mine) -> Self {
        mine.mark_self_destroyed();
        Self {
            handle: mine.handle(),
            origin: mine.position(),
            radius_sq: mine.radius_sq(),
            explosive_yield: mine.explosive_yield(),
            targets: mine.take_targets(),
            next: 0,
        }
    }

    fn next_hit(&mut self) -> Option<(MineHandle, Vec3, f32, f32)> {
        let target = *self.targets.get(self.next)?;
        self.next += 1;
        Some((target, self.origin, self.radius_sq, self.explosive_yield))
    }
}

// =============================================================================
// ExplosionEngine
// =============================================================================

/// Applies detonations and damage to a [`PoolStore`].
///
/// # Example
///
/// ```
/// use minefield_core::explosion::ExplosionEngine;
/// use minefield_core::mine::{Mine, MineId, PoolId};
/// use minefield_core::pool::{ObjectPool, PoolStore};
///
/// let mut store = PoolStore::new();
/// store.init(1, 1);
/// let handle = store
///     .add_object(Mine::new(MineId::new(1), PoolId::new(0)).with_active(true))
///     .unwrap();
///
/// let report = ExplosionEngine::new().detonate(&mut store, handle).unwrap();
/// assert_eq!(report.destroyed_count(), 1);
/// assert!(store.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExplosionEngine;

impl ExplosionEngine {
    /// Creates a new engine.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Detonates the mine behind `handle`.
    ///
    /// Returns `None` and does nothing if the handle no longer resolves or the
    /// mine has already detonated.
    pub fn detonate(&self, store: &mut PoolStore, handle: MineHandle) -> Option<DetonationReport> {
        let mine = store.get_mut(handle)?;
        if mine.is_destroyed() {
            return None;
        }
        let report = DetonationReport::new(mine);
        let root = Frame::open(mine);
        Some(Self::run_chain(store, root, report))
    }

    /// Subtracts `amount` from a mine's health.
    ///
    /// A lethal hit detonates the mine, or just removes it if it has already
    /// detonated. `amount` is not validated; a negative value heals. Returns
    /// `None` if the handle no longer resolves.
    pub fn apply_damage(
        &self,
        store: &mut PoolStore,
        handle: MineHandle,
        amount: f32,
    ) -> Option<DamageOutcome> {
        let mine = store.get_mut(handle)?;
        if !mine.subtract_health(amount) {
            return Some(DamageOutcome::Survived { health: mine.health() });
        }

        let mut report = DetonationReport::new(mine);
        if mine.is_destroyed() {
            Self::finish(store, handle, &mut report);
        } else {
            let root = Frame::open(mine);
            report = Self::run_chain(store, root, report);
        }
        Some(DamageOutcome::Destroyed(report))
    }

    /// Runs a full chain starting from an already opened frame.
    fn run_chain(store: &mut PoolStore, root: Frame, mut report: DetonationReport) -> DetonationReport {
        let mut stack = vec![root];

        trace!(origin = report.origin.as_u32(), team = report.team.as_i32(), "detonation");

        while let Some(frame) = stack.last_mut() {
            let Some((target, origin, radius_sq, explosive_yield)) = frame.next_hit() else {
                if let Some(done) = stack.pop() {
                    Self::finish(store, done.handle, &mut report);
                }
                continue;
            };

            let Some(victim) = store.get_mut(target) else {
                continue;
            };
            report.hits += 1;

            let damage = falloff_damage(sqr_distance(victim.position(), origin), radius_sq, explosive_yield);
            if !victim.subtract_health(damage) {
                continue;
            }

            if victim.is_destroyed() {
                Self::finish(store, target, &mut report);
            } else {
                trace!(id = victim.id().as_u32(), depth = stack.len(), "chain detonation");
                stack.push(Frame::open(victim));
            }
        }

        report
    }

    /// Zeroes a finished mine's health, removes it and invalidates it.
    fn finish(store: &mut PoolStore, handle: MineHandle, report: &mut DetonationReport) {
        let Some(mine) = store.get_mut(handle) else {
            return;
        };
        let remaining = mine.health();
        if remaining > 0.0 {
            mine.subtract_health(remaining);
        }

        if let Some(mut removed) = store.remove(handle) {
            removed.invalidate();
            report.destroyed.push(removed);
        }
    }
}
