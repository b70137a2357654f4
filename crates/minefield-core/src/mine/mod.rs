//! Mine model.
//!
//! This module provides the per-object state of the minefield:
//! - [`MineId`]: externally supplied identifier
//! - [`PoolId`]: the team a mine belongs to (its pool in the store)
//! - [`MineKey`]: store-assigned, never-reused slot key
//! - [`MineHandle`]: stable cross-reference resolved through the store
//! - [`Mine`]: the entity itself
//!
//! # Cross-references
//!
//! Mines never hold references to each other. A mine's target list is a
//! snapshot of [`MineHandle`]s taken during the targeting pass; every use of a
//! handle goes back through the [`PoolStore`](crate::pool::PoolStore), which
//! returns `None` once the referenced mine has been removed.
//!
//! # Example
//!
//! ```
//! use minefield_core::mine::{Mine, MineId, PoolId};
//!
//! let mine = Mine::new(MineId::new(7), PoolId::new(2));
//!
//! assert_eq!(mine.id().as_u32(), 7);
//! assert_eq!(mine.team(), PoolId::new(2));
//! assert!((mine.health() - 100.0).abs() < f32::EPSILON);
//! assert!(!mine.is_active());
//! ```

pub mod status;

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

pub use status::MineStatus;

/// Health every mine spawns with.
pub const DEFAULT_HEALTH: f32 = 100.0;

/// Peak damage at zero distance.
pub const DEFAULT_EXPLOSIVE_YIELD: f32 = 500.0;

/// Externally supplied mine identifier.
///
/// Not guaranteed unique across pools; the spawner removes an existing mine
/// with the same id before inserting a new one.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MineId(u32);

impl MineId {
    /// Creates a new `MineId` from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for MineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MineId({})", self.0)
    }
}

impl fmt::Display for MineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for MineId {
    fn from(id: u32) -> Self {
        Self::new(id)
    }
}

/// Pool (team) identifier.
///
/// Pools are iterated in ascending `PoolId` order, which defines the
/// absolute index order of the store.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PoolId(i32);

impl PoolId {
    /// Creates a new `PoolId`.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Debug for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PoolId({})", self.0)
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for PoolId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

/// Store-assigned slot key.
///
/// Keys increase monotonically with every insertion and are never reused, so
/// each pool's sequence is sorted by key. A mine that is re-inserted (moved to
/// another pool) receives a fresh key.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MineKey(u64);

impl MineKey {
    /// Key carried by a mine that has not been inserted into a store.
    pub const DETACHED: Self = Self(u64::MAX);

    /// Creates a key from a raw value.
    #[must_use]
    pub const fn new(key: u64) -> Self {
        Self(key)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// Stable reference to a stored mine.
///
/// Resolving a handle through the store is a binary search inside the
/// owning pool. A handle to a removed mine resolves to `None`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MineHandle {
    /// Pool the mine lives in.
    pub pool: PoolId,
    /// Slot key inside that pool.
    pub key: MineKey,
}

impl MineHandle {
    /// Creates a handle.
    #[must_use]
    pub const fn new(pool: PoolId, key: MineKey) -> Self {
        Self { pool, key }
    }
}

/// A mine in the minefield.
///
/// # Invariants
///
/// - `destructive_radius` and `explosive_yield` are fixed once the mine is
///   stored; there are builder methods but no setters for them.
/// - `INVALIDATED` is only ever set after `SELF_DESTROYED`.
/// - `targets` is rebuilt from scratch by every targeting pass that reaches
///   the mine and never owns its referents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mine {
    key: MineKey,
    id: MineId,
    pool_id: PoolId,
    position: Vec3,
    health: f32,
    destructive_radius: f32,
    explosive_yield: f32,
    status: MineStatus,
    #[serde(skip)]
    targets: Vec<MineHandle>,
}

impl Mine {
    /// Creates a detached, inactive mine at the origin with default health
    /// and yield and a zero destructive radius.
    #[must_use]
    pub fn new(id: MineId, pool_id: PoolId) -> Self {
        Self {
            key: MineKey::DETACHED,
            id,
            pool_id,
            position: Vec3::ZERO,
            health: DEFAULT_HEALTH,
            destructive_radius: 0.0,
            explosive_yield: DEFAULT_EXPLOSIVE_YIELD,
            status: MineStatus::empty(),
            targets: Vec::new(),
        }
    }

    /// Sets the position.
    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Sets the destructive radius.
    #[must_use]
    pub fn with_destructive_radius(mut self, radius: f32) -> Self {
        self.destructive_radius = radius;
        self
    }

    /// Sets the explosive yield.
    #[must_use]
    pub fn with_explosive_yield(mut self, explosive_yield: f32) -> Self {
        self.explosive_yield = explosive_yield;
        self
    }

    /// Sets the starting health.
    #[must_use]
    pub fn with_health(mut self, health: f32) -> Self {
        self.health = health;
        self
    }

    /// Sets the active flag.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.set_active(active);
        self
    }

    /// Sets the invulnerable flag.
    #[must_use]
    pub fn with_invulnerable(mut self, invulnerable: bool) -> Self {
        self.set_invulnerable(invulnerable);
        self
    }

    /// Returns the store-assigned key, or [`MineKey::DETACHED`].
    #[must_use]
    pub const fn key(&self) -> MineKey {
        self.key
    }

    /// Returns a handle to this mine as currently stored.
    #[must_use]
    pub const fn handle(&self) -> MineHandle {
        MineHandle::new(self.pool_id, self.key)
    }

    /// Returns the external identifier.
    #[must_use]
    pub const fn id(&self) -> MineId {
        self.id
    }

    /// Returns the pool this mine belongs to.
    #[must_use]
    pub const fn pool_id(&self) -> PoolId {
        self.pool_id
    }

    /// Team of this mine. Teams and pools are the same thing.
    #[must_use]
    pub const fn team(&self) -> PoolId {
        self.pool_id
    }

    /// Returns the position.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Returns the current health.
    #[must_use]
    pub const fn health(&self) -> f32 {
        self.health
    }

    /// Returns the destructive radius.
    #[must_use]
    pub const fn destructive_radius(&self) -> f32 {
        self.destructive_radius
    }

    /// Returns the squared destructive radius used in every range check.
    #[must_use]
    pub fn radius_sq(&self) -> f32 {
        self.destructive_radius * self.destructive_radius
    }

    /// Returns the explosive yield.
    #[must_use]
    pub const fn explosive_yield(&self) -> f32 {
        self.explosive_yield
    }

    /// Returns the status flags.
    #[must_use]
    pub const fn status(&self) -> MineStatus {
        self.status
    }

    /// Returns `true` if the mine scans for targets.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.status.contains(MineStatus::ACTIVE)
    }

    /// Returns `true` if the mine blocks other mines' scans.
    #[must_use]
    pub const fn is_invulnerable(&self) -> bool {
        self.status.contains(MineStatus::INVULNERABLE)
    }

    /// Returns `true` once the mine has detonated.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.status.contains(MineStatus::SELF_DESTROYED)
    }

    /// Returns `true` once the mine has been removed from its store.
    #[must_use]
    pub const fn is_invalid(&self) -> bool {
        self.status.contains(MineStatus::INVALIDATED)
    }

    /// Sets or clears the active flag.
    pub fn set_active(&mut self, active: bool) {
        self.status.set(MineStatus::ACTIVE, active);
    }

    /// Sets or clears the invulnerable flag.
    pub fn set_invulnerable(&mut self, invulnerable: bool) {
        self.status.set(MineStatus::INVULNERABLE, invulnerable);
    }

    /// Returns the targets cached by the last targeting pass.
    #[must_use]
    pub fn targets(&self) -> &[MineHandle] {
        &self.targets
    }

    /// Returns the number of cached targets.
    #[must_use]
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    pub(crate) fn attach(&mut self, key: MineKey, pool_id: PoolId) {
        self.key = key;
        self.pool_id = pool_id;
    }

    pub(crate) fn set_targets(&mut self, targets: Vec<MineHandle>) {
        self.targets = targets;
    }

    pub(crate) fn take_targets(&mut self) -> Vec<MineHandle> {
        std::mem::take(&mut self.targets)
    }

    /// Subtracts `amount` from health. Returns `true` if health is now `<= 0`.
    pub(crate) fn subtract_health(&mut self, amount: f32) -> bool {
        self.health -= amount;
        self.health <= 0.0
    }

    pub(crate) fn mark_self_destroyed(&mut self) {
        self.status.insert(MineStatus::SELF_DESTROYED);
    }

    pub(crate) fn invalidate(&mut self) {
        debug_assert!(self.is_destroyed(), "mine {} invalidated before detonating", self.id);
        self.status.insert(MineStatus::INVALIDATED);
        self.key = MineKey::DETACHED;
        self.targets.clear();
    }
}
