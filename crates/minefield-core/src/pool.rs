//! Pool store owning every mine in the minefield.
//!
//! Mines are grouped by [`PoolId`] (team) into ordered sequences. Within a
//! pool, insertion order is spawn order. Pools are iterated in ascending id
//! order, which defines the *absolute index* of a mine: the store behaves as
//! if all pools were concatenated.
//!
//! # Absolute index mapping
//!
//! [`PoolStore::get_by_index`] maps an absolute index to `(pool, slot)` with
//! a fixed partition that assumes every pool holds exactly
//! `objects_per_pool` mines:
//!
//! ```text
//! pool = index / objects_per_pool
//! slot = index - pool * objects_per_pool
//! ```
//!
//! The mapping is **not** derived from actual pool occupancy. Once pools
//! diverge in size through removals, some indices resolve to a different
//! mine than a concatenated walk would give, or to nothing at all. Callers
//! rely on this exact behaviour; do not replace it with an occupancy walk.
//!
//! # Capacity
//!
//! The store tracks the total number of live mines and refuses insertions
//! past its capacity ([`MAX_OBJECTS`] by default). A refused insertion
//! returns `None`; it is not an error.
//!
//! # Example
//!
//! ```
//! use minefield_core::mine::{MineId, PoolId};
//! use minefield_core::pool::{ObjectPool, PoolStore};
//!
//! let mut store = PoolStore::new();
//! store.init(2, 1);
//!
//! let a = store.add(MineId::new(10), PoolId::new(0)).unwrap();
//! store.add(MineId::new(11), PoolId::new(1)).unwrap();
//!
//! assert_eq!(store.count_total(), 2);
//! assert_eq!(store.get(a).unwrap().id(), MineId::new(10));
//! assert_eq!(store.get_by_index(1).unwrap().id(), MineId::new(11));
//! ```

use std::collections::BTreeMap;

use tracing::debug;

use crate::mine::{Mine, MineHandle, MineId, MineKey, PoolId};

/// Default cap on the number of live mines across all pools.
pub const MAX_OBJECTS: usize = 1_000_000;

// =============================================================================
// ObjectPool
// =============================================================================

/// Lookup and lifecycle operations over a pooled object store.
///
/// Generic over the stored object `T` and the key types that name it: an
/// object id, the pool it belongs to and a stable handle to one stored
/// instance. "Not found" and "at capacity" are ordinary `None` results.
pub trait ObjectPool<T> {
    /// Identifier carried by each object.
    type Id;
    /// Identifier of a pool.
    type Pool;
    /// Reference to one stored object that survives unrelated removals.
    type Handle;

    /// Constructs a new object with `id` at the end of `pool`.
    fn add(&mut self, id: Self::Id, pool: Self::Pool) -> Option<Self::Handle>;

    /// Inserts an existing object at the end of its own pool.
    fn add_object(&mut self, object: T) -> Option<Self::Handle>;

    /// Removes the object referenced by `handle`.
    fn remove(&mut self, handle: Self::Handle) -> Option<T>;

    /// Removes the first object with `id`, scanning pools in order.
    fn remove_by_id(&mut self, id: Self::Id) -> Option<T>;

    /// Removes the object at absolute `index`.
    fn remove_by_index(&mut self, index: usize) -> Option<T>;

    /// Looks up an object by id.
    fn get_by_id(&self, id: Self::Id) -> Option<&T>;

    /// Looks up an object by absolute index.
    fn get_by_index(&self, index: usize) -> Option<&T>;

    /// Number of live objects across all pools.
    fn count_total(&self) -> usize;

    /// Number of live objects in `pool`; zero for unknown pools.
    fn count_in_pool(&self, pool: Self::Pool) -> usize;
}

// =============================================================================
// PoolStore
// =============================================================================

/// Team-partitioned mine storage.
///
/// Every pool's sequence is sorted by [`MineKey`] because keys are handed out
/// monotonically on insertion and erasure preserves order. Handle resolution
/// is therefore a binary search inside the owning pool.
#[derive(Debug, Clone)]
pub struct PoolStore {
    /// Mines per pool, iterated in ascending pool order.
    pools: BTreeMap<PoolId, Vec<Mine>>,
    /// Live mines across all pools.
    object_count: usize,
    /// Configured pool size used by the absolute index mapping.
    objects_per_pool: usize,
    /// Number of pools reserved by [`PoolStore::init`].
    pool_count: usize,
    /// Maximum number of live mines.
    capacity: usize,
    /// Monotonically increasing key counter.
    next_key: u64,
}

impl PoolStore {
    /// Creates an empty store with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity_limit(MAX_OBJECTS)
    }

    /// Creates an empty store that holds at most `capacity` live mines.
    #[must_use]
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            pools: BTreeMap::new(),
            object_count: 0,
            objects_per_pool: 0,
            pool_count: 0,
            capacity,
            next_key: 0,
        }
    }

    /// Records the pool layout and reserves storage for pools `0..pools`.
    pub fn init(&mut self, pools: usize, objects_per_pool: usize) {
        self.pool_count = pools;
        self.objects_per_pool = objects_per_pool;

        for pool in 0..pools {
            let Ok(raw) = i32::try_from(pool) else {
                break;
            };
            self.pools
                .entry(PoolId::new(raw))
                .or_default()
                .reserve(objects_per_pool);
        }
    }

    /// Drops every mine and resets the live count. Layout and capacity stay.
    pub fn clear(&mut self) {
        self.pools.clear();
        self.object_count = 0;
    }

    /// Returns the capacity limit.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` if no further mine can be inserted.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.object_count >= self.capacity
    }

    /// Returns `true` if the store holds no mines.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.object_count == 0
    }

    /// Configured pool size used by the absolute index mapping.
    #[must_use]
    pub const fn objects_per_pool(&self) -> usize {
        self.objects_per_pool
    }

    /// Number of pools reserved by [`PoolStore::init`].
    #[must_use]
    pub const fn pool_count(&self) -> usize {
        self.pool_count
    }

    /// Returns a mine by handle.
    #[must_use]
    pub fn get(&self, handle: MineHandle) -> Option<&Mine> {
        let pool = self.pools.get(&handle.pool)?;
        slot_of(pool, handle.key).map(|slot| &pool[slot])
    }

    /// Returns a mutable mine by handle.
    #[must_use]
    pub fn get_mut(&mut self, handle: MineHandle) -> Option<&mut Mine> {
        let pool = self.pools.get_mut(&handle.pool)?;
        slot_of(pool, handle.key).map(move |slot| &mut pool[slot])
    }

    /// Returns `true` if `handle` still resolves to a live mine.
    #[must_use]
    pub fn contains(&self, handle: MineHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Returns the mines of one pool in spawn order.
    #[must_use]
    pub fn pool(&self, pool: PoolId) -> Option<&[Mine]> {
        self.pools.get(&pool).map(Vec::as_slice)
    }

    /// Iterates over pools in ascending id order.
    pub fn pools(&self) -> impl Iterator<Item = (PoolId, &[Mine])> + '_ {
        self.pools.iter().map(|(id, mines)| (*id, mines.as_slice()))
    }

    /// Iterates over every mine, pools concatenated in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &Mine> + '_ {
        self.pools.values().flatten()
    }

    /// Replaces the cached target list of a mine. Returns `false` if the
    /// handle no longer resolves.
    pub fn set_targets(&mut self, handle: MineHandle, targets: Vec<MineHandle>) -> bool {
        match self.get_mut(handle) {
            Some(mine) => {
                mine.set_targets(targets);
                true
            }
            None => false,
        }
    }

    /// Returns the mine of `pool` with the most cached targets.
    ///
    /// Ties go to the first such mine in spawn order. `None` for an empty or
    /// unknown pool.
    #[must_use]
    pub fn mine_with_most_targets(&self, pool: PoolId) -> Option<&Mine> {
        let mut best: Option<&Mine> = None;
        for mine in self.pools.get(&pool)? {
            if best.map_or(true, |b| mine.target_count() > b.target_count()) {
                best = Some(mine);
            }
        }
        best
    }

    /// Moves a mine to another pool.
    ///
    /// The mine is erased from its current pool and re-inserted at the end of
    /// `to`. Pool membership is never changed in place. Returns the new
    /// handle, or `None` if `handle` did not resolve.
    pub fn relocate(&mut self, handle: MineHandle, to: PoolId) -> Option<MineHandle> {
        let mut mine = self.remove(handle)?;
        mine.attach(MineKey::DETACHED, to);
        self.add_object(mine)
    }

    /// Maps an absolute index to `(pool, slot)` using the configured layout.
    ///
    /// See the module docs: this does not look at actual pool sizes.
    #[must_use]
    pub fn locate(&self, index: usize) -> Option<(PoolId, usize)> {
        if self.objects_per_pool == 0 {
            return None;
        }
        let pool = index / self.objects_per_pool;
        let slot = index - pool * self.objects_per_pool;
        let pool = i32::try_from(pool).ok()?;
        Some((PoolId::new(pool), slot))
    }

    fn insert(&mut self, mut mine: Mine) -> Option<MineHandle> {
        if self.is_full() {
            debug!(
                id = mine.id().as_u32(),
                capacity = self.capacity,
                "store at capacity, insertion refused"
            );
            return None;
        }

        let key = MineKey::new(self.next_key);
        self.next_key += 1;

        let pool = mine.pool_id();
        mine.attach(key, pool);
        self.pools.entry(pool).or_default().push(mine);
        self.object_count += 1;

        Some(MineHandle::new(pool, key))
    }
}

impl Default for PoolStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectPool<Mine> for PoolStore {
    type Id = MineId;
    type Pool = PoolId;
    type Handle = MineHandle;

    fn add(&mut self, id: MineId, pool: PoolId) -> Option<MineHandle> {
        self.insert(Mine::new(id, pool))
    }

    fn add_object(&mut self, object: Mine) -> Option<MineHandle> {
        self.insert(object)
    }

    fn remove(&mut self, handle: MineHandle) -> Option<Mine> {
        let pool = self.pools.get_mut(&handle.pool)?;
        let slot = slot_of(pool, handle.key)?;
        self.object_count -= 1;
        Some(pool.remove(slot))
    }

    fn remove_by_id(&mut self, id: MineId) -> Option<Mine> {
        for pool in self.pools.values_mut() {
            if let Some(slot) = pool.iter().position(|m| m.id() == id) {
                self.object_count -= 1;
                return Some(pool.remove(slot));
            }
        }
        None
    }

    fn remove_by_index(&mut self, index: usize) -> Option<Mine> {
        if index >= self.object_count {
            return None;
        }
        let (pool, slot) = self.locate(index)?;
        let pool = self.pools.get_mut(&pool)?;
        if slot >= pool.len() {
            return None;
        }
        self.object_count -= 1;
        Some(pool.remove(slot))
    }

    /// Scans every pool; when the id appears in more than one pool the match
    /// in the highest pool wins.
    fn get_by_id(&self, id: MineId) -> Option<&Mine> {
        self.pools
            .values()
            .rev()
            .find_map(|pool| pool.iter().find(|m| m.id() == id))
    }

    fn get_by_index(&self, index: usize) -> Option<&Mine> {
        if index >= self.object_count {
            return None;
        }
        let (pool, slot) = self.locate(index)?;
        self.pools.get(&pool)?.get(slot)
    }

    fn count_total(&self) -> usize {
        self.object_count
    }

    fn count_in_pool(&self, pool: PoolId) -> usize {
        self.pools.get(&pool).map_or(0, Vec::len)
    }
}

fn slot_of(pool: &[Mine], key: MineKey) -> Option<usize> {
    pool.binary_search_by_key(&key, Mine::key).ok()
}

// =============================================================================
// Tests
// =============================================================================
