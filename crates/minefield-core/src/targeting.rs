//! Per-mine target scan.
//!
//! An active mine rebuilds its target list by walking the whole store in
//! absolute index order. The walk stops outright, not just skipping the
//! candidate, on the first of:
//!
//! 1. a candidate that is invulnerable,
//! 2. a candidate outside the scanning mine's destructive radius,
//! 3. an allied candidate for which the ally-sparing draw succeeds.
//!
//! Everything encountered before the stop is a target, allies included. The
//! resulting set therefore depends on scan order: one out-of-range or
//! invulnerable mine early in the store blinds the scanner to everything
//! after it.
//!
//! The scan only reads the store. It is safe to run from many workers at
//! once as long as nothing mutates the store meanwhile.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::math::sqr_distance;
use crate::mine::{Mine, MineHandle, MineKey};
use crate::pool::ObjectPool;

/// Chance that an allied candidate stops the scan.
pub const DEFAULT_ALLY_SPARE_CHANCE: f32 = 0.05;

/// Tunables of the target scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetingPolicy {
    /// Probability in `[0, 1]` that meeting an ally ends the scan.
    ///
    /// The scan ends when a uniform draw in `[0, 1)` is `<=` this value. A
    /// chance of exactly zero never draws, so allies are never spared.
    pub ally_spare_chance: f32,
}

impl TargetingPolicy {
    /// Creates a policy with the given ally-sparing chance.
    #[must_use]
    pub const fn new(ally_spare_chance: f32) -> Self {
        Self { ally_spare_chance }
    }

    /// Returns `true` if this ally encounter ends the scan.
    fn spares_ally<R: Rng>(&self, rng: &mut R) -> bool {
        self.ally_spare_chance > 0.0 && rng.gen::<f32>() <= self.ally_spare_chance
    }
}

impl Default for TargetingPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLY_SPARE_CHANCE)
    }
}

/// Scans the store for `mine`'s targets.
///
/// Returns `None` for an inactive mine: inactive mines never rebuild their
/// list and keep whatever they held before. Identity is compared by
/// [`MineId`](crate::mine::MineId). Absolute indices that do not resolve to a
/// mine are skipped and the scan continues.
pub fn scan_targets<S, R>(
    mine: &Mine,
    store: &S,
    policy: &TargetingPolicy,
    rng: &mut R,
) -> Option<Vec<MineHandle>>
where
    S: ObjectPool<Mine> + ?Sized,
    R: Rng,
{
    if !mine.is_active() {
        return None;
    }

    let origin = mine.position();
    let radius_sq = mine.radius_sq();
    let mut targets = Vec::new();

    for index in 0..store.count_total() {
        let Some(candidate) = store.get_by_index(index) else {
            continue;
        };
        if candidate.id() == mine.id() {
            continue;
        }

        if candidate.is_invulnerable() || sqr_distance(candidate.position(), origin) > radius_sq {
            break;
        }

        if candidate.team() == mine.team() && policy.spares_ally(rng) {
            break;
        }

        targets.push(candidate.handle());
    }

    Some(targets)
}

/// Random stream for one mine's scan in one round.
///
/// Seeded from `(seed, round, key)` so that a scan draws the same numbers no
/// matter which worker runs it.
#[must_use]
pub fn scan_rng(seed: u64, round: u64, key: MineKey) -> ChaCha8Rng {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    round.hash(&mut hasher);
    key.hash(&mut hasher);
    ChaCha8Rng::seed_from_u64(hasher.finish())
}
