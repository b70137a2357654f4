//! Mine spawning.
//!
//! [`spawn_mine`] places one mine; [`populate`] fills a store with
//! `team_count * mines_per_team` spawn attempts drawn from a single random
//! stream. Because ids can collide, a later spawn with an existing id
//! replaces the earlier mine, so a populated store may hold fewer mines than
//! were attempted.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::Rng;
use tracing::{debug, info};

use crate::config::{IdMode, MinefieldConfig, SpawnProfile};
use crate::math::Vec3;
use crate::mine::{Mine, MineHandle, MineId, PoolId};
use crate::pool::{ObjectPool, PoolStore};

/// Spawns a mine with `id` at `position` in `team`'s pool.
///
/// A mine already holding `id`, in any pool, is removed first. Returns `None`
/// if the store is at capacity; in that case no random numbers are drawn.
///
/// # Panics
///
/// Panics if `profile.radius_range` is empty.
/// [`MinefieldConfig::validate`] rejects such profiles.
pub fn spawn_mine<R: Rng>(
    store: &mut PoolStore,
    profile: &SpawnProfile,
    id: MineId,
    position: Vec3,
    team: PoolId,
    rng: &mut R,
) -> Option<MineHandle> {
    if let Some(previous) = store.get_by_id(id).map(Mine::handle) {
        store.remove(previous);
    }

    if store.is_full() {
        debug!(id = id.as_u32(), team = team.as_i32(), "spawn refused, store at capacity");
        return None;
    }

    let mine = Mine::new(id, team)
        .with_position(position)
        .with_health(profile.health)
        .with_explosive_yield(profile.explosive_yield)
        .with_destructive_radius(rng.gen_range(profile.radius_range.clone()))
        .with_active(rng.gen::<f32>() < profile.active_chance)
        .with_invulnerable(rng.gen::<f32>() < profile.invulnerable_chance);

    store.add_object(mine)
}

/// Lays out the store for `config` and spawns every team's mines.
///
/// Teams are filled in order, each mine drawing its position first and then
/// its id. Returns the number of spawn calls that stored a mine.
///
/// # Panics
///
/// Panics if the spawn profile has a non-positive `position_extent` or an
/// empty `radius_range`. Run [`MinefieldConfig::validate`] first;
/// [`Minefield::new`](crate::minefield::Minefield::new) always does.
pub fn populate<R: Rng>(store: &mut PoolStore, config: &MinefieldConfig, rng: &mut R) -> usize {
    store.init(config.team_count, config.mines_per_team);

    let extent = config.spawn.position_extent;
    let id_range = u32::try_from(config.mines_per_team.saturating_mul(10)).unwrap_or(u32::MAX);
    let mut spawned = 0;

    for team_index in 0..config.team_count {
        let Ok(raw_team) = i32::try_from(team_index) else {
            break;
        };
        let team = PoolId::new(raw_team);

        for mine_index in 0..config.mines_per_team {
            let position = Vec3::new(
                rng.gen_range(-extent..extent),
                rng.gen_range(-extent..extent),
                rng.gen_range(-extent..extent),
            );
            let id = match config.id_mode {
                IdMode::Random => MineId::new(rng.gen::<u32>() % id_range),
                IdMode::Hashed => hashed_id(mine_index, team_index),
            };

            let Some(handle) = spawn_mine(store, &config.spawn, id, position, team, rng) else {
                continue;
            };
            spawned += 1;

            if let Some(mine) = store.get(handle) {
                info!(
                    id = mine.id().as_u32(),
                    team = raw_team,
                    x = position.x,
                    y = position.y,
                    z = position.z,
                    active = mine.is_active(),
                    invulnerable = mine.is_invulnerable(),
                    "spawned mine"
                );
            }
        }
    }

    spawned
}

/// Hashes `mine_index * (team_index + 1)` down to a 32-bit id.
///
/// Only the product is hashed, so `(2, 0)` and `(1, 1)` share an id and the
/// later spawn replaces the earlier mine.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn hashed_id(mine_index: usize, team_index: usize) -> MineId {
    let mut hasher = DefaultHasher::new();
    mine_index.wrapping_mul(team_index.wrapping_add(1)).hash(&mut hasher);
    let hash = hasher.finish();
    MineId::new((hash ^ (hash >> 32)) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::helpers::capture_events;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(11)
    }

    fn small_config(teams: usize, per_team: usize) -> MinefieldConfig {
        MinefieldConfig {
            team_count: teams,
            mines_per_team: per_team,
            ..MinefieldConfig::default()
        }
    }

    mod spawn_mine_tests {
        use super::*;

        #[test]
        fn draws_within_profile() {
            let mut store = PoolStore::new();
            store.init(1, 1);
            let profile = SpawnProfile::default();

            let handle = spawn_mine(
                &mut store,
                &profile,
                MineId::new(4),
                Vec3::new(1.0, 2.0, 3.0),
                PoolId::new(0),
                &mut rng(),
            )
            .unwrap();

            let mine = store.get(handle).unwrap();
            assert!(profile.radius_range.contains(&mine.destructive_radius()));
            assert_eq!(mine.position(), Vec3::new(1.0, 2.0, 3.0));
            assert!((mine.health() - profile.health).abs() < f32::EPSILON);
        }

        #[test]
        fn certain_chances_set_flags() {
            let mut store = PoolStore::new();
            store.init(1, 1);
            let always = SpawnProfile {
                active_chance: 1.0,
                invulnerable_chance: 1.0,
                ..SpawnProfile::default()
            };
            let never = SpawnProfile {
                active_chance: 0.0,
                invulnerable_chance: 0.0,
                ..SpawnProfile::default()
            };

            let a = spawn_mine(&mut store, &always, MineId::new(1), Vec3::ZERO, PoolId::new(0), &mut rng()).unwrap();
            let b = spawn_mine(&mut store, &never, MineId::new(2), Vec3::ZERO, PoolId::new(0), &mut rng()).unwrap();

            assert!(store.get(a).unwrap().is_active());
            assert!(store.get(a).unwrap().is_invulnerable());
            assert!(!store.get(b).unwrap().is_active());
            assert!(!store.get(b).unwrap().is_invulnerable());
        }

        #[test]
        fn duplicate_id_respawns_into_new_team() {
            let mut store = PoolStore::new();
            store.init(2, 1);
            let profile = SpawnProfile::default();
            let mut rng = rng();

            let first = spawn_mine(&mut store, &profile, MineId::new(9), Vec3::ZERO, PoolId::new(0), &mut rng).unwrap();
            let second = spawn_mine(&mut store, &profile, MineId::new(9), Vec3::ONE, PoolId::new(1), &mut rng).unwrap();

            assert!(!store.contains(first));
            assert_eq!(store.count_total(), 1);
            assert_eq!(store.count_in_pool(PoolId::new(0)), 0);
            assert_eq!(store.get(second).unwrap().position(), Vec3::ONE);
        }

        #[test]
        fn refused_at_capacity() {
            let mut store = PoolStore::with_capacity_limit(1);
            store.init(1, 2);
            let profile = SpawnProfile::default();
            let mut rng = rng();

            assert!(spawn_mine(&mut store, &profile, MineId::new(1), Vec3::ZERO, PoolId::new(0), &mut rng).is_some());
            assert!(spawn_mine(&mut store, &profile, MineId::new(2), Vec3::ZERO, PoolId::new(0), &mut rng).is_none());
            assert_eq!(store.count_total(), 1);
        }

        #[test]
        fn respawn_at_capacity_frees_its_own_slot() {
            let mut store = PoolStore::with_capacity_limit(1);
            store.init(1, 1);
            let profile = SpawnProfile::default();
            let mut rng = rng();

            spawn_mine(&mut store, &profile, MineId::new(1), Vec3::ZERO, PoolId::new(0), &mut rng).unwrap();
            assert!(spawn_mine(&mut store, &profile, MineId::new(1), Vec3::ONE, PoolId::new(0), &mut rng).is_some());
            assert_eq!(store.count_total(), 1);
        }
    }

    mod populate_tests {
        use super::*;

        #[test]
        fn hashed_ids_collide_on_equal_products() {
            let mut config = small_config(3, 20);
            config.id_mode = IdMode::Hashed;
            let mut store = PoolStore::new();

            let spawned = populate(&mut store, &config, &mut rng());

            // Every call stores a mine, but 20 of them replace an earlier
            // mine with the same product. Later teams win the collisions.
            assert_eq!(spawned, 60);
            assert_eq!(store.count_total(), 40);
            assert_eq!(store.count_in_pool(PoolId::new(0)), 7);
            assert_eq!(store.count_in_pool(PoolId::new(1)), 13);
            assert_eq!(store.count_in_pool(PoolId::new(2)), 20);
        }

        #[test]
        fn random_ids_stay_in_range() {
            let config = small_config(2, 50);
            let mut store = PoolStore::new();
            populate(&mut store, &config, &mut rng());

            assert!(store.count_total() <= 100);
            assert!(store.iter().all(|m| m.id().as_u32() < 500));
        }

        #[test]
        fn positions_stay_within_extent() {
            let config = small_config(2, 30);
            let mut store = PoolStore::new();
            populate(&mut store, &config, &mut rng());

            let extent = config.spawn.position_extent;
            assert!(store.iter().all(|m| {
                let p = m.position();
                [p.x, p.y, p.z].iter().all(|c| (-extent..extent).contains(c))
            }));
        }

        #[test]
        fn records_layout() {
            let config = small_config(4, 7);
            let mut store = PoolStore::new();
            populate(&mut store, &config, &mut rng());

            assert_eq!(store.pool_count(), 4);
            assert_eq!(store.objects_per_pool(), 7);
        }

        #[test]
        fn same_seed_same_field() {
            let config = small_config(2, 25);
            let mut a = PoolStore::new();
            let mut b = PoolStore::new();
            populate(&mut a, &config, &mut rng());
            populate(&mut b, &config, &mut rng());

            let left: Vec<_> = a.iter().map(|m| (m.id(), m.position(), m.status())).collect();
            let right: Vec<_> = b.iter().map(|m| (m.id(), m.position(), m.status())).collect();
            assert_eq!(left, right);
        }

        #[test]
        fn hashed_id_is_stable() {
            assert_eq!(hashed_id(3, 1), hashed_id(3, 1));
            assert_ne!(hashed_id(3, 1), hashed_id(1, 3));
        }

        #[test]
        fn hashed_id_depends_only_on_product() {
            assert_eq!(hashed_id(2, 0), hashed_id(1, 1));
            assert_eq!(hashed_id(6, 1), hashed_id(4, 2));
            assert_eq!(hashed_id(0, 0), hashed_id(0, 5));
        }

        #[test]
        fn spawn_records_log_at_info() {
            let config = small_config(2, 3);
            let events = capture_events(|| {
                populate(&mut PoolStore::new(), &config, &mut rng());
            });

            let records = events
                .iter()
                .filter(|(_, message)| message == "spawned mine")
                .collect::<Vec<_>>();
            assert_eq!(records.len(), 6);
            assert!(records.iter().all(|(level, _)| *level == tracing::Level::INFO));
        }

        #[test]
        #[should_panic]
        fn zero_extent_panics() {
            let mut config = small_config(1, 1);
            config.spawn.position_extent = 0.0;
            populate(&mut PoolStore::new(), &config, &mut rng());
        }

        #[test]
        #[should_panic]
        fn empty_radius_range_panics() {
            let profile = SpawnProfile {
                radius_range: 5.0..5.0,
                ..SpawnProfile::default()
            };
            let mut store = PoolStore::new();
            store.init(1, 1);
            spawn_mine(&mut store, &profile, MineId::new(1), Vec3::ZERO, PoolId::new(0), &mut rng());
        }
    }
}
