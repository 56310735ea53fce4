//! Fixed-capacity pools that recycle entities instead of allocating them.
//!
//! Every slot keeps its instance for the lifetime of the world. Releasing an
//! entity deactivates it immediately, bumps the slot generation so held
//! references go stale, and optionally arms a countdown after which the
//! entity reactivates at a position chosen by its [`RespawnPolicy`].

use std::time::Duration;

use devour_core::{Category, DVec2, EntityId, Error, Region};
use rand::Rng;

/// Behaviour required from entities stored in an [`EntityPool`].
pub trait Poolable {
    /// Position the entity was created at.
    fn origin(&self) -> DVec2;

    /// Clears transient per-activation state before the entity becomes active again.
    fn reset(&mut self);

    /// Places the entity at `position` as it becomes active.
    fn activate(&mut self, position: DVec2);
}

/// Position chosen for an entity when it is taken from the pool.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Placement {
    /// The position the instance was created at.
    Origin,
    /// A uniformly random position inside the region.
    Within(Region),
    /// An explicit position.
    At(DVec2),
}

/// What happens to an entity after it is released.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RespawnPolicy {
    /// Reactivate at the original spawn point once the delay elapses.
    Origin,
    /// Reactivate at a uniformly random position inside the region once the delay elapses.
    Within(Region),
    /// Stay idle until explicitly acquired again.
    Never,
}

/// Fixed-capacity set of entities of a single category.
#[derive(Debug)]
pub struct EntityPool<T> {
    category: Category,
    slots: Vec<Slot<T>>,
}

#[derive(Debug)]
struct Slot<T> {
    item: T,
    generation: u32,
    active: bool,
    respawn: Option<PendingRespawn>,
}

#[derive(Clone, Copy, Debug)]
struct PendingRespawn {
    remaining: Duration,
    placement: Placement,
}

impl<T: Poolable> EntityPool<T> {
    /// Creates an empty pool serving the provided category.
    #[must_use]
    pub fn new(category: Category) -> Self {
        Self {
            category,
            slots: Vec::new(),
        }
    }

    /// Creates `count` inactive instances using `make`, which receives the slot index.
    pub fn warm_up(&mut self, count: usize, mut make: impl FnMut(usize) -> T) {
        self.slots.reserve(count);
        for _ in 0..count {
            let item = make(self.slots.len());
            self.slots.push(Slot {
                item,
                generation: 0,
                active: false,
                respawn: None,
            });
        }
    }

    /// Activates the first idle instance at the requested placement.
    ///
    /// Instances waiting on a respawn countdown are not idle. Fails with
    /// [`Error::PoolExhausted`] when every instance is active or pending.
    pub fn acquire(&mut self, placement: Placement, rng: &mut impl Rng) -> Result<EntityId, Error> {
        let category = self.category;
        let Some(index) = self
            .slots
            .iter()
            .position(|slot| !slot.active && slot.respawn.is_none())
        else {
            return Err(Error::PoolExhausted { category });
        };

        let slot = &mut self.slots[index];
        let position = resolve(placement, &slot.item, rng);
        slot.item.reset();
        slot.item.activate(position);
        slot.active = true;
        Ok(entity_id(category, index, slot.generation))
    }

    /// Deactivates the entity and schedules its reactivation according to `policy`.
    ///
    /// The delay is ignored for [`RespawnPolicy::Never`]. Once scheduled a
    /// reactivation cannot be cancelled.
    pub fn release(
        &mut self,
        id: EntityId,
        delay: Duration,
        policy: RespawnPolicy,
    ) -> Result<(), Error> {
        let slot = self
            .live_slot_mut(id)
            .ok_or(Error::StaleReference { entity: id })?;

        slot.active = false;
        slot.generation = slot.generation.wrapping_add(1);
        slot.respawn = match policy {
            RespawnPolicy::Origin => Some(PendingRespawn {
                remaining: delay,
                placement: Placement::Origin,
            }),
            RespawnPolicy::Within(region) => Some(PendingRespawn {
                remaining: delay,
                placement: Placement::Within(region),
            }),
            RespawnPolicy::Never => None,
        };
        Ok(())
    }

    /// Counts down pending respawns and reactivates the ones that expired.
    ///
    /// Reactivated references and their placements are appended to `reactivated`.
    pub fn advance(
        &mut self,
        dt: Duration,
        rng: &mut impl Rng,
        reactivated: &mut Vec<(EntityId, DVec2)>,
    ) {
        let category = self.category;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(pending) = slot.respawn.as_mut() else {
                continue;
            };

            pending.remaining = pending.remaining.saturating_sub(dt);
            if !pending.remaining.is_zero() {
                continue;
            }

            let placement = pending.placement;
            slot.respawn = None;
            let position = resolve(placement, &slot.item, rng);
            slot.item.reset();
            slot.item.activate(position);
            slot.active = true;
            reactivated.push((entity_id(category, index, slot.generation), position));
        }
    }

    /// Returns the active entity named by `id`.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.slot_index(id)
            .map(|index| &self.slots[index])
            .filter(|slot| slot.active && slot.generation == id.generation())
            .map(|slot| &slot.item)
    }

    /// Returns the active entity named by `id` for mutation.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.live_slot_mut(id).map(|slot| &mut slot.item)
    }

    /// Reports whether `id` names an active entity of this pool.
    #[must_use]
    pub fn is_active(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Iterator over active entities in slot order.
    pub fn iter_active(&self) -> impl Iterator<Item = (EntityId, &T)> + '_ {
        let category = self.category;
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.active)
            .map(move |(index, slot)| (entity_id(category, index, slot.generation), &slot.item))
    }

    /// Mutable iterator over active entities in slot order.
    pub fn iter_active_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> + '_ {
        let category = self.category;
        self.slots
            .iter_mut()
            .enumerate()
            .filter(|(_, slot)| slot.active)
            .map(move |(index, slot)| {
                (
                    entity_id(category, index, slot.generation),
                    &mut slot.item,
                )
            })
    }

    /// Total number of instances owned by the pool.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of currently active instances.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.active).count()
    }

    /// Number of instances waiting on a respawn countdown.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.respawn.is_some())
            .count()
    }

    fn slot_index(&self, id: EntityId) -> Option<usize> {
        if id.category() != self.category {
            return None;
        }
        let index = usize::try_from(id.slot()).ok()?;
        (index < self.slots.len()).then_some(index)
    }

    fn live_slot_mut(&mut self, id: EntityId) -> Option<&mut Slot<T>> {
        let index = self.slot_index(id)?;
        let slot = &mut self.slots[index];
        (slot.active && slot.generation == id.generation()).then_some(slot)
    }
}

/// Draws a uniformly distributed point inside `region`.
pub fn sample_region(region: &Region, rng: &mut impl Rng) -> DVec2 {
    let min = region.min();
    let max = region.max();
    DVec2::new(sample_axis(min.x, max.x, rng), sample_axis(min.y, max.y, rng))
}

fn sample_axis(min: f64, max: f64, rng: &mut impl Rng) -> f64 {
    if max > min {
        rng.gen_range(min..=max)
    } else {
        min
    }
}

fn resolve<T: Poolable>(placement: Placement, item: &T, rng: &mut impl Rng) -> DVec2 {
    match placement {
        Placement::Origin => item.origin(),
        Placement::Within(region) => sample_region(&region, rng),
        Placement::At(position) => position,
    }
}

fn entity_id(category: Category, index: usize, generation: u32) -> EntityId {
    let slot = u32::try_from(index).unwrap_or(u32::MAX);
    EntityId::new(category, slot, generation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[derive(Debug)]
    struct Marker {
        origin: DVec2,
        position: DVec2,
        charge: u32,
    }

    impl Poolable for Marker {
        fn origin(&self) -> DVec2 {
            self.origin
        }

        fn reset(&mut self) {
            self.charge = 0;
        }

        fn activate(&mut self, position: DVec2) {
            self.position = position;
        }
    }

    fn pool(count: usize) -> EntityPool<Marker> {
        let mut pool = EntityPool::new(Category::Bot);
        pool.warm_up(count, |index| Marker {
            origin: DVec2::new(index as f64, 1.0),
            position: DVec2::splat(-1.0),
            charge: 9,
        });
        pool
    }

    #[test]
    fn warm_up_creates_inactive_instances() {
        let pool = pool(3);
        assert_eq!(pool.capacity(), 3);
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.iter_active().count(), 0);
    }

    #[test]
    fn acquire_fails_once_every_instance_is_active() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut pool = pool(1);
        let first = pool.acquire(Placement::Origin, &mut rng).expect("idle instance");
        assert_eq!(pool.get(first).map(|marker| marker.position), Some(DVec2::new(0.0, 1.0)));
        assert_eq!(
            pool.acquire(Placement::Origin, &mut rng),
            Err(Error::PoolExhausted {
                category: Category::Bot
            })
        );
    }

    #[test]
    fn release_invalidates_held_references() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut pool = pool(1);
        let id = pool.acquire(Placement::Origin, &mut rng).expect("idle instance");

        pool.release(id, Duration::from_secs(1), RespawnPolicy::Origin)
            .expect("release active entity");

        assert!(!pool.is_active(id));
        assert_eq!(
            pool.release(id, Duration::ZERO, RespawnPolicy::Never),
            Err(Error::StaleReference { entity: id })
        );
    }

    #[test]
    fn pending_instances_are_not_handed_out() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut pool = pool(1);
        let id = pool.acquire(Placement::Origin, &mut rng).expect("idle instance");
        pool.release(id, Duration::from_secs(2), RespawnPolicy::Origin)
            .expect("release");

        assert!(matches!(
            pool.acquire(Placement::Origin, &mut rng),
            Err(Error::PoolExhausted { .. })
        ));
        assert_eq!(pool.pending_count(), 1);
    }

    #[test]
    fn respawn_restores_origin_after_delay_and_resets_state() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut pool = pool(2);
        let _ = pool.acquire(Placement::Origin, &mut rng).expect("first");
        let id = pool
            .acquire(Placement::At(DVec2::new(40.0, 40.0)), &mut rng)
            .expect("second");
        if let Some(marker) = pool.get_mut(id) {
            marker.charge = 5;
        }
        pool.release(id, Duration::from_millis(1500), RespawnPolicy::Origin)
            .expect("release");

        let mut reactivated = Vec::new();
        pool.advance(Duration::from_secs(1), &mut rng, &mut reactivated);
        assert!(reactivated.is_empty());

        pool.advance(Duration::from_secs(1), &mut rng, &mut reactivated);
        assert_eq!(reactivated.len(), 1);
        let (fresh, position) = reactivated[0];
        assert_eq!(fresh.slot(), id.slot());
        assert_ne!(fresh.generation(), id.generation());
        assert_eq!(position, DVec2::new(1.0, 1.0));

        let marker = pool.get(fresh).expect("reactivated");
        assert_eq!(marker.charge, 0);
        assert_eq!(marker.position, DVec2::new(1.0, 1.0));
    }

    #[test]
    fn random_respawn_lands_inside_region() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut pool = pool(8);
        let region = Region::new(DVec2::new(100.0, -20.0), DVec2::new(10.0, 6.0));
        let mut ids = Vec::new();
        for _ in 0..8 {
            ids.push(pool.acquire(Placement::Origin, &mut rng).expect("idle"));
        }
        for id in ids {
            pool.release(id, Duration::from_millis(10), RespawnPolicy::Within(region))
                .expect("release");
        }

        let mut reactivated = Vec::new();
        pool.advance(Duration::from_secs(60), &mut rng, &mut reactivated);
        assert_eq!(reactivated.len(), 8);
        for (_, position) in reactivated {
            assert!(region.contains(position), "{position:?} outside spawn region");
        }
    }

    #[test]
    fn never_policy_leaves_entity_idle_for_reuse() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut pool = pool(1);
        let id = pool.acquire(Placement::Origin, &mut rng).expect("idle");
        pool.release(id, Duration::from_secs(1), RespawnPolicy::Never)
            .expect("release");

        let mut reactivated = Vec::new();
        pool.advance(Duration::from_secs(10), &mut rng, &mut reactivated);
        assert!(reactivated.is_empty());
        assert!(pool.acquire(Placement::Origin, &mut rng).is_ok());
    }
}
