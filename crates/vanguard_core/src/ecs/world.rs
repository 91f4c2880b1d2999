//! # ECS World
//!
//! The central container for all entities and components.
//!
//! Every component add/remove goes through the world (directly or via an
//! [`EntityMut`] handle), which keeps the capability index in step with the
//! entities. Queries intersect that index and never scan the entity table.

use super::allocator::IdAllocator;
use super::capability::CapabilityIndex;
use super::component::{Component, ComponentId};
use super::entity::{Entity, EntityId};
use crate::config::WorldConfig;
use crate::error::{WorldError, WorldResult};

/// Snapshot of world occupancy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    /// Currently live entities.
    pub alive: usize,
    /// Maximum simultaneously live entities.
    pub capacity: usize,
    /// Distinct slots ever issued.
    pub high_water_mark: usize,
    /// Members per non-empty capability set, in tag order.
    pub capability_sizes: Vec<(ComponentId, usize)>,
}

/// The ECS World - container for all simulated objects.
///
/// # Example
///
/// ```rust
/// use vanguard_core::{Component, ComponentId, World};
///
/// struct Position(f32, f32);
/// impl Component for Position {
///     const ID: ComponentId = ComponentId::new(0);
/// }
///
/// let mut world = World::new(1_000);
/// let id = world.create_entity().expect("capacity");
/// world.add_component(id, Position(1.0, 2.0));
///
/// assert_eq!(world.entities_with(&[Position::ID]), vec![id]);
/// ```
#[derive(Debug)]
pub struct World {
    /// Identifier issue and liveness.
    allocator: IdAllocator,
    /// Component containers by slot index. Length tracks the allocator's
    /// high-water mark; freed slots hold destroyed containers for reuse.
    entities: Vec<Entity>,
    /// Component type -> slots holding it.
    capabilities: CapabilityIndex,
}

impl World {
    /// Creates a new world with the specified entity capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::from_config(&WorldConfig {
            capacity,
            ..WorldConfig::default()
        })
    }

    /// Creates a world sized from configuration.
    #[must_use]
    pub fn from_config(config: &WorldConfig) -> Self {
        let allocator = IdAllocator::with_reserve(config.capacity, config.initial_reserve);
        let reserve = config.initial_reserve.min(allocator.capacity());

        tracing::debug!(
            "World created: capacity {}, reserved {}",
            allocator.capacity(),
            reserve
        );

        Self {
            allocator,
            entities: Vec::with_capacity(reserve),
            capabilities: CapabilityIndex::new(),
        }
    }

    /// Returns the maximum capacity of this world.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.allocator.capacity()
    }

    /// Returns the number of currently alive entities.
    #[inline]
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.allocator.live_count()
    }

    /// Creates an empty entity.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::CapacityExhausted`] when every slot is live.
    pub fn create_entity(&mut self) -> WorldResult<EntityId> {
        let id = self.allocator.allocate();
        if id.is_null() {
            tracing::warn!(
                "Entity capacity exhausted ({} live)",
                self.allocator.capacity()
            );
            return Err(WorldError::CapacityExhausted {
                capacity: self.allocator.capacity(),
            });
        }

        let idx = id.index() as usize;
        if let Some(slot) = self.entities.get_mut(idx) {
            slot.revive(id);
        } else {
            debug_assert_eq!(idx, self.entities.len(), "slots are issued in order");
            self.entities.push(Entity::new(id));
        }

        tracing::trace!("Entity created: {}", id);
        Ok(id)
    }

    /// Creates up to `count` entities, stopping early if capacity runs out.
    pub fn spawn_batch(&mut self, count: usize) -> Vec<EntityId> {
        let mut spawned = Vec::with_capacity(count);
        for _ in 0..count {
            match self.create_entity() {
                Ok(id) => spawned.push(id),
                Err(_) => break,
            }
        }
        spawned
    }

    /// Destroys an entity, dropping its components and freeing its slot.
    ///
    /// Stale or unknown identifiers are ignored.
    ///
    /// # Returns
    ///
    /// `true` if the entity was live and is now destroyed.
    pub fn destroy_entity(&mut self, id: EntityId) -> bool {
        if !self.allocator.is_valid(id) {
            return false;
        }

        let index = id.index();
        let entity = &mut self.entities[index as usize];
        self.capabilities.remove_all(entity.mask(), index);
        entity.destroy();
        self.allocator.free(id);

        tracing::trace!("Entity destroyed: {}", id);
        true
    }

    /// Checks if an entity is alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.allocator.is_valid(id)
    }

    /// Gets an entity by ID.
    ///
    /// Returns `None` if not found, dead or stale.
    #[inline]
    #[must_use]
    pub fn get_entity(&self, id: EntityId) -> Option<&Entity> {
        if !self.allocator.is_valid(id) {
            return None;
        }
        self.entities.get(id.index() as usize)
    }

    /// Gets the live entity occupying slot `index`, whatever its generation.
    #[inline]
    #[must_use]
    pub fn get_entity_by_index(&self, index: u32) -> Option<&Entity> {
        if !self.allocator.is_allocated(index) {
            return None;
        }
        self.entities.get(index as usize)
    }

    /// Returns the entity only if `id` is present and still live.
    ///
    /// For callers that held on to an identifier across a tick boundary.
    #[inline]
    #[must_use]
    pub fn validate_entity(&self, id: Option<EntityId>) -> Option<&Entity> {
        id.and_then(|id| self.get_entity(id))
    }

    /// Gets a mutating handle for an entity.
    ///
    /// Returns `None` if not found, dead or stale.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<EntityMut<'_>> {
        if !self.allocator.is_valid(id) {
            return None;
        }
        let entity = self.entities.get_mut(id.index() as usize)?;
        Some(EntityMut {
            entity,
            capabilities: &mut self.capabilities,
        })
    }

    /// Attaches a component, replacing any existing one of the same type.
    ///
    /// # Returns
    ///
    /// `false` if the entity is not live.
    pub fn add_component<C: Component>(&mut self, id: EntityId, component: C) -> bool {
        match self.entity_mut(id) {
            Some(mut entity) => {
                entity.insert(component);
                true
            }
            None => false,
        }
    }

    /// Detaches a component.
    ///
    /// # Returns
    ///
    /// `true` if the entity is live and had the component.
    pub fn remove_component<C: Component>(&mut self, id: EntityId) -> bool {
        self.entity_mut(id).is_some_and(|mut entity| entity.remove::<C>())
    }

    /// Gets a component of a live entity.
    #[inline]
    #[must_use]
    pub fn get_component<C: Component>(&self, id: EntityId) -> Option<&C> {
        self.get_entity(id)?.get::<C>()
    }

    /// Gets a component of a live entity mutably.
    ///
    /// Payload mutation does not change the capability set, so no index
    /// update is needed.
    #[inline]
    pub fn get_component_mut<C: Component>(&mut self, id: EntityId) -> Option<&mut C> {
        if !self.allocator.is_valid(id) {
            return None;
        }
        self.entities.get_mut(id.index() as usize)?.get_mut::<C>()
    }

    /// Checks whether a live entity has a component.
    #[inline]
    #[must_use]
    pub fn has_component<C: Component>(&self, id: EntityId) -> bool {
        self.get_entity(id).is_some_and(Entity::has::<C>)
    }

    /// Returns every live entity holding all of `ids`.
    ///
    /// With no ids, returns every live entity in index order. Otherwise the
    /// order follows the smallest requested capability set.
    #[must_use]
    pub fn entities_with(&self, ids: &[ComponentId]) -> Vec<EntityId> {
        let mut out = Vec::new();
        self.query_into(ids, &mut out);
        out
    }

    /// Like [`entities_with`](Self::entities_with), reusing the caller's buffer.
    pub fn query_into(&self, ids: &[ComponentId], out: &mut Vec<EntityId>) {
        out.clear();
        if ids.is_empty() {
            out.extend(self.allocator.iter_live());
            return;
        }
        out.extend(
            self.capabilities
                .intersect(ids)
                .map(|index| self.entities[index as usize].id()),
        );
    }

    /// Counts live entities holding all of `ids`.
    #[must_use]
    pub fn count_with(&self, ids: &[ComponentId]) -> usize {
        if ids.is_empty() {
            return self.alive_count();
        }
        self.capabilities.intersect_count(ids)
    }

    /// Iterates over all alive entities in index order.
    pub fn iter_alive(&self) -> impl Iterator<Item = &Entity> {
        self.allocator
            .iter_live()
            .map(|id| &self.entities[id.index() as usize])
    }

    /// Destroys every entity and empties the capability index.
    ///
    /// Identifiers issued before the clear stay invalid afterwards.
    pub fn clear(&mut self) {
        let destroyed = self.alive_count();
        for entity in &mut self.entities {
            entity.destroy();
        }
        self.capabilities.clear();
        self.allocator.clear();
        tracing::debug!("World cleared: {} entities destroyed", destroyed);
    }

    /// Returns an occupancy snapshot.
    #[must_use]
    pub fn stats(&self) -> WorldStats {
        WorldStats {
            alive: self.alive_count(),
            capacity: self.capacity(),
            high_water_mark: self.allocator.high_water_mark(),
            capability_sizes: self.capabilities.set_sizes(),
        }
    }
}

/// Mutating handle to a live entity.
///
/// Keeps the world's capability index in step with every add and remove.
pub struct EntityMut<'w> {
    entity: &'w mut Entity,
    capabilities: &'w mut CapabilityIndex,
}

impl EntityMut<'_> {
    /// The entity's identifier.
    #[inline]
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.entity.id()
    }

    /// Read-only view of the underlying container.
    #[inline]
    #[must_use]
    pub fn entity(&self) -> &Entity {
        self.entity
    }

    /// Attaches a component, replacing any existing one of the same type.
    pub fn insert<C: Component>(&mut self, component: C) -> &mut Self {
        self.entity.add(component);
        self.capabilities.insert(C::ID, self.entity.id().index());
        self
    }

    /// Detaches a component. Returns `true` if it was attached.
    pub fn remove<C: Component>(&mut self) -> bool {
        let removed = self.entity.remove::<C>();
        if removed {
            self.capabilities.remove(C::ID, self.entity.id().index());
        }
        removed
    }

    /// Gets a component.
    #[inline]
    #[must_use]
    pub fn get<C: Component>(&self) -> Option<&C> {
        self.entity.get::<C>()
    }

    /// Gets a component mutably.
    #[inline]
    pub fn get_mut<C: Component>(&mut self) -> Option<&mut C> {
        self.entity.get_mut::<C>()
    }

    /// Checks for a component.
    #[inline]
    #[must_use]
    pub fn has<C: Component>(&self) -> bool {
        self.entity.has::<C>()
    }
}
