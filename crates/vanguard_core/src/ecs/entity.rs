//! # Entity Management
//!
//! Entities are lightweight identifiers consisting of:
//! - An index into the world's slot table
//! - A generation counter for safe reuse
//!
//! [`Entity`] is the per-slot component container the world keeps for every
//! live identifier.

use std::any::Any;
use std::fmt;

use super::component::{Component, ComponentId, ComponentMask};

/// Number of bits holding the slot index.
pub const INDEX_BITS: u32 = 20;

/// Number of bits holding the generation counter.
pub const GENERATION_BITS: u32 = 32 - INDEX_BITS;

/// Largest representable slot index.
pub const MAX_INDEX: u32 = (1 << INDEX_BITS) - 1;

/// Largest representable generation.
pub const MAX_GENERATION: u32 = (1 << GENERATION_BITS) - 1;

/// Unique identifier for an entity.
///
/// The ID is split into two parts:
/// - Lower 20 bits: Index into the slot table
/// - Upper 12 bits: Generation counter for detecting stale references
///
/// The all-zero value is [`EntityId::INVALID`]. Live identifiers never use
/// generation zero, so the sentinel can not alias a real entity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct EntityId(u32);

impl EntityId {
    /// Null/invalid entity ID.
    pub const INVALID: Self = Self(0);

    /// Creates a new entity ID from index and generation.
    ///
    /// Both fields are masked to their bit widths, so out-of-range input
    /// wraps instead of spilling into the neighbouring field.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation & MAX_GENERATION) << INDEX_BITS) | (index & MAX_INDEX))
    }

    /// Returns the index portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 & MAX_INDEX
    }

    /// Returns the generation portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.0 >> INDEX_BITS
    }

    /// Checks if this entity ID is the invalid sentinel.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Raw packed value.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u32 {
        self.0
    }

    /// Rebuilds an ID from a packed value.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "EntityId(null)")
        } else {
            write!(f, "EntityId({}v{})", self.index(), self.generation())
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

type ComponentBox = Box<dyn Any + Send + Sync>;

/// Component container for a single entity.
///
/// Holds at most one component per type. Payloads are kept sorted by tag so
/// a lookup is a mask test plus a popcount.
///
/// Once [`destroy`](Self::destroy)ed, the container ignores further adds and
/// removes.
pub struct Entity {
    id: EntityId,
    mask: ComponentMask,
    components: Vec<ComponentBox>,
    destroyed: bool,
}

impl Entity {
    /// Creates an empty, live container.
    #[must_use]
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            mask: ComponentMask::EMPTY,
            components: Vec::new(),
            destroyed: false,
        }
    }

    /// The identifier this container was created for.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Set of component types currently attached.
    #[inline]
    #[must_use]
    pub const fn mask(&self) -> ComponentMask {
        self.mask
    }

    /// Whether [`destroy`](Self::destroy) has been called.
    #[inline]
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Number of attached components.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns `true` if no components are attached.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Attaches a component, replacing any existing one of the same type.
    ///
    /// Does nothing on a destroyed container.
    pub fn add<C: Component>(&mut self, component: C) -> &mut Self {
        if self.destroyed {
            return self;
        }

        let slot = self.mask.rank(C::ID);
        if self.mask.contains(C::ID) {
            self.components[slot] = Box::new(component);
        } else {
            self.components.insert(slot, Box::new(component));
            self.mask.insert(C::ID);
        }
        self
    }

    /// Returns the component of type `C`, if attached.
    #[inline]
    #[must_use]
    pub fn get<C: Component>(&self) -> Option<&C> {
        if !self.mask.contains(C::ID) {
            return None;
        }
        self.components[self.mask.rank(C::ID)].downcast_ref::<C>()
    }

    /// Returns the component of type `C` mutably, if attached.
    #[inline]
    pub fn get_mut<C: Component>(&mut self) -> Option<&mut C> {
        if !self.mask.contains(C::ID) {
            return None;
        }
        let slot = self.mask.rank(C::ID);
        self.components[slot].downcast_mut::<C>()
    }

    /// Checks whether a component of type `C` is attached.
    #[inline]
    #[must_use]
    pub fn has<C: Component>(&self) -> bool {
        self.mask.contains(C::ID)
    }

    /// Checks whether a component with tag `id` is attached.
    #[inline]
    #[must_use]
    pub fn has_id(&self, id: ComponentId) -> bool {
        self.mask.contains(id)
    }

    /// Detaches the component of type `C`.
    ///
    /// Returns `true` if one was attached. Always `false` once destroyed.
    pub fn remove<C: Component>(&mut self) -> bool {
        self.remove_id(C::ID)
    }

    /// Detaches the component with tag `id`.
    pub fn remove_id(&mut self, id: ComponentId) -> bool {
        if self.destroyed || !self.mask.contains(id) {
            return false;
        }
        self.components.remove(self.mask.rank(id));
        self.mask.remove(id);
        true
    }

    /// Writes the attached component tags into `out`, replacing its contents.
    ///
    /// Reuses the caller's buffer so per-tick callers do not allocate.
    pub fn component_types(&self, out: &mut Vec<ComponentId>) {
        out.clear();
        out.extend(self.mask.iter());
    }

    /// Drops every component and marks the container destroyed.
    ///
    /// Calling it again has no further effect.
    pub fn destroy(&mut self) {
        self.components.clear();
        self.mask = ComponentMask::EMPTY;
        self.destroyed = true;
    }

    /// Reuses a destroyed container for a new identifier, keeping its allocation.
    pub(crate) fn revive(&mut self, id: EntityId) {
        self.components.clear();
        self.mask = ComponentMask::EMPTY;
        self.destroyed = false;
        self.id = id;
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("components", &self.mask.iter().collect::<Vec<_>>())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Health(u32);
    impl Component for Health {
        const ID: ComponentId = ComponentId::new(4);
    }

    #[derive(Debug, PartialEq)]
    struct Armor(u32);
    impl Component for Armor {
        const ID: ComponentId = ComponentId::new(1);
    }

    #[test]
    fn test_entity_id_roundtrip() {
        let id = EntityId::new(12345, 678);
        assert_eq!(id.index(), 12345);
        assert_eq!(id.generation(), 678);
        assert!(!id.is_null());
    }

    #[test]
    fn test_entity_id_fields_wrap_independently() {
        let id = EntityId::new(MAX_INDEX + 3, 1);
        assert_eq!(id.index(), 2);
        assert_eq!(id.generation(), 1);

        let id = EntityId::new(7, MAX_GENERATION + 2);
        assert_eq!(id.index(), 7);
        assert_eq!(id.generation(), 1);
    }

    #[test]
    fn test_entity_id_equality_needs_both_fields() {
        assert_ne!(EntityId::new(3, 1), EntityId::new(3, 2));
        assert_ne!(EntityId::new(3, 1), EntityId::new(4, 1));
        assert_eq!(EntityId::new(3, 1), EntityId::new(3, 1));
        assert!(EntityId::default().is_null());
    }

    #[test]
    fn test_add_replaces_in_place() {
        let mut entity = Entity::new(EntityId::new(0, 1));
        entity.add(Health(10)).add(Armor(2));
        entity.add(Health(25));

        assert_eq!(entity.len(), 2);
        assert_eq!(entity.get::<Health>(), Some(&Health(25)));
        assert_eq!(entity.get::<Armor>(), Some(&Armor(2)));
    }

    #[test]
    fn test_remove_and_get_mut() {
        let mut entity = Entity::new(EntityId::new(0, 1));
        entity.add(Health(10));

        if let Some(health) = entity.get_mut::<Health>() {
            health.0 -= 4;
        }
        assert_eq!(entity.get::<Health>(), Some(&Health(6)));

        assert!(entity.remove::<Health>());
        assert!(!entity.remove::<Health>());
        assert!(!entity.has::<Health>());
        assert!(entity.get::<Health>().is_none());
    }

    #[test]
    fn test_component_types_reuses_buffer() {
        let mut entity = Entity::new(EntityId::new(0, 1));
        entity.add(Health(1)).add(Armor(1));

        let mut out = vec![ComponentId::new(9), ComponentId::new(10), ComponentId::new(11)];
        entity.component_types(&mut out);
        assert_eq!(out, vec![Armor::ID, Health::ID]);
    }

    #[test]
    fn test_destroy_is_idempotent_and_blocks_mutation() {
        let mut entity = Entity::new(EntityId::new(0, 1));
        entity.add(Health(10));

        entity.destroy();
        entity.destroy();
        assert!(entity.is_destroyed());
        assert!(entity.is_empty());

        entity.add(Armor(3));
        assert!(!entity.has::<Armor>());
        assert!(!entity.remove::<Armor>());
    }
}
