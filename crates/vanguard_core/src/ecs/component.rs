//! # Component Types
//!
//! Components are plain data attached to entities. The runtime knows nothing
//! about what they mean; it only needs a static tag per type so it can keep
//! one instance per type per entity and index entities by capability.
//!
//! Tags form a closed set of at most [`MAX_COMPONENT_TYPES`] values, which lets
//! an entity's capability set live in a single `u64` bitmask.

use std::any::Any;
use std::fmt;

/// Maximum number of distinct component types (one bit each in [`ComponentMask`]).
pub const MAX_COMPONENT_TYPES: usize = 64;

/// Static tag identifying a component type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ComponentId(u8);

impl ComponentId {
    /// Creates a component tag.
    ///
    /// # Panics
    ///
    /// Panics if `id >= 64`. When used to initialise a `const`, as in
    /// [`Component::ID`], this is a compile-time error instead.
    #[inline]
    #[must_use]
    pub const fn new(id: u8) -> Self {
        assert!(
            (id as usize) < MAX_COMPONENT_TYPES,
            "component id must be below 64"
        );
        Self(id)
    }

    /// Returns the raw tag value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Returns the tag as an index into per-type tables.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    const fn bit(self) -> u64 {
        1 << self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "component#{}", self.0)
    }
}

/// Marker trait for ECS components.
///
/// # Example
///
/// ```rust
/// use vanguard_core::{Component, ComponentId};
///
/// struct Health {
///     current: u32,
///     max: u32,
/// }
///
/// impl Component for Health {
///     const ID: ComponentId = ComponentId::new(3);
/// }
/// ```
pub trait Component: Any + Send + Sync {
    /// Unique tag for this component type.
    const ID: ComponentId;
}

/// Set of component tags, one bit per type.
///
/// This is an entity's capability set ("archetype").
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ComponentMask(u64);

impl ComponentMask {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Builds a mask from a list of tags.
    #[must_use]
    pub fn from_ids(ids: &[ComponentId]) -> Self {
        ids.iter().fold(Self::EMPTY, |mask, &id| mask.with(id))
    }

    /// Returns a copy with `id` added.
    #[inline]
    #[must_use]
    pub const fn with(self, id: ComponentId) -> Self {
        Self(self.0 | id.bit())
    }

    /// Adds a tag.
    #[inline]
    pub fn insert(&mut self, id: ComponentId) {
        self.0 |= id.bit();
    }

    /// Removes a tag.
    #[inline]
    pub fn remove(&mut self, id: ComponentId) {
        self.0 &= !id.bit();
    }

    /// Checks for a single tag.
    #[inline]
    #[must_use]
    pub const fn contains(self, id: ComponentId) -> bool {
        self.0 & id.bit() != 0
    }

    /// Checks that every tag in `other` is present.
    #[inline]
    #[must_use]
    pub const fn contains_all(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Number of tags in the set.
    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Returns `true` if no tag is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of tags in the set with a lower value than `id`.
    ///
    /// Entities keep their component payloads sorted by tag, so this is the
    /// slot of `id` in that list.
    #[inline]
    #[must_use]
    pub(crate) const fn rank(self, id: ComponentId) -> usize {
        (self.0 & (id.bit() - 1)).count_ones() as usize
    }

    /// Iterates tags in ascending order.
    pub fn iter(self) -> impl Iterator<Item = ComponentId> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            // Lowest set bit first
            #[allow(clippy::cast_possible_truncation)]
            let id = bits.trailing_zeros() as u8;
            bits &= bits - 1;
            Some(ComponentId(id))
        })
    }

    /// Raw bit pattern.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }
}

impl FromIterator<ComponentId> for ComponentMask {
    fn from_iter<I: IntoIterator<Item = ComponentId>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}
