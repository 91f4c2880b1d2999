//! # Entity Component System
//!
//! Generational entity identifiers, per-entity component containers and an
//! incrementally maintained capability index.
//!
//! ## Design Philosophy
//!
//! - Entity IDs are plain values: a slot index plus a generation counter
//! - Stale IDs are detected by generation, never by pointer identity
//! - Component types are a closed set of static tags (at most 64)
//! - Queries intersect per-type sets; they never scan all entities

mod allocator;
mod bitset;
mod capability;
mod component;
mod entity;
mod world;

pub use allocator::{next_generation, IdAllocator};
pub use bitset::{SlotBits, SlotIter};
pub use capability::{CapabilityIndex, CapabilitySet};
pub use component::{Component, ComponentId, ComponentMask, MAX_COMPONENT_TYPES};
pub use entity::{
    Entity, EntityId, GENERATION_BITS, INDEX_BITS, MAX_GENERATION, MAX_INDEX,
};
pub use world::{EntityMut, World, WorldStats};
