//! # Vanguard Core Runtime
//!
//! The entity-component layer under a real-time simulation:
//! - Generational entity identifiers that make stale references harmless
//! - Component queries answered from incrementally maintained indices
//! - Dependency-ordered, deterministic per-tick system execution
//!
//! ## Architecture Rules
//!
//! 1. **Single-threaded ticks** - Systems run one after another, each to completion
//! 2. **No rescans** - Every component add/remove updates the capability index
//! 3. **Fail at startup** - Registry misconfiguration is caught before the first tick
//!
//! ## Example
//!
//! ```rust
//! use vanguard_core::{Component, ComponentId, System, SystemDefinition, SystemRegistry, World};
//!
//! struct Position(f32);
//! impl Component for Position {
//!     const ID: ComponentId = ComponentId::new(0);
//! }
//!
//! struct Velocity(f32);
//! impl Component for Velocity {
//!     const ID: ComponentId = ComponentId::new(1);
//! }
//!
//! struct Movement;
//! impl System<World> for Movement {
//!     fn name(&self) -> &str {
//!         "movement"
//!     }
//!
//!     fn update(&mut self, world: &mut World, delta_time: f32) {
//!         for id in world.entities_with(&[Position::ID, Velocity::ID]) {
//!             let speed = world.get_component::<Velocity>(id).map_or(0.0, |v| v.0);
//!             if let Some(pos) = world.get_component_mut::<Position>(id) {
//!                 pos.0 += speed * delta_time;
//!             }
//!         }
//!     }
//! }
//!
//! let mut world = World::new(1_024);
//! let id = world.create_entity().expect("capacity");
//! world.entity_mut(id).expect("live").insert(Position(0.0)).insert(Velocity(2.0));
//!
//! let mut registry = SystemRegistry::new();
//! registry
//!     .register(SystemDefinition::new("movement", |_: &mut World| Movement))
//!     .expect("unique name");
//!
//! let mut schedule = registry.create_systems(&mut world).expect("valid graph");
//! schedule.run(&mut world, 0.5);
//! assert_eq!(world.get_component::<Position>(id).map(|p| p.0), Some(1.0));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod schedule;

pub use config::{RuntimeConfig, SchedulerConfig, WorldConfig};
pub use ecs::{
    Component, ComponentId, ComponentMask, Entity, EntityId, EntityMut, IdAllocator, World,
    WorldStats,
};
pub use error::{ConfigError, RegistryError, WorldError};
pub use schedule::{RegistryState, Schedule, ScheduledSystem, System, SystemDefinition, SystemRegistry};
