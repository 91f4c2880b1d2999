//! # System Scheduling
//!
//! Named, dependency-aware systems and the registry that orders them.
//!
//! ## Design Philosophy
//!
//! - Order is computed once (startup, or when the active feature set changes)
//! - Ties between independent systems break by name, never by registration order
//! - Configuration errors surface before the first tick, never during one
//! - Single-threaded: each update runs to completion before the next begins

mod registry;
mod system;

pub use registry::{
    ActivationCondition, RegistryState, SystemDefinition, SystemFactory, SystemRegistry,
};
pub use system::{Schedule, ScheduledSystem, System};
