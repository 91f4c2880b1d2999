//! # Systems
//!
//! A system is a named unit of per-tick logic. The registry builds them and
//! hands back a [`Schedule`] that runs them in dependency order.

use std::fmt;

/// A unit of per-tick logic.
///
/// `C` is the game context the driver passes to every update (typically a
/// struct owning the [`World`](crate::World) plus session services).
pub trait System<C> {
    /// Name of this system. Must match the name it was registered under.
    fn name(&self) -> &str;

    /// Runs one tick. Called synchronously, once per tick, in schedule order.
    fn update(&mut self, ctx: &mut C, delta_time: f32);
}

/// An instantiated system with its order-derived priority.
pub struct ScheduledSystem<C> {
    priority: u32,
    system: Box<dyn System<C>>,
}

impl<C> ScheduledSystem<C> {
    pub(crate) fn new(priority: u32, system: Box<dyn System<C>>) -> Self {
        Self { priority, system }
    }

    /// Name of the wrapped system.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        self.system.name()
    }

    /// Priority assigned from the system's position in execution order.
    ///
    /// Lower runs earlier. Consecutive systems are spaced apart so new ones
    /// can be slotted in between without renumbering.
    #[inline]
    #[must_use]
    pub const fn priority(&self) -> u32 {
        self.priority
    }

    /// The wrapped system.
    #[must_use]
    pub fn system(&self) -> &dyn System<C> {
        self.system.as_ref()
    }

    /// The wrapped system, mutably.
    pub fn system_mut(&mut self) -> &mut dyn System<C> {
        self.system.as_mut()
    }
}

impl<C> fmt::Debug for ScheduledSystem<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledSystem")
            .field("name", &self.name())
            .field("priority", &self.priority)
            .finish()
    }
}

/// Systems in execution order.
///
/// A system that is a (transitive) dependency of another always finishes its
/// update before the dependent's update begins.
pub struct Schedule<C> {
    systems: Vec<ScheduledSystem<C>>,
}

impl<C> Schedule<C> {
    pub(crate) fn new(systems: Vec<ScheduledSystem<C>>) -> Self {
        Self { systems }
    }

    /// Runs one tick: every system's update, in order, to completion.
    pub fn run(&mut self, ctx: &mut C, delta_time: f32) {
        for scheduled in &mut self.systems {
            tracing::trace!(
                "Updating system '{}' (priority {})",
                scheduled.system.name(),
                scheduled.priority
            );
            scheduled.system.update(ctx, delta_time);
        }
    }

    /// Number of instantiated systems.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Returns `true` if no system was instantiated.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// System names in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.systems.iter().map(ScheduledSystem::name).collect()
    }

    /// Looks up a scheduled system by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ScheduledSystem<C>> {
        self.systems.iter().find(|s| s.name() == name)
    }

    /// Iterates systems in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &ScheduledSystem<C>> {
        self.systems.iter()
    }

    /// Iterates systems mutably in execution order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ScheduledSystem<C>> {
        self.systems.iter_mut()
    }

    /// Drops every system.
    pub fn clear(&mut self) {
        self.systems.clear();
    }
}

impl<C> fmt::Debug for Schedule<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.systems.iter()).finish()
    }
}
