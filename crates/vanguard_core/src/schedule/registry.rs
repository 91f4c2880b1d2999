//! # System Registry
//!
//! Systems are registered independently, each naming the systems that must
//! run before it. The registry checks the resulting graph and turns it into a
//! fixed, deterministic execution order.
//!
//! ## Lifecycle
//!
//! ```text
//! register() --> Unvalidated --validate()--> Validated
//!                                   --execution_order()--> Ordered
//!                                   --create_systems()--> Instantiated
//! ```
//!
//! Any new registration drops the registry back to `Unvalidated`.
//!
//! ## Ordering
//!
//! Kahn's algorithm with the ready set kept sorted by name: whenever several
//! systems are free to run, the alphabetically first goes next. The same
//! registrations therefore always produce the same order.

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use super::system::{Schedule, ScheduledSystem, System};
use crate::config::{SchedulerConfig, DEFAULT_PRIORITY_SPACING};
use crate::error::{RegistryError, RegistryResult};

/// Builds a system instance from the game context.
pub type SystemFactory<C> = Box<dyn Fn(&mut C) -> Box<dyn System<C>>>;

/// Decides at instantiation time whether a system is created at all.
pub type ActivationCondition<C> = Box<dyn Fn(&C) -> bool>;

/// Where the registry is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistryState {
    /// Registrations changed since the last successful check.
    Unvalidated,
    /// Every dependency resolves and the graph is acyclic.
    Validated,
    /// An execution order has been computed.
    Ordered,
    /// Systems have been constructed from the order.
    Instantiated,
}

/// Registration record for one system.
///
/// # Example
///
/// ```rust
/// use vanguard_core::{System, SystemDefinition};
///
/// struct Movement;
/// impl System<()> for Movement {
///     fn name(&self) -> &str {
///         "movement"
///     }
///     fn update(&mut self, _ctx: &mut (), _delta_time: f32) {}
/// }
///
/// let def = SystemDefinition::new("movement", |_: &mut ()| Movement)
///     .depends_on(["input"])
///     .run_if(|_: &()| true);
/// assert_eq!(def.dependencies(), ["input"]);
/// ```
pub struct SystemDefinition<C> {
    name: String,
    dependencies: Vec<String>,
    factory: SystemFactory<C>,
    condition: Option<ActivationCondition<C>>,
}

impl<C: 'static> SystemDefinition<C> {
    /// Creates a definition with no dependencies and no activation condition.
    pub fn new<S, F>(name: impl Into<String>, factory: F) -> Self
    where
        S: System<C> + 'static,
        F: Fn(&mut C) -> S + 'static,
    {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
            factory: Box::new(move |ctx: &mut C| -> Box<dyn System<C>> {
                Box::new(factory(ctx))
            }),
            condition: None,
        }
    }

    /// Adds systems that must run before this one.
    #[must_use]
    pub fn depends_on<I>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        for dependency in dependencies {
            let dependency = dependency.into();
            if !self.dependencies.contains(&dependency) {
                self.dependencies.push(dependency);
            }
        }
        self
    }

    /// Only instantiate this system when `condition` holds for the context.
    #[must_use]
    pub fn run_if<F>(mut self, condition: F) -> Self
    where
        F: Fn(&C) -> bool + 'static,
    {
        self.condition = Some(Box::new(condition));
        self
    }
}

impl<C> SystemDefinition<C> {
    /// Registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Systems that must run before this one, in declaration order.
    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Whether an activation condition is attached.
    #[must_use]
    pub fn has_condition(&self) -> bool {
        self.condition.is_some()
    }

    fn is_active(&self, ctx: &C) -> bool {
        self.condition.as_ref().map_or(true, |condition| condition(ctx))
    }
}

impl<C> fmt::Debug for SystemDefinition<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemDefinition")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("has_condition", &self.condition.is_some())
            .finish_non_exhaustive()
    }
}

/// DFS colouring for cycle detection.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Registry of named systems and their dependencies.
pub struct SystemRegistry<C> {
    /// Definitions keyed by name. Sorted, so every walk is deterministic.
    definitions: BTreeMap<String, SystemDefinition<C>>,
    /// Gap between the priorities of consecutive systems.
    priority_spacing: u32,
    state: Cell<RegistryState>,
}

impl<C> Default for SystemRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> SystemRegistry<C> {
    /// Creates an empty registry with default priority spacing.
    #[must_use]
    pub fn new() -> Self {
        Self::with_priority_spacing(DEFAULT_PRIORITY_SPACING)
    }

    /// Creates an empty registry using scheduler configuration.
    #[must_use]
    pub fn with_config(config: &SchedulerConfig) -> Self {
        Self::with_priority_spacing(config.priority_spacing)
    }

    /// Creates an empty registry with the given priority spacing (at least 1).
    #[must_use]
    pub fn with_priority_spacing(priority_spacing: u32) -> Self {
        Self {
            definitions: BTreeMap::new(),
            priority_spacing: priority_spacing.max(1),
            state: Cell::new(RegistryState::Unvalidated),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> RegistryState {
        self.state.get()
    }

    /// Gap between the priorities of consecutive systems.
    #[must_use]
    pub const fn priority_spacing(&self) -> u32 {
        self.priority_spacing
    }

    /// Number of registered systems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Whether a system with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Looks up a definition.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SystemDefinition<C>> {
        self.definitions.get(name)
    }

    /// Registered names in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    /// Registers a system.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateSystem`] if the name is taken. The
    /// existing definition is kept.
    pub fn register(&mut self, definition: SystemDefinition<C>) -> RegistryResult<()> {
        if self.definitions.contains_key(&definition.name) {
            return Err(RegistryError::DuplicateSystem(definition.name));
        }

        tracing::debug!(
            "Registered system '{}' (depends on: {:?})",
            definition.name,
            definition.dependencies
        );
        self.definitions.insert(definition.name.clone(), definition);
        self.state.set(RegistryState::Unvalidated);
        Ok(())
    }

    /// Registers several systems, stopping at the first duplicate.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateSystem`] for the first name already
    /// taken. Definitions before it stay registered.
    pub fn register_all<I>(&mut self, definitions: I) -> RegistryResult<()>
    where
        I: IntoIterator<Item = SystemDefinition<C>>,
    {
        for definition in definitions {
            self.register(definition)?;
        }
        Ok(())
    }

    /// Checks the dependency graph.
    ///
    /// Returns one message per unknown dependency and one per distinct cycle.
    /// An empty list means the registry can be ordered and instantiated.
    pub fn validate(&self) -> Vec<String> {
        let mut errors: Vec<String> = self
            .unknown_dependencies()
            .map(|(system, dependency)| {
                RegistryError::UnknownDependency {
                    system: system.to_string(),
                    dependency: dependency.to_string(),
                }
                .to_string()
            })
            .collect();

        errors.extend(self.find_cycles().into_iter().map(|cycle| {
            RegistryError::CircularDependency { cycle }.to_string()
        }));

        if errors.is_empty() {
            if self.state.get() == RegistryState::Unvalidated {
                self.state.set(RegistryState::Validated);
            }
        } else {
            self.state.set(RegistryState::Unvalidated);
        }
        errors
    }

    /// Computes the execution order.
    ///
    /// Dependencies always come before their dependents; ties are broken by
    /// ascending name.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::UnknownDependency`] for the first unresolved name
    /// - [`RegistryError::CircularDependency`] if the graph has a cycle; no
    ///   partial order is returned
    pub fn execution_order(&self) -> RegistryResult<Vec<String>> {
        if let Some((system, dependency)) = self.unknown_dependencies().next() {
            return Err(RegistryError::UnknownDependency {
                system: system.to_string(),
                dependency: dependency.to_string(),
            });
        }

        let mut pending: HashMap<&str, usize> = HashMap::with_capacity(self.definitions.len());
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
        for (name, definition) in &self.definitions {
            pending.insert(name.as_str(), definition.dependencies.len());
            for dependency in &definition.dependencies {
                dependents
                    .entry(dependency.as_str())
                    .or_default()
                    .push(name.as_str());
            }
        }

        let mut ready: BTreeSet<&str> = pending
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(&name, _)| name)
            .collect();

        let mut order = Vec::with_capacity(self.definitions.len());
        while let Some(name) = ready.pop_first() {
            order.push(name.to_string());

            for &dependent in dependents.get(name).into_iter().flatten() {
                if let Some(count) = pending.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        if order.len() < self.definitions.len() {
            let cycle = self.find_cycles().into_iter().next().unwrap_or_else(|| {
                let placed: BTreeSet<&str> = order.iter().map(String::as_str).collect();
                self.names().filter(|name| !placed.contains(name)).map(str::to_string).collect()
            });
            return Err(RegistryError::CircularDependency { cycle });
        }

        self.state.set(RegistryState::Ordered);
        tracing::debug!("System execution order: {:?}", order);
        Ok(order)
    }

    /// Instantiates every active system in execution order.
    ///
    /// Systems whose activation condition is false are skipped but keep their
    /// slot in the priority numbering. Either every active system is built or
    /// none is.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Validation`] with every [`validate`](Self::validate)
    ///   message if the graph is invalid
    /// - [`RegistryError::NameMismatch`] if a factory builds a system reporting
    ///   a different name
    pub fn create_systems(&self, ctx: &mut C) -> RegistryResult<Schedule<C>> {
        let errors = self.validate();
        if !errors.is_empty() {
            tracing::warn!(
                "Refusing to instantiate systems: {} validation error(s)",
                errors.len()
            );
            return Err(RegistryError::Validation(errors));
        }

        let order = self.execution_order()?;
        let mut systems = Vec::with_capacity(order.len());

        for (position, name) in order.iter().enumerate() {
            let Some(definition) = self.definitions.get(name) else {
                continue;
            };

            if !definition.is_active(ctx) {
                tracing::debug!("System '{}' skipped: activation condition is false", name);
                continue;
            }

            let system = (definition.factory)(&mut *ctx);
            if system.name() != name {
                return Err(RegistryError::NameMismatch {
                    expected: name.clone(),
                    actual: system.name().to_string(),
                });
            }

            let slot = u32::try_from(position + 1).unwrap_or(u32::MAX);
            systems.push(ScheduledSystem::new(
                slot.saturating_mul(self.priority_spacing),
                system,
            ));
        }

        self.state.set(RegistryState::Instantiated);
        tracing::debug!(
            "Instantiated {} of {} systems",
            systems.len(),
            self.definitions.len()
        );
        Ok(Schedule::new(systems))
    }

    /// Removes every definition.
    pub fn clear(&mut self) {
        self.definitions.clear();
        self.state.set(RegistryState::Unvalidated);
    }

    /// `(system, dependency)` pairs whose dependency is not registered.
    fn unknown_dependencies(&self) -> impl Iterator<Item = (&str, &str)> {
        self.definitions.iter().flat_map(move |(name, definition)| {
            definition
                .dependencies
                .iter()
                .filter(move |dependency| !self.definitions.contains_key(dependency.as_str()))
                .map(move |dependency| (name.as_str(), dependency.as_str()))
        })
    }

    /// Every distinct cycle reachable by depth-first search, as dependency
    /// paths with the first system repeated at the end.
    fn find_cycles(&self) -> Vec<Vec<String>> {
        let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(self.definitions.len());
        let mut path: Vec<&str> = Vec::new();
        let mut cycles = Vec::new();

        for name in self.definitions.keys() {
            if !marks.contains_key(name.as_str()) {
                self.dfs_find_cycles(name, &mut marks, &mut path, &mut cycles);
            }
        }
        cycles
    }

    /// DFS helper for cycle detection.
    fn dfs_find_cycles<'a>(
        &'a self,
        name: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        marks.insert(name, Mark::Visiting);
        path.push(name);

        if let Some(definition) = self.definitions.get(name) {
            for dependency in &definition.dependencies {
                let dependency = dependency.as_str();
                if !self.definitions.contains_key(dependency) {
                    continue;
                }
                match marks.get(dependency) {
                    None => self.dfs_find_cycles(dependency, marks, path, cycles),
                    Some(Mark::Visiting) => {
                        // Found cycle - extract it from path
                        let start = path.iter().position(|&n| n == dependency).unwrap_or(0);
                        let mut cycle: Vec<String> =
                            path[start..].iter().map(|&n| n.to_string()).collect();
                        cycle.push(dependency.to_string());
                        cycles.push(cycle);
                    }
                    Some(Mark::Done) => {}
                }
            }
        }

        path.pop();
        marks.insert(name, Mark::Done);
    }
}

impl<C> fmt::Debug for SystemRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemRegistry")
            .field("definitions", &self.definitions.values().collect::<Vec<_>>())
            .field("priority_spacing", &self.priority_spacing)
            .field("state", &self.state.get())
            .finish()
    }
}
