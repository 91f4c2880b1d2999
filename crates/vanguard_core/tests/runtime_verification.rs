//! # Runtime Verification Tests
//!
//! End-to-end checks of the runtime contract:
//!
//! 1. **Identity**: no live aliasing, generation bumps on reuse, exhaustion
//! 2. **Capability index**: queries stay exact under random add/remove churn
//! 3. **Scheduling**: deterministic order, diamonds, cycles, per-tick dispatch
//!
//! Run with: cargo test --package vanguard_core --test runtime_verification

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vanguard_core::{
    Component, ComponentId, EntityId, IdAllocator, RegistryError, RuntimeConfig, System,
    SystemDefinition, SystemRegistry, World, WorldError,
};

// ============================================================================
// IDENTITY ALLOCATION
// ============================================================================

#[test]
fn verify_no_two_live_ids_collide() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let mut ids = IdAllocator::new(256);
    let mut live: Vec<EntityId> = Vec::new();

    for _ in 0..20_000 {
        if live.is_empty() || rng.gen_bool(0.55) {
            let id = ids.allocate();
            if !id.is_null() {
                live.push(id);
            }
        } else {
            let victim = live.swap_remove(rng.gen_range(0..live.len()));
            assert!(ids.free(victim));
        }

        let unique: HashSet<EntityId> = live.iter().copied().collect();
        assert_eq!(unique.len(), live.len());
        assert_eq!(ids.live_count(), live.len());
    }

    assert!(live.iter().all(|&id| ids.is_valid(id)));
}

#[test]
fn verify_reuse_bumps_generation() {
    let mut ids = IdAllocator::new(4);
    let first = ids.allocate();

    for _ in 0..10 {
        let previous = ids.current_id(first.index()).unwrap();
        ids.free(previous);
        let next = ids.allocate();

        assert_eq!(next.index(), first.index());
        assert!(next.generation() > previous.generation());
        assert!(!ids.is_valid(previous));
        assert!(ids.is_valid(next));
    }
}

#[test]
fn verify_capacity_exhaustion_is_repeatable() {
    const N: usize = 16;
    let mut ids = IdAllocator::new(N);

    let issued: Vec<EntityId> = (0..N).map(|_| ids.allocate()).collect();
    assert!(issued.iter().all(|&id| ids.is_valid(id)));

    for _ in 0..3 {
        assert_eq!(ids.allocate(), EntityId::INVALID);
    }

    ids.free(issued[7]);
    let reused = ids.allocate();
    assert_eq!(reused.index(), issued[7].index());
    assert_eq!(reused.generation(), issued[7].generation() + 1);
    assert!(ids.allocate().is_null());
}

#[test]
fn verify_capacity_two_scenario() {
    let mut ids = IdAllocator::new(2);
    let a = ids.allocate();
    let b = ids.allocate();
    assert!(ids.is_valid(a) && ids.is_valid(b));
    assert!(ids.allocate().is_null());

    assert!(ids.free(a));
    assert!(!ids.free(a), "double free is a no-op");

    let c = ids.allocate();
    assert_eq!(c.index(), a.index());
    assert!(c.generation() > a.generation());
}

#[test]
fn verify_world_surfaces_exhaustion_as_error() {
    let mut world = World::new(2);
    let a = world.create_entity().unwrap();
    world.create_entity().unwrap();

    assert_eq!(
        world.create_entity(),
        Err(WorldError::CapacityExhausted { capacity: 2 })
    );

    assert!(world.destroy_entity(a));
    assert!(!world.destroy_entity(a));
    assert!(world.create_entity().is_ok());
}

// ============================================================================
// CAPABILITY INDEX
// ============================================================================

macro_rules! marker_components {
    ($($name:ident = $id:expr),* $(,)?) => {
        $(
            struct $name;
            impl Component for $name {
                const ID: ComponentId = ComponentId::new($id);
            }
        )*
    };
}

marker_components!(A = 0, B = 1, C = 2, D = 3);

/// Brute-force answer, for comparison against the index.
fn scan(world: &World, ids: &[ComponentId]) -> HashSet<EntityId> {
    world
        .iter_alive()
        .filter(|entity| ids.iter().all(|&id| entity.has_id(id)))
        .map(|entity| entity.id())
        .collect()
}

#[test]
fn verify_add_add_remove_membership() {
    let mut world = World::new(64);
    let id = world.create_entity().unwrap();

    world.entity_mut(id).unwrap().insert(A).insert(B);
    assert!(world.entities_with(&[A::ID, B::ID]).contains(&id));

    world.remove_component::<A>(id);
    assert!(!world.entities_with(&[A::ID, B::ID]).contains(&id));
    assert_eq!(world.entities_with(&[B::ID]), vec![id]);
}

#[test]
fn verify_queries_track_random_churn() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut world = World::new(512);
    let mut live: Vec<EntityId> = Vec::new();
    let queries: [&[ComponentId]; 6] = [
        &[],
        &[A::ID],
        &[A::ID, B::ID],
        &[B::ID, C::ID],
        &[A::ID, C::ID, D::ID],
        &[A::ID, B::ID, C::ID, D::ID],
    ];

    for step in 0..5_000 {
        match rng.gen_range(0..10) {
            0..=2 => {
                if let Ok(id) = world.create_entity() {
                    live.push(id);
                }
            }
            3 if !live.is_empty() => {
                let id = live.swap_remove(rng.gen_range(0..live.len()));
                assert!(world.destroy_entity(id));
            }
            4..=6 if !live.is_empty() => {
                let id = live[rng.gen_range(0..live.len())];
                match rng.gen_range(0..4) {
                    0 => world.add_component(id, A),
                    1 => world.add_component(id, B),
                    2 => world.add_component(id, C),
                    _ => world.add_component(id, D),
                };
            }
            7..=9 if !live.is_empty() => {
                let id = live[rng.gen_range(0..live.len())];
                match rng.gen_range(0..4) {
                    0 => world.remove_component::<A>(id),
                    1 => world.remove_component::<B>(id),
                    2 => world.remove_component::<C>(id),
                    _ => world.remove_component::<D>(id),
                };
            }
            _ => {}
        }

        if step % 50 == 0 {
            for ids in queries {
                let indexed: HashSet<EntityId> = world.entities_with(ids).into_iter().collect();
                assert_eq!(indexed, scan(&world, ids), "query {ids:?} at step {step}");
                assert_eq!(world.count_with(ids), indexed.len());
            }
        }
    }
}

#[test]
fn verify_stale_ids_are_inert() {
    let mut world = World::new(8);
    let old = world.create_entity().unwrap();
    world.add_component(old, A);
    world.destroy_entity(old);

    let new = world.create_entity().unwrap();
    assert_eq!(new.index(), old.index());

    assert!(!world.add_component(old, B));
    assert!(!world.remove_component::<A>(old));
    assert!(world.get_entity(old).is_none());
    assert!(world.validate_entity(Some(old)).is_none());
    assert!(!world.has_component::<B>(new));
    assert!(world.entities_with(&[A::ID]).is_empty());
}

#[test]
fn verify_clear_resets_world() {
    let mut world = World::new(32);
    let before: Vec<EntityId> = world.spawn_batch(10);
    for &id in &before {
        world.add_component(id, A);
    }

    world.clear();

    assert_eq!(world.alive_count(), 0);
    assert!(world.entities_with(&[A::ID]).is_empty());
    assert!(before.iter().all(|&id| !world.is_alive(id)));

    let after = world.create_entity().unwrap();
    assert!(world.get_component::<A>(after).is_none());
    assert!(!before.contains(&after));
}

// ============================================================================
// SCHEDULING
// ============================================================================

/// Game context passed to every system.
#[derive(Default)]
struct Game {
    world: Option<World>,
    trace: Vec<String>,
}

struct Tracer(&'static str);

impl System<Game> for Tracer {
    fn name(&self) -> &str {
        self.0
    }

    fn update(&mut self, ctx: &mut Game, _delta_time: f32) {
        ctx.trace.push(self.0.to_string());
    }
}

fn tracer(name: &'static str, deps: &[&'static str]) -> SystemDefinition<Game> {
    SystemDefinition::new(name, move |_: &mut Game| Tracer(name)).depends_on(deps.iter().copied())
}

fn position(order: &[String], name: &str) -> usize {
    order.iter().position(|n| n == name).unwrap()
}

#[test]
fn verify_execution_order_is_deterministic() {
    let build = |reverse: bool| {
        let mut defs = vec![
            tracer("render_prep", &["movement"]),
            tracer("movement", &["input"]),
            tracer("input", &[]),
            tracer("audio", &[]),
            tracer("ai", &["input"]),
        ];
        if reverse {
            defs.reverse();
        }
        let mut registry = SystemRegistry::new();
        registry.register_all(defs).unwrap();
        registry
    };

    let first = build(false);
    let order = first.execution_order().unwrap();
    assert_eq!(order, first.execution_order().unwrap());
    assert_eq!(order, build(true).execution_order().unwrap());
    assert_eq!(order, vec!["audio", "input", "ai", "movement", "render_prep"]);
}

#[test]
fn verify_chain_and_independent_scenarios() {
    let mut chain = SystemRegistry::new();
    chain
        .register_all(vec![tracer("C", &["B"]), tracer("B", &["A"]), tracer("A", &[])])
        .unwrap();
    assert_eq!(chain.execution_order().unwrap(), vec!["A", "B", "C"]);

    let mut independent = SystemRegistry::new();
    independent
        .register_all(vec![tracer("B", &[]), tracer("C", &[]), tracer("A", &[])])
        .unwrap();
    assert_eq!(independent.execution_order().unwrap(), vec!["A", "B", "C"]);
}

#[test]
fn verify_diamond_places_root_first_and_sink_last() {
    let mut registry = SystemRegistry::new();
    registry
        .register_all(vec![
            tracer("D", &["B", "C"]),
            tracer("B", &["A"]),
            tracer("C", &["A"]),
            tracer("A", &[]),
        ])
        .unwrap();

    let order = registry.execution_order().unwrap();
    assert_eq!(order.first().map(String::as_str), Some("A"));
    assert_eq!(order.last().map(String::as_str), Some("D"));
    for middle in ["B", "C"] {
        assert!(position(&order, "A") < position(&order, middle));
        assert!(position(&order, middle) < position(&order, "D"));
    }
}

#[test]
fn verify_cycles_are_rejected() {
    let mut direct = SystemRegistry::<Game>::new();
    direct
        .register_all(vec![tracer("A", &["B"]), tracer("B", &["A"])])
        .unwrap();

    let mut indirect = SystemRegistry::<Game>::new();
    indirect
        .register_all(vec![tracer("A", &["C"]), tracer("B", &["A"]), tracer("C", &["B"])])
        .unwrap();

    for registry in [&direct, &indirect] {
        let errors = registry.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("circular dependency detected"));
        assert!(matches!(
            registry.execution_order(),
            Err(RegistryError::CircularDependency { .. })
        ));

        let mut game = Game::default();
        assert!(matches!(
            registry.create_systems(&mut game),
            Err(RegistryError::Validation(_))
        ));
    }
}

/// Moves every entity holding both a position and a velocity.
struct Movement;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Position(f32);
impl Component for Position {
    const ID: ComponentId = ComponentId::new(10);
}

#[derive(Clone, Copy)]
struct Velocity(f32);
impl Component for Velocity {
    const ID: ComponentId = ComponentId::new(11);
}

impl System<Game> for Movement {
    fn name(&self) -> &str {
        "movement"
    }

    fn update(&mut self, ctx: &mut Game, delta_time: f32) {
        ctx.trace.push("movement".to_string());
        let Some(world) = ctx.world.as_mut() else {
            return;
        };
        for id in world.entities_with(&[Position::ID, Velocity::ID]) {
            let Some(&Velocity(v)) = world.get_component::<Velocity>(id) else {
                continue;
            };
            if let Some(Position(p)) = world.get_component_mut::<Position>(id) {
                *p += v * delta_time;
            }
        }
    }
}

#[test]
fn verify_tick_runs_dependencies_first() {
    let config = RuntimeConfig::from_toml_str(
        r#"
        [world]
        capacity = 128

        [scheduler]
        priority_spacing = 10
        "#,
    )
    .unwrap();

    let mut world = World::from_config(&config.world);
    let mover = world.create_entity().unwrap();
    world
        .entity_mut(mover)
        .unwrap()
        .insert(Position(0.0))
        .insert(Velocity(2.0));
    let idle = world.create_entity().unwrap();
    world.add_component(idle, Position(5.0));

    let mut registry = SystemRegistry::with_config(&config.scheduler);
    registry
        .register_all(vec![
            tracer("input", &[]),
            SystemDefinition::new("movement", |_: &mut Game| Movement).depends_on(["input"]),
            tracer("render_prep", &["movement"]),
            tracer("naval", &["input"]).run_if(|game: &Game| game.world.is_none()),
        ])
        .unwrap();

    let mut game = Game {
        world: Some(world),
        trace: Vec::new(),
    };
    let mut schedule = registry.create_systems(&mut game).unwrap();

    // "naval" sorts between "movement" and "render_prep" but is inactive.
    let priorities: Vec<(&str, u32)> = schedule.iter().map(|s| (s.name(), s.priority())).collect();
    assert_eq!(
        priorities,
        vec![("input", 10), ("movement", 20), ("render_prep", 40)]
    );

    schedule.run(&mut game, 0.5);
    schedule.run(&mut game, 0.5);

    assert_eq!(
        game.trace,
        vec!["input", "movement", "render_prep", "input", "movement", "render_prep"]
    );
    let world = game.world.as_ref().unwrap();
    assert_eq!(world.get_component::<Position>(mover), Some(&Position(2.0)));
    assert_eq!(world.get_component::<Position>(idle), Some(&Position(5.0)));
}

#[test]
fn verify_name_mismatch_fails_fast() {
    let mut registry = SystemRegistry::new();
    registry
        .register(SystemDefinition::new("physics", |_: &mut Game| Tracer("phys")))
        .unwrap();

    let mut game = Game::default();
    assert!(matches!(
        registry.create_systems(&mut game),
        Err(RegistryError::NameMismatch { .. })
    ));
}
