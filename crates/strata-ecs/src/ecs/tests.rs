// Copyright 2025 strata developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::access::{ComponentAccess, ComponentGroup, Permission};
use super::component::Component;
use super::publisher::new_id_vector;
use super::scheduler::{Job, SchedulerConfig};
use super::system::{EntitySubscriptionRegistration, System, SystemRegistration};
use super::world::{EcsWorld, TickContext};
use bincode::{Decode, Encode};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

// --- DUMMY COMPONENTS FOR TESTING ---

#[derive(Debug, Clone, Copy, PartialEq, Encode, Decode)]
struct Position {
    x: f32,
    y: f32,
    z: f32,
}
impl Component for Position {}

#[derive(Debug, Clone, Copy, PartialEq, Encode, Decode)]
struct Velocity {
    x: f32,
    y: f32,
    z: f32,
}
impl Component for Velocity {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
struct Health(u32);
impl Component for Health {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
struct PlayerTag;
impl Component for PlayerTag {}

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn small_world() -> EcsWorld {
    EcsWorld::new(SchedulerConfig { worker_threads: 4 })
}

// --- TESTS ---

#[test]
fn created_entities_are_alive_and_unique() {
    // --- 1. SETUP ---
    let world = small_world();

    // --- 2. ACTION ---
    let a = world.create_entity();
    let b = world.create_entity();

    // --- 3. ASSERTIONS ---
    assert_ne!(a, b, "two live entities must have distinct ids");
    assert!(world.is_alive(a));
    assert!(world.is_alive(b));
    assert_eq!(world.registry().live_count(), 2);
}

#[test]
fn recycled_index_bumps_generation() {
    let mut world = small_world();
    let first = world.create_entity();

    world.remove_entity(first);
    world.tick(0.0);
    assert!(!world.is_alive(first), "deletion completes within the tick");

    let second = world.create_entity();
    assert_eq!(
        second.index, first.index,
        "the freed index should be recycled"
    );
    assert_eq!(
        second.generation,
        first.generation + 1,
        "recycling must bump the generation"
    );
    assert!(
        !world.is_alive(first),
        "the stale handle must not alias the recycled entity"
    );
    assert!(world.is_alive(second));
}

#[test]
fn stale_handle_write_does_not_alias_recycled_entity() {
    // --- 1. SETUP: recycle an index so a stale handle exists ---
    let mut world = small_world();
    let stale = world.create_entity();
    world.remove_entity(stale);
    world.tick(0.0);

    let fresh = world.create_entity();
    assert_eq!(fresh.index, stale.index, "the index must be recycled");
    world.add_component(fresh, Health(5));

    // --- 2. ACTION: write through the dead handle ---
    world.add_component(stale, Health(99));

    // --- 3. ASSERTIONS ---
    assert_eq!(
        world.storage().component::<Health>(fresh),
        Health(5),
        "a stale write must never reach the entity that recycled the index"
    );
    assert!(
        world
            .storage()
            .with_component_if::<Health, _>(stale, |h| *h)
            .is_none(),
        "reads through the stale handle must miss"
    );
}

#[test]
fn stale_handle_remove_leaves_live_entity_intact() {
    // --- 1. SETUP ---
    let mut world = small_world();
    let ids = new_id_vector();
    world.subscribe_to_entities(
        "observer",
        EntitySubscriptionRegistration::new(
            ids.clone(),
            vec![ComponentAccess::of::<Health>(Permission::R)],
        ),
    );

    let stale = world.create_entity();
    world.remove_entity(stale);
    world.tick(0.0);

    let fresh = world.create_entity();
    world.add_component(fresh, Health(5));
    world.tick(0.0);
    assert_eq!(*ids.read().unwrap(), vec![fresh]);

    // --- 2. ACTION: remove through the dead handle ---
    world.remove_component::<Health>(stale);
    world.tick(0.0);

    // --- 3. ASSERTIONS ---
    assert_eq!(
        world.storage().component::<Health>(fresh),
        Health(5),
        "a stale remove must not destroy the live entity's component"
    );
    assert_eq!(
        *ids.read().unwrap(),
        vec![fresh],
        "the live entity stays in the id vector"
    );
}

#[test]
fn component_is_readable_immediately_but_published_next_tick() {
    // --- 1. SETUP ---
    let mut world = small_world();
    let ids = new_id_vector();
    world.subscribe_to_entities(
        "observer",
        EntitySubscriptionRegistration::new(
            ids.clone(),
            vec![ComponentAccess::of::<Health>(Permission::R)],
        ),
    );
    let entity = world.create_entity();

    // --- 2. ACTION ---
    world.add_component(entity, Health(100));

    // --- 3. ASSERTIONS ---
    // Direct reads observe the value within the same frame.
    assert_eq!(world.storage().component::<Health>(entity), Health(100));
    // Subscribers only see the entity after the next sync point.
    assert!(
        ids.read().unwrap().is_empty(),
        "id vector must not change mid-frame"
    );

    world.tick(0.0);
    assert_eq!(
        *ids.read().unwrap(),
        vec![entity],
        "the entity is published at the sync point"
    );

    // And it stays present on every later tick until removed.
    world.tick(0.0);
    assert_eq!(*ids.read().unwrap(), vec![entity]);
}

#[test]
fn removal_is_deferred_and_idempotent() {
    // --- 1. SETUP ---
    let mut world = small_world();
    let keep = world.create_entity();
    let drop = world.create_entity();
    world.add_component(keep, Health(10));
    world.add_component(drop, Health(20));
    world.tick(0.0);

    let hook_runs = Arc::new(AtomicUsize::new(0));
    let counter = hook_runs.clone();
    world.storage().set_removal_hook::<Health>(Box::new(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    // --- 2. ACTION ---
    // Removing twice before the sync point must remove exactly once.
    world.remove_component::<Health>(drop);
    world.remove_component::<Health>(drop);

    // Data is still present before the sync point.
    assert!(world
        .storage()
        .with_component_if::<Health, _>(drop, |h| *h)
        .is_some());

    world.tick(0.0);

    // --- 3. ASSERTIONS ---
    assert!(
        world
            .storage()
            .with_component_if::<Health, _>(drop, |h| *h)
            .is_none(),
        "the component is gone after the sync point"
    );
    assert_eq!(
        hook_runs.load(Ordering::SeqCst),
        1,
        "the removal hook runs exactly once"
    );
    assert_eq!(
        world.storage().component::<Health>(keep),
        Health(10),
        "other entities' data is untouched"
    );
}

#[test]
fn dense_array_stays_compact_after_removals() {
    // --- 1. SETUP ---
    let mut world = small_world();
    let entities: Vec<_> = (0..5)
        .map(|i| {
            let e = world.create_entity();
            world.add_component(e, Health(i));
            e
        })
        .collect();
    world.tick(0.0);

    // --- 2. ACTION ---
    world.remove_component::<Health>(entities[1]);
    world.remove_component::<Health>(entities[3]);
    world.tick(0.0);

    // --- 3. ASSERTIONS ---
    let handle = world.storage().array::<Health>();
    let array = handle.read().unwrap();
    assert_eq!(array.len(), 3);

    // The slot map must be a bijection between live holders and [0, len).
    let mut seen_slots: Vec<usize> = array.slot_map().values().copied().collect();
    seen_slots.sort_unstable();
    assert_eq!(seen_slots, vec![0, 1, 2], "slots must be contiguous");
    for (&index, &slot) in array.slot_map() {
        assert_eq!(
            array.entities()[slot].index,
            index,
            "slot map and entity list must agree"
        );
    }
}

#[test]
fn subscription_updates_are_incremental_on_delete() {
    let mut world = small_world();
    let ids = new_id_vector();
    let removed = Arc::new(AtomicUsize::new(0));
    let removed_counter = removed.clone();
    world.subscribe_to_entities(
        "observer",
        EntitySubscriptionRegistration::new(
            ids.clone(),
            vec![
                ComponentAccess::of::<Position>(Permission::R),
                ComponentAccess::of::<Health>(Permission::NDA),
            ],
        )
        .with_removal_callback(Box::new(move |_| {
            removed_counter.fetch_add(1, Ordering::SeqCst);
        })),
    );

    let entity = world.create_entity();
    world.add_component(entity, Position { x: 0.0, y: 0.0, z: 0.0 });
    world.add_component(entity, Health(5));
    world.tick(0.0);
    assert_eq!(*ids.read().unwrap(), vec![entity]);

    // Dropping one declared type removes the entity from the cache and
    // fires the removal callback.
    world.remove_component::<Health>(entity);
    world.tick(0.0);
    assert!(ids.read().unwrap().is_empty());
    assert_eq!(removed.load(Ordering::SeqCst), 1);
}

#[test]
fn unsubscribe_clears_bookkeeping() {
    let mut world = small_world();
    let ids = new_id_vector();
    let subscription = world.subscribe_to_entities(
        "short-lived",
        EntitySubscriptionRegistration::new(
            ids.clone(),
            vec![ComponentAccess::of::<Health>(Permission::R)],
        ),
    );

    let entity = world.create_entity();
    world.add_component(entity, Health(1));
    world.tick(0.0);
    assert_eq!(ids.read().unwrap().len(), 1);

    world.unsubscribe_from_entities(subscription);
    assert!(
        ids.read().unwrap().is_empty(),
        "teardown clears the id vector"
    );

    // Later component traffic must not resurrect the dead subscription.
    let other = world.create_entity();
    world.add_component(other, Health(2));
    world.tick(0.0);
    assert!(ids.read().unwrap().is_empty());
}

#[test]
fn component_groups_are_reusable_across_registrations() {
    let mut world = small_world();
    let player_filter = ComponentGroup::new(
        "player-filter",
        vec![
            ComponentAccess::of::<PlayerTag>(Permission::NDA),
            ComponentAccess::of::<Position>(Permission::R),
        ],
    );

    let with_health = new_id_vector();
    let with_velocity = new_id_vector();
    world.subscribe_to_entities(
        "health-view",
        EntitySubscriptionRegistration::new(
            with_health.clone(),
            vec![ComponentAccess::of::<Health>(Permission::R)],
        )
        .with_group(player_filter.clone()),
    );
    world.subscribe_to_entities(
        "velocity-view",
        EntitySubscriptionRegistration::new(
            with_velocity.clone(),
            vec![ComponentAccess::of::<Velocity>(Permission::R)],
        )
        .with_group(player_filter),
    );

    let player = world.create_entity();
    world.add_component(player, PlayerTag);
    world.add_component(player, Position { x: 1.0, y: 2.0, z: 3.0 });
    world.add_component(player, Health(50));
    world.tick(0.0);

    assert_eq!(*with_health.read().unwrap(), vec![player]);
    assert!(
        with_velocity.read().unwrap().is_empty(),
        "the group alone is not sufficient without the direct accesses"
    );
}

#[test]
#[should_panic(expected = "conflicting permissions")]
fn conflicting_permissions_in_one_registration_panic() {
    let mut world = small_world();
    world.subscribe_to_entities(
        "broken",
        EntitySubscriptionRegistration::new(
            new_id_vector(),
            vec![
                ComponentAccess::of::<Health>(Permission::R),
                ComponentAccess::of::<Health>(Permission::RW),
            ],
        ),
    );
}

#[test]
#[should_panic(expected = "has no component")]
fn missing_component_access_panics() {
    let world = small_world();
    let entity = world.create_entity();
    world.storage().with_component::<Health, _>(entity, |h| h.0);
}

struct MovementSystem {
    matched: super::publisher::IdVectorHandle,
}

impl System for MovementSystem {
    fn tick(&mut self, ctx: &TickContext) {
        let positions = ctx.storage().array::<Position>();
        let velocities = ctx.storage().array::<Velocity>();
        let mut positions = positions.write().unwrap();
        let velocities = velocities.read().unwrap();
        for &entity in self.matched.read().unwrap().iter() {
            let vel = *velocities.component(entity);
            let pos = positions.component_mut(entity);
            pos.x += vel.x * ctx.delta_time();
            pos.y += vel.y * ctx.delta_time();
            pos.z += vel.z * ctx.delta_time();
        }
    }
}

#[test]
fn movement_scenario_advances_position_by_velocity() {
    init_logs();

    // --- 1. SETUP ---
    let mut world = small_world();
    let entity = world.create_entity();
    world.add_component(entity, Position { x: 0.0, y: 0.0, z: 0.0 });
    world.add_component(entity, Velocity { x: 1.0, y: 0.0, z: 0.0 });

    let matched = new_id_vector();
    world.register_system(
        "movement",
        SystemRegistration::new(
            0,
            vec![EntitySubscriptionRegistration::new(
                matched.clone(),
                vec![
                    ComponentAccess::of::<Position>(Permission::RW),
                    ComponentAccess::of::<Velocity>(Permission::R),
                ],
            )],
        ),
        Box::new(MovementSystem { matched: matched.clone() }),
    );

    // --- 2. ACTION ---
    world.tick(1.0);

    // --- 3. ASSERTIONS ---
    assert_eq!(
        world.storage().component::<Position>(entity),
        Position { x: 1.0, y: 0.0, z: 0.0 },
        "one tick of dt=1 advances the position by the velocity"
    );
}

#[test]
fn conflicting_jobs_are_never_in_flight_together() {
    // --- 1. SETUP ---
    let mut world = small_world();
    let entity = world.create_entity();
    world.add_component(entity, Health(0));
    world.tick(0.0);

    let in_flight = Arc::new(AtomicUsize::new(0));
    let violated = Arc::new(AtomicBool::new(false));

    for name in ["writer-a", "writer-b"] {
        let in_flight = in_flight.clone();
        let violated = violated.clone();
        world.schedule_regular_job(
            Job::new(
                name,
                vec![ComponentAccess::of::<Health>(Permission::RW)],
                move |ctx: &TickContext| {
                    if in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
                        violated.store(true, Ordering::SeqCst);
                    }
                    ctx.storage()
                        .with_component_mut::<Health, _>(entity, |h| h.0 += 1);
                    std::thread::sleep(std::time::Duration::from_millis(5));
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                },
            ),
            0,
        );
    }

    // --- 2. ACTION ---
    for _ in 0..10 {
        world.tick(0.016);
    }

    // --- 3. ASSERTIONS ---
    assert!(
        !violated.load(Ordering::SeqCst),
        "two RW jobs on the same component type must never overlap"
    );
    assert_eq!(
        world.storage().component::<Health>(entity),
        Health(20),
        "both jobs ran every frame"
    );
}

#[test]
fn one_shot_jobs_bracket_the_phases() {
    // --- 1. SETUP ---
    let mut world = small_world();
    let order = Arc::new(std::sync::Mutex::new(Vec::<&'static str>::new()));

    let log = order.clone();
    world.schedule_regular_job(
        Job::new("regular", Vec::new(), move |_: &TickContext| {
            log.lock().unwrap().push("regular");
        }),
        0,
    );
    let log = order.clone();
    world.schedule_job_asap(Job::new("asap", Vec::new(), move |_: &TickContext| {
        log.lock().unwrap().push("asap");
    }));
    let log = order.clone();
    world.schedule_job_post_frame(Job::new("post", Vec::new(), move |_: &TickContext| {
        log.lock().unwrap().push("post");
    }));

    // --- 2. ACTION ---
    world.tick(0.0);

    // --- 3. ASSERTIONS ---
    assert_eq!(
        *order.lock().unwrap(),
        vec!["asap", "regular", "post"],
        "ASAP runs before phase 0, post-frame after the last phase"
    );

    // One-shots do not repeat.
    world.tick(0.0);
    assert_eq!(
        *order.lock().unwrap(),
        vec!["asap", "regular", "post", "regular"]
    );
}

#[test]
fn descheduled_job_stops_running() {
    let mut world = small_world();
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();
    let id = world.schedule_regular_job(
        Job::new("counting", Vec::new(), move |_: &TickContext| {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
        0,
    );

    world.tick(0.0);
    assert!(world.deschedule_regular_job(id));
    world.tick(0.0);

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(
        !world.deschedule_regular_job(id),
        "descheduling twice reports the id as unknown"
    );
}

#[test]
fn phases_run_in_ascending_order() {
    let mut world = small_world();
    let order = Arc::new(std::sync::Mutex::new(Vec::<u32>::new()));
    // Registered out of phase order on purpose.
    for phase in [2u32, 0, 1] {
        let log = order.clone();
        world.schedule_regular_job(
            Job::new("phase-probe", Vec::new(), move |_: &TickContext| {
                log.lock().unwrap().push(phase);
            }),
            phase,
        );
    }

    world.tick(0.0);
    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
}

#[test]
fn registry_pages_isolate_hide_and_restore() {
    // --- 1. SETUP ---
    let mut world = small_world();
    let ids = new_id_vector();
    world.subscribe_to_entities(
        "observer",
        EntitySubscriptionRegistration::new(
            ids.clone(),
            vec![ComponentAccess::of::<Health>(Permission::R)],
        ),
    );

    let base_entity = world.create_entity();
    world.add_component(base_entity, Health(1));
    world.tick(0.0);

    // --- 2. ACTION: push a page and populate it ---
    world.add_registry_page();
    let paged_entity = world.create_entity();
    world.add_component(paged_entity, Health(2));
    world.tick(0.0);

    let mut cached = ids.read().unwrap().clone();
    cached.sort_by_key(|e| e.index);
    assert_eq!(cached, vec![base_entity, paged_entity]);

    // --- 3. HIDE: the page's entities leave the caches without destruction ---
    world.deregister_top_registry_page();
    assert_eq!(
        *ids.read().unwrap(),
        vec![base_entity],
        "hidden entities leave every id vector"
    );
    assert!(
        world.storage().has_component::<Health>(paged_entity),
        "hiding must not destroy component data"
    );
    assert!(!world.is_alive(paged_entity), "hidden entities are not live");

    // --- 4. RESTORE ---
    world.reinstate_top_registry_page();
    let mut cached = ids.read().unwrap().clone();
    cached.sort_by_key(|e| e.index);
    assert_eq!(cached, vec![base_entity, paged_entity]);
    assert!(world.is_alive(paged_entity));
}

#[test]
fn deleting_a_page_destroys_its_entities_exactly_once() {
    // --- 1. SETUP ---
    let mut world = small_world();
    let hook_runs = Arc::new(AtomicUsize::new(0));
    let counter = hook_runs.clone();
    world.storage().set_removal_hook::<Health>(Box::new(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    let survivor = world.create_entity();
    world.add_component(survivor, Health(1));

    world.add_registry_page();
    let doomed = world.create_entity();
    world.add_component(doomed, Health(2));
    world.tick(0.0);

    // --- 2. ACTION ---
    world.delete_top_registry_page();

    // --- 3. ASSERTIONS ---
    assert_eq!(
        hook_runs.load(Ordering::SeqCst),
        1,
        "only the page's entities are destroyed, exactly once each"
    );
    assert!(!world.storage().has_component::<Health>(doomed));
    assert!(!world.is_alive(doomed));
    assert!(world.is_alive(survivor));
    assert_eq!(world.storage().component::<Health>(survivor), Health(1));
}

#[test]
#[should_panic(expected = "cannot delete the base page")]
fn deleting_the_base_page_panics() {
    let mut world = small_world();
    world.delete_top_registry_page();
}

#[test]
fn snapshot_round_trips_and_dry_run_sizes_match() {
    init_logs();

    // --- 1. SETUP ---
    let mut world = small_world();
    let source = world.create_entity();
    world.add_component(source, Position { x: 1.5, y: -2.0, z: 8.25 });
    world.add_component(source, Health(77));
    world.tick(0.0);

    // --- 2. ACTION: probe, serialize, restore onto a fresh entity ---
    let required = world.serialize_entity(source, &mut []);
    let mut buf = vec![0u8; required as usize];
    let written = world.serialize_entity(source, &mut buf);
    assert_eq!(
        written, required,
        "the dry run must return exactly the size a full serialization consumes"
    );

    let target = world.create_entity();
    world
        .deserialize_entity(target, &buf)
        .expect("snapshot decodes cleanly");

    // --- 3. ASSERTIONS ---
    assert_eq!(
        world.storage().component::<Position>(target),
        Position { x: 1.5, y: -2.0, z: 8.25 }
    );
    assert_eq!(world.storage().component::<Health>(target), Health(77));

    // Restored components publish like any other addition.
    let ids = new_id_vector();
    world.subscribe_to_entities(
        "observer",
        EntitySubscriptionRegistration::new(
            ids.clone(),
            vec![ComponentAccess::of::<Health>(Permission::R)],
        ),
    );
    let mut cached = ids.read().unwrap().clone();
    cached.sort_by_key(|e| e.index);
    assert_eq!(cached, vec![source, target]);
}

#[test]
fn snapshot_header_is_little_endian_and_framed() {
    let mut world = small_world();
    let entity = world.create_entity();
    world.add_component(entity, Health(9));
    world.tick(0.0);

    let required = world.serialize_entity(entity, &mut []);
    let mut buf = vec![0u8; required as usize];
    world.serialize_entity(entity, &mut buf);

    assert_eq!(
        u32::from_le_bytes(buf[0..4].try_into().unwrap()),
        required,
        "total size field includes the header"
    );
    assert_eq!(
        u32::from_le_bytes(buf[4..8].try_into().unwrap()),
        entity.index,
        "entity field carries the 32-bit index"
    );
    assert_eq!(
        u32::from_le_bytes(buf[8..12].try_into().unwrap()),
        1,
        "one component serialized"
    );
    let component_size = u32::from_le_bytes(buf[12..16].try_into().unwrap());
    assert_eq!(
        required,
        12 + component_size,
        "component size includes its 8-byte sub-header"
    );
}

#[test]
fn truncated_snapshot_is_rejected() {
    let mut world = small_world();
    let entity = world.create_entity();
    world.add_component(entity, Health(9));
    world.tick(0.0);

    let required = world.serialize_entity(entity, &mut []);
    let mut buf = vec![0u8; required as usize];
    world.serialize_entity(entity, &mut buf);
    buf.truncate(buf.len() - 1);

    let target = world.create_entity();
    let err = world.deserialize_entity(target, &buf).unwrap_err();
    assert!(
        matches!(err, super::SerializationError::TruncatedBuffer { .. }),
        "unexpected error: {err}"
    );
}

#[test]
fn snapshot_of_dead_target_is_rejected() {
    let mut world = small_world();
    let entity = world.create_entity();
    world.add_component(entity, Health(9));
    world.tick(0.0);

    let required = world.serialize_entity(entity, &mut []);
    let mut buf = vec![0u8; required as usize];
    world.serialize_entity(entity, &mut buf);

    let target = world.create_entity();
    world.remove_entity(target);
    world.tick(0.0);

    let err = world.deserialize_entity(target, &buf).unwrap_err();
    assert!(matches!(err, super::SerializationError::DeadEntity { .. }));
}

#[test]
fn entity_deletion_purges_components_and_caches() {
    let mut world = small_world();
    let ids = new_id_vector();
    world.subscribe_to_entities(
        "observer",
        EntitySubscriptionRegistration::new(
            ids.clone(),
            vec![ComponentAccess::of::<Health>(Permission::R)],
        ),
    );

    let entity = world.create_entity();
    world.add_component(entity, Health(3));
    world.tick(0.0);
    assert_eq!(ids.read().unwrap().len(), 1);

    world.remove_entity(entity);
    world.tick(0.0);

    assert!(ids.read().unwrap().is_empty());
    assert!(!world.storage().has_component::<Health>(entity));
    assert!(!world.is_alive(entity));
}

struct FixedCounter {
    fixed_runs: Arc<AtomicUsize>,
}

impl System for FixedCounter {
    fn tick(&mut self, _ctx: &TickContext) {}

    fn fixed_tick(&mut self, _ctx: &TickContext) {
        self.fixed_runs.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn fixed_tick_drives_systems_serially() {
    let mut world = small_world();
    let fixed_runs = Arc::new(AtomicUsize::new(0));
    // The system still needs a live subscription to be a valid registration.
    world.register_system(
        "fixed-counter",
        SystemRegistration::new(
            0,
            vec![EntitySubscriptionRegistration::new(
                new_id_vector(),
                vec![ComponentAccess::of::<Health>(Permission::NDA)],
            )],
        ),
        Box::new(FixedCounter {
            fixed_runs: fixed_runs.clone(),
        }),
    );

    world.fixed_tick(0.02);
    world.fixed_tick(0.02);
    assert_eq!(fixed_runs.load(Ordering::SeqCst), 2);
}

#[test]
fn deregistered_system_stops_ticking_and_unsubscribes() {
    let mut world = small_world();
    let matched = new_id_vector();
    let id = world.register_system(
        "movement",
        SystemRegistration::new(
            0,
            vec![EntitySubscriptionRegistration::new(
                matched.clone(),
                vec![
                    ComponentAccess::of::<Position>(Permission::RW),
                    ComponentAccess::of::<Velocity>(Permission::R),
                ],
            )],
        ),
        Box::new(MovementSystem { matched: matched.clone() }),
    );

    let entity = world.create_entity();
    world.add_component(entity, Position { x: 0.0, y: 0.0, z: 0.0 });
    world.add_component(entity, Velocity { x: 1.0, y: 0.0, z: 0.0 });
    world.tick(1.0);
    assert_eq!(
        world.storage().component::<Position>(entity).x,
        1.0
    );

    world.deregister_system(id);
    assert!(matched.read().unwrap().is_empty());

    world.tick(1.0);
    assert_eq!(
        world.storage().component::<Position>(entity).x,
        1.0,
        "a deregistered system must not run"
    );
}
