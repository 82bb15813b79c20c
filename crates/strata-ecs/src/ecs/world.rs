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

//! The `EcsWorld` façade tying the registry, storage, publisher, and
//! scheduler together and driving one tick of the simulation.
//!
//! There is no global instance: the world is constructed explicitly at
//! startup and passed by reference to every subsystem, which preserves
//! single-writer semantics without hidden global state.

use crate::ecs::component::Component;
use crate::ecs::error::SerializationError;
use crate::ecs::publisher::{EntityPublisher, IdVectorHandle, SubscriptionId};
use crate::ecs::registry::EntityRegistry;
use crate::ecs::scheduler::{Job, JobId, JobScheduler, OneShotQueues, SchedulerConfig};
use crate::ecs::serialization;
use crate::ecs::storage::ComponentStorage;
use crate::ecs::system::{EntitySubscriptionRegistration, System, SystemRegistration};
use crate::ecs::{access::ComponentAccess, publisher};
use std::sync::{Arc, Mutex};
use strata_core::Entity;

/// The view of the world a job sees while a phase is running.
///
/// Entity creation is immediate; entity removal and component
/// addition/removal are buffered and applied at the next tick's sync point,
/// so nothing a job does here can tear the id vectors or component arrays
/// another job is iterating.
pub struct TickContext<'a> {
    registry: &'a EntityRegistry,
    storage: &'a ComponentStorage,
    queues: &'a OneShotQueues,
    delta_time: f32,
}

impl<'a> TickContext<'a> {
    /// Seconds of simulation time this tick advances.
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// The component storage; use [`ComponentStorage::array`] for bulk
    /// iteration over a declared component type.
    pub fn storage(&self) -> &'a ComponentStorage {
        self.storage
    }

    /// Allocates a new entity. The id is valid immediately; subscriptions
    /// pick it up once its components are published at the next sync point.
    pub fn create_entity(&self) -> Entity {
        self.registry.create_entity()
    }

    /// Enqueues an entity for destruction at the next sync point.
    pub fn remove_entity(&self, entity: Entity) {
        self.registry.remove_entity(entity);
    }

    /// Whether the handle refers to a live entity.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.registry.is_alive(entity)
    }

    /// Adds a component; the value is readable immediately on this thread,
    /// visible to subscribers at the next sync point.
    pub fn add_component<T: Component>(&self, entity: Entity, value: T) {
        self.storage.add_component(entity, value);
    }

    /// Enqueues a component removal for the next sync point.
    pub fn remove_component<T: Component>(&self, entity: Entity) {
        self.storage.remove_component::<T>(entity);
    }

    /// Queues a one-shot job to run before the next frame's phases.
    pub fn schedule_job_asap(&self, job: Job) {
        self.queues.push_asap(job);
    }

    /// Queues a one-shot job to run after this frame's phases.
    pub fn schedule_job_post_frame(&self, job: Job) {
        self.queues.push_post_frame(job);
    }
}

/// Handle to a registered system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SystemId(u32);

struct RegisteredSystem {
    name: String,
    system: Arc<Mutex<Box<dyn System>>>,
    subscriptions: Vec<SubscriptionId>,
    job_id: JobId,
}

/// The ECS core: entity registry, component storage, subscription publisher,
/// and job scheduler behind one façade.
pub struct EcsWorld {
    registry: EntityRegistry,
    storage: ComponentStorage,
    publisher: EntityPublisher,
    scheduler: JobScheduler,
    systems: Vec<Option<RegisteredSystem>>,
}

impl Default for EcsWorld {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl EcsWorld {
    /// Creates a world with the given scheduler configuration.
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            registry: EntityRegistry::new(),
            storage: ComponentStorage::new(),
            publisher: EntityPublisher::new(),
            scheduler: JobScheduler::new(config),
            systems: Vec::new(),
        }
    }

    /// Creates an empty id vector for a subscription registration.
    pub fn new_id_vector() -> IdVectorHandle {
        publisher::new_id_vector()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Entity Lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Allocates a new or recycled entity, assigned to the top registry page.
    pub fn create_entity(&self) -> Entity {
        self.registry.create_entity()
    }

    /// Enqueues an entity for destruction; guaranteed to have completed by
    /// the end of the current tick.
    pub fn remove_entity(&self, entity: Entity) {
        self.registry.remove_entity(entity);
    }

    /// Whether the handle refers to a live entity.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.registry.is_alive(entity)
    }

    /// The entity registry.
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// The component storage.
    pub fn storage(&self) -> &ComponentStorage {
        &self.storage
    }

    // ─────────────────────────────────────────────────────────────────────
    // Registry Pages
    // ─────────────────────────────────────────────────────────────────────

    /// Pushes a new registry page; subsequently created entities belong to it.
    pub fn add_registry_page(&mut self) {
        self.registry.add_registry_page();
    }

    /// Hides every entity in the top page without destroying it: the
    /// entities leave all id vectors, but their component data stays
    /// registered and no removal hooks run.
    pub fn deregister_top_registry_page(&mut self) {
        for entity in self.registry.deregister_top_page() {
            self.publisher.entity_removed(entity);
        }
    }

    /// Restores a previously deregistered top page: its entities re-enter
    /// every subscription they still match.
    pub fn reinstate_top_registry_page(&mut self) {
        for entity in self.registry.reinstate_top_page() {
            self.publisher.entity_restored(entity, &self.storage);
        }
    }

    /// Permanently destroys every entity in the top page and pops it.
    /// Component removal hooks run exactly once per destroyed component.
    pub fn delete_top_registry_page(&mut self) {
        for entity in self.registry.delete_top_page() {
            self.storage.purge_entity(entity);
            self.publisher.entity_removed(entity);
            self.registry.free_entity(entity);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Components
    // ─────────────────────────────────────────────────────────────────────

    /// Adds a component; readable immediately, published at the next tick.
    pub fn add_component<T: Component>(&self, entity: Entity, value: T) {
        self.storage.add_component(entity, value);
    }

    /// Enqueues a component removal for the next sync point.
    pub fn remove_component<T: Component>(&self, entity: Entity) {
        self.storage.remove_component::<T>(entity);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Systems & Subscriptions
    // ─────────────────────────────────────────────────────────────────────

    /// Registers a system: wires its subscriptions and schedules its `tick`
    /// as a regular job in the declared phase, with the union of all
    /// subscription accesses as the job's declared access set.
    pub fn register_system(
        &mut self,
        name: &str,
        registration: SystemRegistration,
        system: Box<dyn System>,
    ) -> SystemId {
        let mut job_accesses: Vec<ComponentAccess> = Vec::new();
        let mut subscriptions = Vec::new();
        for subscription in registration.subscriptions {
            for access in subscription.flattened_accesses() {
                if !job_accesses.contains(&access) {
                    job_accesses.push(access);
                }
            }
            subscriptions.push(self.subscribe_to_entities(name, subscription));
        }

        let system = Arc::new(Mutex::new(system));
        let job_system = system.clone();
        let job = Job::new(name.to_string(), job_accesses, move |ctx: &TickContext| {
            job_system.lock().unwrap().tick(ctx);
        });
        let job_id = self.scheduler.schedule_regular_job(job, registration.phase);

        let id = SystemId(self.systems.len() as u32);
        log::info!("registered system '{name}' in phase {}", registration.phase);
        self.systems.push(Some(RegisteredSystem {
            name: name.to_string(),
            system,
            subscriptions,
            job_id,
        }));
        id
    }

    /// Tears a system down: descheduled, unsubscribed, dropped.
    pub fn deregister_system(&mut self, id: SystemId) {
        let Some(registered) = self.systems[id.0 as usize].take() else {
            log::warn!("deregister_system: system {} already removed", id.0);
            return;
        };
        self.scheduler.deschedule_regular_job(registered.job_id);
        for subscription in registered.subscriptions {
            self.publisher.unsubscribe_from_entities(subscription);
        }
        log::info!("deregistered system '{}'", registered.name);
    }

    /// The raw subscription primitive beneath [`EcsWorld::register_system`],
    /// for component owners that are not systems.
    pub fn subscribe_to_entities(
        &mut self,
        owner: &str,
        registration: EntitySubscriptionRegistration,
    ) -> SubscriptionId {
        let registry = &self.registry;
        self.publisher
            .subscribe_to_entities(owner, registration, &self.storage, |entity| {
                registry.is_alive(entity)
            })
    }

    /// Removes a subscription's bookkeeping and clears its id vector.
    pub fn unsubscribe_from_entities(&mut self, id: SubscriptionId) {
        self.publisher.unsubscribe_from_entities(id);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Jobs
    // ─────────────────────────────────────────────────────────────────────

    /// Registers a job to run every frame in the given phase.
    pub fn schedule_regular_job(&mut self, job: Job, phase: u32) -> JobId {
        self.scheduler.schedule_regular_job(job, phase)
    }

    /// Removes a regular job.
    pub fn deschedule_regular_job(&mut self, id: JobId) -> bool {
        self.scheduler.deschedule_regular_job(id)
    }

    /// Queues a one-shot job to run before the next frame's phases.
    pub fn schedule_job_asap(&self, job: Job) {
        self.scheduler.schedule_job_asap(job);
    }

    /// Queues a one-shot job to run after the current frame's phases.
    pub fn schedule_job_post_frame(&self, job: Job) {
        self.scheduler.schedule_job_post_frame(job);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Tick
    // ─────────────────────────────────────────────────────────────────────

    /// Advances the simulation by one frame.
    ///
    /// Order of operations: buffered component registrations are published,
    /// buffered component deletions applied, buffered entity deletions run
    /// to completion, and only then do the scheduler's phases execute, so
    /// every job observes a single consistent snapshot for the whole tick.
    pub fn tick(&mut self, delta_time: f32) {
        self.perform_component_registrations();
        self.perform_component_deletions();
        self.perform_entity_deletions();

        let Self {
            registry,
            storage,
            scheduler,
            ..
        } = self;
        let queues = scheduler.queues();
        let ctx = TickContext {
            registry,
            storage,
            queues: queues.as_ref(),
            delta_time,
        };
        scheduler.run_frame(&ctx);
    }

    /// Drives every registered system's `fixed_tick`, serially, outside the
    /// phase machinery. Deferred mutations made here are applied at the next
    /// [`EcsWorld::tick`].
    pub fn fixed_tick(&mut self, delta_time: f32) {
        let Self {
            registry,
            storage,
            scheduler,
            systems,
            ..
        } = self;
        let queues = scheduler.queues();
        let ctx = TickContext {
            registry,
            storage,
            queues: queues.as_ref(),
            delta_time,
        };
        for registered in systems.iter().flatten() {
            registered.system.lock().unwrap().fixed_tick(&ctx);
        }
    }

    fn perform_component_registrations(&mut self) {
        for op in self.storage.drain_registrations() {
            // An entity can be added and removed within the same frame;
            // publishing it dead would leak it into id vectors.
            if self.registry.is_alive(op.entity) {
                self.publisher
                    .component_added(op.entity, op.type_id, &self.storage);
            }
        }
    }

    fn perform_component_deletions(&mut self) {
        for op in self.storage.drain_deletions() {
            if self.storage.apply_deletion(op) {
                self.publisher.component_deleted(op.entity, op.type_id);
            }
        }
    }

    fn perform_entity_deletions(&mut self) {
        for entity in self.registry.drain_removals() {
            if !self.registry.is_alive(entity) {
                continue;
            }
            self.storage.purge_entity(entity);
            self.publisher.entity_removed(entity);
            self.registry.free_entity(entity);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Snapshots
    // ─────────────────────────────────────────────────────────────────────

    /// Serializes every component the entity holds into `buf`, returning
    /// the required snapshot size. An empty buffer probes the size without
    /// writing.
    ///
    /// # Panics
    /// If the entity is not alive; snapshotting a destroyed entity is a
    /// programmer error.
    pub fn serialize_entity(&self, entity: Entity, buf: &mut [u8]) -> u32 {
        assert!(
            self.registry.is_alive(entity),
            "serialize_entity: entity {entity} is not alive"
        );
        serialization::serialize_entity(&self.storage, entity, buf)
    }

    /// Applies a snapshot to a live target entity. The restored components
    /// become visible to subscribers at the next tick.
    pub fn deserialize_entity(
        &self,
        target: Entity,
        buf: &[u8],
    ) -> Result<(), SerializationError> {
        if !self.registry.is_alive(target) {
            return Err(SerializationError::DeadEntity { entity: target });
        }
        serialization::deserialize_entity(&self.storage, target, buf)
    }
}
