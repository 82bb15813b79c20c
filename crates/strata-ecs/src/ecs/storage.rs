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

//! Typed component storage with deferred registration and removal.
//!
//! One dense [`ComponentArray`] exists per component type, exclusively owned
//! by [`ComponentStorage`] behind a type-erased map and borrowed by callers
//! through an `RwLock`. Adding a component writes the value immediately, so
//! reads on the same thread observe it within the same frame, but the
//! *registration* (the act of becoming visible to subscribers) and every
//! removal are enqueued and processed at the start-of-tick sync point. The
//! backlog mutexes protect only the queues themselves; critical sections
//! stay O(1).

use crate::ecs::component::{Component, ComponentDescriptor};
use crate::ecs::error::SerializationError;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use strata_core::{ComponentTypeHash, Entity};

/// Hook run for each component instance destroyed through the ECS lifecycle
/// (entity deletion, deferred removal, page deletion). The component-level
/// analogue of a destructor.
pub type RemovalHook<T> = Box<dyn Fn(Entity, &mut T) + Send + Sync>;

/// Dense, contiguous storage of one component type.
///
/// Insertion order carries no meaning; removal is O(1) via swap-with-last.
/// The entity-to-slot map is a bijection between entities holding `T` and
/// the contiguous slots `[0, len)`.
pub struct ComponentArray<T: Component> {
    entries: Vec<T>,
    entities: Vec<Entity>,
    slot_of: HashMap<u32, usize>,
    removal_hook: Option<RemovalHook<T>>,
}

impl<T: Component> Default for ComponentArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> ComponentArray<T> {
    /// Creates an empty array.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            entities: Vec::new(),
            slot_of: HashMap::new(),
            removal_hook: None,
        }
    }

    /// Resolves the slot for a handle, checking the full id. A stale handle
    /// whose index has been recycled to a newer generation misses instead of
    /// aliasing the current holder's slot.
    fn slot(&self, entity: Entity) -> Option<usize> {
        let &slot = self.slot_of.get(&entity.index)?;
        (self.entities[slot] == entity).then_some(slot)
    }

    /// Inserts or replaces the component for an entity.
    ///
    /// A write through a handle older than the index's current holder is
    /// dropped: the stale owner is dead, and its leftover writes must not
    /// reach the entity that recycled the index.
    pub fn insert(&mut self, entity: Entity, value: T) {
        if let Some(&slot) = self.slot_of.get(&entity.index) {
            if entity.generation < self.entities[slot].generation {
                log::warn!(
                    "dropping write of '{}' through stale handle {entity}",
                    std::any::type_name::<T>()
                );
                return;
            }
            self.entries[slot] = value;
            self.entities[slot] = entity;
        } else {
            self.slot_of.insert(entity.index, self.entries.len());
            self.entries.push(value);
            self.entities.push(entity);
        }
    }

    /// Removes the component for an entity, running the removal hook.
    ///
    /// Returns `true` if a component was removed. Removing an entity that
    /// holds no `T` (including through a stale handle) is a no-op, which is
    /// what makes deferred removal idempotent within a tick.
    pub fn remove(&mut self, entity: Entity) -> bool {
        let Some(slot) = self.slot(entity) else {
            return false;
        };
        self.slot_of.remove(&entity.index);

        if let Some(hook) = &self.removal_hook {
            hook(entity, &mut self.entries[slot]);
        }

        // Swap-with-last keeps the array dense; the moved entity's slot
        // mapping is repaired afterwards.
        self.entries.swap_remove(slot);
        self.entities.swap_remove(slot);
        if slot < self.entities.len() {
            let moved = self.entities[slot];
            self.slot_of.insert(moved.index, slot);
        }
        true
    }

    /// Whether the entity holds this component.
    pub fn has(&self, entity: Entity) -> bool {
        self.slot(entity).is_some()
    }

    /// Returns the component for an entity, if present.
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.slot(entity).map(|slot| &self.entries[slot])
    }

    /// Mutable variant of [`ComponentArray::get`].
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let slot = self.slot(entity)?;
        Some(&mut self.entries[slot])
    }

    /// Returns the component for an entity.
    ///
    /// # Panics
    /// If the entity does not hold this component; requesting data that was
    /// never added is a programmer error.
    pub fn component(&self, entity: Entity) -> &T {
        self.get(entity).unwrap_or_else(|| {
            panic!(
                "entity {entity} has no component '{}'",
                std::any::type_name::<T>()
            )
        })
    }

    /// Mutable variant of [`ComponentArray::component`].
    pub fn component_mut(&mut self, entity: Entity) -> &mut T {
        if !self.has(entity) {
            panic!(
                "entity {entity} has no component '{}'",
                std::any::type_name::<T>()
            );
        }
        self.get_mut(entity).unwrap()
    }

    /// Number of stored components.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the array is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(entity, component)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.entries.iter())
    }

    /// Mutable variant of [`ComponentArray::iter`].
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.entities.iter().copied().zip(self.entries.iter_mut())
    }

    /// The entities currently holding this component.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Installs the removal hook for this component type.
    pub fn set_removal_hook(&mut self, hook: RemovalHook<T>) {
        self.removal_hook = Some(hook);
    }

    #[cfg(test)]
    pub(crate) fn slot_map(&self) -> &HashMap<u32, usize> {
        &self.slot_of
    }
}

/// Shared handle to one component array; jobs lock it for the duration of
/// their iteration.
pub type ArrayHandle<T> = Arc<RwLock<ComponentArray<T>>>;

/// Internal type-erased view over a [`ComponentArray`], the ECS analogue of
/// a `Box<dyn Any>` column: concrete operations needed at sync points and in
/// the serialization path, without knowing `T`.
pub(crate) trait AnyComponentArray: Send + Sync {
    /// Casts to `&dyn Any` so the call site can downcast to the concrete
    /// holder and recover the typed handle.
    fn as_any(&self) -> &dyn Any;

    /// The static descriptor of the stored component type.
    fn descriptor(&self) -> ComponentDescriptor;

    /// Whether the entity holds this component.
    fn has_entity(&self, entity: Entity) -> bool;

    /// Removes the entity's component, running the removal hook.
    fn remove_entity(&self, entity: Entity) -> bool;

    /// Number of stored components.
    fn entity_count(&self) -> usize;

    /// Snapshot of the entities currently holding this component.
    fn entity_list(&self) -> Vec<Entity>;

    /// Encodes the entity's component payload, if present.
    fn serialize_component(&self, entity: Entity) -> Option<Vec<u8>>;

    /// Decodes a payload and writes it for the entity.
    fn deserialize_component(&self, entity: Entity, bytes: &[u8])
        -> Result<(), SerializationError>;
}

struct SharedArray<T: Component> {
    inner: ArrayHandle<T>,
}

impl<T: Component> AnyComponentArray for SharedArray<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn descriptor(&self) -> ComponentDescriptor {
        ComponentDescriptor::of::<T>()
    }

    fn has_entity(&self, entity: Entity) -> bool {
        self.inner.read().unwrap().has(entity)
    }

    fn remove_entity(&self, entity: Entity) -> bool {
        self.inner.write().unwrap().remove(entity)
    }

    fn entity_count(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    fn entity_list(&self) -> Vec<Entity> {
        self.inner.read().unwrap().entities().to_vec()
    }

    fn serialize_component(&self, entity: Entity) -> Option<Vec<u8>> {
        let array = self.inner.read().unwrap();
        let value = array.get(entity)?;
        Some(
            bincode::encode_to_vec(value, bincode::config::standard())
                .expect("component encoding is infallible for in-memory targets"),
        )
    }

    fn deserialize_component(
        &self,
        entity: Entity,
        bytes: &[u8],
    ) -> Result<(), SerializationError> {
        let (value, _) = bincode::decode_from_slice::<T, _>(bytes, bincode::config::standard())
            .map_err(|err| SerializationError::ComponentDecode {
                type_name: std::any::type_name::<T>(),
                details: err.to_string(),
            })?;
        self.inner.write().unwrap().insert(entity, value);
        Ok(())
    }
}

/// A deferred mutation recorded during a phase and applied at the next sync
/// point.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PendingOp {
    pub entity: Entity,
    pub type_id: TypeId,
}

/// Owns every component array and the deferred-mutation backlogs.
pub struct ComponentStorage {
    /// Type-erased array per component type. The outer lock guards only the
    /// map shape (first-touch registration); each array has its own lock.
    arrays: RwLock<HashMap<TypeId, Box<dyn AnyComponentArray>>>,
    /// Stable wire hash to runtime id, for snapshot decoding.
    hash_index: RwLock<HashMap<ComponentTypeHash, TypeId>>,
    /// Components added during a phase, awaiting publication to subscribers.
    registration_backlog: Mutex<Vec<PendingOp>>,
    /// Components queued for removal at the next sync point.
    deletion_backlog: Mutex<Vec<PendingOp>>,
}

impl Default for ComponentStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self {
            arrays: RwLock::new(HashMap::new()),
            hash_index: RwLock::new(HashMap::new()),
            registration_backlog: Mutex::new(Vec::new()),
            deletion_backlog: Mutex::new(Vec::new()),
        }
    }

    /// Returns the shared array for `T`, creating it on first touch.
    ///
    /// The write lock is taken only on the first registration of a type;
    /// every later call is a read-lock lookup plus an `Arc` clone.
    pub fn array<T: Component>(&self) -> ArrayHandle<T> {
        let type_id = TypeId::of::<T>();
        {
            let arrays = self.arrays.read().unwrap();
            if let Some(erased) = arrays.get(&type_id) {
                return Self::downcast_handle::<T>(erased.as_ref());
            }
        }
        self.register_component_type::<T>();
        let arrays = self.arrays.read().unwrap();
        Self::downcast_handle::<T>(arrays[&type_id].as_ref())
    }

    fn downcast_handle<T: Component>(erased: &dyn AnyComponentArray) -> ArrayHandle<T> {
        erased
            .as_any()
            .downcast_ref::<SharedArray<T>>()
            .expect("array map entry has mismatched component type")
            .inner
            .clone()
    }

    /// Registers the array for `T` if it does not exist yet.
    pub fn register_component_type<T: Component>(&self) {
        let descriptor = ComponentDescriptor::of::<T>();
        let mut arrays = self.arrays.write().unwrap();
        if arrays.contains_key(&descriptor.type_id) {
            return;
        }

        let mut hashes = self.hash_index.write().unwrap();
        if let Some(existing) = hashes.get(&descriptor.type_hash) {
            // Two distinct types hashing to one wire id would make snapshots
            // ambiguous; refuse to run.
            assert!(
                *existing == descriptor.type_id,
                "component type hash collision on {:#010x} ('{}')",
                descriptor.type_hash,
                descriptor.type_name
            );
        }
        hashes.insert(descriptor.type_hash, descriptor.type_id);
        arrays.insert(
            descriptor.type_id,
            Box::new(SharedArray::<T> {
                inner: Arc::new(RwLock::new(ComponentArray::new())),
            }),
        );
        log::debug!(
            "registered component type '{}' ({:#010x})",
            descriptor.type_name,
            descriptor.type_hash
        );
    }

    /// Installs a removal hook for `T`, creating the array if needed.
    pub fn set_removal_hook<T: Component>(&self, hook: RemovalHook<T>) {
        self.array::<T>().write().unwrap().set_removal_hook(hook);
    }

    /// Writes the component immediately and enqueues its registration.
    ///
    /// The value is visible to direct accessors on this thread right away;
    /// subscription id vectors only pick the entity up at the next tick's
    /// sync point, because publishing means mutating lists that concurrently
    /// running jobs may be iterating.
    ///
    /// Must not be called while holding a borrow of the same component
    /// array; the immediate write takes the array's write lock.
    pub fn add_component<T: Component>(&self, entity: Entity, value: T) {
        self.array::<T>().write().unwrap().insert(entity, value);
        self.registration_backlog.lock().unwrap().push(PendingOp {
            entity,
            type_id: TypeId::of::<T>(),
        });
    }

    /// Type-erased registration enqueue, used by snapshot restore so
    /// deserialized components become visible like any other addition.
    pub(crate) fn enqueue_registration_dyn(&self, entity: Entity, type_id: TypeId) {
        self.registration_backlog
            .lock()
            .unwrap()
            .push(PendingOp { entity, type_id });
    }

    /// Enqueues a component removal for the next sync point.
    pub fn remove_component<T: Component>(&self, entity: Entity) {
        self.deletion_backlog.lock().unwrap().push(PendingOp {
            entity,
            type_id: TypeId::of::<T>(),
        });
    }

    /// Runs `f` on the entity's component.
    ///
    /// # Panics
    /// If the entity does not hold `T`.
    pub fn with_component<T: Component, R>(&self, entity: Entity, f: impl FnOnce(&T) -> R) -> R {
        let handle = self.array::<T>();
        let array = handle.read().unwrap();
        f(array.component(entity))
    }

    /// Mutable variant of [`ComponentStorage::with_component`].
    pub fn with_component_mut<T: Component, R>(
        &self,
        entity: Entity,
        f: impl FnOnce(&mut T) -> R,
    ) -> R {
        let handle = self.array::<T>();
        let mut array = handle.write().unwrap();
        f(array.component_mut(entity))
    }

    /// Runs `f` on the entity's component if present; absence of an optional
    /// component is an expected runtime state, not an error.
    pub fn with_component_if<T: Component, R>(
        &self,
        entity: Entity,
        f: impl FnOnce(&T) -> R,
    ) -> Option<R> {
        let handle = self.array::<T>();
        let array = handle.read().unwrap();
        array.get(entity).map(f)
    }

    /// Returns a copy of the entity's component.
    ///
    /// # Panics
    /// If the entity does not hold `T`.
    pub fn component<T: Component + Clone>(&self, entity: Entity) -> T {
        self.with_component::<T, T>(entity, T::clone)
    }

    /// Whether the entity holds `T`.
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.has_component_dyn(entity, TypeId::of::<T>())
    }

    /// Type-erased presence check.
    pub fn has_component_dyn(&self, entity: Entity, type_id: TypeId) -> bool {
        let arrays = self.arrays.read().unwrap();
        arrays
            .get(&type_id)
            .is_some_and(|array| array.has_entity(entity))
    }

    /// Whether the entity holds every component type in the access list.
    pub(crate) fn entity_matches(
        &self,
        entity: Entity,
        accesses: &[crate::ecs::access::ComponentAccess],
    ) -> bool {
        let arrays = self.arrays.read().unwrap();
        accesses.iter().all(|access| {
            arrays
                .get(&access.type_id)
                .is_some_and(|array| array.has_entity(entity))
        })
    }

    /// Candidate entities for an initial subscription fill: the member list
    /// of the rarest declared type. Every match must hold all declared
    /// types, so scanning the smallest array suffices. Returns an empty list
    /// if any declared type has no array yet.
    pub(crate) fn candidate_entities(
        &self,
        accesses: &[crate::ecs::access::ComponentAccess],
    ) -> Vec<Entity> {
        let arrays = self.arrays.read().unwrap();
        let mut rarest: Option<&dyn AnyComponentArray> = None;
        for access in accesses {
            let Some(array) = arrays.get(&access.type_id) else {
                return Vec::new();
            };
            if rarest.map_or(true, |best| array.entity_count() < best.entity_count()) {
                rarest = Some(array.as_ref());
            }
        }
        rarest.map_or_else(Vec::new, |array| array.entity_list())
    }

    /// Swaps out the registration backlog for sync-point processing.
    pub(crate) fn drain_registrations(&self) -> Vec<PendingOp> {
        std::mem::take(&mut *self.registration_backlog.lock().unwrap())
    }

    /// Swaps out the deletion backlog for sync-point processing.
    pub(crate) fn drain_deletions(&self) -> Vec<PendingOp> {
        std::mem::take(&mut *self.deletion_backlog.lock().unwrap())
    }

    /// Removes one component at the sync point. Returns `true` if a
    /// component was actually removed (hooks have run).
    pub(crate) fn apply_deletion(&self, op: PendingOp) -> bool {
        let arrays = self.arrays.read().unwrap();
        arrays
            .get(&op.type_id)
            .is_some_and(|array| array.remove_entity(op.entity))
    }

    /// Purges every component the entity still holds, running removal hooks.
    /// Returns the affected type ids so the publisher can be updated.
    pub(crate) fn purge_entity(&self, entity: Entity) -> Vec<TypeId> {
        let arrays = self.arrays.read().unwrap();
        let mut removed = Vec::new();
        for (&type_id, array) in arrays.iter() {
            if array.remove_entity(entity) {
                removed.push(type_id);
            }
        }
        removed
    }

    /// The component types the entity currently holds, with stable ordering
    /// by wire hash so snapshots are deterministic.
    pub(crate) fn component_types_of(&self, entity: Entity) -> Vec<ComponentDescriptor> {
        let arrays = self.arrays.read().unwrap();
        let mut descriptors: Vec<ComponentDescriptor> = arrays
            .values()
            .filter(|array| array.has_entity(entity))
            .map(|array| array.descriptor())
            .collect();
        descriptors.sort_by_key(|d| d.type_hash);
        descriptors
    }

    /// Resolves a wire hash back to a runtime type id.
    pub(crate) fn type_id_for_hash(&self, hash: ComponentTypeHash) -> Option<TypeId> {
        self.hash_index.read().unwrap().get(&hash).copied()
    }

    /// Type-erased payload encode for the serialization path.
    pub(crate) fn serialize_component_dyn(
        &self,
        entity: Entity,
        type_id: TypeId,
    ) -> Option<Vec<u8>> {
        let arrays = self.arrays.read().unwrap();
        arrays.get(&type_id)?.serialize_component(entity)
    }

    /// Type-erased payload decode for the deserialization path.
    pub(crate) fn deserialize_component_dyn(
        &self,
        entity: Entity,
        type_id: TypeId,
        bytes: &[u8],
    ) -> Result<(), SerializationError> {
        let arrays = self.arrays.read().unwrap();
        arrays
            .get(&type_id)
            .expect("hash index and array map are updated together")
            .deserialize_component(entity, bytes)
    }

    /// Convenience read guard over the array for `T`.
    ///
    /// The guard borrows the `Arc` handle, so most callers want
    /// [`ComponentStorage::array`] and an explicit lock instead; this is for
    /// single-expression reads.
    pub fn read_array<T: Component>(&self) -> ArrayGuard<T> {
        ArrayGuard {
            handle: self.array::<T>(),
        }
    }
}

/// Owning wrapper that keeps the array handle alive while reading.
pub struct ArrayGuard<T: Component> {
    handle: ArrayHandle<T>,
}

impl<T: Component> ArrayGuard<T> {
    /// Locks the array for shared reading.
    pub fn read(&self) -> RwLockReadGuard<'_, ComponentArray<T>> {
        self.handle.read().unwrap()
    }

    /// Locks the array for exclusive writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, ComponentArray<T>> {
        self.handle.write().unwrap()
    }
}
