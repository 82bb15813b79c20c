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

//! Incremental subscription maintenance.
//!
//! Each system subscription owns an *id vector*: the cached set of live
//! entities holding every component type the subscription declares. The
//! publisher updates these caches incrementally on every component
//! registration/deletion and on page hide/restore, re-evaluating only the
//! one affected entity against the subscriptions watching the changed type.
//! A full rescan never happens after the initial fill.
//!
//! The publisher itself is only ever mutated single-threaded, at sync points
//! or during world setup; the id vectors it writes are shared with systems
//! through an `RwLock`, read-only on their side.

use crate::ecs::access::ComponentAccess;
use crate::ecs::storage::ComponentStorage;
use crate::ecs::system::EntitySubscriptionRegistration;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use strata_core::Entity;

/// Shared handle to one subscription's entity cache.
///
/// Mutated only by the publisher; the owning system reads it during phases.
/// Ordering of the contained entities carries no meaning.
pub type IdVectorHandle = Arc<RwLock<Vec<Entity>>>;

/// Creates an empty id vector for a subscription registration.
pub fn new_id_vector() -> IdVectorHandle {
    Arc::new(RwLock::new(Vec::new()))
}

/// Callback fired when an entity leaves a subscription's id vector.
pub type EntityRemovalCallback = Box<dyn Fn(Entity) + Send + Sync>;

/// Opaque handle to one registered subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u32);

struct Subscription {
    /// Flattened accesses (explicit entries plus referenced groups).
    accesses: Vec<ComponentAccess>,
    id_vector: IdVectorHandle,
    on_entity_removal: Option<EntityRemovalCallback>,
    /// Diagnostic name of the subscribing system.
    owner: String,
}

impl Subscription {
    fn insert(&self, entity: Entity) {
        let mut ids = self.id_vector.write().unwrap();
        if !ids.contains(&entity) {
            ids.push(entity);
        }
    }

    /// Removes the entity and fires the removal callback if it was present.
    fn remove(&self, entity: Entity) {
        let removed = {
            let mut ids = self.id_vector.write().unwrap();
            match ids.iter().position(|&id| id == entity) {
                Some(pos) => {
                    ids.swap_remove(pos);
                    true
                }
                None => false,
            }
        };
        if removed {
            if let Some(callback) = &self.on_entity_removal {
                callback(entity);
            }
        }
    }
}

/// Maintains every subscription's id vector.
#[derive(Default)]
pub struct EntityPublisher {
    subscriptions: Vec<Option<Subscription>>,
    free_ids: Vec<u32>,
    /// Subscription ids watching each component type; the key to O(watchers)
    /// incremental updates.
    watchers: HashMap<TypeId, Vec<u32>>,
}

impl EntityPublisher {
    /// Creates a publisher with no subscriptions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscription, computes its initial matching entity set,
    /// and returns its id.
    ///
    /// # Panics
    /// If the registration declares no accesses, or declares the same
    /// component type twice with different permissions; both are programmer
    /// errors in the subscribing system.
    pub fn subscribe_to_entities(
        &mut self,
        owner: &str,
        registration: EntitySubscriptionRegistration,
        storage: &ComponentStorage,
        is_live: impl Fn(Entity) -> bool,
    ) -> SubscriptionId {
        let accesses = registration.flattened_accesses();
        Self::validate_accesses(owner, &accesses);

        let subscription = Subscription {
            accesses,
            id_vector: registration.id_vector,
            on_entity_removal: registration.on_entity_removal,
            owner: owner.to_string(),
        };

        // Initial fill: scan the candidates of the rarest declared type and
        // keep those holding every declared type. This is the only full scan
        // a subscription ever performs.
        let initial: Vec<Entity> = storage
            .candidate_entities(&subscription.accesses)
            .into_iter()
            .filter(|&e| is_live(e) && storage.entity_matches(e, &subscription.accesses))
            .collect();
        *subscription.id_vector.write().unwrap() = initial;

        let id = match self.free_ids.pop() {
            Some(id) => {
                self.subscriptions[id as usize] = Some(subscription);
                id
            }
            None => {
                self.subscriptions.push(Some(subscription));
                (self.subscriptions.len() - 1) as u32
            }
        };

        let sub = self.subscriptions[id as usize].as_ref().unwrap();
        for access in &sub.accesses {
            self.watchers.entry(access.type_id).or_default().push(id);
        }
        log::debug!(
            "system '{}' subscribed ({} accesses, {} initial entities)",
            sub.owner,
            sub.accesses.len(),
            sub.id_vector.read().unwrap().len()
        );
        SubscriptionId(id)
    }

    /// Removes all bookkeeping for a subscription and clears its id vector.
    ///
    /// Used on system teardown; the id may be reused by later subscriptions.
    pub fn unsubscribe_from_entities(&mut self, id: SubscriptionId) {
        let Some(subscription) = self.subscriptions[id.0 as usize].take() else {
            log::warn!("unsubscribe_from_entities: subscription {} already removed", id.0);
            return;
        };
        for access in &subscription.accesses {
            if let Some(list) = self.watchers.get_mut(&access.type_id) {
                list.retain(|&sub_id| sub_id != id.0);
            }
        }
        subscription.id_vector.write().unwrap().clear();
        self.free_ids.push(id.0);
    }

    /// Re-evaluates one entity against every subscription watching `type_id`
    /// after a component registration.
    pub(crate) fn component_added(
        &self,
        entity: Entity,
        type_id: TypeId,
        storage: &ComponentStorage,
    ) {
        let Some(watching) = self.watchers.get(&type_id) else {
            return;
        };
        for &sub_id in watching {
            let Some(sub) = self.subscriptions[sub_id as usize].as_ref() else {
                continue;
            };
            if storage.entity_matches(entity, &sub.accesses) {
                sub.insert(entity);
            }
        }
    }

    /// Re-evaluates one entity against every subscription watching `type_id`
    /// after a component deletion.
    pub(crate) fn component_deleted(&self, entity: Entity, type_id: TypeId) {
        let Some(watching) = self.watchers.get(&type_id) else {
            return;
        };
        for &sub_id in watching {
            if let Some(sub) = self.subscriptions[sub_id as usize].as_ref() {
                sub.remove(entity);
            }
        }
    }

    /// Removes a destroyed or hidden entity from every subscription.
    pub(crate) fn entity_removed(&self, entity: Entity) {
        for sub in self.subscriptions.iter().flatten() {
            sub.remove(entity);
        }
    }

    /// Re-inserts a reinstated entity into every subscription it matches.
    pub(crate) fn entity_restored(&self, entity: Entity, storage: &ComponentStorage) {
        for sub in self.subscriptions.iter().flatten() {
            if storage.entity_matches(entity, &sub.accesses) {
                sub.insert(entity);
            }
        }
    }

    /// Number of active subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.iter().flatten().count()
    }

    fn validate_accesses(owner: &str, accesses: &[ComponentAccess]) {
        assert!(
            !accesses.is_empty(),
            "system '{owner}' registered a subscription with no component accesses"
        );
        for (i, a) in accesses.iter().enumerate() {
            for b in &accesses[i + 1..] {
                assert!(
                    !(a.type_id == b.type_id && a.permission != b.permission),
                    "system '{owner}' declares conflicting permissions for component '{}'",
                    a.type_name
                );
            }
        }
    }
}
