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

//! Entity id allocation, recycling, and the registry page stack.
//!
//! Indices are recycled through a free list with a generation bump, so a
//! stale [`Entity`] handle captured before destruction can never alias the
//! entity that later reuses the index. An index is returned to the free list
//! only after the world has purged all component data for it, which upholds
//! the invariant that an id is never reused while component data is still
//! registered.
//!
//! *Registry pages* partition live entities into a stack of layers. Pushing a
//! page and later hiding or deleting it lets a game state freeze or tear down
//! every entity it created without touching entities from the layers below.

use crate::ecs::bitset::EntityBitset;
use std::sync::Mutex;
use strata_core::Entity;

/// One stack frame over the registry: the set of entities created while this
/// page was on top.
#[derive(Debug, Default)]
struct RegistryPage {
    /// Indices of the entities belonging to this page.
    members: EntityBitset,
    /// Whether the page is currently hidden (deregistered, not destroyed).
    hidden: bool,
}

#[derive(Debug)]
struct RegistryState {
    /// Generation counter per entity slot; bumped when the index is recycled.
    generations: Vec<u32>,
    /// Live bit per entity index. Hidden entities read as not live.
    live: EntityBitset,
    /// Indices available for reuse.
    free_indices: Vec<u32>,
    /// The page stack. Never empty: a base page is pushed at construction.
    pages: Vec<RegistryPage>,
}

/// Allocates and recycles entity identifiers.
///
/// All methods take `&self`: id allocation state sits behind a mutex so
/// systems may create entities freely from worker threads during a phase,
/// and entity removal goes through a backlog drained at the sync point.
#[derive(Debug)]
pub struct EntityRegistry {
    state: Mutex<RegistryState>,
    /// Entities queued for destruction by `remove_entity`; the lock protects
    /// only this queue, never the registry tables.
    removal_backlog: Mutex<Vec<Entity>>,
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityRegistry {
    /// Creates a registry with a single base page on the stack.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState {
                generations: Vec::new(),
                live: EntityBitset::new(),
                free_indices: Vec::new(),
                pages: vec![RegistryPage::default()],
            }),
            removal_backlog: Mutex::new(Vec::new()),
        }
    }

    /// Allocates a new or recycled entity id, assigned to the top page.
    pub fn create_entity(&self) -> Entity {
        let mut state = self.state.lock().unwrap();
        let entity = if let Some(index) = state.free_indices.pop() {
            state.generations[index as usize] += 1;
            Entity::new(index, state.generations[index as usize])
        } else {
            let index = state.generations.len() as u32;
            state.generations.push(0);
            Entity::new(index, 0)
        };

        state.live.set(entity.index);
        state
            .pages
            .last_mut()
            .expect("registry page stack is never empty")
            .members
            .set(entity.index);
        entity
    }

    /// Whether the handle refers to a live (not destroyed, not hidden) entity.
    pub fn is_alive(&self, entity: Entity) -> bool {
        let state = self.state.lock().unwrap();
        state.live.is_set(entity.index)
            && state
                .generations
                .get(entity.index as usize)
                .is_some_and(|&gen| gen == entity.generation)
    }

    /// Enqueues an entity for destruction.
    ///
    /// The destruction is asynchronous: it is guaranteed to have run to
    /// completion by the end of the current tick, when the world drains the
    /// backlog and purges the entity's component data.
    pub fn remove_entity(&self, entity: Entity) {
        self.removal_backlog.lock().unwrap().push(entity);
    }

    /// Swaps out the removal backlog for sync-point processing.
    pub(crate) fn drain_removals(&self) -> Vec<Entity> {
        std::mem::take(&mut *self.removal_backlog.lock().unwrap())
    }

    /// Returns the index to the free list after the world has purged all
    /// component data for the entity.
    pub(crate) fn free_entity(&self, entity: Entity) {
        let mut state = self.state.lock().unwrap();
        state.live.clear(entity.index);
        for page in &mut state.pages {
            page.members.clear(entity.index);
        }
        state.free_indices.push(entity.index);
    }

    /// Pushes a new page onto the stack; subsequently created entities belong
    /// to it.
    pub fn add_registry_page(&self) {
        self.state.lock().unwrap().pages.push(RegistryPage::default());
    }

    /// Number of pages currently on the stack.
    pub fn page_count(&self) -> usize {
        self.state.lock().unwrap().pages.len()
    }

    /// Hides every entity in the top page without destroying it: live bits
    /// are cleared, component data stays registered, no removal hooks run.
    ///
    /// Returns the affected entities so the caller can update subscriptions.
    ///
    /// # Panics
    /// If the top page is already hidden. Operating on a mis-ordered page
    /// stack is a programmer error, not a runtime condition.
    pub(crate) fn deregister_top_page(&self) -> Vec<Entity> {
        let mut state = self.state.lock().unwrap();
        let top = state
            .pages
            .last()
            .expect("registry page stack is never empty");
        assert!(
            !top.hidden,
            "deregister_top_registry_page: top page is already hidden"
        );

        let members: Vec<u32> = top.members.iter_set().collect();
        let entities: Vec<Entity> = members
            .iter()
            .map(|&index| Entity::new(index, state.generations[index as usize]))
            .collect();

        for &index in &members {
            state.live.clear(index);
        }
        state.pages.last_mut().unwrap().hidden = true;
        entities
    }

    /// Restores a previously deregistered top page to live status.
    ///
    /// Returns the affected entities so the caller can re-evaluate
    /// subscriptions.
    ///
    /// # Panics
    /// If the top page is not hidden.
    pub(crate) fn reinstate_top_page(&self) -> Vec<Entity> {
        let mut state = self.state.lock().unwrap();
        let top = state
            .pages
            .last()
            .expect("registry page stack is never empty");
        assert!(
            top.hidden,
            "reinstate_top_registry_page: top page was never deregistered"
        );

        let members: Vec<u32> = top.members.iter_set().collect();
        let entities: Vec<Entity> = members
            .iter()
            .map(|&index| Entity::new(index, state.generations[index as usize]))
            .collect();

        for &index in &members {
            state.live.set(index);
        }
        state.pages.last_mut().unwrap().hidden = false;
        entities
    }

    /// Pops the top page, returning its entities for permanent destruction.
    ///
    /// The caller is responsible for purging component data (running removal
    /// hooks) and then calling [`EntityRegistry::free_entity`] for each
    /// returned entity.
    ///
    /// # Panics
    /// If only the base page remains; deleting the base page would leave the
    /// registry without a destination for new entities.
    pub(crate) fn delete_top_page(&self) -> Vec<Entity> {
        let mut state = self.state.lock().unwrap();
        assert!(
            state.pages.len() > 1,
            "delete_top_registry_page: cannot delete the base page"
        );

        let top = state.pages.pop().unwrap();
        let entities: Vec<Entity> = top
            .members
            .iter_set()
            .map(|index| Entity::new(index, state.generations[index as usize]))
            .collect();

        for entity in &entities {
            state.live.clear(entity.index);
        }
        entities
    }

    /// Number of live entities across all pages.
    pub fn live_count(&self) -> usize {
        self.state.lock().unwrap().live.count()
    }
}
