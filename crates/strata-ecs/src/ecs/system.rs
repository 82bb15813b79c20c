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

//! System registration: how external subsystems declare what they iterate.

use crate::ecs::access::{ComponentAccess, ComponentGroup};
use crate::ecs::publisher::{EntityRemovalCallback, IdVectorHandle};
use crate::ecs::world::TickContext;

/// A logic unit that subscribes to entities by component-access pattern and
/// runs once per phase.
///
/// This is a closed seam: rendering, physics, audio and networking layers
/// implement it per concrete system and hand the world a boxed instance.
pub trait System: Send {
    /// Per-frame work; runs as a regular job in the system's phase, reading
    /// the subscription id vectors filled at the last sync point.
    fn tick(&mut self, ctx: &TickContext);

    /// Fixed-timestep work, driven serially by [`EcsWorld::fixed_tick`].
    ///
    /// [`EcsWorld::fixed_tick`]: crate::ecs::world::EcsWorld::fixed_tick
    fn fixed_tick(&mut self, _ctx: &TickContext) {}
}

/// One subscription a system registers: which entities it wants cached and
/// where the cache lives.
pub struct EntitySubscriptionRegistration {
    /// Destination cache, owned by the subscribing system and filled by the
    /// publisher.
    pub id_vector: IdVectorHandle,
    /// Accesses declared directly on this subscription.
    pub accesses: Vec<ComponentAccess>,
    /// Named access bundles shared with other registrations.
    pub groups: Vec<ComponentGroup>,
    /// Fired when an entity leaves the id vector.
    pub on_entity_removal: Option<EntityRemovalCallback>,
}

impl EntitySubscriptionRegistration {
    /// Creates a registration from a cache handle and direct accesses.
    pub fn new(id_vector: IdVectorHandle, accesses: Vec<ComponentAccess>) -> Self {
        Self {
            id_vector,
            accesses,
            groups: Vec::new(),
            on_entity_removal: None,
        }
    }

    /// Adds a shared component group to the registration.
    pub fn with_group(mut self, group: ComponentGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Sets the removal callback.
    pub fn with_removal_callback(mut self, callback: EntityRemovalCallback) -> Self {
        self.on_entity_removal = Some(callback);
        self
    }

    /// Direct accesses plus every referenced group's accesses, with exact
    /// duplicates collapsed. Conflicting duplicates are left in place for
    /// the publisher's validation to reject.
    pub(crate) fn flattened_accesses(&self) -> Vec<ComponentAccess> {
        let mut flat: Vec<ComponentAccess> = self.accesses.clone();
        for group in &self.groups {
            flat.extend(group.accesses.iter().copied());
        }
        let mut deduped: Vec<ComponentAccess> = Vec::with_capacity(flat.len());
        for access in flat {
            if !deduped.contains(&access) {
                deduped.push(access);
            }
        }
        deduped
    }
}

/// Everything a system declares when registering with the world: its
/// subscriptions and the phase its `tick` job runs in.
pub struct SystemRegistration {
    /// Phase index for the system's per-frame job.
    pub phase: u32,
    /// The subscriptions to wire.
    pub subscriptions: Vec<EntitySubscriptionRegistration>,
}

impl SystemRegistration {
    /// Creates a registration for one phase.
    pub fn new(phase: u32, subscriptions: Vec<EntitySubscriptionRegistration>) -> Self {
        Self {
            phase,
            subscriptions,
        }
    }
}
