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

//! The complete ECS core implementation.
//!
//! Dependency order, leaves first: [`registry`] allocates entity ids,
//! [`storage`] owns one dense array per component type, [`publisher`]
//! maintains per-subscription entity caches, [`scheduler`] runs jobs in
//! ordered phases, and [`world`] ties the four together and drives one tick
//! of the simulation.

pub mod access;
mod bitset;
pub mod component;
pub mod error;
pub mod publisher;
pub mod registry;
pub mod scheduler;
pub mod serialization;
pub mod storage;
pub mod system;
pub mod world;

pub use access::{ComponentAccess, ComponentGroup, Permission};
pub use bitset::EntityBitset;
pub use component::Component;
pub use error::SerializationError;
pub use publisher::{EntityPublisher, IdVectorHandle, SubscriptionId};
pub use registry::EntityRegistry;
pub use scheduler::{Job, JobId, JobScheduler, SchedulerConfig};
pub use storage::{ComponentArray, ComponentStorage};
pub use system::{EntitySubscriptionRegistration, System, SystemRegistration};
pub use world::{EcsWorld, TickContext};

#[cfg(test)]
mod tests;
