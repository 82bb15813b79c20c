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

//! The strata Entity-Component-System core.
//!
//! Every other engine layer (rendering, physics, audio, networking) is a thin
//! client of this crate. It provides:
//!
//! * entity id allocation and recycling, with a stack of *registry pages* for
//!   bulk hide/restore of whole entity groups (level and game-state
//!   transitions),
//! * dense typed component arrays with deferred registration and removal,
//! * a publish/subscribe mechanism that incrementally maintains the entity
//!   list each system iterates,
//! * a phased job scheduler that parallelizes work within a phase wherever
//!   declared component access sets do not conflict.
//!
//! The primary entry point is [`EcsWorld`], constructed explicitly and passed
//! by reference to every subsystem at startup. There is no global instance.

pub mod ecs;

pub use ecs::access::{ComponentAccess, ComponentGroup, Permission};
pub use ecs::component::Component;
pub use ecs::error::SerializationError;
pub use ecs::publisher::{IdVectorHandle, SubscriptionId};
pub use ecs::scheduler::{Job, JobId, SchedulerConfig};
pub use ecs::system::{EntitySubscriptionRegistration, System, SystemRegistration};
pub use ecs::world::{EcsWorld, TickContext};
pub use strata_core::Entity;
