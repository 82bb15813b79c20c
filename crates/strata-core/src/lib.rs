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

//! Foundational types shared by every strata crate.
//!
//! This crate deliberately stays tiny: it owns the [`Entity`] id and the
//! stable component type hash, and nothing else. Everything that actually
//! stores or schedules data lives in `strata-ecs`.

pub mod ecs;

pub use ecs::entity::Entity;
pub use ecs::type_hash::{stable_type_hash, ComponentTypeHash};
