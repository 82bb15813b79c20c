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

use bincode::{Decode, Encode};
use std::any::TypeId;
use strata_core::{stable_type_hash, ComponentTypeHash};

/// A marker trait for types that can be attached to an entity.
///
/// Components are plain data. The `'static` lifetime ensures that the type
/// does not contain non-static references, and `Send + Sync` allow component
/// data to be read from worker threads during a phase. The bincode bounds
/// make every component eligible for the entity snapshot format without a
/// separate opt-in.
pub trait Component: Encode + Decode<()> + Send + Sync + 'static {}

/// The static per-type descriptor components are looked up by.
///
/// Runtime lookup uses [`TypeId`] (pointer-style identity, never a string
/// comparison); the [`ComponentTypeHash`] is the stable identity used on the
/// snapshot wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentDescriptor {
    /// Runtime identity of the component type.
    pub type_id: TypeId,
    /// Stable FNV-1a hash of the type name, used by the snapshot format.
    pub type_hash: ComponentTypeHash,
    /// The full type name, kept for diagnostics only.
    pub type_name: &'static str,
}

impl ComponentDescriptor {
    /// Builds the descriptor for a component type.
    pub fn of<T: Component>() -> Self {
        let type_name = std::any::type_name::<T>();
        Self {
            type_id: TypeId::of::<T>(),
            type_hash: stable_type_hash(type_name),
            type_name,
        }
    }
}
