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

//! Error types for the recoverable boundary of the ECS core.
//!
//! The core distinguishes programmer-contract violations, which panic, from
//! runtime conditions such as a malformed snapshot buffer, which are reported
//! through these enums.

use std::fmt;
use strata_core::{ComponentTypeHash, Entity};

/// An error produced while decoding an entity snapshot.
#[derive(Debug)]
pub enum SerializationError {
    /// The buffer ended before the declared serialization size.
    TruncatedBuffer {
        /// Bytes the header or sub-header declared.
        declared: u32,
        /// Bytes actually available.
        available: usize,
    },
    /// The snapshot names a component type hash no registered type matches.
    UnknownComponentType {
        /// The unmatched stable type hash.
        type_hash: ComponentTypeHash,
    },
    /// A component payload failed to decode.
    ComponentDecode {
        /// Name of the component type whose payload was rejected.
        type_name: &'static str,
        /// The underlying bincode error, stringified.
        details: String,
    },
    /// The target entity is not alive in the registry.
    DeadEntity {
        /// The stale or destroyed entity handle.
        entity: Entity,
    },
}

impl fmt::Display for SerializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializationError::TruncatedBuffer {
                declared,
                available,
            } => {
                write!(
                    f,
                    "snapshot buffer truncated: declared {declared} bytes, {available} available"
                )
            }
            SerializationError::UnknownComponentType { type_hash } => {
                write!(
                    f,
                    "snapshot names unknown component type hash {type_hash:#010x}"
                )
            }
            SerializationError::ComponentDecode { type_name, details } => {
                write!(f, "failed to decode component '{type_name}': {details}")
            }
            SerializationError::DeadEntity { entity } => {
                write!(f, "target entity {entity} is not alive")
            }
        }
    }
}

impl std::error::Error for SerializationError {}
