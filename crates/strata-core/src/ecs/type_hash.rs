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

//! Stable, process-independent identity for component types.
//!
//! `std::any::TypeId` is the runtime key for component lookup, but its value
//! is not stable across builds, so it cannot appear in the entity snapshot
//! wire format. The snapshot instead carries an FNV-1a hash of the type name,
//! which is deterministic across runs and platforms.

/// The 32-bit stable hash identifying a component type on the wire.
pub type ComponentTypeHash = u32;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Computes the FNV-1a hash of a type name.
///
/// Collisions between distinct component types registered in the same world
/// are treated as a fatal configuration error by the storage layer.
pub fn stable_type_hash(type_name: &str) -> ComponentTypeHash {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in type_name.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let a = stable_type_hash("engine::Position");
        let b = stable_type_hash("engine::Position");
        assert_eq!(a, b, "same name must always hash to the same value");
    }

    #[test]
    fn hash_distinguishes_names() {
        assert_ne!(
            stable_type_hash("engine::Position"),
            stable_type_hash("engine::Velocity"),
            "different names should not collide"
        );
    }

    #[test]
    fn hash_matches_reference_vector() {
        // FNV-1a reference vector: empty input hashes to the offset basis.
        assert_eq!(stable_type_hash(""), 0x811c_9dc5);
    }
}
