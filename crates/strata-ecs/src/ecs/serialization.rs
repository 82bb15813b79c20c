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

//! The minimal binary entity snapshot.
//!
//! Fixed little-endian framing, used for save/restore and as the basis for
//! any wire replication external systems build on top:
//!
//! ```text
//! EntitySerializationHeader {
//!     u32 total_serialization_size;  // includes this header
//!     u32 entity;                    // entity index
//!     u32 component_count;
//! }
//! repeated component_count times:
//!     u32 component_serialization_size;  // includes this 8-byte sub-header
//!     u32 component_type_hash;
//!     u8  component_data[component_serialization_size - 8];
//! ```
//!
//! Calling [`serialize_entity`] with an empty buffer is a valid "dry run"
//! that returns only the required size.

use crate::ecs::error::SerializationError;
use crate::ecs::storage::ComponentStorage;
use strata_core::Entity;

/// Size of the fixed entity header.
pub const HEADER_SIZE: u32 = 12;
/// Size of each per-component sub-header.
pub const COMPONENT_HEADER_SIZE: u32 = 8;

fn put_u32(buf: &mut [u8], offset: &mut usize, value: u32) {
    buf[*offset..*offset + 4].copy_from_slice(&value.to_le_bytes());
    *offset += 4;
}

fn read_u32(buf: &[u8], offset: usize) -> Option<u32> {
    let bytes = buf.get(offset..offset + 4)?;
    Some(u32::from_le_bytes(bytes.try_into().unwrap()))
}

/// Serializes every component the entity holds into `buf`.
///
/// Returns the total size the snapshot requires, header included. The buffer
/// is written only if it is large enough; callers probe the required size by
/// passing an empty buffer and compare the return value against their
/// capacity.
pub fn serialize_entity(storage: &ComponentStorage, entity: Entity, buf: &mut [u8]) -> u32 {
    let descriptors = storage.component_types_of(entity);
    let payloads: Vec<(u32, Vec<u8>)> = descriptors
        .iter()
        .map(|descriptor| {
            let bytes = storage
                .serialize_component_dyn(entity, descriptor.type_id)
                .expect("component_types_of returned a type the entity holds");
            (descriptor.type_hash, bytes)
        })
        .collect();

    let total: u32 = HEADER_SIZE
        + payloads
            .iter()
            .map(|(_, bytes)| COMPONENT_HEADER_SIZE + bytes.len() as u32)
            .sum::<u32>();

    if (buf.len() as u64) < u64::from(total) {
        return total;
    }

    let mut offset = 0;
    put_u32(buf, &mut offset, total);
    put_u32(buf, &mut offset, entity.index());
    put_u32(buf, &mut offset, payloads.len() as u32);
    for (type_hash, bytes) in &payloads {
        put_u32(buf, &mut offset, COMPONENT_HEADER_SIZE + bytes.len() as u32);
        put_u32(buf, &mut offset, *type_hash);
        buf[offset..offset + bytes.len()].copy_from_slice(bytes);
        offset += bytes.len();
    }
    total
}

/// Applies a snapshot to `target`, writing each component payload into the
/// corresponding array.
///
/// The header's entity index identifies the snapshot's source entity; the
/// data is applied to `target`, which is typically a freshly created entity
/// on the restoring side. Written components become visible to subscribers
/// at the next tick, like any other component addition.
pub fn deserialize_entity(
    storage: &ComponentStorage,
    target: Entity,
    buf: &[u8],
) -> Result<(), SerializationError> {
    let total = read_u32(buf, 0).ok_or(SerializationError::TruncatedBuffer {
        declared: HEADER_SIZE,
        available: buf.len(),
    })?;
    if buf.len() < total as usize || total < HEADER_SIZE {
        return Err(SerializationError::TruncatedBuffer {
            declared: total,
            available: buf.len(),
        });
    }

    let component_count = read_u32(buf, 8).expect("header length checked above");

    let mut offset = HEADER_SIZE as usize;
    for _ in 0..component_count {
        let size = read_u32(buf, offset).ok_or(SerializationError::TruncatedBuffer {
            declared: COMPONENT_HEADER_SIZE,
            available: buf.len() - offset,
        })?;
        let type_hash = read_u32(buf, offset + 4).ok_or(SerializationError::TruncatedBuffer {
            declared: COMPONENT_HEADER_SIZE,
            available: buf.len() - offset,
        })?;
        if size < COMPONENT_HEADER_SIZE || offset + size as usize > buf.len() {
            return Err(SerializationError::TruncatedBuffer {
                declared: size,
                available: buf.len() - offset,
            });
        }

        let type_id = storage
            .type_id_for_hash(type_hash)
            .ok_or(SerializationError::UnknownComponentType { type_hash })?;
        let data = &buf[offset + COMPONENT_HEADER_SIZE as usize..offset + size as usize];
        storage.deserialize_component_dyn(target, type_id, data)?;
        storage.enqueue_registration_dyn(target, type_id);
        offset += size as usize;
    }
    Ok(())
}
