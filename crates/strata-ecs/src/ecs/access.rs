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

//! Declared component access: the vocabulary systems and jobs use to tell
//! the publisher what entities they match and the scheduler what they may
//! touch concurrently.

use crate::ecs::component::Component;
use std::any::TypeId;

/// The access mode a system or job declares for one component type.
///
/// Drives both subscription matching (all three modes require presence of the
/// component) and scheduler conflict detection (only [`Permission::RW`]
/// conflicts).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Read-only access to the component data.
    R,
    /// Read-write access to the component data.
    RW,
    /// "No data access": the subscription only checks that the component is
    /// present. NDA never participates in scheduler conflicts.
    NDA,
}

impl Permission {
    /// Whether this mode may mutate component data.
    pub fn writes(self) -> bool {
        matches!(self, Permission::RW)
    }

    /// Whether this mode touches component data at all.
    pub fn touches_data(self) -> bool {
        !matches!(self, Permission::NDA)
    }
}

/// One declared `(permission, component type)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentAccess {
    /// The declared access mode.
    pub permission: Permission,
    /// The component type being accessed.
    pub type_id: TypeId,
    /// Type name, carried for assertion messages.
    pub type_name: &'static str,
}

impl ComponentAccess {
    /// Declares access to component type `T`.
    pub fn of<T: Component>(permission: Permission) -> Self {
        Self {
            permission,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Whether two declarations conflict: same component type and at least
    /// one side declares read-write. NDA entries never conflict.
    pub fn conflicts_with(&self, other: &ComponentAccess) -> bool {
        self.type_id == other.type_id
            && self.permission.touches_data()
            && other.permission.touches_data()
            && (self.permission.writes() || other.permission.writes())
    }
}

/// A named, reusable bundle of accesses.
///
/// Several subscription registrations can reference the same group instead of
/// repeating a common filter (e.g. "is a local player") in each of them.
#[derive(Debug, Clone)]
pub struct ComponentGroup {
    /// Diagnostic name of the group.
    pub name: &'static str,
    /// The accesses this group contributes to a registration.
    pub accesses: Vec<ComponentAccess>,
}

impl ComponentGroup {
    /// Creates a named group from a list of accesses.
    pub fn new(name: &'static str, accesses: Vec<ComponentAccess>) -> Self {
        Self { name, accesses }
    }
}

/// Returns whether any access in `a` conflicts with any access in `b`.
pub(crate) fn access_sets_conflict(a: &[ComponentAccess], b: &[ComponentAccess]) -> bool {
    a.iter().any(|lhs| b.iter().any(|rhs| lhs.conflicts_with(rhs)))
}
