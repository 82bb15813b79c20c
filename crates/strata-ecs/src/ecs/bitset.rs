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

//! A sparse bitset over entity indices.
//!
//! Used by the registry to track which entity indices are live and to record
//! page membership for bulk hide/restore.

/// A simple bitset wrapped around a `Vec<u64>`.
#[derive(Debug, Default, Clone)]
pub struct EntityBitset {
    bits: Vec<u64>,
}

impl EntityBitset {
    /// Creates a new, empty bitset.
    pub fn new() -> Self {
        Self { bits: Vec::new() }
    }

    /// Sets the bit at the specified index to 1.
    pub fn set(&mut self, index: u32) {
        let word_idx = (index / 64) as usize;
        let bit_idx = index % 64;

        // Ensure the vector is large enough to hold the bit.
        if word_idx >= self.bits.len() {
            self.bits.resize(word_idx + 1, 0);
        }

        self.bits[word_idx] |= 1 << bit_idx;
    }

    /// Clears the bit at the specified index to 0.
    pub fn clear(&mut self, index: u32) {
        let word_idx = (index / 64) as usize;
        let bit_idx = index % 64;

        if word_idx < self.bits.len() {
            self.bits[word_idx] &= !(1 << bit_idx);
        }
    }

    /// Returns true if the bit at the specified index is set.
    pub fn is_set(&self, index: u32) -> bool {
        let word_idx = (index / 64) as usize;
        let bit_idx = index % 64;

        if let Some(word) = self.bits.get(word_idx) {
            (word & (1 << bit_idx)) != 0
        } else {
            false
        }
    }

    /// Returns the number of set bits.
    pub fn count(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Iterates over the indices of all set bits, in ascending order.
    pub fn iter_set(&self) -> impl Iterator<Item = u32> + '_ {
        self.bits.iter().enumerate().flat_map(|(word_idx, &word)| {
            (0..64u32)
                .filter(move |bit| (word & (1 << bit)) != 0)
                .map(move |bit| word_idx as u32 * 64 + bit)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_clear_and_query() {
        let mut set = EntityBitset::new();
        set.set(3);
        set.set(64);
        set.set(200);

        assert!(set.is_set(3));
        assert!(set.is_set(64));
        assert!(!set.is_set(4), "unset bit must read as 0");
        assert!(!set.is_set(10_000), "out of range reads as 0");

        set.clear(64);
        assert!(!set.is_set(64));
        assert_eq!(set.count(), 2);
    }

    #[test]
    fn iteration_is_ascending() {
        let mut set = EntityBitset::new();
        for idx in [190u32, 0, 63, 64] {
            set.set(idx);
        }
        let collected: Vec<u32> = set.iter_set().collect();
        assert_eq!(collected, vec![0, 63, 64, 190]);
    }
}
