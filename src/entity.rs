// Copyright 2024 Saptak Santra
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

//! Entity identifiers.

use serde::{Deserialize, Serialize};

/// Opaque entity identifier. Monotonically allocated from a per-[`crate::store::Store`]
/// counter and never reused within that store's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub(crate) u64);

impl EntityId {
    pub(crate) fn offset(self, n: u64) -> EntityId {
        EntityId(self.0 + n)
    }
}

/// Where a live entity's row lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Entry {
    pub archetype_id: u32,
    pub row: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_sequential() {
        let first = EntityId(10);
        assert_eq!(first.offset(0), EntityId(10));
        assert_eq!(first.offset(4), EntityId(14));
    }
}
