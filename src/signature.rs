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

//! Signatures: sorted, deduplicated sets of [`PartId`]s with set algebra
//! and a stable CRC-64 hash.

use crc::{Crc, CRC_64_GO_ISO};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::part::PartId;

pub(crate) const CRC64: Crc<u64> = Crc::<u64>::new(&CRC_64_GO_ISO);

/// A sorted, deduplicated set of part-ids — an entity's or archetype's
/// exact composition. Most archetypes have a handful of parts, so this is
/// backed by a `SmallVec` to avoid a heap allocation for the common case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    parts: SmallVec<[PartId; 8]>,
}

impl Signature {
    pub fn new(parts: impl IntoIterator<Item = PartId>) -> Self {
        let mut parts: SmallVec<[PartId; 8]> = parts.into_iter().collect();
        parts.sort_unstable();
        parts.dedup();
        Self { parts }
    }

    pub fn empty() -> Self {
        Self {
            parts: SmallVec::new(),
        }
    }

    pub fn as_slice(&self) -> &[PartId] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// A new signature with `part` inserted (or unchanged if already present).
    pub fn add(&self, part: PartId) -> Signature {
        let mut parts = self.parts.clone();
        parts.push(part);
        parts.sort_unstable();
        parts.dedup();
        Self { parts }
    }

    /// A new signature with every occurrence of `part` removed.
    pub fn delete(&self, part: PartId) -> Signature {
        let parts = self.parts.iter().copied().filter(|p| *p != part).collect();
        Self { parts }
    }

    pub fn equal_to(&self, other: &Signature) -> bool {
        self.parts == other.parts
    }

    pub fn contains_single(&self, part: PartId) -> bool {
        self.parts.binary_search(&part).is_ok()
    }

    /// True iff every element of `other` is present in `self`. Both sides
    /// are sorted, so the cursor into `self` only ever advances rightward
    /// as we walk `other` in order.
    pub fn contains_all(&self, other: &Signature) -> bool {
        let mut cursor = 0usize;
        for &needle in other.parts.iter() {
            match self.parts[cursor..].binary_search(&needle) {
                Ok(offset) => cursor += offset + 1,
                Err(_) => return false,
            }
        }
        true
    }

    pub fn contains_any(&self, other: &Signature) -> bool {
        other
            .parts
            .iter()
            .any(|p| self.parts.binary_search(p).is_ok())
    }

    /// CRC-64/ISO over the little-endian part-ids in ascending order — the
    /// signature's own sort order — so the hash depends only on set
    /// membership, never on insertion order.
    pub fn hash(&self) -> u64 {
        let mut digest = CRC64.digest();
        for part in &self.parts {
            digest.update(&part.to_le_bytes());
        }
        digest.finalize()
    }
}
