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

//! The archetype registry, entity directory, and page lifecycle.
//!
//! `Store` is never touched directly by user code — it's reached only
//! through an [`crate::access::Access`], which holds the lock that
//! guards it. Every mutating method here is `pub(crate)` for exactly
//! that reason: touching it outside an `Access` is a compile error, not
//! a runtime panic.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::entity::{Entry, EntityId};
use crate::page::Page;
use crate::part::PartId;
use crate::resource::ResourceId;
use crate::signature::Signature;

pub(crate) type ArchetypeId = u32;

pub(crate) struct Store {
    archetypes: Vec<Signature>,
    archetype_by_hash: FxHashMap<u64, ArchetypeId>,
    parts: FxHashSet<PartId>,
    pages: FxHashMap<ArchetypeId, Page>,
    entries: FxHashMap<EntityId, Entry>,
    next_entity: u64,
    pub(crate) resources: ahash::AHashMap<crate::resource::ResourceId, Box<dyn std::any::Any + Send + Sync>>,
}

impl Store {
    pub fn new() -> Self {
        Self {
            archetypes: Vec::new(),
            archetype_by_hash: FxHashMap::default(),
            parts: FxHashSet::default(),
            pages: FxHashMap::default(),
            entries: FxHashMap::default(),
            next_entity: 0,
            resources: ahash::AHashMap::default(),
        }
    }

    pub fn parts(&self) -> &FxHashSet<PartId> {
        &self.parts
    }

    pub fn archetype_signature(&self, id: ArchetypeId) -> &Signature {
        &self.archetypes[id as usize]
    }

    pub fn archetype_count(&self) -> usize {
        self.archetypes.len()
    }

    /// Intern a signature, returning its archetype id. Also ensures a
    /// backing page exists with columns for every component part.
    pub fn intern_archetype(&mut self, signature: Signature) -> ArchetypeId {
        let hash = signature.hash();
        if let Some(&id) = self.archetype_by_hash.get(&hash) {
            return id;
        }
        let id = self.archetypes.len() as ArchetypeId;
        for part in signature.as_slice() {
            self.parts.insert(*part);
        }
        let component_parts: Vec<PartId> = signature
            .as_slice()
            .iter()
            .copied()
            .filter(|p| crate::part::part_type_info(*p).size > 0)
            .collect();
        self.pages.insert(id, Page::new(component_parts));
        self.archetypes.push(signature);
        self.archetype_by_hash.insert(hash, id);
        id
    }

    pub fn page(&self, id: ArchetypeId) -> &Page {
        &self.pages[&id]
    }

    pub fn pages(&self) -> impl Iterator<Item = (ArchetypeId, &Page)> {
        self.pages.iter().map(|(id, page)| (*id, page))
    }

    pub fn entry(&self, entity: EntityId) -> Option<Entry> {
        self.entries.get(&entity).copied()
    }

    pub fn exists(&self, entity: EntityId) -> bool {
        self.entries.contains_key(&entity)
    }

    /// Allocate `n` fresh entities into the given archetype's page.
    pub fn grow(&mut self, archetype_id: ArchetypeId, n: usize) -> EntityId {
        let first_entity = EntityId(self.next_entity);
        self.next_entity += n as u64;

        let page = self.pages.get_mut(&archetype_id).expect("archetype page must exist");
        let first_row = page.grow(n, first_entity);

        for i in 0..n {
            let entity = first_entity.offset(i as u64);
            self.entries.insert(
                entity,
                Entry {
                    archetype_id,
                    row: first_row + i,
                },
            );
        }
        first_entity
    }

    /// Remove `entity` entirely: swap-remove its row and fix up whatever
    /// entity got swapped into its place.
    pub fn delete(&mut self, entity: EntityId) {
        let Some(entry) = self.entries.remove(&entity) else {
            return;
        };
        let page = self
            .pages
            .get_mut(&entry.archetype_id)
            .expect("archetype page must exist");
        if let Some(swapped) = page.delete(entry.row) {
            self.entries.insert(
                swapped,
                Entry {
                    archetype_id: entry.archetype_id,
                    row: entry.row,
                },
            );
        }
    }

    /// Move `entity` into `new_archetype_id`, carrying over every
    /// component column the two archetypes share.
    pub fn move_entity(&mut self, entity: EntityId, new_archetype_id: ArchetypeId) {
        #[cfg(feature = "profiling")]
        let _span = tracing::info_span!(
            "archetype_move",
            entity = entity.0,
            to = new_archetype_id
        )
        .entered();

        let Some(entry) = self.entries.get(&entity).copied() else {
            return;
        };
        if entry.archetype_id == new_archetype_id {
            return;
        }

        // Grow the destination first (it takes exactly one row, so
        // `entity` itself is the "first" and only new entity), then
        // briefly take the source page out of the map so we can hold
        // `&mut` into both pages at once without a double-borrow of
        // `self.pages`.
        let dst_row = {
            let dst_page = self
                .pages
                .get_mut(&new_archetype_id)
                .expect("destination archetype page must exist");
            dst_page.grow(1, entity)
        };

        let mut src_page = self.pages.remove(&entry.archetype_id).expect("source page");
        {
            let dst_page = self.pages.get_mut(&new_archetype_id).expect("destination page");
            src_page.copy_row_into(entry.row, dst_page, dst_row);
        }
        self.pages.insert(entry.archetype_id, src_page);

        self.delete(entity);
        self.entries.insert(
            entity,
            Entry {
                archetype_id: new_archetype_id,
                row: dst_row,
            },
        );
    }

    pub fn has_part(&self, entity: EntityId, part: PartId) -> bool {
        self.entry(entity)
            .map(|e| self.archetype_signature(e.archetype_id).contains_single(part))
            .unwrap_or(false)
    }

    pub fn add_part(&mut self, entity: EntityId, part: PartId) -> bool {
        let Some(entry) = self.entry(entity) else {
            return false;
        };
        let current = self.archetype_signature(entry.archetype_id);
        if current.contains_single(part) {
            return false;
        }
        let new_signature = current.add(part);
        let new_archetype = self.intern_archetype(new_signature);
        self.move_entity(entity, new_archetype);
        true
    }

    pub fn delete_part(&mut self, entity: EntityId, part: PartId) -> bool {
        let Some(entry) = self.entry(entity) else {
            return false;
        };
        let current = self.archetype_signature(entry.archetype_id);
        if !current.contains_single(part) {
            return false;
        }
        let new_signature = current.delete(part);
        let new_archetype = self.intern_archetype(new_signature);
        self.move_entity(entity, new_archetype);
        true
    }

    pub fn component_bytes(&self, entity: EntityId, part: PartId) -> Option<&[u8]> {
        let entry = self.entry(entity)?;
        self.pages[&entry.archetype_id].component_bytes(part, entry.row)
    }

    pub fn component_bytes_mut(&mut self, entity: EntityId, part: PartId) -> Option<&mut [u8]> {
        let entry = self.entries.get(&entity).copied()?;
        self.pages
            .get_mut(&entry.archetype_id)?
            .component_bytes_mut(part, entry.row)
    }

    /// The set of parts that have ever appeared in an interned archetype,
    /// in ascending part-id order — the basis of `part_hash`.
    pub(crate) fn parts_in_use(&self) -> Vec<PartId> {
        let mut parts: Vec<PartId> = self.parts.iter().copied().collect();
        parts.sort_unstable();
        parts
    }

    /// A self-describing snapshot of every archetype, page, and resource,
    /// for the save record. Component bytes are decoded through their
    /// registered serializer row by row (see [`Page::snapshot_rows`]), not
    /// copied raw, so the save stays meaningful independent of in-memory
    /// layout.
    pub(crate) fn to_snapshot(&self) -> StoreSnapshot {
        let archetypes = self
            .archetypes
            .iter()
            .enumerate()
            .map(|(id, signature)| {
                let page = &self.pages[&(id as ArchetypeId)];
                ArchetypeSnapshot {
                    signature: signature.clone(),
                    entities: page.entities().to_vec(),
                    components: page.snapshot_rows(),
                }
            })
            .collect();

        let resources = self
            .resources
            .iter()
            .filter_map(|(id, value)| {
                crate::resource::serialize_resource(id, value.as_ref()).map(|v| (id.clone(), v))
            })
            .collect();

        StoreSnapshot {
            next_entity: self.next_entity,
            archetypes,
            resources,
        }
    }

    /// Rebuild a fresh `Store` from a snapshot taken by `to_snapshot`.
    /// Archetype ids are reassigned in the snapshot's own order, which is
    /// exactly the order `to_snapshot` walked `self.archetypes` in, so ids
    /// round-trip unchanged for a save written and restored by the same
    /// process generation.
    pub(crate) fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let mut store = Store::new();
        store.next_entity = snapshot.next_entity;

        for archetype in snapshot.archetypes {
            let hash = archetype.signature.hash();
            let archetype_id = store.archetypes.len() as ArchetypeId;
            for part in archetype.signature.as_slice() {
                store.parts.insert(*part);
            }
            store.archetype_by_hash.insert(hash, archetype_id);
            store.archetypes.push(archetype.signature);

            let page = Page::from_snapshot(archetype.entities.clone(), archetype.components);
            for (row, entity) in archetype.entities.iter().enumerate() {
                store.entries.insert(*entity, Entry { archetype_id, row });
            }
            store.pages.insert(archetype_id, page);
        }

        for (id, value) in snapshot.resources {
            if let Some(boxed) = crate::resource::deserialize_resource(&id, value) {
                store.resources.insert(id, boxed);
            }
        }

        store
    }
}

/// One archetype's worth of save data: its signature, the entity ids that
/// lived in its page, and every component column decoded to JSON values.
#[derive(Serialize, Deserialize)]
pub(crate) struct ArchetypeSnapshot {
    signature: Signature,
    entities: Vec<EntityId>,
    components: Vec<(PartId, Vec<serde_json::Value>)>,
}

/// The full save-record payload for a [`Store`]: every archetype's page
/// data, the entity counter, and every resource that had a registered
/// serializer at save time.
#[derive(Serialize, Deserialize)]
pub(crate) struct StoreSnapshot {
    next_entity: u64,
    archetypes: Vec<ArchetypeSnapshot>,
    resources: Vec<(ResourceId, serde_json::Value)>,
}
