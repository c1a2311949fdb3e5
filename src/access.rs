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

//! Access: a scoped, mutually-exclusive handle over a [`crate::store::Store`].
//!
//! Construction locks the store's mutex; going out of scope (or an
//! explicit [`Access::close`]) drains the deferred-delete queue and
//! releases it. Ownership is consumed by both paths, so there is no
//! "closed twice" state to panic on — the type system already rules it
//! out.

use parking_lot::MutexGuard;
use rustc_hash::FxHashSet;

use crate::entity::EntityId;
use crate::filter::Filter;
use crate::part::PartId;
use crate::store::Store;

pub struct Access<'a> {
    guard: MutexGuard<'a, Store>,
    delete_queue: FxHashSet<EntityId>,
}

impl<'a> Access<'a> {
    pub(crate) fn new(guard: MutexGuard<'a, Store>) -> Self {
        Self {
            guard,
            delete_queue: FxHashSet::default(),
        }
    }

    pub(crate) fn store_ref(&self) -> &Store {
        &self.guard
    }

    pub(crate) fn store_mut(&mut self) -> &mut Store {
        &mut self.guard
    }

    pub fn alive(&self, entity: EntityId) -> bool {
        self.exists(entity) && !self.delete_queue.contains(&entity)
    }

    pub fn exists(&self, entity: EntityId) -> bool {
        self.guard.exists(entity)
    }

    /// Spawn one entity with the given parts.
    pub fn spawn(&mut self, parts: impl IntoIterator<Item = PartId>) -> EntityId {
        let signature = crate::signature::Signature::new(parts);
        let archetype = self.guard.intern_archetype(signature);
        self.guard.grow(archetype, 1)
    }

    /// Spawn `n` entities with the given parts, returning the first of the
    /// contiguous block of ids that were allocated.
    pub fn spawn_batch(&mut self, n: usize, parts: impl IntoIterator<Item = PartId>) -> Vec<EntityId> {
        let signature = crate::signature::Signature::new(parts);
        let archetype = self.guard.intern_archetype(signature);
        let first = self.guard.grow(archetype, n);
        (0..n).map(|i| first.offset(i as u64)).collect()
    }

    /// Every live entity whose archetype matches `filter`.
    pub fn query(&self, filter: &Filter) -> Vec<EntityId> {
        let mut out = Vec::new();
        for (archetype_id, page) in self.guard.pages() {
            let signature = self.guard.archetype_signature(archetype_id);
            if filter.matches(signature) {
                out.extend_from_slice(page.entities());
            }
        }
        out
    }

    /// Defer deletion of `entity` until this Access closes.
    pub fn delete(&mut self, entity: EntityId) {
        self.delete_queue.insert(entity);
    }

    /// Delete `entity` right now, bypassing the deferred queue.
    pub fn delete_immediately(&mut self, entity: EntityId) {
        self.guard.delete(entity);
    }

    /// Apply every deferred deletion now and clear the queue.
    pub fn empty_delete_queue(&mut self) {
        for entity in self.delete_queue.drain().collect::<Vec<_>>() {
            self.guard.delete(entity);
        }
    }

    pub fn has_part(&self, entity: EntityId, part: PartId) -> bool {
        self.guard.has_part(entity, part)
    }

    pub fn add_part(&mut self, entity: EntityId, part: PartId) -> bool {
        self.guard.add_part(entity, part)
    }

    pub fn delete_part(&mut self, entity: EntityId, part: PartId) -> bool {
        self.guard.delete_part(entity, part)
    }

    pub fn component_bytes(&self, entity: EntityId, part: PartId) -> Option<&[u8]> {
        self.guard.component_bytes(entity, part)
    }

    pub fn component_bytes_mut(&mut self, entity: EntityId, part: PartId) -> Option<&mut [u8]> {
        self.guard.component_bytes_mut(entity, part)
    }

    /// Explicitly close this access. Equivalent to letting it drop, but
    /// useful when the scope needs to be visually obvious at the call
    /// site.
    pub fn close(self) {}
}

impl Drop for Access<'_> {
    fn drop(&mut self) {
        for entity in self.delete_queue.drain() {
            self.guard.delete(entity);
        }
    }
}
