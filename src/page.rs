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

//! Page: the sole storage for every entity of one archetype.
//!
//! Each component column is a raw byte arena rather than a `Vec<T>` — the
//! page doesn't know `T`, only the part-id, so it leans on the process
//! part registry for size and (if needed) a type-erased drop function.
//! This mirrors a struct-of-byte-arenas-plus-vtable storage model and
//! composes directly with save/restore, which serializes raw bytes.

use rustc_hash::FxHashMap;

use crate::entity::EntityId;
use crate::part::{part_type_info, PartId};

struct Column {
    bytes: Vec<u8>,
    item_size: usize,
    drop_fn: Option<unsafe fn(*mut u8)>,
}

impl Column {
    fn new(part: PartId) -> Self {
        let info = part_type_info(part);
        Self {
            bytes: Vec::new(),
            item_size: info.size,
            drop_fn: info.drop_fn,
        }
    }

    fn len(&self) -> usize {
        if self.item_size == 0 {
            0
        } else {
            self.bytes.len() / self.item_size
        }
    }

    fn row(&self, row: usize) -> &[u8] {
        &self.bytes[row * self.item_size..(row + 1) * self.item_size]
    }

    fn row_mut(&mut self, row: usize) -> &mut [u8] {
        &mut self.bytes[row * self.item_size..(row + 1) * self.item_size]
    }

    unsafe fn drop_row(&mut self, row: usize) {
        if let Some(drop_fn) = self.drop_fn {
            let offset = row * self.item_size;
            drop_fn(self.bytes.as_mut_ptr().add(offset));
        }
    }

    fn grow(&mut self, from_len: usize, to_len: usize, dirty_len: usize) {
        let new_byte_len = to_len * self.item_size;
        self.bytes.resize(new_byte_len, 0);
        // Only zero the span that was never written before; rows beyond
        // `dirty_len` are fresh and already zeroed by `resize`. Rows
        // between `from_len` and `dirty_len` held a now-forgotten entity's
        // garbage bytes and must be re-zeroed before they're exposed again.
        if dirty_len > from_len {
            let zero_from = from_len * self.item_size;
            let zero_to = (to_len.min(dirty_len)) * self.item_size;
            if zero_to > zero_from {
                self.bytes[zero_from..zero_to].fill(0);
            }
        }
    }

    fn swap_remove(&mut self, row: usize) {
        let last = self.len() - 1;
        unsafe {
            self.drop_row(row);
        }
        if row != last {
            let size = self.item_size;
            self.bytes.copy_within(last * size..(last + 1) * size, row * size);
        }
        self.bytes.truncate(last * self.item_size);
    }
}

impl Drop for Column {
    fn drop(&mut self) {
        if self.drop_fn.is_some() {
            for row in 0..self.len() {
                unsafe {
                    self.drop_row(row);
                }
            }
        }
    }
}

/// Dense, columnar storage for every entity sharing one archetype.
pub(crate) struct Page {
    entities: Vec<EntityId>,
    columns: FxHashMap<PartId, Column>,
    dirty_size: usize,
}

impl Page {
    pub fn new(component_parts: impl IntoIterator<Item = PartId>) -> Self {
        let columns = component_parts
            .into_iter()
            .map(|p| (p, Column::new(p)))
            .collect();
        Self {
            entities: Vec::new(),
            columns,
            dirty_size: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    pub fn has_column(&self, part: PartId) -> bool {
        self.columns.contains_key(&part)
    }

    pub fn component_bytes(&self, part: PartId, row: usize) -> Option<&[u8]> {
        self.columns.get(&part).map(|c| c.row(row))
    }

    pub fn component_bytes_mut(&mut self, part: PartId, row: usize) -> Option<&mut [u8]> {
        self.columns.get_mut(&part).map(|c| c.row_mut(row))
    }

    /// Append `n` rows starting at `first_entity`, returning the row index
    /// of the first new row.
    pub fn grow(&mut self, n: usize, first_entity: EntityId) -> usize {
        let first_row = self.entities.len();
        let new_size = first_row + n;
        for column in self.columns.values_mut() {
            column.grow(first_row, new_size, self.dirty_size);
        }
        for i in 0..n {
            self.entities.push(first_entity.offset(i as u64));
        }
        self.dirty_size = self.dirty_size.max(new_size);
        first_row
    }

    /// Swap-remove `row`. Returns the entity that was moved into `row`
    /// from the end, if any (the caller must fix up that entity's
    /// directory entry).
    pub fn delete(&mut self, row: usize) -> Option<EntityId> {
        self.entities.swap_remove(row);
        for column in self.columns.values_mut() {
            column.swap_remove(row);
        }
        self.entities.get(row).copied()
    }

    /// Copy every column `dst` also has from `self` at `src_row` into
    /// `dst` at `dst_row`. Columns only `self` has are dropped; columns
    /// only `dst` has keep whatever `grow` already zeroed them to.
    pub fn copy_row_into(&self, src_row: usize, dst: &mut Page, dst_row: usize) {
        for (part, column) in &self.columns {
            if let Some(dst_column) = dst.columns.get_mut(part) {
                let src_bytes = column.row(src_row);
                dst_column.row_mut(dst_row).copy_from_slice(src_bytes);
            }
        }
    }

    pub fn component_parts(&self) -> impl Iterator<Item = PartId> + '_ {
        self.columns.keys().copied()
    }

    /// Every component column as self-describing values, one per row, for
    /// the save record. Raw bytes never leave the process this way — each
    /// row is decoded through the part's registered serializer first, so
    /// the save stays meaningful even if this crate's byte layout for `T`
    /// ever changed underneath.
    pub(crate) fn snapshot_rows(&self) -> Vec<(PartId, Vec<serde_json::Value>)> {
        self.columns
            .iter()
            .map(|(part, column)| {
                let values = (0..column.len())
                    .map(|row| crate::part::serialize_part(*part, column.row(row)))
                    .collect();
                (*part, values)
            })
            .collect()
    }

    /// Rebuild a page from a save record's entity list and per-column
    /// values. Unlike [`Page::grow`], the entity ids need not be
    /// consecutive — they are whatever survived in the original page.
    pub(crate) fn from_snapshot(
        entities: Vec<EntityId>,
        components: Vec<(PartId, Vec<serde_json::Value>)>,
    ) -> Self {
        let size = entities.len();
        let columns = components
            .into_iter()
            .map(|(part, values)| {
                let info = crate::part::part_type_info(part);
                let mut bytes = vec![0u8; size * info.size];
                for (row, value) in values.into_iter().enumerate() {
                    let slice = &mut bytes[row * info.size..(row + 1) * info.size];
                    crate::part::deserialize_part_into(part, value, slice);
                }
                (
                    part,
                    Column {
                        bytes,
                        item_size: info.size,
                        drop_fn: info.drop_fn,
                    },
                )
            })
            .collect();
        Self {
            entities,
            columns,
            dirty_size: size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_page() -> (Page, PartId) {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Marker(#[allow(dead_code)] u32);
        let part = crate::part::Component::<Marker>::new().id();
        (Page::new([part]), part)
    }

    #[test]
    fn grow_zero_initializes_fresh_rows() {
        let (mut page, part) = make_page();
        let first = page.grow(3, EntityId(10));
        assert_eq!(first, 0);
        assert_eq!(page.component_bytes(part, 0), Some(&[0u8; 4][..]));
    }

    #[test]
    fn swap_remove_relocates_last_row() {
        let (mut page, part) = make_page();
        page.grow(3, EntityId(0));
        page.component_bytes_mut(part, 2).unwrap().copy_from_slice(&42u32.to_le_bytes());
        let moved = page.delete(0);
        assert_eq!(moved, Some(EntityId(2)));
        assert_eq!(page.component_bytes(part, 0), Some(&42u32.to_le_bytes()[..]));
        assert_eq!(page.size(), 2);
    }
}
