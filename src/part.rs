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

//! Parts: the uniform "an entity has one of these" abstraction.
//!
//! A [`Component<T>`] carries a fixed-size payload and is assigned a
//! part-id from a process-wide counter starting at zero. A [`Tag`] is a
//! pure marker with no payload, assigned from a separate counter counting
//! down from `u32::MAX`. The two ranges never meet in practice; colliding
//! them is a programmer error, not something this crate can detect.

use std::any::type_name;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, OnceLock};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Dense identifier for a [`Component`] or [`Tag`], used as the atoms of a
/// [`crate::signature::Signature`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartId(pub(crate) u32);

impl PartId {
    pub(crate) fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

/// Byte-layout information the store needs to manage a component's column
/// without knowing its concrete type: its size and, if it owns resources
/// that need cleanup, a type-erased drop function.
#[derive(Clone, Copy)]
pub(crate) struct PartTypeInfo {
    pub size: usize,
    pub name: &'static str,
    pub drop_fn: Option<unsafe fn(*mut u8)>,
}

static NEXT_COMPONENT_ID: AtomicU32 = AtomicU32::new(0);
static NEXT_TAG_ID: AtomicU32 = AtomicU32::new(u32::MAX);

/// Process-wide registry of every part-id ever allocated, keyed for
/// lookup by the store when it needs a column's byte size or drop
/// function and has only a [`PartId`] to go on.
static PART_REGISTRY: OnceLock<Mutex<rustc_hash::FxHashMap<PartId, PartTypeInfo>>> =
    OnceLock::new();

fn part_registry() -> &'static Mutex<rustc_hash::FxHashMap<PartId, PartTypeInfo>> {
    PART_REGISTRY.get_or_init(|| Mutex::new(rustc_hash::FxHashMap::default()))
}

pub(crate) fn part_type_info(id: PartId) -> PartTypeInfo {
    *part_registry()
        .lock()
        .unwrap()
        .get(&id)
        .expect("part id was never registered")
}

/// Type-erased (de)serialization for one component column, registered
/// alongside a component's drop function the first time a [`Component<T>`]
/// handle is created. The save record embeds component values as
/// self-describing JSON rather than raw bytes, so restoring on a process
/// that never constructed a live `T` of its own still works: the
/// registry, not the caller's stack, supplies the concrete type.
pub(crate) trait PartSerializer: Send + Sync {
    fn serialize(&self, bytes: &[u8]) -> Value;
    fn deserialize_into(&self, value: Value, out: &mut [u8]);
}

struct TypedPartSerializer<T>(std::marker::PhantomData<T>);

impl<T> PartSerializer for TypedPartSerializer<T>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    fn serialize(&self, bytes: &[u8]) -> Value {
        let value = unsafe { &*(bytes.as_ptr() as *const T) };
        serde_json::to_value(value).expect("component value must be serializable")
    }

    fn deserialize_into(&self, value: Value, out: &mut [u8]) {
        let typed: T = serde_json::from_value(value).expect("component value must deserialize");
        unsafe {
            std::ptr::write(out.as_mut_ptr() as *mut T, typed);
        }
    }
}

static PART_SERIALIZERS: OnceLock<Mutex<rustc_hash::FxHashMap<PartId, Box<dyn PartSerializer>>>> =
    OnceLock::new();

fn part_serializers() -> &'static Mutex<rustc_hash::FxHashMap<PartId, Box<dyn PartSerializer>>> {
    PART_SERIALIZERS.get_or_init(|| Mutex::new(rustc_hash::FxHashMap::default()))
}

/// Encode one component row's raw bytes through its registered serializer.
/// Panics if `id` does not name a registered component — callers only
/// invoke this for part-ids a `Page` actually carries a column for.
pub(crate) fn serialize_part(id: PartId, bytes: &[u8]) -> Value {
    part_serializers()
        .lock()
        .unwrap()
        .get(&id)
        .expect("component part must have a registered serializer")
        .serialize(bytes)
}

/// Inverse of [`serialize_part`]: decode `value` and write it into `out`,
/// which must be exactly `size_of` the component wide.
pub(crate) fn deserialize_part_into(id: PartId, value: Value, out: &mut [u8]) {
    part_serializers()
        .lock()
        .unwrap()
        .get(&id)
        .expect("component part must have a registered serializer")
        .deserialize_into(value, out)
}

/// Stable handle for a component type `T`. Carries no state of its own —
/// all the interesting bits live in the process-wide registry keyed by
/// `T`'s assigned [`PartId`] — so constructing one is free and a program
/// may call [`Component::id`] as often as it likes.
#[derive(Clone, Copy)]
pub struct Component<T> {
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T> Default for Component<T>
where
    T: 'static + Send + Sync + Serialize + for<'de> Deserialize<'de>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Component<T>
where
    T: 'static + Send + Sync + Serialize + for<'de> Deserialize<'de>,
{
    /// Register (idempotently) and return this component's part-id.
    ///
    /// Two programs that register the same set of component types in the
    /// same order end up with the same ids; this is the allocation-order
    /// contract §6 of the specification documents — rename a type or
    /// reorder its registration and `part_hash` changes, rejecting saves
    /// from before the change rather than silently misreading them.
    pub fn new() -> Self {
        component_id::<T>();
        Self {
            _marker: std::marker::PhantomData,
        }
    }

    pub fn id(&self) -> PartId {
        component_id::<T>()
    }
}

fn component_id<T>() -> PartId
where
    T: 'static + Serialize + for<'de> Deserialize<'de>,
{
    static BY_TYPE: OnceLock<Mutex<rustc_hash::FxHashMap<std::any::TypeId, PartId>>> =
        OnceLock::new();
    let by_type_lock = BY_TYPE.get_or_init(|| Mutex::new(rustc_hash::FxHashMap::default()));

    let type_id = std::any::TypeId::of::<T>();
    let mut by_type = by_type_lock.lock().unwrap();
    if let Some(&id) = by_type.get(&type_id) {
        return id;
    }

    let id = PartId(NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed));
    by_type.insert(type_id, id);
    part_registry().lock().unwrap().insert(
        id,
        PartTypeInfo {
            size: std::mem::size_of::<T>(),
            name: type_name::<T>(),
            drop_fn: if std::mem::needs_drop::<T>() {
                Some(|ptr: *mut u8| unsafe {
                    std::ptr::drop_in_place(ptr as *mut T);
                })
            } else {
                None
            },
        },
    );
    part_serializers()
        .lock()
        .unwrap()
        .insert(id, Box::new(TypedPartSerializer::<T>(std::marker::PhantomData)));
    id
}

/// A pure marker: `Tag`s carry no bytes and no backing column, only
/// membership in an entity's signature.
#[derive(Clone, Copy)]
pub struct Tag {
    id: PartId,
}

impl Tag {
    /// Register a new, distinct tag. Unlike [`Component::new`], every call
    /// allocates a fresh id — tags have no `T` to deduplicate on, so a
    /// caller is expected to create each tag exactly once (typically as a
    /// `static`) and share the handle.
    pub fn new(name: &'static str) -> Self {
        let id = PartId(NEXT_TAG_ID.fetch_sub(1, Ordering::Relaxed));
        part_registry().lock().unwrap().insert(
            id,
            PartTypeInfo {
                size: 0,
                name,
                drop_fn: None,
            },
        );
        Self { id }
    }

    pub fn id(&self) -> PartId {
        self.id
    }
}

pub(crate) fn registered_parts() -> Vec<(PartId, &'static str)> {
    part_registry()
        .lock()
        .unwrap()
        .iter()
        .map(|(id, info)| (*id, info.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize)]
    struct Int(#[allow(dead_code)] u32);
    #[derive(Serialize, Deserialize)]
    struct Other(#[allow(dead_code)] u32);

    #[test]
    fn component_ids_are_stable_per_type() {
        let a = Component::<Int>::new();
        let b = Component::<Int>::new();
        assert_eq!(a.id(), b.id());

        let c = Component::<Other>::new();
        assert_ne!(a.id(), c.id());
    }

    #[test]
    fn tags_never_collide_with_components() {
        let tag = Tag::new("Dead");
        let comp = Component::<Int>::new();
        assert_ne!(tag.id(), comp.id());
        assert!(tag.id().0 > comp.id().0);
    }
}
