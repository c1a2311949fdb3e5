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

//! Singleton resources, keyed by type name rather than an allocation
//! counter.
//!
//! Components and tags need small dense integer ids because they
//! participate in archetype signatures; resources don't — they live in a
//! flat map, so there's no reason to make their identity depend on
//! registration order. Keying by `std::any::type_name::<T>()` instead
//! means two programs that register the same resource types in different
//! orders stay save-compatible, which an allocation counter would not
//! guarantee.

use std::any::Any;
use std::sync::{Mutex, OnceLock};

use serde::{Deserialize, Serialize};

use crate::access::Access;

/// A resource's stable identity: its type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(pub(crate) String);

impl ResourceId {
    pub(crate) fn name(&self) -> &str {
        &self.0
    }
}

/// Type-erased (de)serialization for one resource type, registered once
/// per `T` the first time a [`Resource<T>`] handle is created. Mirrors a
/// boxed-serializer-registry pattern rather than requiring every resource
/// type to be known up front.
pub(crate) trait ResourceSerializer: Send + Sync {
    fn serialize(&self, value: &dyn Any) -> serde_json::Value;
    fn deserialize(&self, value: serde_json::Value) -> Box<dyn Any + Send + Sync>;
}

struct TypedResourceSerializer<T>(std::marker::PhantomData<T>);

impl<T> ResourceSerializer for TypedResourceSerializer<T>
where
    T: Send + Sync + 'static + Serialize + for<'de> Deserialize<'de>,
{
    fn serialize(&self, value: &dyn Any) -> serde_json::Value {
        let typed = value.downcast_ref::<T>().expect("resource type mismatch");
        serde_json::to_value(typed).expect("resource value must be serializable")
    }

    fn deserialize(&self, value: serde_json::Value) -> Box<dyn Any + Send + Sync> {
        let typed: T = serde_json::from_value(value).expect("resource value must deserialize");
        Box::new(typed)
    }
}

static SERIALIZER_REGISTRY: OnceLock<Mutex<rustc_hash::FxHashMap<ResourceId, Box<dyn ResourceSerializer>>>> =
    OnceLock::new();

fn serializer_registry() -> &'static Mutex<rustc_hash::FxHashMap<ResourceId, Box<dyn ResourceSerializer>>> {
    SERIALIZER_REGISTRY.get_or_init(|| Mutex::new(rustc_hash::FxHashMap::default()))
}

/// Every resource type ever registered in this process, sorted by id.
/// Used for `resource_hash`: resource identity is type-name-keyed rather
/// than allocation-order-keyed (see module docs), so "in use" is best
/// read as "known to this process' registry", not "currently holding a
/// value in some `Store`".
pub(crate) fn registered_resource_ids() -> Vec<ResourceId> {
    let mut ids: Vec<ResourceId> = serializer_registry().lock().unwrap().keys().cloned().collect();
    ids.sort();
    ids
}

pub(crate) fn serialize_resource(id: &ResourceId, value: &dyn Any) -> Option<serde_json::Value> {
    serializer_registry()
        .lock()
        .unwrap()
        .get(id)
        .map(|s| s.serialize(value))
}

pub(crate) fn deserialize_resource(id: &ResourceId, value: serde_json::Value) -> Option<Box<dyn Any + Send + Sync>> {
    serializer_registry()
        .lock()
        .unwrap()
        .get(id)
        .map(|s| s.deserialize(value))
}

/// Stable, zero-sized handle for a resource type `T`.
pub struct Resource<T> {
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T> Default for Resource<T>
where
    T: Send + Sync + 'static + Serialize + for<'de> Deserialize<'de>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Resource<T>
where
    T: Send + Sync + 'static + Serialize + for<'de> Deserialize<'de>,
{
    pub fn new() -> Self {
        let id = Self::id();
        let mut registry = serializer_registry().lock().unwrap();
        registry
            .entry(id)
            .or_insert_with(|| Box::new(TypedResourceSerializer::<T>(std::marker::PhantomData)));
        Self {
            _marker: std::marker::PhantomData,
        }
    }

    pub fn id() -> ResourceId {
        ResourceId(std::any::type_name::<T>().to_string())
    }

    pub fn add(&self, access: &mut Access, value: T) {
        access.store_mut().resources.insert(Self::id(), Box::new(value));
    }

    pub fn delete(&self, access: &mut Access) -> bool {
        access.store_mut().resources.remove(&Self::id()).is_some()
    }

    pub fn has(&self, access: &Access) -> bool {
        access.store_ref().resources.contains_key(&Self::id())
    }

    pub fn get<'a>(&self, access: &'a Access) -> Option<&'a T> {
        access
            .store_ref()
            .resources
            .get(&Self::id())
            .and_then(|v| v.downcast_ref::<T>())
    }

    pub fn get_mut<'a>(&self, access: &'a mut Access) -> Option<&'a mut T> {
        access
            .store_mut()
            .resources
            .get_mut(&Self::id())
            .and_then(|v| v.downcast_mut::<T>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::World;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Score(u32);

    #[test]
    fn add_get_delete_round_trip() {
        let world = World::new();
        let mut access = world.access();
        let score = Resource::<Score>::new();
        assert!(!score.has(&access));
        score.add(&mut access, Score(7));
        assert_eq!(score.get(&access), Some(&Score(7)));
        score.get_mut(&mut access).unwrap().0 += 1;
        assert_eq!(score.get(&access), Some(&Score(8)));
        assert!(score.delete(&mut access));
        assert!(!score.has(&access));
    }

    #[test]
    fn id_is_stable_across_instances() {
        assert_eq!(Resource::<Score>::id(), Resource::<Score>::id());
    }
}
