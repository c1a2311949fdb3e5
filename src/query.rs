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

//! Typed component access layered on top of [`crate::access::Access`]'s
//! raw byte storage, plus a convenience iterator over one component type
//! across every page a filter matches.

use serde::{Deserialize, Serialize};

use crate::access::Access;
use crate::entity::EntityId;
use crate::filter::Filter;
use crate::part::Component;

impl<T> Component<T>
where
    T: 'static + Send + Sync + Serialize + for<'de> Deserialize<'de>,
{
    pub fn add(&self, access: &mut Access, entity: EntityId, value: T) -> bool {
        if !access.add_part(entity, self.id()) {
            return false;
        }
        let bytes = access
            .component_bytes_mut(entity, self.id())
            .expect("column must exist right after add_part");
        unsafe {
            std::ptr::write(bytes.as_mut_ptr() as *mut T, value);
        }
        true
    }

    pub fn delete(&self, access: &mut Access, entity: EntityId) -> bool {
        access.delete_part(entity, self.id())
    }

    pub fn has(&self, access: &Access, entity: EntityId) -> bool {
        access.has_part(entity, self.id())
    }

    pub fn get<'a>(&self, access: &'a Access, entity: EntityId) -> Option<&'a T> {
        access
            .component_bytes(entity, self.id())
            .map(|bytes| unsafe { &*(bytes.as_ptr() as *const T) })
    }

    pub fn get_mut<'a>(&self, access: &'a mut Access, entity: EntityId) -> Option<&'a mut T> {
        access
            .component_bytes_mut(entity, self.id())
            .map(|bytes| unsafe { &mut *(bytes.as_mut_ptr() as *mut T) })
    }

    /// Every `(entity, &T)` pair whose entity's archetype matches `filter`
    /// and which carries this component. Collected eagerly — there is no
    /// lazy cursor held open across calls, matching the bounded lifetime
    /// of the `Access` the slices borrow from.
    pub fn query<'a>(&self, access: &'a Access, filter: &Filter) -> Vec<(EntityId, &'a T)> {
        let id = self.id();
        let mut out = Vec::new();
        for (archetype_id, page) in access.store_ref().pages() {
            let signature = access.store_ref().archetype_signature(archetype_id);
            if !filter.matches(signature) || !page.has_column(id) {
                continue;
            }
            for (row, &entity) in page.entities().iter().enumerate() {
                let bytes = page.component_bytes(id, row).unwrap();
                out.push((entity, unsafe { &*(bytes.as_ptr() as *const T) }));
            }
        }
        out
    }
}

impl crate::part::Tag {
    pub fn add(&self, access: &mut Access, entity: EntityId) -> bool {
        access.add_part(entity, self.id())
    }

    pub fn delete(&self, access: &mut Access, entity: EntityId) -> bool {
        access.delete_part(entity, self.id())
    }

    pub fn has(&self, access: &Access, entity: EntityId) -> bool {
        access.has_part(entity, self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::Signature;
    use crate::world::World;

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Velocity {
        dx: f32,
    }

    #[test]
    fn add_remove_component_round_trip() {
        let world = World::new();
        let pos = Component::<Position>::new();
        let vel = Component::<Velocity>::new();
        let mut access = world.access();

        let a = access.spawn([pos.id()]);
        pos.add(&mut access, a, Position { x: 1.0, y: 2.0 });

        assert!(pos.has(&access, a));
        assert!(!vel.has(&access, a));

        vel.add(&mut access, a, Velocity { dx: 3.0 });
        assert!(vel.has(&access, a));

        vel.delete(&mut access, a);
        assert!(!vel.has(&access, a));
        assert_eq!(pos.get(&access, a), Some(&Position { x: 1.0, y: 2.0 }));
    }

    #[test]
    fn filter_exactly_matches_archetype_precisely() {
        let world = World::new();
        let pos = Component::<Position>::new();
        let vel = Component::<Velocity>::new();
        let mut access = world.access();

        let only_pos = access.spawn([pos.id()]);
        let _only_vel = access.spawn([vel.id()]);
        let both = access.spawn([pos.id(), vel.id()]);
        pos.add(&mut access, both, Position { x: 0.0, y: 0.0 });
        pos.add(&mut access, only_pos, Position { x: 0.0, y: 0.0 });

        let exact_pos = Filter::new().exactly(Signature::new([pos.id()]));
        let found = pos.query(&access, &exact_pos);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, only_pos);

        let include_pos = Filter::new().include_exact(Signature::new([pos.id()]));
        let found = pos.query(&access, &include_pos);
        assert_eq!(found.len(), 2);
    }
}
