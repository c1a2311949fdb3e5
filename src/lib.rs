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

//! Archetype ECS — columnar archetype storage, layered queries,
//! rate-scheduled systems, event buses, and hash-gated save/restore.
//!
//! Start at [`World`]: it owns the store and the scheduler and is the
//! only type most callers ever touch directly. Components and tags are
//! registered once (typically as `static`s wrapping [`Component::new`] /
//! [`Tag::new`]) and then used as handles into any `World`.

pub mod access;
pub mod bus;
pub mod entity;
pub mod error;
pub mod filter;
mod page;
pub mod part;
mod query;
pub mod resource;
mod ring;
pub mod schedule;
mod scheduler;
mod save;
pub mod signature;
mod store;
pub mod system;
pub mod world;

pub use access::Access;
pub use bus::{Bus, Pipe};
pub use entity::EntityId;
pub use error::{EcsError, Result, RestoreError};
pub use filter::Filter;
pub use part::{Component, PartId, Tag};
pub use resource::{Resource, ResourceId};
pub use schedule::Schedule;
pub use signature::Signature;
pub use system::TypedSystem;
pub use world::{ScheduleId, World};
