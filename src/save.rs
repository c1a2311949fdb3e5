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

//! Versioned, fingerprinted save records.
//!
//! The three hashes are computed against this *process*'s registries, not
//! against whatever happens to be live in a particular `Store` at save
//! time — a resource or part type is "in use" once something registers
//! it, regardless of whether a value currently exists for it. This keeps
//! `resource_hash`/`part_hash` meaningful for a freshly constructed
//! `World` that has not yet re-populated every resource a save expects,
//! which the alternative (hashing only what `store.resources`/`store.parts`
//! happen to hold right now) would make impossible to satisfy.

use serde::{Deserialize, Serialize};

use crate::error::{EcsError, Result, RestoreError};
use crate::part::registered_parts;
use crate::resource::registered_resource_ids;
use crate::scheduler::Scheduler;
use crate::signature::CRC64;
use crate::store::{Store, StoreSnapshot};

pub(crate) const FORMAT_VERSION: u32 = 1;

/// CRC-64/ISO over every registered part's little-endian id followed by
/// its type name, in ascending part-id order.
fn part_hash() -> u64 {
    let mut parts = registered_parts();
    parts.sort_unstable_by_key(|(id, _)| *id);
    let mut digest = CRC64.digest();
    for (id, name) in parts {
        digest.update(&id.to_le_bytes());
        digest.update(name.as_bytes());
        digest.update(&[0]);
    }
    digest.finalize()
}

/// CRC-64/ISO over every registered resource's type-name string, sorted.
fn resource_hash() -> u64 {
    let mut digest = CRC64.digest();
    for id in registered_resource_ids() {
        digest.update(id.name().as_bytes());
        digest.update(&[0]);
    }
    digest.finalize()
}

/// CRC-64/ISO over every system-callback name referenced by any schedule,
/// sorted lexicographically so registration order doesn't matter.
fn callback_hash(scheduler: &Scheduler) -> u64 {
    let mut names = scheduler.callback_names();
    names.sort_unstable();
    let mut digest = CRC64.digest();
    for name in names {
        digest.update(name.as_bytes());
        digest.update(&[0]);
    }
    digest.finalize()
}

/// The full, self-describing payload written by [`crate::world::World::serialize`].
#[derive(Serialize, Deserialize)]
pub(crate) struct SaveRecord {
    pub version: u32,
    pub part_hash: u64,
    pub resource_hash: u64,
    pub callback_hash: u64,
    pub store: StoreSnapshot,
    pub schedule_run_times: Vec<std::time::Duration>,
}

pub(crate) fn build(store: &Store, scheduler: &Scheduler) -> SaveRecord {
    SaveRecord {
        version: FORMAT_VERSION,
        part_hash: part_hash(),
        resource_hash: resource_hash(),
        callback_hash: callback_hash(scheduler),
        store: store.to_snapshot(),
        schedule_run_times: scheduler.run_times(),
    }
}

/// Steps 2–3 of the restore sequence: recompute every fingerprint against
/// this process's current registries and compare, then check the version.
/// Must succeed, in full, before any live state is touched.
pub(crate) fn validate(record: &SaveRecord, scheduler: &Scheduler) -> Result<()> {
    if record.version > FORMAT_VERSION {
        return Err(EcsError::from(RestoreError::IncompatibleVersion));
    }
    if record.part_hash != part_hash() {
        return Err(EcsError::from(RestoreError::IncompatibleParts));
    }
    if record.resource_hash != resource_hash() {
        return Err(EcsError::from(RestoreError::IncompatibleResources));
    }
    if record.callback_hash != callback_hash(scheduler) {
        return Err(EcsError::from(RestoreError::IncompatibleCallbacks));
    }
    Ok(())
}
