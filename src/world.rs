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

//! `World`: the facade over a [`Store`] and a [`Scheduler`], plus
//! save/restore.
//!
//! Every Access-scoped convenience method here (`spawn`, `delete`, …)
//! opens a fresh [`Access`], performs one operation, and lets it close
//! immediately — there is no separate world-level delete queue. A caller
//! who needs several operations to share one deferred-delete batch opens
//! an `Access` directly and keeps it alive across them.

use std::time::Duration;

use parking_lot::Mutex;

use crate::access::Access;
use crate::entity::EntityId;
use crate::error::{EcsError, Result};
use crate::filter::Filter;
use crate::part::PartId;
use crate::schedule::Schedule;
use crate::scheduler::Scheduler;
use crate::store::Store;

/// A handle returned by `new_schedule`/`new_variable_schedule`/
/// `new_manual_schedule`, used to add systems and to step or address a
/// particular schedule afterward.
pub type ScheduleId = usize;

pub struct World {
    store: Mutex<Store>,
    scheduler: Scheduler,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(Store::new()),
            scheduler: Scheduler::new(),
        }
    }

    /// Acquire the store's lock and open a scoped handle onto it. The
    /// lock is held until the returned `Access` closes (explicitly or by
    /// drop).
    pub fn access(&self) -> Access<'_> {
        Access::new(self.store.lock())
    }

    pub fn alive(&self, entity: EntityId) -> bool {
        self.access().alive(entity)
    }

    pub fn exists(&self, entity: EntityId) -> bool {
        self.access().exists(entity)
    }

    pub fn spawn(&self, parts: impl IntoIterator<Item = PartId>) -> EntityId {
        self.access().spawn(parts)
    }

    pub fn spawn_batch(&self, n: usize, parts: impl IntoIterator<Item = PartId>) -> Vec<EntityId> {
        self.access().spawn_batch(n, parts)
    }

    pub fn delete(&self, entity: EntityId) {
        self.access().delete(entity);
    }

    pub fn delete_immediately(&self, entity: EntityId) {
        self.access().delete_immediately(entity);
    }

    pub fn empty_delete_queue(&self) {
        self.access().empty_delete_queue();
    }

    pub fn query(&self, filter: &Filter) -> Vec<EntityId> {
        self.access().query(filter)
    }

    /// A fixed-rate schedule: `min_delta == max_delta == 1s / freq`.
    pub fn new_schedule(&self, freq: f64) -> ScheduleId {
        self.scheduler.push(Schedule::new(freq, freq))
    }

    /// A schedule bounded between `min_freq` and `max_freq` Hz.
    pub fn new_variable_schedule(&self, max_freq: f64, min_freq: f64) -> ScheduleId {
        self.scheduler.push(Schedule::new(max_freq, min_freq))
    }

    /// A schedule with no periodic ticker; only ever advanced by
    /// `step_schedule`.
    pub fn new_manual_schedule(&self) -> ScheduleId {
        self.scheduler.push(Schedule::manual())
    }

    /// Register a system on a schedule previously returned by one of the
    /// `new_*_schedule` constructors.
    pub fn add_system<F>(&self, schedule: ScheduleId, name: &'static str, callback: F)
    where
        F: FnMut(&mut Access, Duration, Duration) + Send + 'static,
    {
        self.scheduler.add_system(schedule, name, callback);
    }

    /// Advance one schedule by hand, independent of its ticker (or for a
    /// manual schedule, the only way it ever advances).
    pub fn step_schedule(&self, schedule: ScheduleId) {
        self.scheduler.step(schedule, self);
    }

    /// Block the calling thread, driving every schedule's ticks until
    /// [`World::stop_schedules`] is called from another thread.
    pub fn run_schedules(&self) {
        self.scheduler.run(self);
    }

    pub fn stop_schedules(&self) {
        self.scheduler.stop();
    }

    /// Encode a versioned, fingerprinted snapshot of this world's store
    /// and schedules.
    pub fn serialize(&self) -> Vec<u8> {
        let store = self.store.lock();
        let record = crate::save::build(&store, &self.scheduler);
        serde_json::to_vec(&record).expect("save record must serialize")
    }

    /// Decode and restore a snapshot written by [`World::serialize`].
    ///
    /// Validation (the three fingerprints, then the version) runs to
    /// completion before any live state is touched: a save that fails any
    /// check leaves this world exactly as it was. If the scheduler was
    /// running, it is stopped before the store is replaced; resuming it
    /// afterward — if the caller still wants it running — is the
    /// caller's job, not this method's: `Scheduler::run` blocks the
    /// thread that calls it, and a restore invoked from some other thread
    /// has no way to hand that thread back its loop.
    pub fn deserialize(&self, bytes: &[u8]) -> Result<()> {
        #[cfg(feature = "profiling")]
        let _span = tracing::info_span!("restore").entered();

        let record: crate::save::SaveRecord =
            serde_json::from_slice(bytes).map_err(|e| EcsError::Decode(e.to_string()))?;
        crate::save::validate(&record, &self.scheduler)?;

        self.scheduler.stop();
        {
            let mut store = self.store.lock();
            *store = Store::from_snapshot(record.store);
        }
        self.scheduler.reset_schedules(&record.schedule_run_times);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::Component;
    use crate::signature::Signature;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Copy)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[test]
    fn spawn_and_query_round_trip_through_save() {
        let world = World::new();
        let pos = Component::<Position>::new();
        let e = world.spawn([pos.id()]);
        {
            let mut access = world.access();
            pos.add(&mut access, e, Position { x: 1.0, y: 2.0 });
        }

        let bytes = world.serialize();
        world.deserialize(&bytes).unwrap();

        assert!(world.exists(e));
        let filter = Filter::new().exactly(Signature::new([pos.id()]));
        assert_eq!(world.query(&filter), vec![e]);
        let access = world.access();
        assert_eq!(pos.get(&access, e), Some(&Position { x: 1.0, y: 2.0 }));
    }

    #[test]
    fn restore_rejects_on_part_mismatch_and_leaves_world_untouched() {
        let world = World::new();
        let pos = Component::<Position>::new();
        let e = world.spawn([pos.id()]);
        let bytes = world.serialize();
        // Corrupt the recorded part_hash so validation must fail.
        let mut record: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        record["part_hash"] = serde_json::Value::from(record["part_hash"].as_u64().unwrap() ^ 1);
        let bytes = serde_json::to_vec(&record).unwrap();

        let result = world.deserialize(&bytes);
        assert!(result.is_err());
        assert!(world.exists(e));
    }
}
