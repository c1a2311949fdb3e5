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

//! Drives every [`Schedule`] from one unified wait loop.

use crossbeam::channel::{bounded, Receiver, Select, Sender};
use parking_lot::Mutex;

use crate::schedule::Schedule;
use crate::world::World;

pub(crate) struct Scheduler {
    schedules: Mutex<Vec<Schedule>>,
    exit_tx: Mutex<Option<Sender<()>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            schedules: Mutex::new(Vec::new()),
            exit_tx: Mutex::new(None),
        }
    }

    pub fn push(&self, schedule: Schedule) -> usize {
        let mut schedules = self.schedules.lock();
        schedules.push(schedule);
        schedules.len() - 1
    }

    pub fn step(&self, index: usize, world: &World) {
        let mut schedules = self.schedules.lock();
        schedules[index].step(world, std::time::Instant::now());
    }

    /// Register a system on an already-pushed schedule. A `Schedule`
    /// itself is moved into `self.schedules` by [`Scheduler::push`], so
    /// this is the only way to add systems to it afterward.
    pub fn add_system<F>(&self, index: usize, name: &'static str, callback: F)
    where
        F: FnMut(&mut crate::access::Access, std::time::Duration, std::time::Duration) + Send + 'static,
    {
        self.schedules.lock()[index].add_system(name, callback);
    }

    pub fn callback_names(&self) -> Vec<&'static str> {
        self.schedules
            .lock()
            .iter()
            .flat_map(|s| s.callback_names())
            .collect()
    }

    pub(crate) fn is_running(&self) -> bool {
        self.exit_tx.lock().is_some()
    }

    /// Restore step 6: reset every schedule's ticker and last-observed
    /// time, and set `run_time` to the saved value for that index (or
    /// zero, if the save had fewer schedules than are registered now).
    pub(crate) fn reset_schedules(&self, run_times: &[std::time::Duration]) {
        let mut schedules = self.schedules.lock();
        for (i, schedule) in schedules.iter_mut().enumerate() {
            schedule.reset_ticker();
            schedule.run_time = run_times.get(i).copied().unwrap_or(std::time::Duration::ZERO);
        }
    }

    pub(crate) fn run_times(&self) -> Vec<std::time::Duration> {
        self.schedules.lock().iter().map(|s| s.run_time()).collect()
    }

    /// Block the calling thread, driving every schedule's ticks until
    /// [`Scheduler::stop`] is called from another thread.
    ///
    /// The `schedules` lock is only ever held long enough to snapshot the
    /// current ticker handles or to step one schedule — never across the
    /// blocking `select.select()` wait — so `push`/`add_system`/`step`/
    /// `callback_names` and the rest stay callable from another thread
    /// while a schedule is running instead of deadlocking against a guard
    /// this loop never drops.
    pub fn run(&self, world: &World) {
        let (tx, rx) = bounded::<()>(0);
        *self.exit_tx.lock() = Some(tx);

        loop {
            let tickers: Vec<Receiver<std::time::Instant>> =
                self.schedules.lock().iter().map(|s| s.ticker.clone()).collect();

            let mut select = Select::new();
            for ticker in &tickers {
                select.recv(ticker);
            }
            let exit_index = select.recv(&rx);

            let op = select.select();
            let index = op.index();
            if index == exit_index {
                let _ = op.recv(&rx);
                break;
            }
            match op.recv(&tickers[index]) {
                Ok(now) => self.schedules.lock()[index].step(world, now),
                Err(_) => continue,
            }
        }

        *self.exit_tx.lock() = None;
    }

    /// Signal a running [`Scheduler::run`] to return at the next wait
    /// boundary. A correct no-op if the scheduler is not currently
    /// running — unlike a naive port that sends unconditionally and only
    /// afterward checks whether the channel still exists, which sends
    /// into a channel nothing is listening on.
    pub fn stop(&self) {
        if let Some(tx) = self.exit_tx.lock().take() {
            let _ = tx.send(());
        }
    }
}
