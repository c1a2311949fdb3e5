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

//! A frequency-bounded group of systems, driven by a periodic ticker.

use std::time::{Duration, Instant};

use crossbeam::channel::Receiver;

use crate::access::Access;
use crate::system::{SystemRunner, TypedSystem};
use crate::world::World;

/// One rate-limited group of systems. Systems run sequentially, in
/// registration order, every time the schedule's ticker fires.
pub struct Schedule {
    pub(crate) ticker: Receiver<Instant>,
    pub(crate) last_time: Instant,
    pub(crate) run_time: Duration,
    pub(crate) min_delta: Duration,
    pub(crate) max_delta: Duration,
    pub(crate) systems: Vec<Box<dyn SystemRunner>>,
}

impl Schedule {
    /// `max_freq` and `min_freq` are in Hz. `min_freq` is clamped to
    /// `max_freq` if it would otherwise exceed it. A `max_freq` of zero
    /// produces a non-ticking, manually stepped schedule.
    pub(crate) fn new(max_freq: f64, min_freq: f64) -> Self {
        let min_freq = if min_freq > max_freq { max_freq } else { min_freq };

        if max_freq <= 0.0 {
            return Self {
                ticker: crossbeam::channel::never(),
                last_time: Instant::now(),
                run_time: Duration::ZERO,
                min_delta: Duration::ZERO,
                max_delta: Duration::MAX,
                systems: Vec::new(),
            };
        }

        let min_delta = Duration::from_secs_f64(1.0 / max_freq);
        let max_delta = if min_freq > 0.0 {
            Duration::from_secs_f64(1.0 / min_freq)
        } else {
            Duration::MAX
        };

        Self {
            ticker: crossbeam::channel::tick(min_delta),
            last_time: Instant::now(),
            run_time: Duration::ZERO,
            min_delta,
            max_delta,
            systems: Vec::new(),
        }
    }

    pub(crate) fn manual() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn add_system<F>(&mut self, name: &'static str, callback: F)
    where
        F: FnMut(&mut Access, Duration, Duration) + Send + 'static,
    {
        self.systems.push(Box::new(TypedSystem::new(name, callback)));
    }

    pub fn run_time(&self) -> Duration {
        self.run_time
    }

    /// Reset the ticker and last-observed time, as restore step 6
    /// requires. A manual schedule (`min_delta == 0`) has no periodic
    /// ticker to begin with, so it stays on `never()`. `last_time` is
    /// reset to the current wall clock, matching the original's
    /// `LastTime: time.Now()` at construction, so the very next `step`
    /// reports a genuine elapsed duration rather than a fabricated one.
    pub(crate) fn reset_ticker(&mut self) {
        self.ticker = if self.min_delta.is_zero() {
            crossbeam::channel::never()
        } else {
            crossbeam::channel::tick(self.min_delta)
        };
        self.last_time = Instant::now();
    }

    /// Advance one tick at wall-clock `now`, clamping the observed delta
    /// to `[min_delta, max_delta]` and running every system in order. Each
    /// system gets its own fresh `Access`: the store's lock is acquired
    /// at call entry and released at return, not held across the whole
    /// tick.
    pub(crate) fn step(&mut self, world: &World, now: Instant) {
        let raw = now.saturating_duration_since(self.last_time);
        self.last_time = now;

        let delta = raw.clamp(self.min_delta, self.max_delta);
        self.run_time += delta;

        #[cfg(feature = "profiling")]
        let _span = tracing::info_span!("schedule_tick", run_time_ms = self.run_time.as_millis() as u64).entered();

        for system in self.systems.iter_mut() {
            let mut access = world.access();
            system.run(&mut access, delta, self.run_time);
        }
    }

    pub(crate) fn callback_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|s| s.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn step_clamps_delta_to_bounds() {
        let mut schedule = Schedule::new(50.0, 50.0); // min_delta == max_delta == 20ms
        let world = World::new();
        schedule.step(&world, Instant::now());
        let first_run_time = schedule.run_time();
        assert_eq!(first_run_time, Duration::from_millis(20));

        // A long stall between ticks must clamp back down to max_delta.
        schedule.step(&world, Instant::now() + Duration::from_secs(10));
        assert_eq!(schedule.run_time(), first_run_time + Duration::from_millis(20));
    }

    #[test]
    fn systems_run_in_registration_order() {
        let mut schedule = Schedule::manual();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let o1 = order.clone();
        schedule.add_system("first", move |_a: &mut Access, _d, _r| o1.lock().unwrap().push(1));
        let o2 = order.clone();
        schedule.add_system("second", move |_a: &mut Access, _d, _r| o2.lock().unwrap().push(2));

        let world = World::new();
        schedule.step(&world, Instant::now());
        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn run_time_accumulates_deltas() {
        let counter = Arc::new(AtomicU32::new(0));
        let mut schedule = Schedule::new(100.0, 10.0);
        let c = counter.clone();
        schedule.add_system("acc", move |_a: &mut Access, d: Duration, _r| {
            c.fetch_add(d.as_millis() as u32, Ordering::SeqCst);
        });
        let world = World::new();
        let start = Instant::now();
        schedule.step(&world, start);
        schedule.step(&world, start + Duration::from_millis(30));
        assert_eq!(counter.load(Ordering::SeqCst) as u128, schedule.run_time().as_millis());
    }
}
