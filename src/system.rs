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

//! The callback a [`crate::schedule::Schedule`] drives every tick.
//!
//! There's no generic way to recover a closure's identity at runtime in
//! Rust the way a reflection-based host language can, so every system is
//! registered with an explicit name — used both for diagnostics and as
//! the input to `callback_hash` (see [`crate::save`]). A system's "state"
//! is whatever the closure itself captures; there's no separate state
//! parameter the way a language without closures would need one.

use std::time::Duration;

use crate::access::Access;

/// Type-erased entry point a [`crate::schedule::Schedule`] can call
/// without knowing the concrete callback type underneath.
pub(crate) trait SystemRunner: Send {
    fn name(&self) -> &'static str;
    fn run(&mut self, access: &mut Access, delta: Duration, run_time: Duration);
}

/// A named callback plus whatever state it closes over.
pub struct TypedSystem<F> {
    name: &'static str,
    callback: F,
}

impl<F> TypedSystem<F>
where
    F: FnMut(&mut Access, Duration, Duration) + Send + 'static,
{
    pub fn new(name: &'static str, callback: F) -> Self {
        Self { name, callback }
    }
}

impl<F> SystemRunner for TypedSystem<F>
where
    F: FnMut(&mut Access, Duration, Duration) + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn run(&mut self, access: &mut Access, delta: Duration, run_time: Duration) {
        (self.callback)(access, delta, run_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::World;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn typed_system_invokes_callback_with_deltas() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        let mut system = TypedSystem::new("counter", move |_access: &mut Access, _d, _r| {
            calls2.fetch_add(1, Ordering::SeqCst);
        });
        let world = World::new();
        let mut access = world.access();
        system.run(&mut access, Duration::from_millis(16), Duration::from_millis(16));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(system.name(), "counter");
    }
}
