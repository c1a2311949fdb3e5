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

//! Event fan-out: synchronous listeners plus independent, asynchronously
//! draining pipes sharing one ring buffer.
//!
//! A Pipe and its Bus are mutually referential by nature — the Bus must
//! reach every open Pipe's cursor to know how much of the queue it can
//! reclaim, and a Pipe must reach the Bus to read from its queue. Rather
//! than a raw back-pointer (which would fight the borrow checker and
//! invite a use-after-free once a Bus moves), both sides hold a shared,
//! reference-counted handle to the same inner state.

use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};

use crate::ring::RingBuffer;

new_key_type! {
    struct PipeKey;
}

struct PipeState {
    next_event: u64,
}

struct BusInner<E> {
    listeners: Vec<Box<dyn FnMut(&E) + Send>>,
    pipes: SlotMap<PipeKey, PipeState>,
    queue: RingBuffer<E>,
}

impl<E: Clone> BusInner<E> {
    fn reclaim(&mut self) {
        match self.pipes.values().map(|p| p.next_event).min() {
            Some(min) => {
                self.queue.drop_until(min);
            }
            None => {
                self.queue.drop_until(self.queue.head());
            }
        }
    }
}

/// A publish/subscribe event channel for event type `E`.
pub struct Bus<E> {
    inner: Arc<Mutex<BusInner<E>>>,
}

impl<E> Default for Bus<E>
where
    E: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Bus<E>
where
    E: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(BusInner {
                listeners: Vec::new(),
                pipes: SlotMap::with_key(),
                queue: RingBuffer::new(),
            })),
        }
    }

    /// Register a synchronous listener, invoked on every publish in
    /// registration order, before any pipe enqueue.
    pub fn listen(&self, callback: impl FnMut(&E) + Send + 'static) {
        self.inner.lock().listeners.push(Box::new(callback));
    }

    pub fn publish(&self, event: E) {
        let mut inner = self.inner.lock();
        for listener in inner.listeners.iter_mut() {
            listener(&event);
        }
        if !inner.pipes.is_empty() {
            inner.queue.enqueue(event);
        }
    }

    pub fn publish_batch(&self, events: impl IntoIterator<Item = E>) {
        let mut inner = self.inner.lock();
        let events: Vec<E> = events.into_iter().collect();
        for event in &events {
            for listener in inner.listeners.iter_mut() {
                listener(event);
            }
        }
        if !inner.pipes.is_empty() {
            inner.queue.enqueue_batch(events);
        }
    }

    /// Open a new consumer. It sees no backlog: its cursor starts at the
    /// queue's current head.
    pub fn new_pipe(&self) -> Pipe<E> {
        let mut inner = self.inner.lock();
        let next_event = inner.queue.head();
        let key = inner.pipes.insert(PipeState { next_event });
        Pipe {
            bus: self.inner.clone(),
            key,
        }
    }
}

/// An independent, ordered consumer of a [`Bus`]'s events.
pub struct Pipe<E> {
    bus: Arc<Mutex<BusInner<E>>>,
    key: PipeKey,
}

impl<E: Clone> Pipe<E> {
    pub fn pop(&self) -> Option<E> {
        let mut inner = self.bus.lock();
        let cursor = inner.pipes[self.key].next_event;
        let event = inner.queue.peek(cursor)?;
        inner.pipes[self.key].next_event = cursor + 1;
        inner.reclaim();
        Some(event)
    }

    /// Every event not yet seen by this pipe, in publish order. Collected
    /// eagerly in one locked pass rather than as a lazy, self-referential
    /// iterator — holding the bus lock open across yields would fight the
    /// borrow checker for no real benefit here.
    pub fn iter(&self) -> Vec<E> {
        let mut inner = self.bus.lock();
        let mut cursor = inner.pipes[self.key].next_event;
        let mut out = Vec::new();
        while let Some(event) = inner.queue.peek(cursor) {
            out.push(event);
            cursor += 1;
        }
        inner.pipes[self.key].next_event = cursor;
        inner.reclaim();
        out
    }

    /// Stop consuming. Backlog this pipe was the last to hold open is not
    /// reclaimed immediately — reclamation only happens the next time some
    /// other live pipe consumes, so if this was the last pipe, the
    /// backlog is retained until a new pipe exists and reads past it.
    pub fn close(self) {
        self.bus.lock().pipes.remove(self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn pipe_sees_only_events_published_after_it_opens() {
        let bus: Bus<i32> = Bus::new();
        bus.publish(1); // no pipes yet, not queued
        let pipe = bus.new_pipe();
        bus.publish(2);
        bus.publish(3);
        assert_eq!(pipe.iter(), vec![2, 3]);
    }

    #[test]
    fn listeners_fire_synchronously_in_order() {
        let bus: Bus<i32> = Bus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c1 = count.clone();
        bus.listen(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        bus.publish(1);
        bus.publish(2);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn queue_reclaims_once_every_pipe_has_advanced() {
        let bus: Bus<i32> = Bus::new();
        let a = bus.new_pipe();
        let b = bus.new_pipe();
        bus.publish(1);
        bus.publish(2);
        assert_eq!(a.pop(), Some(1));
        // b hasn't consumed yet, so nothing is reclaimed.
        assert_eq!(bus.inner.lock().queue.len(), 2);
        assert_eq!(b.pop(), Some(1));
        assert_eq!(bus.inner.lock().queue.len(), 1);
    }
}
