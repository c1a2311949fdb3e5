//! Multi-consumer event fan-out: independent pipe cursors, synchronous
//! listeners, and reclaim-on-consume — spec invariant 7.

use archetype_ecs::Bus;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
struct Damage(u32);

#[test]
fn each_pipe_sees_only_events_published_after_it_opened() {
    let bus: Bus<Damage> = Bus::new();
    bus.publish(Damage(1)); // no pipes open yet, dropped

    let early = bus.new_pipe();
    bus.publish(Damage(2));
    let late = bus.new_pipe();
    bus.publish(Damage(3));

    assert_eq!(early.iter(), vec![Damage(2), Damage(3)]);
    assert_eq!(late.iter(), vec![Damage(3)]);
}

#[test]
fn listeners_fire_before_any_pipe_can_observe_the_event() {
    let bus: Bus<Damage> = Bus::new();
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));
    let o = order.clone();
    bus.listen(move |d: &Damage| o.lock().unwrap().push(d.0));

    let pipe = bus.new_pipe();
    bus.publish_batch([Damage(1), Damage(2), Damage(3)]);

    assert_eq!(*order.lock().unwrap(), vec![1, 2, 3]);
    assert_eq!(pipe.iter(), vec![Damage(1), Damage(2), Damage(3)]);
}

#[test]
fn a_slow_pipe_holds_back_reclamation_until_it_advances() {
    let bus: Bus<Damage> = Bus::new();
    let fast = bus.new_pipe();
    let slow = bus.new_pipe();

    bus.publish(Damage(1));
    bus.publish(Damage(2));

    assert_eq!(fast.pop(), Some(Damage(1)));
    assert_eq!(fast.pop(), Some(Damage(2)));

    // slow hasn't consumed anything yet, so both events are still held.
    let backlog_before = slow.iter();
    assert_eq!(backlog_before, vec![Damage(1), Damage(2)]);
}

#[test]
fn closing_the_last_pipe_retains_backlog_until_a_new_pipe_consumes() {
    let bus: Bus<Damage> = Bus::new();
    let pipe = bus.new_pipe();
    bus.publish(Damage(1));
    pipe.close();

    // No live pipes exist now; a fresh one starts at the current head and
    // does not see the retained backlog either.
    let fresh = bus.new_pipe();
    assert_eq!(fresh.iter(), Vec::<Damage>::new());
}
