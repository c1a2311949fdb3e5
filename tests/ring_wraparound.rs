//! The event queue's ring buffer starts at capacity 1 and doubles on
//! demand; absolute indices must stay stable across a grow and across a
//! dequeue/enqueue cycle that wraps the physical buffer. `RingBuffer`
//! itself is crate-private (exercised directly in `src/ring.rs`'s own
//! unit tests — spec scenario E5), so this drives the same geometry
//! through the only public API built on top of it: `Bus`/`Pipe`.

use archetype_ecs::Bus;

#[test]
fn publishing_past_several_growths_preserves_order_and_values() {
    let bus: Bus<u32> = Bus::new();
    let pipe = bus.new_pipe();

    // Capacity starts at 1 and doubles on demand; 200 events forces
    // several growths while a pipe is open and backlog is retained.
    for i in 0..200u32 {
        bus.publish(i);
    }

    let seen = pipe.iter();
    let expected: Vec<u32> = (0..200).collect();
    assert_eq!(seen, expected);
}

#[test]
fn interleaved_consume_and_grow_keeps_both_cursors_correct() {
    let bus: Bus<u32> = Bus::new();
    let a = bus.new_pipe();
    let b = bus.new_pipe();

    let mut a_consumed = Vec::new();
    for i in 0..20u32 {
        bus.publish(i);
        if i % 3 == 0 {
            // Pops one absolute slot behind `i`'s publish; the buffer
            // grows several times over this loop while `a` is draining
            // and `b` is not, so this also exercises growth with a live
            // backlog gap between two pipes.
            if let Some(v) = a.pop() {
                a_consumed.push(v);
            }
        }
    }

    // `a` only ever advanced on every pop() above; whatever it hasn't
    // consumed yet, plus what it already has, must equal everything `b`
    // (which never consumed) still sees.
    let a_rest = a.iter();
    let mut a_total = a_consumed;
    a_total.extend(a_rest);

    let b_all = b.iter();
    assert_eq!(a_total, b_all);
    assert_eq!(b_all, (0..20).collect::<Vec<u32>>());
}
