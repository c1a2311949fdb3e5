//! Filter layer semantics over archetypes with overlapping parts — spec
//! scenario E4, invariant 6.

use archetype_ecs::{Component, Filter, Signature, World};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
struct Int(u32);

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
struct Vec2 {
    x: f32,
    y: f32,
}

#[test]
fn exactly_yields_only_the_identical_archetype() {
    let world = World::new();
    let int = Component::<Int>::new();
    let vec2 = Component::<Vec2>::new();

    let only_int = world.spawn([int.id()]);
    let only_vec2 = world.spawn([vec2.id()]);
    let both = world.spawn([int.id(), vec2.id()]);

    let exactly_vec2 = Filter::new().exactly(Signature::new([vec2.id()]));
    assert_eq!(world.query(&exactly_vec2), vec![only_vec2]);

    let include_exact_vec2 = Filter::new().include_exact(Signature::new([vec2.id()]));
    let mut found = world.query(&include_exact_vec2);
    found.sort_by_key(|e| format!("{e:?}"));
    let mut expected = vec![only_vec2, both];
    expected.sort_by_key(|e| format!("{e:?}"));
    assert_eq!(found, expected);

    let exclude_vec2 = Filter::new().exclude_any(Signature::new([vec2.id()]));
    assert_eq!(world.query(&exclude_vec2), vec![only_int]);
}

#[test]
fn layers_conjoin_as_logical_and() {
    let world = World::new();
    let int = Component::<Int>::new();
    let vec2 = Component::<Vec2>::new();

    let both = world.spawn([int.id(), vec2.id()]);
    let _only_int = world.spawn([int.id()]);

    let filter = Filter::new()
        .include_any(Signature::new([int.id()]))
        .include_any(Signature::new([vec2.id()]));
    assert_eq!(world.query(&filter), vec![both]);
}
