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

//! Spawns a few entities, runs one manual schedule tick over them, then
//! saves and restores the world to show the round trip.

use archetype_ecs::{Component, Filter, Signature, World};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
struct Velocity {
    dx: f32,
    dy: f32,
}

fn main() {
    let world = World::new();
    let position = Component::<Position>::new();
    let velocity = Component::<Velocity>::new();

    let movers: Vec<_> = (0..5)
        .map(|i| {
            let e = world.spawn([position.id(), velocity.id()]);
            let mut access = world.access();
            position.add(&mut access, e, Position { x: i as f32, y: 0.0 });
            velocity.add(&mut access, e, Velocity { dx: 1.0, dy: 0.5 });
            e
        })
        .collect();

    let schedule = world.new_manual_schedule();
    world.add_system(schedule, "integrate_positions", move |access, delta, _run_time| {
        let dt = delta.as_secs_f32();
        let filter = Filter::new().include_exact(Signature::new([position.id(), velocity.id()]));
        for entity in access.query(&filter) {
            let v = *velocity.get(access, entity).unwrap();
            let p = position.get_mut(access, entity).unwrap();
            p.x += v.dx * dt;
            p.y += v.dy * dt;
        }
    });

    world.step_schedule(schedule);

    for &e in &movers {
        let access = world.access();
        println!("{e:?} -> {:?}", position.get(&access, e));
    }

    let saved = world.serialize();
    world.deserialize(&saved).expect("save/restore compatible with this build");
    println!("restored {} entities", movers.len());
}
