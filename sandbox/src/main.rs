//! A small playground driving the ECS core: a moving entity, a scratch
//! registry page that gets thrown away, and a snapshot round trip.

use bincode::{Decode, Encode};
use strata_ecs::{
    Component, ComponentAccess, EcsWorld, EntitySubscriptionRegistration, Permission, System,
    SystemRegistration, TickContext,
};

#[derive(Debug, Clone, Copy, Encode, Decode)]
struct Position {
    x: f32,
    y: f32,
}
impl Component for Position {}

#[derive(Debug, Clone, Copy, Encode, Decode)]
struct Velocity {
    x: f32,
    y: f32,
}
impl Component for Velocity {}

struct Movement {
    matched: strata_ecs::IdVectorHandle,
}

impl System for Movement {
    fn tick(&mut self, ctx: &TickContext) {
        let positions = ctx.storage().array::<Position>();
        let velocities = ctx.storage().array::<Velocity>();
        let mut positions = positions.write().unwrap();
        let velocities = velocities.read().unwrap();
        for &entity in self.matched.read().unwrap().iter() {
            let vel = *velocities.component(entity);
            let pos = positions.component_mut(entity);
            pos.x += vel.x * ctx.delta_time();
            pos.y += vel.y * ctx.delta_time();
        }
    }
}

fn main() {
    env_logger::init();

    let mut world = EcsWorld::default();

    let player = world.create_entity();
    world.add_component(player, Position { x: 0.0, y: 0.0 });
    world.add_component(player, Velocity { x: 2.0, y: 1.0 });

    let matched = EcsWorld::new_id_vector();
    world.register_system(
        "movement",
        SystemRegistration::new(
            0,
            vec![EntitySubscriptionRegistration::new(
                matched.clone(),
                vec![
                    ComponentAccess::of::<Position>(Permission::RW),
                    ComponentAccess::of::<Velocity>(Permission::R),
                ],
            )],
        ),
        Box::new(Movement { matched }),
    );

    // Scratch content on its own page: simulated, then discarded wholesale.
    world.add_registry_page();
    for i in 0..8 {
        let debris = world.create_entity();
        world.add_component(
            debris,
            Position {
                x: i as f32,
                y: 0.0,
            },
        );
        world.add_component(debris, Velocity { x: 0.0, y: -1.0 });
    }

    for frame in 0..60 {
        world.tick(1.0 / 60.0);
        if frame == 29 {
            world.delete_top_registry_page();
            log::info!("scratch page discarded after frame {frame}");
        }
    }

    let pos = world.storage().component::<Position>(player);
    log::info!("player after one second: ({:.2}, {:.2})", pos.x, pos.y);

    // Snapshot the player and stamp a copy of it onto a fresh entity.
    let size = world.serialize_entity(player, &mut []);
    let mut snapshot = vec![0u8; size as usize];
    world.serialize_entity(player, &mut snapshot);

    let clone = world.create_entity();
    match world.deserialize_entity(clone, &snapshot) {
        Ok(()) => {
            let pos = world.storage().component::<Position>(clone);
            log::info!("cloned {player} into {clone} at ({:.2}, {:.2})", pos.x, pos.y);
        }
        Err(err) => log::error!("snapshot restore failed: {err}"),
    }
}
