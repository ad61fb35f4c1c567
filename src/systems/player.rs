//! Player controller systems.
//!
//! [`player_actions_system`] runs before motion and performs buffered
//! actions; [`player_combo_system`] runs after it and updates the combo from
//! the resulting velocity.
use bevy_ecs::prelude::*;
use log::{debug, info};

use crate::components::motion::PlayerMotion;
use crate::components::player::PlayerController;
use crate::components::rigidbody::RigidBody;
use crate::resources::worldtime::WorldTime;
use crate::systems::time::set_paused;

/// Health check, attack window, buffered jump and boost, facing.
///
/// A dead player pauses the simulation and does nothing else.
pub fn player_actions_system(
    mut commands: Commands,
    time: Res<WorldTime>,
    mut players: Query<(Entity, &mut PlayerController, &mut PlayerMotion, &mut RigidBody)>,
) {
    let now = time.elapsed;
    for (entity, mut controller, mut motion, mut body) in players.iter_mut() {
        if controller.is_dead() {
            info!("Player {:?} is dead, pausing", entity);
            commands.queue(|world: &mut World| {
                set_paused(world, true);
            });
            continue;
        }
        controller.update_attack(now);
        if controller.check_jump(now, &mut motion, &mut body) {
            debug!("Player {:?} jumped, {} charges left", entity, motion.jumps_left());
        }
        if controller.check_boost(now, &mut motion, &mut body) {
            debug!("Player {:?} boosted", entity);
        }
        let vx = body.velocity.x;
        controller.check_flip(vx);
    }
}

pub fn player_combo_system(
    time: Res<WorldTime>,
    mut players: Query<(Entity, &mut PlayerController, &RigidBody)>,
) {
    for (entity, mut controller, body) in players.iter_mut() {
        if controller.is_dead() {
            continue;
        }
        if controller.update_combo(time.elapsed, time.delta, body.velocity.x) {
            debug!(
                "Player {:?} healed to {} at combo {:.1}",
                entity, controller.health, controller.combo
            );
        }
    }
}
