//! Player motion system.
//!
//! Probes for ground below every player, runs the
//! [`PlayerMotion`](crate::components::motion::PlayerMotion) tick and
//! triggers [`LandEvent`] / [`LeaveGroundEvent`] on grounding changes.
use bevy_ecs::prelude::*;

use crate::components::boxcollider::BoxCollider;
use crate::components::mapposition::MapPosition;
use crate::components::motion::{GroundTransition, PlayerMotion};
use crate::components::rigidbody::RigidBody;
use crate::components::rotation::Rotation;
use crate::components::spline::SplinePath;
use crate::events::motion::{LandEvent, LeaveGroundEvent};
use crate::resources::worldtime::WorldTime;
use crate::systems::grounding::cast_ground;

pub fn player_motion_system(
    mut commands: Commands,
    time: Res<WorldTime>,
    mut players: Query<(
        Entity,
        &mut PlayerMotion,
        &mut RigidBody,
        &mut MapPosition,
        &mut Rotation,
    )>,
    ground: Query<(Entity, &MapPosition, &BoxCollider), Without<PlayerMotion>>,
    surfaces: Query<(Entity, &SplinePath)>,
    splines: Query<&SplinePath>,
) {
    for (entity, mut motion, mut body, mut position, mut rotation) in players.iter_mut() {
        let origin = position.pos + motion.params.ground_check_offset;
        let hit = cast_ground(
            origin,
            motion.params.ground_check_distance,
            motion.params.ground_mask,
            ground.iter().map(|(e, p, c)| (e, p.pos, c)),
            surfaces.iter(),
        );

        let transition = motion.update_motion(
            time.elapsed,
            time.delta,
            &mut body,
            &mut position,
            &mut rotation,
            hit,
            &splines,
        );
        match transition {
            Some(GroundTransition::Landed) => commands.trigger(LandEvent { player: entity }),
            Some(GroundTransition::LeftGround) => {
                commands.trigger(LeaveGroundEvent { player: entity })
            }
            None => {}
        }
    }
}
